//! Property tests for pricing, validation, liquidity and surfaces

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use premium_analytics::prelude::*;

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 14, 0, 0).unwrap()
}

fn kind() -> impl Strategy<Value = OptionKind> {
    prop_oneof![Just(OptionKind::Call), Just(OptionKind::Put)]
}

fn clean_chain() -> OptionChainSnapshot {
    let expiry = ts().date_naive() + Duration::days(40);
    let mut snap = OptionChainSnapshot::new("XYZ", 100.0, ts());
    for k in [90.0, 95.0, 100.0, 105.0, 110.0] {
        let price = bs_price(100.0, k, 0.05, 0.0, 0.3, 40.0 / 365.0, OptionKind::Call).unwrap();
        snap.push(
            OptionContract::new("XYZ", expiry, k, OptionKind::Call, 100.0, ts())
                .with_quote(price * 0.98, price * 1.02)
                .with_activity(100, 500)
                .with_iv(0.3),
        )
        .unwrap();
    }
    snap
}

/// A contract that fails one of the rejection rules
fn invalid_contract(i: usize) -> OptionContract {
    let expiry = ts().date_naive() + Duration::days(40);
    let base = OptionContract::new("XYZ", expiry, 120.0 + i as f64, OptionKind::Call, 100.0, ts())
        .with_activity(10, 10);
    match i % 4 {
        0 => base.with_quote(1.0, 0.9),
        1 => OptionContract {
            expiration: ts().date_naive() - Duration::days(1),
            ..base.with_quote(1.0, 1.1)
        },
        2 => OptionContract {
            underlying: "OTHER".to_string(),
            ..base.with_quote(1.0, 1.1)
        },
        _ => base.with_quote(0.1, 2.0),
    }
}

proptest! {
    #[test]
    fn call_put_greek_symmetry(
        spot in 20.0..500.0f64,
        strike in 20.0..500.0f64,
        rate in 0.0..0.10f64,
        div in 0.0..0.05f64,
        vol in 0.05..1.5f64,
        time in 0.01..3.0f64,
    ) {
        let c = bs_greeks(spot, strike, rate, div, vol, time, OptionKind::Call).unwrap();
        let p = bs_greeks(spot, strike, rate, div, vol, time, OptionKind::Put).unwrap();

        prop_assert_eq!(c.gamma, p.gamma);
        prop_assert!((c.delta - p.delta - (-div * time).exp()).abs() < 1e-12);
    }

    #[test]
    fn expired_greeks_are_zero(
        spot in 1.0..1000.0f64,
        strike in 1.0..1000.0f64,
        rate in -0.02..0.15f64,
        div in 0.0..0.1f64,
        vol in 0.0..3.0f64,
        kind in kind(),
    ) {
        let g = bs_greeks(spot, strike, rate, div, vol, 0.0, kind).unwrap();
        prop_assert_eq!(g, Greeks::zero());
    }

    #[test]
    fn delta_within_bounds(
        spot in 1.0..1000.0f64,
        strike in 1.0..1000.0f64,
        rate in -0.02..0.15f64,
        div in 0.0..0.1f64,
        vol in 0.001..3.0f64,
        time in 0.0..5.0f64,
    ) {
        let c = bs_greeks(spot, strike, rate, div, vol, time, OptionKind::Call).unwrap();
        let p = bs_greeks(spot, strike, rate, div, vol, time, OptionKind::Put).unwrap();

        prop_assert!((0.0..=1.0).contains(&c.delta));
        prop_assert!((-1.0..=0.0).contains(&p.delta));
        prop_assert!(c.gamma >= 0.0);
    }

    #[test]
    fn invalid_contracts_never_raise_quality(extra in 0usize..12) {
        let validator = ChainValidator::new();
        let mut snap = clean_chain();
        let mut last = validator.validate(snap.clone()).result().quality_score;

        for i in 0..extra {
            snap.calls.push(invalid_contract(i));
            let quality = validator.validate(snap.clone()).result().quality_score;
            prop_assert!(quality <= last);
            last = quality;
        }
    }

    #[test]
    fn liquidity_is_total(
        bid in proptest::num::f64::ANY,
        ask in proptest::num::f64::ANY,
        volume in any::<u64>(),
        open_interest in any::<u64>(),
    ) {
        let m = LiquidityAnalyzer::new().analyze(bid, ask, volume, open_interest);

        prop_assert!(m.spread_percentage.is_finite());
        prop_assert!(m.liquidity_score.is_finite());
        prop_assert!((0.0..=1.0).contains(&m.liquidity_score));
        prop_assert!(m.volume_score.is_finite());
        prop_assert!(m.open_interest_score.is_finite());
        prop_assert!(m.market_impact_estimate.is_finite());
        prop_assert!(m.effective_spread.is_finite());
    }

    #[test]
    fn surface_exact_at_observed_nodes(vols in prop::collection::vec(0.05..1.5f64, 15)) {
        let strikes = [90.0, 95.0, 100.0, 105.0, 110.0];
        let days = [30i64, 60, 120];

        let mut snap = OptionChainSnapshot::new("XYZ", 100.0, ts());
        for (j, &d) in days.iter().enumerate() {
            let expiry = ts().date_naive() + Duration::days(d);
            for (i, &k) in strikes.iter().enumerate() {
                snap.push(
                    OptionContract::new("XYZ", expiry, k, OptionKind::Call, 100.0, ts())
                        .with_quote(1.0, 1.05)
                        .with_activity(50, 50)
                        .with_iv(vols[j * strikes.len() + i]),
                )
                .unwrap();
            }
        }

        let chain = ChainValidator::new().validate(snap);
        prop_assert!(chain.is_valid());
        let surface = SurfaceBuilder::new().build(&chain).unwrap();

        for (j, &d) in days.iter().enumerate() {
            for (i, &k) in strikes.iter().enumerate() {
                let expected = vols[j * strikes.len() + i];
                prop_assert_eq!(surface.get_volatility(k, d as f64), Some(expected));
                prop_assert_eq!(surface.is_observed(k, d as f64), Some(true));
            }
        }
    }
}
