//! End-to-end scenarios over validation, liquidity and surfaces

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};

use premium_analytics::prelude::*;
use premium_analytics::validation::fill_gaps;

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 14, 15, 30, 0).unwrap()
}

fn call(strike: f64, days: i64, vol: f64) -> OptionContract {
    let expiry = ts().date_naive() + Duration::days(days);
    let time = days as f64 / 365.0;
    let price = bs_price(100.0, strike, 0.05, 0.0, vol, time, OptionKind::Call).unwrap();
    OptionContract::new("XYZ", expiry, strike, OptionKind::Call, 100.0, ts())
        .with_quote(price * 0.99, price * 1.01)
        .with_activity(400, 2500)
        .with_iv(vol)
}

fn calls_chain(strikes: &[f64], days: i64, vol: f64) -> OptionChainSnapshot {
    let mut snap = OptionChainSnapshot::new("XYZ", 100.0, ts());
    for &k in strikes {
        snap.push(call(k, days, vol)).unwrap();
    }
    snap
}

#[test]
fn flat_smile_has_no_skew() {
    let strikes = [90.0, 95.0, 100.0, 105.0, 110.0];
    let chain = ChainValidator::new().validate(calls_chain(&strikes, 45, 0.30));
    assert!(chain.is_valid());
    assert_relative_eq!(chain.result().quality_score, 1.0);

    let builder = SurfaceBuilder::with_config(SurfaceConfig {
        min_expirations: 1,
        ..Default::default()
    });
    let surface = builder.build(&chain).unwrap();

    let skew = surface.calculate_skew(45.0).unwrap();
    assert_relative_eq!(skew.net_skew, 0.0, epsilon = 1e-12);
    assert_relative_eq!(skew.call_skew_ratio, 1.0, epsilon = 1e-12);
    assert_relative_eq!(surface.get_atm_volatility(45.0).unwrap(), 0.30, epsilon = 1e-12);

    // single expiry: no term structure, nothing outside the envelope
    assert!(surface.calculate_term_structure().is_none());
    assert!(surface.get_volatility(100.0, 60.0).is_none());
    assert!(surface.get_volatility(120.0, 45.0).is_none());
}

#[test]
fn saturated_activity_scores_fully_liquid() {
    let m = LiquidityAnalyzer::new().analyze(1.00, 1.05, 2000, 8000);

    assert_relative_eq!(m.spread_percentage, 0.0488, epsilon = 1e-4);
    assert_relative_eq!(m.liquidity_score, 1.0, epsilon = 1e-12);
    assert!(!m.degenerate);
}

#[test]
fn missing_strike_is_synthesized_once() {
    let raw = calls_chain(&[85.0, 90.0, 95.0, 105.0, 110.0, 115.0], 30, 0.25);
    let chain = ChainValidator::new().validate(raw);
    assert!(chain.is_valid());

    let result = chain.result();
    assert!(result.gap_fill_applied);
    assert_eq!(result.synthesized_contracts, 1);
    assert_eq!(result.accepted_contracts, 6);
    assert!(result.confidence_level < result.quality_score);

    let snap = chain.snapshot();
    let synthetic: Vec<&OptionContract> = snap.contracts().filter(|c| c.interpolated).collect();
    assert_eq!(synthetic.len(), 1);

    let filled = synthetic[0];
    assert_eq!(filled.strike, 100.0);
    assert_eq!(filled.kind, OptionKind::Call);

    let lo = snap.call_at(95.0, filled.expiration).unwrap();
    let hi = snap.call_at(105.0, filled.expiration).unwrap();
    assert_relative_eq!(filled.bid, (lo.bid + hi.bid) / 2.0, epsilon = 1e-12);
    assert_relative_eq!(filled.ask, (lo.ask + hi.ask) / 2.0, epsilon = 1e-12);

    let (g, g_lo, g_hi) = (filled.greeks.unwrap(), lo.greeks.unwrap(), hi.greeks.unwrap());
    assert_relative_eq!(g.delta, (g_lo.delta + g_hi.delta) / 2.0, epsilon = 1e-12);
    assert_relative_eq!(g.gamma, (g_lo.gamma + g_hi.gamma) / 2.0, epsilon = 1e-12);
}

#[test]
fn gap_fill_is_idempotent() {
    let strikes = [85.0, 90.0, 95.0, 105.0, 110.0, 115.0];
    let chain = ChainValidator::new().validate(calls_chain(&strikes, 30, 0.25));
    let (mut snap, _) = chain.into_parts();

    assert_eq!(fill_gaps(&mut snap, 1.5, 10), 0);

    // re-validating carries the synthetic contract without adding another
    let again = ChainValidator::new().validate(snap);
    assert_eq!(again.result().synthesized_contracts, 1);
    assert_eq!(again.snapshot().interpolated_count(), 1);
}

#[test]
fn crossed_chain_is_rejected() {
    let mut snap = calls_chain(&[90.0, 95.0, 100.0, 105.0, 110.0], 30, 0.25);
    for c in snap.calls.iter_mut() {
        c.bid = c.ask;
    }

    let chain = ChainValidator::new().validate(snap);
    let result = chain.result();

    assert!(!result.is_valid);
    assert_eq!(result.quality_score, 0.0);
    assert_eq!(result.count_of(IssueKind::CrossedQuote), 5);
    assert!(matches!(chain.require_valid(), Err(AnalyticsError::DataQuality(_))));
    assert!(LiquidityAnalyzer::new().analyze_chain(&chain).is_err());
}

#[test]
fn pipeline_report_over_multiple_symbols() {
    let mut good = OptionChainSnapshot::new("XYZ", 100.0, ts());
    for days in [30, 60, 90] {
        for k in [90.0, 95.0, 100.0, 105.0, 110.0] {
            good.push(call(k, days, 0.20 + days as f64 / 1000.0)).unwrap();
        }
    }
    let mut bad = calls_chain(&[90.0, 95.0, 100.0], 30, 0.25);
    bad.underlying = "BAD".to_string();
    for c in bad.calls.iter_mut() {
        c.underlying = "BAD".to_string();
        c.ask = 0.0;
    }

    let results = AnalyticsPipeline::default().process_batch(vec![good, bad]);

    let surface = results[0].surface().unwrap();
    let term = surface.calculate_term_structure().unwrap();
    assert!(term.term_premium > 0.0);
    assert_relative_eq!(surface.get_atm_volatility(60.0).unwrap(), 0.26, epsilon = 1e-12);

    assert!(matches!(results[1].outcome, AnalysisOutcome::Rejected { .. }));
}
