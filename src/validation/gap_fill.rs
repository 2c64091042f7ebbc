//! Strike gap detection and filling
//!
//! Within one (expiration, kind) slice, a gap is a strike interval wider than
//! `multiplier` times the median interval of the observed strikes. Gaps are
//! filled with evenly spaced synthetic contracts whose numeric fields are
//! linearly interpolated between the two bounding contracts.

use std::cmp::Ordering;

use tracing::debug;

use crate::core::{OptionChainSnapshot, OptionContract, OptionKind};

/// Median spacing between consecutive strikes (None with fewer than 2 distinct strikes)
pub fn median_strike_interval(strikes: &[f64]) -> Option<f64> {
    let mut diffs: Vec<f64> = strikes
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .filter(|&d| d > 1e-10)
        .collect();

    if diffs.is_empty() {
        return None;
    }

    diffs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = diffs.len() / 2;
    if diffs.len() % 2 == 0 {
        Some((diffs[mid - 1] + diffs[mid]) / 2.0)
    } else {
        Some(diffs[mid])
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

fn lerp_opt(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b, t)),
        _ => None,
    }
}

fn lerp_count(a: Option<u64>, b: Option<u64>, t: f64) -> Option<u64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a as f64, b as f64, t).round().max(0.0) as u64),
        _ => None,
    }
}

/// Build a synthetic contract a fraction `t` of the way from `lo` to `hi`
pub fn interpolate_contract(lo: &OptionContract, hi: &OptionContract, t: f64) -> OptionContract {
    let strike = (lerp(lo.strike, hi.strike, t) * 100.0).round() / 100.0;

    OptionContract {
        underlying: lo.underlying.clone(),
        expiration: lo.expiration,
        strike,
        kind: lo.kind,
        bid: lerp(lo.bid, hi.bid, t),
        ask: lerp(lo.ask, hi.ask, t),
        last: lerp_opt(lo.last, hi.last, t),
        volume: lerp_count(lo.volume, hi.volume, t),
        open_interest: lerp_count(lo.open_interest, hi.open_interest, t),
        implied_volatility: lerp_opt(lo.implied_volatility, hi.implied_volatility, t),
        greeks: match (lo.greeks, hi.greeks) {
            (Some(a), Some(b)) => Some(a.lerp(&b, t)),
            _ => None,
        },
        underlying_price: lerp(lo.underlying_price, hi.underlying_price, t),
        quote_time: lo.quote_time.max(hi.quote_time),
        interpolated: true,
    }
}

/// Synthetic contracts for one strike-sorted slice of a single kind and expiration
pub fn fill_slice(
    slice: &[&OptionContract],
    multiplier: f64,
    max_per_gap: usize,
) -> Vec<OptionContract> {
    let observed: Vec<f64> = slice
        .iter()
        .filter(|c| !c.interpolated)
        .map(|c| c.strike)
        .collect();

    let median = match median_strike_interval(&observed) {
        Some(m) => m,
        None => return Vec::new(),
    };

    let mut synthesized = Vec::new();

    for pair in slice.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        let gap = hi.strike - lo.strike;

        if gap <= multiplier * median {
            continue;
        }

        let count = ((gap / median).round() as usize).saturating_sub(1);
        if count > max_per_gap {
            debug!(
                "Gap {:.2}-{:.2} in {} {} needs {} strikes, above limit {}; left open",
                lo.strike,
                hi.strike,
                lo.expiration,
                lo.kind.label(),
                count,
                max_per_gap
            );
            continue;
        }

        for i in 1..=count {
            let t = i as f64 / (count + 1) as f64;
            synthesized.push(interpolate_contract(lo, hi, t));
        }

        debug!(
            "Gap {:.2}-{:.2} in {} {} (median {:.2}): {} synthesized",
            lo.strike,
            hi.strike,
            lo.expiration,
            lo.kind.label(),
            median,
            count
        );
    }

    synthesized
}

/// Fill strike gaps across every (expiration, kind) slice of a snapshot.
///
/// Returns the number of synthesized contracts. Running it again on the
/// result adds nothing, because filled intervals never exceed the
/// threshold and the median is taken over observed strikes only.
pub fn fill_gaps(snapshot: &mut OptionChainSnapshot, multiplier: f64, max_per_gap: usize) -> usize {
    let mut added = Vec::new();

    for expiration in snapshot.expirations() {
        for kind in [OptionKind::Call, OptionKind::Put] {
            let slice = snapshot.contracts_for(kind, expiration);
            added.extend(fill_slice(&slice, multiplier, max_per_gap));
        }
    }

    let count = added.len();
    for contract in added {
        match contract.kind {
            OptionKind::Call => snapshot.calls.push(contract),
            OptionKind::Put => snapshot.puts.push(contract),
        }
    }
    if count > 0 {
        snapshot.sort();
    }

    count
}
