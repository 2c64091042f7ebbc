//! Put-call parity cross-check
//!
//! For a European call and put sharing strike and expiry:
//! C - P = e^(-rT)·(F - K), with F = S·e^((r-q)T)
//!
//! Listed equity options are American, so this is only an approximate
//! check; deviations beyond the band become warnings.

use crate::core::{OptionChainSnapshot, OptionContract};

use super::{IssueKind, ValidationIssue};

/// Deviation of observed mids from European parity at one strike, using
/// the snapshot's spot and rates
pub fn parity_deviation(
    snapshot: &OptionChainSnapshot,
    call: &OptionContract,
    put: &OptionContract,
) -> f64 {
    let time = call.time_to_expiry().max(0.0);
    let discount = (-snapshot.risk_free_rate * time).exp();
    let theoretical = discount * (snapshot.forward(time) - call.strike);
    let observed = call.mid() - put.mid();
    (observed - theoretical).abs()
}

/// Warnings for every shared strike whose parity deviation exceeds
/// `tolerance * spot`. Synthesized contracts are skipped.
pub fn check_put_call_parity(
    snapshot: &OptionChainSnapshot,
    tolerance: f64,
) -> Vec<ValidationIssue> {
    let band = tolerance * snapshot.spot;

    snapshot
        .calls
        .iter()
        .filter(|c| !c.interpolated)
        .filter_map(|call| {
            let put = snapshot
                .put_at(call.strike, call.expiration)
                .filter(|p| !p.interpolated)?;
            let deviation = parity_deviation(snapshot, call, put);

            (deviation > band).then(|| {
                ValidationIssue::warning(
                    Some(call.label()),
                    IssueKind::ParityViolation,
                    format!(
                        "parity deviation {:.4} exceeds band {:.4} at strike {}",
                        deviation, band, call.strike
                    ),
                )
            })
        })
        .collect()
}
