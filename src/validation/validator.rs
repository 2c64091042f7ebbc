//! ChainValidator - per-contract rules, resolution and gap filling

use tracing::{debug, info, warn};

use crate::core::{OptionChainSnapshot, OptionContract, OptionKind};
use crate::models::black_scholes;

use super::{
    check_put_call_parity, fill_gaps, IssueKind, ValidatedChain, ValidationConfig,
    ValidationIssue, ValidationResult,
};

/// Per-contract field indicators feeding the quality score
const FIELD_COUNT: f64 = 7.0;

/// Outcome of checking a single contract
#[derive(Debug)]
enum ContractVerdict {
    Accepted {
        score: f64,
        warning: Option<ValidationIssue>,
    },
    Rejected(ValidationIssue),
}

/// Validates raw option chains
#[derive(Debug, Clone, Default)]
pub struct ChainValidator {
    config: ValidationConfig,
}

impl ChainValidator {
    /// Create a validator with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a raw snapshot.
    ///
    /// Rejected contracts are removed, accepted ones have IV, Greeks,
    /// volume and open interest resolved, and strike gaps are filled when
    /// enabled. Contracts already flagged `interpolated` are re-checked but
    /// do not count towards the quality score.
    pub fn validate(&self, raw: OptionChainSnapshot) -> ValidatedChain {
        let OptionChainSnapshot {
            underlying,
            spot,
            calls,
            puts,
            fetched_at,
            risk_free_rate,
            dividend_yield,
        } = raw;

        let mut validated = OptionChainSnapshot::new(underlying, spot, fetched_at)
            .with_rates(risk_free_rate, dividend_yield);

        let mut rejections = Vec::new();
        let mut warnings = Vec::new();
        let mut observed = 0usize;
        let mut accepted = 0usize;
        let mut carried_synthetic = 0usize;
        let mut score_sum = 0.0;

        for mut contract in calls.into_iter().chain(puts) {
            let synthetic = contract.interpolated;
            if !synthetic {
                observed += 1;
            }

            match self.check_contract(&mut contract, &validated) {
                ContractVerdict::Accepted { score, warning } => {
                    if synthetic {
                        carried_synthetic += 1;
                    } else {
                        accepted += 1;
                        score_sum += score;
                    }
                    warnings.extend(warning);
                    match contract.kind {
                        OptionKind::Call => validated.calls.push(contract),
                        OptionKind::Put => validated.puts.push(contract),
                    }
                }
                ContractVerdict::Rejected(issue) => {
                    debug!(
                        "Rejected {}: {}",
                        issue.contract.as_deref().unwrap_or("?"),
                        issue.message
                    );
                    rejections.push(issue);
                }
            }
        }
        validated.sort();

        if self.config.check_parity {
            warnings.extend(check_put_call_parity(&validated, self.config.parity_tolerance));
        }

        let filled = if self.config.fill_gaps && accepted > 0 {
            fill_gaps(
                &mut validated,
                self.config.gap_multiplier,
                self.config.max_fill_per_gap,
            )
        } else {
            0
        };
        let synthesized = filled + carried_synthetic;

        if accepted == 0 {
            rejections.push(ValidationIssue::rejection(
                None,
                IssueKind::EmptyChain,
                format!("no valid contracts among {} observed", observed),
            ));
        }

        let quality_score = if observed > 0 {
            score_sum / observed as f64
        } else {
            0.0
        };

        let kept = accepted + synthesized;
        let confidence_level = if kept > 0 {
            quality_score * (1.0 - synthesized as f64 / kept as f64)
        } else {
            0.0
        };

        let mut issues = rejections;
        issues.extend(warnings);

        let issue_budget = self.config.max_issue_ratio * observed as f64;
        let is_valid = accepted > 0
            && quality_score >= self.config.min_quality_score
            && issues.len() as f64 <= issue_budget;

        let result = ValidationResult {
            is_valid,
            quality_score,
            gap_fill_applied: synthesized > 0,
            confidence_level,
            total_contracts: observed,
            accepted_contracts: accepted,
            rejected_contracts: observed.saturating_sub(accepted),
            synthesized_contracts: synthesized,
            issues,
        };

        if result.is_valid {
            info!(
                "Validated {}: {}/{} accepted, {} synthesized, quality {:.3}, confidence {:.3}",
                validated.underlying,
                accepted,
                observed,
                synthesized,
                quality_score,
                confidence_level
            );
        } else {
            warn!(
                "Chain {} failed validation: {}/{} accepted, quality {:.3}, {} issues",
                validated.underlying,
                accepted,
                observed,
                quality_score,
                result.issues.len()
            );
        }

        ValidatedChain::new(validated, result)
    }

    /// Apply the rejection rules in order, resolving missing fields on the way
    fn check_contract(
        &self,
        contract: &mut OptionContract,
        chain: &OptionChainSnapshot,
    ) -> ContractVerdict {
        let label = contract.label();
        let reject = |kind: IssueKind, message: String| {
            let issue = ValidationIssue::rejection(Some(label.clone()), kind, message);
            ContractVerdict::Rejected(issue)
        };

        if contract.underlying != chain.underlying {
            return reject(
                IssueKind::ForeignUnderlying,
                format!("underlying {} differs from chain", contract.underlying),
            );
        }

        if !(contract.strike > 0.0) || !contract.strike.is_finite() {
            return reject(IssueKind::InvalidStrike, format!("strike {}", contract.strike));
        }

        let dte = contract.days_to_expiration();
        if dte <= 0 {
            return reject(IssueKind::Expired, format!("{} days to expiration", dte));
        }

        if !contract.has_valid_quote() {
            return reject(
                IssueKind::CrossedQuote,
                format!("bid {} / ask {}", contract.bid, contract.ask),
            );
        }

        match contract.spread_ratio() {
            Some(ratio) if ratio <= self.config.max_spread_ratio => {}
            Some(ratio) => {
                return reject(
                    IssueKind::ExtremeSpread,
                    format!(
                        "spread ratio {:.3} above {:.3}",
                        ratio, self.config.max_spread_ratio
                    ),
                )
            }
            None => return reject(IssueKind::CrossedQuote, "non-positive mid".to_string()),
        }

        let spot = if contract.underlying_price > 0.0 && contract.underlying_price.is_finite() {
            contract.underlying_price
        } else {
            chain.spot
        };
        let time = contract.time_to_expiry();
        let (rate, div) = (chain.risk_free_rate, chain.dividend_yield);

        let iv = match contract.implied_volatility {
            Some(iv) => iv,
            None => match black_scholes::implied_volatility(
                contract.mid(),
                spot,
                contract.strike,
                rate,
                div,
                time,
                contract.kind,
            ) {
                Ok(iv) => iv,
                Err(e) => return reject(IssueKind::IvUnresolved, e.to_string()),
            },
        };

        if !iv.is_finite() || iv < self.config.min_iv || iv > self.config.max_iv {
            return reject(
                IssueKind::IvOutOfRange,
                format!(
                    "IV {:.4} outside [{}, {}]",
                    iv, self.config.min_iv, self.config.max_iv
                ),
            );
        }
        contract.implied_volatility = Some(iv);

        let strike = contract.strike;
        let model = match black_scholes::greeks(spot, strike, rate, div, iv, time, contract.kind) {
            Ok(g) => g,
            Err(e) => return reject(IssueKind::GreeksOutOfBounds, e.to_string()),
        };

        let mut warning = None;
        match contract.greeks {
            Some(quoted) if !quoted.within_bounds(contract.kind) => {
                return reject(
                    IssueKind::GreeksOutOfBounds,
                    format!("delta {:.4}, gamma {:.6}", quoted.delta, quoted.gamma),
                );
            }
            Some(quoted) => {
                if self.config.cross_check_greeks
                    && (quoted.delta - model.delta).abs() > self.config.greek_tolerance
                {
                    warning = Some(ValidationIssue::warning(
                        Some(label.clone()),
                        IssueKind::GreeksMismatch,
                        format!(
                            "quoted delta {:.4} vs model {:.4}; replaced",
                            quoted.delta, model.delta
                        ),
                    ));
                    contract.greeks = Some(model);
                }
            }
            None => {
                if !model.within_bounds(contract.kind) {
                    return reject(
                        IssueKind::GreeksOutOfBounds,
                        format!("model delta {:.4}", model.delta),
                    );
                }
                contract.greeks = Some(model);
            }
        }

        let volume_reported = contract.volume.is_some();
        let open_interest_reported = contract.open_interest.is_some();
        contract.volume = Some(contract.volume());
        contract.open_interest = Some(contract.open_interest());

        // quote, spread, iv, greeks and expiry passed; activity fields may be defaulted
        let passed = 5.0 + volume_reported as u8 as f64 + open_interest_reported as u8 as f64;

        ContractVerdict::Accepted {
            score: passed / FIELD_COUNT,
            warning,
        }
    }
}
