//! Option Chain Validation
//!
//! Turns a raw snapshot into one downstream stages may trust:
//!
//! 1. **Per-contract rules**: crossed quotes, extreme spreads, IV and Greek
//!    bounds, expiry. Rejected contracts are dropped.
//! 2. **Resolution**: missing IV is solved from the mid, missing Greeks are
//!    computed, quoted Greeks are cross-checked against the model.
//! 3. **Put-call parity**: violations are warnings only.
//! 4. **Gap filling**: strike gaps are filled with interpolated contracts
//!    flagged `interpolated = true`.
//!
//! The outcome is a [`ValidatedChain`]. Surface construction and liquidity
//! ranking only accept chains whose [`ValidationResult`] is valid.

mod config;
mod gap_fill;
mod parity;
mod validator;

pub use config::*;
pub use gap_fill::*;
pub use parity::*;
pub use validator::*;

use serde::{Deserialize, Serialize};

use crate::core::{AnalyticsError, AnalyticsResult, OptionChainSnapshot};

/// What went wrong with a contract or chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// Strike is not a positive number
    InvalidStrike,
    /// Contract belongs to another underlying
    ForeignUnderlying,
    /// Days to expiration <= 0
    Expired,
    /// ask <= bid or a side <= 0
    CrossedQuote,
    /// Spread / mid above the configured ratio
    ExtremeSpread,
    /// IV outside the configured bounds
    IvOutOfRange,
    /// IV missing and could not be solved from the quote
    IvUnresolved,
    /// Greeks outside theoretical bounds
    GreeksOutOfBounds,
    /// Quoted Greeks disagree with the model and were replaced
    GreeksMismatch,
    /// Put-call parity violated at a shared strike
    ParityViolation,
    /// No usable contracts at all
    EmptyChain,
}

impl IssueKind {
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::InvalidStrike => "INVALID_STRIKE",
            IssueKind::ForeignUnderlying => "FOREIGN_UNDERLYING",
            IssueKind::Expired => "EXPIRED",
            IssueKind::CrossedQuote => "CROSSED_QUOTE",
            IssueKind::ExtremeSpread => "EXTREME_SPREAD",
            IssueKind::IvOutOfRange => "IV_OUT_OF_RANGE",
            IssueKind::IvUnresolved => "IV_UNRESOLVED",
            IssueKind::GreeksOutOfBounds => "GREEKS_OUT_OF_BOUNDS",
            IssueKind::GreeksMismatch => "GREEKS_MISMATCH",
            IssueKind::ParityViolation => "PARITY_VIOLATION",
            IssueKind::EmptyChain => "EMPTY_CHAIN",
        }
    }
}

/// Rejections drop a contract; warnings keep it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Rejection,
}

/// A single data-quality finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Contract label, None for chain-level issues
    pub contract: Option<String>,
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    pub fn rejection(
        contract: Option<String>,
        kind: IssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            contract,
            kind,
            severity: Severity::Rejection,
            message: message.into(),
        }
    }

    pub fn warning(contract: Option<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            contract,
            kind,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Summary of a validation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Chain may be used for surfaces and liquidity ranking
    pub is_valid: bool,
    /// Mean per-contract field validity over observed contracts, in [0, 1]
    pub quality_score: f64,
    /// All findings, rejections first
    pub issues: Vec<ValidationIssue>,
    /// At least one contract was synthesized
    pub gap_fill_applied: bool,
    /// Quality score discounted by the synthesized fraction, in [0, 1]
    pub confidence_level: f64,
    /// Observed contracts in the raw chain
    pub total_contracts: usize,
    pub accepted_contracts: usize,
    pub rejected_contracts: usize,
    pub synthesized_contracts: usize,
}

impl ValidationResult {
    pub fn rejections(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Rejection)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

/// A snapshot that has been through the validator, with its verdict.
///
/// Only [`ChainValidator`] constructs these.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedChain {
    snapshot: OptionChainSnapshot,
    result: ValidationResult,
}

impl ValidatedChain {
    pub(crate) fn new(snapshot: OptionChainSnapshot, result: ValidationResult) -> Self {
        Self { snapshot, result }
    }

    pub fn snapshot(&self) -> &OptionChainSnapshot {
        &self.snapshot
    }

    pub fn result(&self) -> &ValidationResult {
        &self.result
    }

    pub fn is_valid(&self) -> bool {
        self.result.is_valid
    }

    /// The validated snapshot, or a `DataQuality` error if the chain failed
    /// validation. Downstream stages go through this gate.
    pub fn require_valid(&self) -> AnalyticsResult<&OptionChainSnapshot> {
        if self.result.is_valid {
            Ok(&self.snapshot)
        } else {
            Err(AnalyticsError::data_quality(format!(
                "chain {} failed validation (quality {:.2}, {} issues)",
                self.snapshot.underlying,
                self.result.quality_score,
                self.result.issues.len()
            )))
        }
    }

    pub fn into_parts(self) -> (OptionChainSnapshot, ValidationResult) {
        (self.snapshot, self.result)
    }
}
