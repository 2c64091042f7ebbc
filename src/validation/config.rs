//! Configuration for chain validation and gap filling

use serde::{Deserialize, Serialize};

use crate::core::{AnalyticsError, AnalyticsResult};

/// Validation policy knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject contracts whose spread / mid exceeds this ratio
    /// Default: 0.5
    pub max_spread_ratio: f64,

    /// Lowest acceptable implied volatility
    /// Default: 0.001
    pub min_iv: f64,

    /// Highest acceptable implied volatility
    /// Default: 5.0
    pub max_iv: f64,

    /// Compare quoted Greeks with the pricing model
    /// Default: true
    pub cross_check_greeks: bool,

    /// Max |quoted delta - model delta| before the model Greeks replace the quote
    /// Default: 0.10
    pub greek_tolerance: f64,

    /// Record put-call parity violations as warnings
    /// Default: true
    pub check_parity: bool,

    /// Parity deviation band as a fraction of the underlying price
    /// Default: 0.02
    pub parity_tolerance: f64,

    /// Synthesize contracts inside strike gaps
    /// Default: true
    pub fill_gaps: bool,

    /// A strike interval is a gap when it exceeds this multiple of the
    /// median interval
    /// Default: 1.5
    pub gap_multiplier: f64,

    /// Upper bound on synthesized contracts inside a single gap
    /// Default: 10
    pub max_fill_per_gap: usize,

    /// Minimum quality score for a valid chain
    /// Default: 0.8
    pub min_quality_score: f64,

    /// Maximum issues per contract in the raw chain for a valid chain
    /// Default: 0.5
    pub max_issue_ratio: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_spread_ratio: 0.5,
            min_iv: 0.001,
            max_iv: 5.0,
            cross_check_greeks: true,
            greek_tolerance: 0.10,
            check_parity: true,
            parity_tolerance: 0.02,
            fill_gaps: true,
            gap_multiplier: 1.5,
            max_fill_per_gap: 10,
            min_quality_score: 0.8,
            max_issue_ratio: 0.5,
        }
    }
}

impl ValidationConfig {
    /// Strict settings: tighter spreads and parity, higher quality bar
    pub fn strict() -> Self {
        Self {
            max_spread_ratio: 0.25,
            parity_tolerance: 0.01,
            min_quality_score: 0.9,
            max_issue_ratio: 0.2,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if !(self.max_spread_ratio > 0.0) {
            return Err(AnalyticsError::config("max_spread_ratio must be positive"));
        }
        if !(self.min_iv > 0.0 && self.min_iv < self.max_iv) {
            return Err(AnalyticsError::config("IV bounds must satisfy 0 < min_iv < max_iv"));
        }
        if !(self.greek_tolerance >= 0.0) || !(self.parity_tolerance >= 0.0) {
            return Err(AnalyticsError::config("tolerances must be non-negative"));
        }
        if !(self.gap_multiplier > 1.0) {
            return Err(AnalyticsError::config("gap_multiplier must exceed 1.0"));
        }
        if !(0.0..=1.0).contains(&self.min_quality_score) {
            return Err(AnalyticsError::config("min_quality_score must be within [0, 1]"));
        }
        if !(self.max_issue_ratio >= 0.0) {
            return Err(AnalyticsError::config("max_issue_ratio must be non-negative"));
        }
        Ok(())
    }
}
