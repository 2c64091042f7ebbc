//! Liquidity and Spread Analysis
//!
//! Scores how cheaply a contract can be traded from its quote and activity.
//! Scoring is total: degenerate quotes get the worst possible metrics
//! instead of an error, so screening can still rank them.

mod analyzer;
mod config;

pub use analyzer::*;
pub use config::*;

use serde::{Deserialize, Serialize};

use crate::core::OptionContract;

/// Per-contract liquidity view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityMetrics {
    /// (ask - bid) / mid
    pub spread_percentage: f64,
    /// Weighted volume and open-interest score in [0, 1]
    pub liquidity_score: f64,
    /// min(volume / V_ref, 1)
    pub volume_score: f64,
    /// min(open_interest / OI_ref, 1)
    pub open_interest_score: f64,
    /// spread / (1 + volume / V_ref)
    pub market_impact_estimate: f64,
    /// spread plus round-trip commission relative to mid
    pub effective_spread: f64,
    /// Quote was crossed, non-positive or non-finite
    pub degenerate: bool,
}

impl LiquidityMetrics {
    /// Metrics for a quote that cannot be traded
    pub fn illiquid() -> Self {
        Self {
            spread_percentage: 1.0,
            liquidity_score: 0.0,
            volume_score: 0.0,
            open_interest_score: 0.0,
            market_impact_estimate: 1.0,
            effective_spread: 1.0,
            degenerate: true,
        }
    }

    pub fn is_liquid(&self, threshold: f64) -> bool {
        self.liquidity_score >= threshold
    }
}

/// Liquidity metrics attached to the contract they describe
#[derive(Debug, Clone, Serialize)]
pub struct ContractLiquidity {
    pub contract: OptionContract,
    pub metrics: LiquidityMetrics,
}
