//! Configuration for liquidity scoring

use serde::{Deserialize, Serialize};

use crate::core::{AnalyticsError, AnalyticsResult};

/// Reference levels, weights and cost model for liquidity scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityConfig {
    /// Volume at which the volume sub-score saturates
    /// Default: 1000
    pub volume_reference: f64,

    /// Open interest at which the open-interest sub-score saturates
    /// Default: 5000
    pub open_interest_reference: f64,

    /// Weight of the volume sub-score
    /// Default: 0.4
    pub volume_weight: f64,

    /// Weight of the open-interest sub-score
    /// Default: 0.6
    pub open_interest_weight: f64,

    /// Commission per contract, in option price units
    /// Default: 0.65
    pub commission_per_contract: f64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            volume_reference: 1000.0,
            open_interest_reference: 5000.0,
            volume_weight: 0.4,
            open_interest_weight: 0.6,
            commission_per_contract: 0.65,
        }
    }
}

impl LiquidityConfig {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if !(self.volume_reference > 0.0) || !(self.open_interest_reference > 0.0) {
            return Err(AnalyticsError::config("liquidity reference levels must be positive"));
        }
        if !(self.volume_weight >= 0.0) || !(self.open_interest_weight >= 0.0) {
            return Err(AnalyticsError::config("liquidity weights must be non-negative"));
        }
        if ((self.volume_weight + self.open_interest_weight) - 1.0).abs() > 1e-9 {
            return Err(AnalyticsError::config("liquidity weights must sum to 1"));
        }
        if !(self.commission_per_contract >= 0.0) || !self.commission_per_contract.is_finite() {
            return Err(AnalyticsError::config("commission_per_contract must be non-negative"));
        }
        Ok(())
    }
}
