//! Aggregate configuration
//!
//! Every knob the analytics stages use, loadable from TOML. Missing
//! sections and fields fall back to defaults:
//!
//! ```toml
//! cache_ttl_minutes = 15
//!
//! [validation]
//! max_spread_ratio = 0.4
//! gap_multiplier = 1.5
//!
//! [surface]
//! min_expirations = 2
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{AnalyticsError, AnalyticsResult};
use crate::liquidity::LiquidityConfig;
use crate::surface::SurfaceConfig;
use crate::validation::ValidationConfig;

/// One year
pub const MAX_CACHE_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Lifetime of cached surfaces
    /// Default: 15
    pub cache_ttl_minutes: i64,
    pub validation: ValidationConfig,
    pub liquidity: LiquidityConfig,
    pub surface: SurfaceConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 15,
            validation: ValidationConfig::default(),
            liquidity: LiquidityConfig::default(),
            surface: SurfaceConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    pub fn from_toml_str(text: &str) -> AnalyticsResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| AnalyticsError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> AnalyticsResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        tracing::info!("Loaded analytics config from {:?}", path);
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> AnalyticsResult<String> {
        toml::to_string_pretty(self).map_err(|e| AnalyticsError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        self.validation.validate()?;
        self.liquidity.validate()?;
        self.surface.validate()?;
        if !(0..=MAX_CACHE_TTL_MINUTES).contains(&self.cache_ttl_minutes) {
            return Err(AnalyticsError::config(format!(
                "cache_ttl_minutes must be in [0, {}], got {}",
                MAX_CACHE_TTL_MINUTES, self.cache_ttl_minutes
            )));
        }
        Ok(())
    }

    /// Cached surface lifetime, clamped to `[0, MAX_CACHE_TTL_MINUTES]` for
    /// configs built without `validate()`
    pub fn cache_ttl(&self) -> chrono::Duration {
        let minutes = self.cache_ttl_minutes.clamp(0, MAX_CACHE_TTL_MINUTES);
        chrono::Duration::try_minutes(minutes).unwrap_or_else(chrono::Duration::zero)
    }
}
