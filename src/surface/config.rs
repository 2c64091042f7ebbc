//! Configuration for surface construction

use serde::{Deserialize, Serialize};

use crate::core::{AnalyticsError, AnalyticsResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// IV observations an expiration needs to enter the grid
    /// Default: 5
    pub min_strikes: usize,

    /// Usable expirations required to build a surface
    /// Default: 3
    pub min_expirations: usize,

    /// Use gap-filled contracts as grid inputs
    /// Default: true
    pub include_interpolated: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            min_strikes: 5,
            min_expirations: 3,
            include_interpolated: true,
        }
    }
}

impl SurfaceConfig {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.min_strikes < 2 {
            return Err(AnalyticsError::config("min_strikes must be at least 2"));
        }
        if self.min_expirations < 1 {
            return Err(AnalyticsError::config("min_expirations must be at least 1"));
        }
        Ok(())
    }
}
