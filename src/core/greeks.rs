//! Option Greeks
//!
//! First order sensitivities (plus gamma) in the units a trader quotes them:
//! theta per calendar day, vega and rho per percentage point.

use serde::{Deserialize, Serialize};

use super::option::OptionKind;

/// Option Greeks (sensitivities)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: dV/dS (sensitivity to spot)
    pub delta: f64,
    /// Gamma: d²V/dS² (sensitivity of delta to spot)
    pub gamma: f64,
    /// Theta: dV/dt per calendar day
    pub theta: f64,
    /// Vega: dV/dσ per 1 vol point
    pub vega: f64,
    /// Rho: dV/dr per 1 rate point
    pub rho: f64,
}

impl Greeks {
    pub fn new(delta: f64, gamma: f64, theta: f64, vega: f64, rho: f64) -> Self {
        Self {
            delta,
            gamma,
            theta,
            vega,
            rho,
        }
    }

    /// Greeks of an expired or zero-vol contract
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_finite(&self) -> bool {
        self.delta.is_finite()
            && self.gamma.is_finite()
            && self.theta.is_finite()
            && self.vega.is_finite()
            && self.rho.is_finite()
    }

    /// Theoretical bounds: delta in [0,1] for calls, [-1,0] for puts, gamma >= 0
    pub fn within_bounds(&self, kind: OptionKind) -> bool {
        if !self.is_finite() || self.gamma < 0.0 {
            return false;
        }
        match kind {
            OptionKind::Call => (0.0..=1.0).contains(&self.delta),
            OptionKind::Put => (-1.0..=0.0).contains(&self.delta),
        }
    }

    /// Linear interpolation towards `other` (t = 0 gives self, t = 1 gives other)
    pub fn lerp(&self, other: &Greeks, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + t * (b - a);
        Self {
            delta: mix(self.delta, other.delta),
            gamma: mix(self.gamma, other.gamma),
            theta: mix(self.theta, other.theta),
            vega: mix(self.vega, other.vega),
            rho: mix(self.rho, other.rho),
        }
    }
}
