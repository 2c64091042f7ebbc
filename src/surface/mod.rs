//! Implied Volatility Surface
//!
//! Builds a strike × days-to-expiration grid of implied volatility from a
//! validated chain and answers point, ATM, skew and term-structure queries.
//! Surfaces are immutable and rebuilt per snapshot.

mod builder;
mod config;
mod vol_surface;

pub use builder::*;
pub use config::*;
pub use vol_surface::*;

use serde::{Deserialize, Serialize};

/// Wing vols relative to ATM at one expiry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkewMetrics {
    /// Mean OTM call vol / ATM vol
    pub call_skew_ratio: f64,
    /// Mean OTM put vol / ATM vol
    pub put_skew_ratio: f64,
    /// call_skew_ratio - put_skew_ratio
    pub net_skew: f64,
}

/// ATM vol across expiries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermStructure {
    pub short_term_avg: f64,
    pub long_term_avg: f64,
    /// long_term_avg - short_term_avg
    pub term_premium: f64,
    /// Std dev of consecutive ATM vol changes
    pub vol_of_vol: f64,
    /// Term premium per day of tenor between the buckets
    pub slope: f64,
}
