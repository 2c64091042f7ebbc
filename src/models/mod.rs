//! Pricing models
//!
//! Implements:
//! - Black-Scholes (pricing, Greeks, IV computation)

pub mod black_scholes;

pub use black_scholes::*;
