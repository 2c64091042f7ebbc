//! Core data types for the analytics engine
//!
//! Defines fundamental types:
//! - OptionContract: Strike, expiry, kind plus the observed quote
//! - OptionChainSnapshot: All contracts for one underlying at one instant
//! - Greeks: Model sensitivities
//! - AnalyticsError: Error taxonomy

pub mod chain;
pub mod error;
pub mod greeks;
pub mod option;

pub use chain::*;
pub use error::*;
pub use greeks::*;
pub use option::*;
