//! Caching and storage
//!
//! Handles:
//! - Surface caching keyed by (symbol, snapshot timestamp)
//! - Local JSON storage of chain snapshots

pub mod cache;
pub mod store;

pub use cache::*;
pub use store::*;
