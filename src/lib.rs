//! # Premium Analytics - Options Analytics Core
//!
//! Analytics for an options-selling workflow (covered calls, cash-secured
//! puts): Black-Scholes Greeks, option chain validation and gap filling,
//! liquidity and spread scoring, and implied volatility surfaces.
//!
//! ## Overview
//!
//! A raw [`OptionChainSnapshot`](core::OptionChainSnapshot) goes through:
//! - **Validation**: per-contract rules, Greek cross-check, put-call parity,
//!   strike gap filling, quality score and confidence
//! - **Liquidity**: spread, activity and cost metrics per contract
//! - **Surface**: strike × days-to-expiration IV grid with bilinear queries,
//!   skew and term structure
//!
//! Only chains that pass validation reach the later stages.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use premium_analytics::prelude::*;
//!
//! let snapshot = read_snapshot(std::path::Path::new("spy.json")).unwrap();
//!
//! let analysis = AnalyticsPipeline::default().process(snapshot);
//! if let Some(surface) = analysis.surface() {
//!     println!("30d ATM vol: {:?}", surface.get_atm_volatility(30.0));
//! }
//! ```
//!
//! ## What This Crate Does NOT Do
//!
//! - Fetch chains from brokers or market data vendors
//! - Decide what to trade (filter thresholds, strategy scoring)
//! - Render reports or send alerts

pub mod config;
pub mod core;
pub mod data;
pub mod liquidity;
pub mod models;
pub mod pipeline;
pub mod surface;
pub mod validation;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        AnalyticsError, AnalyticsResult, Greeks, OptionChainSnapshot, OptionContract, OptionKind,
        SnapshotKey,
    };

    // Pricing
    pub use crate::models::black_scholes::{
        greeks as bs_greeks, implied_volatility, norm_cdf, norm_pdf, price as bs_price,
    };

    // Validation
    pub use crate::validation::{
        ChainValidator, IssueKind, Severity, ValidatedChain, ValidationConfig, ValidationIssue,
        ValidationResult,
    };

    // Liquidity
    pub use crate::liquidity::{
        ContractLiquidity, LiquidityAnalyzer, LiquidityConfig, LiquidityMetrics,
    };

    // Surface
    pub use crate::surface::{
        SkewMetrics, SurfaceBuilder, SurfaceConfig, TermStructure, VolatilitySurface,
    };

    // Caching and storage
    pub use crate::data::{
        read_snapshot, MemorySurfaceCache, SnapshotStore, StoreConfig, SurfaceCache,
    };

    // Pipeline
    pub use crate::config::AnalyticsConfig;
    pub use crate::pipeline::{AnalysisOutcome, AnalyticsPipeline, SurfaceStatus, SymbolAnalysis};
}

// Re-export main types at crate root
pub use crate::config::AnalyticsConfig;
pub use crate::core::{AnalyticsError, AnalyticsResult};
pub use crate::pipeline::AnalyticsPipeline;
