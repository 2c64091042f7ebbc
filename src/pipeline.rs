//! Analytics pipeline
//!
//! Per symbol: validate → liquidity → surface, strictly in that order.
//! Symbols are independent, so a batch fans out across the rayon pool.
//! The only state shared between symbols is the optional surface cache.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AnalyticsConfig;
use crate::core::{AnalyticsResult, OptionChainSnapshot};
use crate::data::SurfaceCache;
use crate::liquidity::{ContractLiquidity, LiquidityAnalyzer};
use crate::surface::{SurfaceBuilder, VolatilitySurface};
use crate::validation::{ChainValidator, ValidatedChain, ValidationResult};

/// Result of running one snapshot through the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct SymbolAnalysis {
    pub symbol: String,
    pub snapshot_time: DateTime<Utc>,
    pub validation: ValidationResult,
    pub outcome: AnalysisOutcome,
}

impl SymbolAnalysis {
    pub fn is_analyzed(&self) -> bool {
        matches!(self.outcome, AnalysisOutcome::Analyzed { .. })
    }

    pub fn surface(&self) -> Option<&Arc<VolatilitySurface>> {
        match &self.outcome {
            AnalysisOutcome::Analyzed {
                surface: SurfaceStatus::Built { surface, .. },
                ..
            } => Some(surface),
            _ => None,
        }
    }

    pub fn liquidity(&self) -> &[ContractLiquidity] {
        match &self.outcome {
            AnalysisOutcome::Analyzed { liquidity, .. } => liquidity,
            AnalysisOutcome::Rejected { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Chain failed validation; nothing downstream ran
    Rejected { reason: String },
    /// Chain passed validation
    Analyzed {
        /// Most liquid first
        liquidity: Vec<ContractLiquidity>,
        surface: SurfaceStatus,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SurfaceStatus {
    Built {
        surface: Arc<VolatilitySurface>,
        /// Served from the surface cache
        cached: bool,
    },
    Unavailable { reason: String },
}

/// Runs snapshots through validation, liquidity scoring and surface
/// construction
pub struct AnalyticsPipeline {
    validator: ChainValidator,
    liquidity: LiquidityAnalyzer,
    surfaces: SurfaceBuilder,
    cache: Option<Arc<dyn SurfaceCache>>,
    cache_ttl: Duration,
}

impl Default for AnalyticsPipeline {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

impl AnalyticsPipeline {
    /// Build stages from a config without checking it
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            validator: ChainValidator::with_config(config.validation.clone()),
            liquidity: LiquidityAnalyzer::with_config(config.liquidity.clone()),
            surfaces: SurfaceBuilder::with_config(config.surface.clone()),
            cache: None,
            cache_ttl: config.cache_ttl(),
        }
    }

    /// Build stages from a config after validating it
    pub fn from_config(config: &AnalyticsConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Attach a surface cache
    pub fn with_cache(mut self, cache: Arc<dyn SurfaceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn validator(&self) -> &ChainValidator {
        &self.validator
    }

    /// Validate one snapshot and, if it passes, score liquidity and build
    /// (or fetch) its surface
    pub fn process(&self, snapshot: OptionChainSnapshot) -> SymbolAnalysis {
        let symbol = snapshot.underlying.clone();
        let snapshot_time = snapshot.fetched_at;

        let chain = self.validator.validate(snapshot);
        let validation = chain.result().clone();

        let outcome = match self.liquidity.analyze_chain(&chain) {
            Err(e) => {
                warn!("Skipping analysis of {}: {}", symbol, e);
                // a surface cached for this key came from content that no longer validates
                if let Some(cache) = &self.cache {
                    cache.invalidate(&chain.snapshot().key());
                }
                AnalysisOutcome::Rejected { reason: e.to_string() }
            }
            Ok(liquidity) => AnalysisOutcome::Analyzed {
                liquidity,
                surface: self.surface_for(&chain),
            },
        };

        SymbolAnalysis {
            symbol,
            snapshot_time,
            validation,
            outcome,
        }
    }

    /// Process independent symbols in parallel, preserving input order
    pub fn process_batch(&self, snapshots: Vec<OptionChainSnapshot>) -> Vec<SymbolAnalysis> {
        let count = snapshots.len();
        let results: Vec<SymbolAnalysis> = snapshots
            .into_par_iter()
            .map(|snapshot| self.process(snapshot))
            .collect();

        let analyzed = results.iter().filter(|r| r.is_analyzed()).count();
        info!("Processed batch of {}: {} analyzed, {} rejected", count, analyzed, count - analyzed);
        results
    }

    fn surface_for(&self, chain: &ValidatedChain) -> SurfaceStatus {
        let key = chain.snapshot().key();

        if let Some(surface) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            return SurfaceStatus::Built {
                surface,
                cached: true,
            };
        }

        match self.surfaces.build(chain) {
            Ok(surface) => {
                let surface = Arc::new(surface);
                if let Some(cache) = &self.cache {
                    cache.put(key, Arc::clone(&surface), self.cache_ttl);
                }
                SurfaceStatus::Built {
                    surface,
                    cached: false,
                }
            }
            Err(e) => SurfaceStatus::Unavailable { reason: e.to_string() },
        }
    }
}
