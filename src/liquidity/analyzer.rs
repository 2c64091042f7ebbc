//! LiquidityAnalyzer - spread, activity and cost scoring

use std::cmp::Ordering;

use tracing::debug;

use crate::core::{AnalyticsResult, OptionContract};
use crate::validation::ValidatedChain;

use super::{ContractLiquidity, LiquidityConfig, LiquidityMetrics};

/// Computes [`LiquidityMetrics`] from quotes
#[derive(Debug, Clone, Default)]
pub struct LiquidityAnalyzer {
    config: LiquidityConfig,
}

impl LiquidityAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LiquidityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LiquidityConfig {
        &self.config
    }

    /// Score a raw quote. Never fails and never yields NaN.
    pub fn analyze(&self, bid: f64, ask: f64, volume: u64, open_interest: u64) -> LiquidityMetrics {
        let quote_ok = bid.is_finite() && ask.is_finite() && bid > 0.0 && ask > bid;
        let refs_ok =
            self.config.volume_reference > 0.0 && self.config.open_interest_reference > 0.0;
        if !quote_ok || !refs_ok {
            return LiquidityMetrics::illiquid();
        }

        let mid = (bid + ask) / 2.0;
        let spread_percentage = (ask - bid) / mid;

        let volume_ratio = volume as f64 / self.config.volume_reference;
        let volume_score = volume_ratio.min(1.0);
        let open_interest_score =
            (open_interest as f64 / self.config.open_interest_reference).min(1.0);

        let liquidity_score = (self.config.volume_weight * volume_score
            + self.config.open_interest_weight * open_interest_score)
            .clamp(0.0, 1.0);

        let market_impact_estimate = spread_percentage / (1.0 + volume_ratio);
        let effective_spread = spread_percentage + 2.0 * self.config.commission_per_contract / mid;

        LiquidityMetrics {
            spread_percentage,
            liquidity_score,
            volume_score,
            open_interest_score,
            market_impact_estimate,
            effective_spread,
            degenerate: false,
        }
    }

    /// Score a contract from its quote fields (absent activity counts as 0)
    pub fn analyze_contract(&self, contract: &OptionContract) -> LiquidityMetrics {
        self.analyze(
            contract.bid,
            contract.ask,
            contract.volume(),
            contract.open_interest(),
        )
    }

    /// Score every contract of a validated chain, most liquid first.
    ///
    /// Fails with `DataQuality` if the chain did not pass validation.
    pub fn analyze_chain(&self, chain: &ValidatedChain) -> AnalyticsResult<Vec<ContractLiquidity>> {
        let snapshot = chain.require_valid()?;

        let mut ranked: Vec<ContractLiquidity> = snapshot
            .contracts()
            .map(|c| ContractLiquidity {
                contract: c.clone(),
                metrics: self.analyze_contract(c),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.metrics
                .liquidity_score
                .partial_cmp(&a.metrics.liquidity_score)
                .unwrap_or(Ordering::Equal)
                .then(
                    a.metrics
                        .spread_percentage
                        .partial_cmp(&b.metrics.spread_percentage)
                        .unwrap_or(Ordering::Equal),
                )
        });

        debug!(
            "Scored {} contracts for {}",
            ranked.len(),
            snapshot.underlying
        );

        Ok(ranked)
    }
}
