//! Option chain snapshots
//!
//! A snapshot is every quoted contract for one underlying at one fetch time,
//! split into calls and puts.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::{AnalyticsError, AnalyticsResult};
use super::option::{OptionContract, OptionKind};

fn default_rate() -> f64 {
    0.05
}

/// Identity of a snapshot: symbol plus fetch timestamp
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
}

impl SnapshotKey {
    pub fn new(symbol: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.timestamp.to_rfc3339())
    }
}

/// Point-in-time option chain for one underlying
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChainSnapshot {
    /// Underlying symbol
    pub underlying: String,
    /// Underlying spot price
    pub spot: f64,
    /// Call contracts, strike-sorted
    #[serde(default)]
    pub calls: Vec<OptionContract>,
    /// Put contracts, strike-sorted
    #[serde(default)]
    pub puts: Vec<OptionContract>,
    /// Fetch timestamp
    pub fetched_at: DateTime<Utc>,
    /// Risk-free rate (continuous, decimal)
    #[serde(default = "default_rate")]
    pub risk_free_rate: f64,
    /// Dividend yield (continuous, decimal)
    #[serde(default)]
    pub dividend_yield: f64,
}

fn strike_order(a: &OptionContract, b: &OptionContract) -> Ordering {
    a.strike
        .partial_cmp(&b.strike)
        .unwrap_or(Ordering::Equal)
        .then(a.expiration.cmp(&b.expiration))
}

impl OptionChainSnapshot {
    pub fn new(underlying: impl Into<String>, spot: f64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            underlying: underlying.into(),
            spot,
            calls: Vec::new(),
            puts: Vec::new(),
            fetched_at,
            risk_free_rate: default_rate(),
            dividend_yield: 0.0,
        }
    }

    pub fn with_rates(mut self, risk_free_rate: f64, dividend_yield: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self.dividend_yield = dividend_yield;
        self
    }

    /// Add a contract to the side matching its kind.
    ///
    /// Fails if the contract belongs to a different underlying.
    pub fn push(&mut self, contract: OptionContract) -> AnalyticsResult<()> {
        if contract.underlying != self.underlying {
            return Err(AnalyticsError::invalid_input(format!(
                "contract {} does not belong to chain {}",
                contract.label(),
                self.underlying
            )));
        }

        let side = match contract.kind {
            OptionKind::Call => &mut self.calls,
            OptionKind::Put => &mut self.puts,
        };
        let pos = side
            .binary_search_by(|c| strike_order(c, &contract))
            .unwrap_or_else(|p| p);
        side.insert(pos, contract);
        Ok(())
    }

    /// Re-establish strike ordering (after deserializing unsorted data)
    pub fn sort(&mut self) {
        self.calls.sort_by(strike_order);
        self.puts.sort_by(strike_order);
    }

    /// Check that every contract belongs to this underlying
    pub fn check_underlying(&self) -> AnalyticsResult<()> {
        match self.contracts().find(|c| c.underlying != self.underlying) {
            Some(c) => Err(AnalyticsError::invalid_input(format!(
                "contract {} does not belong to chain {}",
                c.label(),
                self.underlying
            ))),
            None => Ok(()),
        }
    }

    /// Calls followed by puts
    pub fn contracts(&self) -> impl Iterator<Item = &OptionContract> {
        self.calls.iter().chain(self.puts.iter())
    }

    pub fn side(&self, kind: OptionKind) -> &[OptionContract] {
        match kind {
            OptionKind::Call => &self.calls,
            OptionKind::Put => &self.puts,
        }
    }

    /// Contracts of one kind and expiration, strike-sorted
    pub fn contracts_for(&self, kind: OptionKind, expiration: NaiveDate) -> Vec<&OptionContract> {
        self.side(kind)
            .iter()
            .filter(|c| c.expiration == expiration)
            .collect()
    }

    /// Distinct expirations, ascending
    pub fn expirations(&self) -> Vec<NaiveDate> {
        let mut expiries: Vec<NaiveDate> = self.contracts().map(|c| c.expiration).collect();
        expiries.sort();
        expiries.dedup();
        expiries
    }

    /// Distinct strikes across calls and puts, ascending
    pub fn strikes(&self) -> Vec<f64> {
        let mut strikes: Vec<f64> = self.contracts().map(|c| c.strike).collect();
        strikes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        strikes.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        strikes
    }

    pub fn call_at(&self, strike: f64, expiration: NaiveDate) -> Option<&OptionContract> {
        self.calls
            .iter()
            .find(|c| c.expiration == expiration && (c.strike - strike).abs() < 1e-6)
    }

    pub fn put_at(&self, strike: f64, expiration: NaiveDate) -> Option<&OptionContract> {
        self.puts
            .iter()
            .find(|c| c.expiration == expiration && (c.strike - strike).abs() < 1e-6)
    }

    /// Days from the fetch date to an expiration
    pub fn days_to(&self, expiration: NaiveDate) -> i64 {
        (expiration - self.fetched_at.date_naive()).num_days()
    }

    pub fn total_contracts(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    /// Number of gap-filled contracts
    pub fn interpolated_count(&self) -> usize {
        self.contracts().filter(|c| c.interpolated).count()
    }

    pub fn is_empty(&self) -> bool {
        self.total_contracts() == 0
    }

    pub fn key(&self) -> SnapshotKey {
        SnapshotKey::new(self.underlying.clone(), self.fetched_at)
    }

    /// Forward price for a time in years
    pub fn forward(&self, time: f64) -> f64 {
        self.spot * ((self.risk_free_rate - self.dividend_yield) * time).exp()
    }
}
