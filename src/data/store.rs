//! Local snapshot storage
//!
//! Stores validated or raw chain snapshots as JSON files so analysis can be
//! re-run offline. One file per (symbol, snapshot timestamp).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::core::{AnalyticsError, AnalyticsResult, OptionChainSnapshot};

const STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Storage directory
    pub dir: PathBuf,
    /// Maximum file age before a snapshot is treated as stale (in hours)
    pub max_age_hours: i64,
    /// Whether to use the store
    pub enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data/snapshots"),
            max_age_hours: 24,
            enabled: true,
        }
    }
}

/// JSON snapshot store
pub struct SnapshotStore {
    config: StoreConfig,
}

impl SnapshotStore {
    pub fn new(config: StoreConfig) -> AnalyticsResult<Self> {
        if config.enabled && !config.dir.exists() {
            fs::create_dir_all(&config.dir)?;
        }

        Ok(Self { config })
    }

    fn snapshot_path(&self, symbol: &str, timestamp: DateTime<Utc>) -> PathBuf {
        self.config
            .dir
            .join(format!("{}_{}.json", symbol, timestamp.format(STAMP_FORMAT)))
    }

    /// Split `SYMBOL_STAMP.json` into its parts
    fn parse_file_name(name: &str) -> Option<(String, DateTime<Utc>)> {
        let stem = name.strip_suffix(".json")?;
        let (symbol, stamp) = stem.rsplit_once('_')?;
        let naive = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
        Some((symbol.to_string(), naive.and_utc()))
    }

    /// File exists and is younger than `max_age_hours`
    fn is_fresh(&self, path: &Path) -> bool {
        let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) else {
            return false;
        };
        let modified: DateTime<Utc> = modified.into();
        // an age limit past the representable range never goes stale
        Duration::try_hours(self.config.max_age_hours)
            .map_or(true, |max_age| Utc::now() - modified < max_age)
    }

    /// Save a snapshot, returning the file written
    pub fn save(&self, snapshot: &OptionChainSnapshot) -> AnalyticsResult<Option<PathBuf>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let path = self.snapshot_path(&snapshot.underlying, snapshot.fetched_at);
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| AnalyticsError::Serialization(e.to_string()))?;
        fs::write(&path, json)?;

        tracing::info!("Stored {} snapshot at {:?}", snapshot.underlying, path);
        Ok(Some(path))
    }

    /// Load the snapshot for exactly this timestamp, if stored and fresh
    pub fn load(
        &self,
        symbol: &str,
        timestamp: DateTime<Utc>,
    ) -> AnalyticsResult<Option<OptionChainSnapshot>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let path = self.snapshot_path(symbol, timestamp);
        if !path.exists() || !self.is_fresh(&path) {
            return Ok(None);
        }

        read_snapshot(&path).map(Some)
    }

    /// Most recent fresh snapshot for a symbol
    pub fn latest(&self, symbol: &str) -> AnalyticsResult<Option<OptionChainSnapshot>> {
        if !self.config.enabled || !self.config.dir.exists() {
            return Ok(None);
        }

        let mut newest: Option<(DateTime<Utc>, PathBuf)> = None;
        for entry in fs::read_dir(&self.config.dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();

            let Some((sym, stamp)) = Self::parse_file_name(&file_name) else {
                continue;
            };
            if sym != symbol || !self.is_fresh(&entry.path()) {
                continue;
            }
            if newest.as_ref().map_or(true, |(t, _)| stamp > *t) {
                newest = Some((stamp, entry.path()));
            }
        }

        match newest {
            Some((_, path)) => {
                tracing::info!("Loaded latest {} snapshot from {:?}", symbol, path);
                read_snapshot(&path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Delete every stored snapshot of a symbol
    pub fn clear(&self, symbol: &str) -> AnalyticsResult<()> {
        if !self.config.dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(&self.config.dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();

            if matches!(Self::parse_file_name(&file_name), Some((sym, _)) if sym == symbol) {
                fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }

    /// Clear the whole store
    pub fn clear_all(&self) -> AnalyticsResult<()> {
        if self.config.dir.exists() {
            fs::remove_dir_all(&self.config.dir)?;
            fs::create_dir_all(&self.config.dir)?;
        }
        Ok(())
    }

    /// Symbols with at least one stored snapshot
    pub fn list_symbols(&self) -> AnalyticsResult<Vec<String>> {
        let mut symbols = Vec::new();

        if !self.config.dir.exists() {
            return Ok(symbols);
        }

        for entry in fs::read_dir(&self.config.dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();

            if let Some((symbol, _)) = Self::parse_file_name(&file_name) {
                if !symbols.contains(&symbol) {
                    symbols.push(symbol);
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

/// Read one snapshot file
pub fn read_snapshot(path: &Path) -> AnalyticsResult<OptionChainSnapshot> {
    let json = fs::read_to_string(path)?;
    let snapshot: OptionChainSnapshot =
        serde_json::from_str(&json)
            .map_err(|e| AnalyticsError::Serialization(format!("{:?}: {}", path, e)))?;
    snapshot.check_underlying()?;
    Ok(snapshot)
}
