//! Surface caching
//!
//! Surfaces are expensive to build and immutable once built, so they are
//! shared as `Arc<VolatilitySurface>`. The cache is injected into the
//! pipeline rather than held in a global.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::core::SnapshotKey;
use crate::surface::VolatilitySurface;

/// Surface cache keyed by (symbol, snapshot timestamp)
pub trait SurfaceCache: Send + Sync {
    /// Surface for exactly this snapshot, if present and not expired
    fn get(&self, key: &SnapshotKey) -> Option<Arc<VolatilitySurface>>;

    /// Store a surface for `ttl`
    fn put(&self, key: SnapshotKey, surface: Arc<VolatilitySurface>, ttl: Duration);

    /// Drop the entry for this snapshot
    fn invalidate(&self, key: &SnapshotKey);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    timestamp: DateTime<Utc>,
    surface: Arc<VolatilitySurface>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// In-memory [`SurfaceCache`] holding the latest surface per symbol.
///
/// A newer snapshot replaces the symbol's entry in one step, so readers
/// see either the old surface or the new one. Older snapshots never
/// overwrite newer ones.
#[derive(Debug, Default)]
pub struct MemorySurfaceCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemorySurfaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbols with a cached surface
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl SurfaceCache for MemorySurfaceCache {
    fn get(&self, key: &SnapshotKey) -> Option<Arc<VolatilitySurface>> {
        let now = Utc::now();
        let hit = self
            .entries
            .get(&key.symbol)
            .filter(|entry| entry.timestamp == key.timestamp)
            .map(|entry| (entry.is_live(now), entry.surface.clone()));

        match hit {
            Some((true, surface)) => {
                tracing::debug!("Surface cache hit for {}", key);
                Some(surface)
            }
            Some((false, _)) => {
                self.entries.remove_if(&key.symbol, |_, entry| {
                    entry.timestamp == key.timestamp && !entry.is_live(now)
                });
                tracing::debug!("Surface cache entry for {} expired", key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: SnapshotKey, surface: Arc<VolatilitySurface>, ttl: Duration) {
        let entry = CacheEntry {
            timestamp: key.timestamp,
            surface,
            expires_at: Utc::now()
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        match self.entries.entry(key.symbol) {
            Entry::Occupied(mut existing) => {
                if existing.get().timestamp <= entry.timestamp {
                    existing.insert(entry);
                } else {
                    tracing::debug!(
                        "Kept newer cached surface for {} over {}",
                        existing.key(),
                        entry.timestamp
                    );
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }

    fn invalidate(&self, key: &SnapshotKey) {
        self.entries
            .remove_if(&key.symbol, |_, entry| entry.timestamp == key.timestamp);
    }
}
