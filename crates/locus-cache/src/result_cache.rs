//! TTL-bounded cache for resolved positions and reverse-geocoding results.
//!
//! Two regions share one mutex:
//!
//! - the current-position slot (5 min TTL by default), and
//! - the geocode region, keyed by coordinates rounded to 4 decimals
//!   (~11 m cells) with a 30 min TTL and a hard entry cap.
//!
//! Every write is mirrored to a [`Storage`] backend. Storage failures are
//! logged and swallowed: the in-memory state stays authoritative for the
//! life of the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use locus_core::{Clock, Coordinates, Position};

use crate::entry::CacheEntry;
use crate::storage::Storage;

const CURRENT_POSITION_KEY: &str = "locus.current_position";
const GEOCODE_RESULTS_KEY: &str = "locus.geocode_results";
const GEOCODE_KEY_DECIMALS: i32 = 4;

/// TTLs and capacity for the two cache regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub position_ttl: Duration,
    pub geocode_ttl: Duration,
    pub max_geocode_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            position_ttl: Duration::from_secs(5 * 60),
            geocode_ttl: Duration::from_secs(30 * 60),
            max_geocode_entries: 100,
        }
    }
}

/// Point-in-time view of the cache, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub current_position: Option<Position>,
    pub current_position_stored_at: Option<DateTime<Utc>>,
    pub geocode_entries: usize,
    pub max_geocode_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeocodeRecord {
    entry: CacheEntry<String>,
    /// Insertion order; breaks `stored_at` ties during eviction.
    seq: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    current: Option<CacheEntry<Position>>,
    geocode: HashMap<String, GeocodeRecord>,
    next_seq: u64,
}

/// Shared result cache. Cheap to share behind an `Arc`.
pub struct ResultCache {
    state: Mutex<CacheState>,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    settings: CacheSettings,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Canonical geocode-region key for a coordinate pair.
#[must_use]
pub fn geocode_key(lat: f64, lng: f64) -> String {
    let rounded = Coordinates::new(lat, lng).rounded(GEOCODE_KEY_DECIMALS);
    // `+ 0.0` folds negative zero so -0.00001 and 0.00001 share a cell.
    format!("{:.4},{:.4}", rounded.lat + 0.0, rounded.lng + 0.0)
}

impl ResultCache {
    /// Create an empty cache that writes through to `storage`.
    ///
    /// Nothing is read from `storage`; use [`ResultCache::load`] to rehydrate.
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, settings: CacheSettings) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            storage,
            clock,
            settings,
        }
    }

    /// Create a cache and rehydrate both regions from `storage`.
    ///
    /// Expired entries are dropped and unreadable payloads are logged and
    /// ignored; loading never fails.
    pub fn load(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, settings: CacheSettings) -> Self {
        let cache = Self::new(storage, clock, settings);
        let now = cache.clock.now();

        let current = cache
            .read_persisted::<CacheEntry<Position>>(CURRENT_POSITION_KEY)
            .filter(|entry| !entry.is_expired(now));

        let mut geocode = cache
            .read_persisted::<HashMap<String, GeocodeRecord>>(GEOCODE_RESULTS_KEY)
            .unwrap_or_default();
        geocode.retain(|_, record| !record.entry.is_expired(now));

        {
            let mut state = cache.lock();
            state.next_seq = geocode.values().map(|r| r.seq + 1).max().unwrap_or(0);
            state.current = current;
            state.geocode = geocode;
            Self::evict_overflow(&mut state, settings.max_geocode_entries);
            tracing::debug!(
                has_position = state.current.is_some(),
                geocode_entries = state.geocode.len(),
                "result cache rehydrated"
            );
        }
        cache
    }

    #[must_use]
    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    /// Overwrite the current-position slot.
    pub fn set_current_position(&self, position: Position) {
        let now = self.clock.now();
        let mut state = self.lock();
        state.current = Some(CacheEntry::new(position, now, self.settings.position_ttl));
        self.persist(CURRENT_POSITION_KEY, &state.current);
    }

    /// The current position, unless it is older than the position TTL.
    /// An expired slot is cleared on the way out.
    #[must_use]
    pub fn get_current_position(&self) -> Option<Position> {
        let now = self.clock.now();
        let mut state = self.lock();
        let expired = state.current.as_ref()?.is_expired(now);
        if expired {
            state.current = None;
            self.remove_persisted(CURRENT_POSITION_KEY);
            return None;
        }
        state.current.as_ref().map(|entry| entry.value.clone())
    }

    /// Store a reverse-geocoding result, then evict the oldest entries until
    /// the region is back within its cap.
    pub fn set_geocode_result(&self, lat: f64, lng: f64, address: &str) {
        let key = geocode_key(lat, lng);
        let now = self.clock.now();
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.geocode.insert(
            key,
            GeocodeRecord {
                entry: CacheEntry::new(address.to_string(), now, self.settings.geocode_ttl),
                seq,
            },
        );
        Self::evict_overflow(&mut state, self.settings.max_geocode_entries);
        self.persist(GEOCODE_RESULTS_KEY, &state.geocode);
    }

    /// Cached address for the ~11 m cell containing `(lat, lng)`.
    #[must_use]
    pub fn get_geocode_result(&self, lat: f64, lng: f64) -> Option<String> {
        let key = geocode_key(lat, lng);
        let now = self.clock.now();
        let mut state = self.lock();
        let expired = match state.geocode.get(&key) {
            Some(record) if !record.entry.is_expired(now) => {
                return Some(record.entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            state.geocode.remove(&key);
            self.persist(GEOCODE_RESULTS_KEY, &state.geocode);
        }
        None
    }

    /// Number of geocode entries currently held, expired or not.
    #[must_use]
    pub fn geocode_len(&self) -> usize {
        self.lock().geocode.len()
    }

    /// Wipe both regions, in memory and in storage.
    pub fn clear_all(&self) {
        let mut state = self.lock();
        state.current = None;
        state.geocode.clear();
        self.remove_persisted(CURRENT_POSITION_KEY);
        self.remove_persisted(GEOCODE_RESULTS_KEY);
        tracing::info!("result cache cleared");
    }

    #[must_use]
    pub fn snapshot(&self) -> CacheSnapshot {
        let now = self.clock.now();
        let state = self.lock();
        let current = state.current.as_ref().filter(|e| !e.is_expired(now));
        CacheSnapshot {
            current_position: current.map(|e| e.value.clone()),
            current_position_stored_at: current.map(|e| e.stored_at),
            geocode_entries: state.geocode.len(),
            max_geocode_entries: self.settings.max_geocode_entries,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop oldest-by-`stored_at` entries until `len <= max`. Runs under the
    /// state lock so the scan and the removals are one step.
    fn evict_overflow(state: &mut CacheState, max: usize) {
        let overflow = state.geocode.len().saturating_sub(max);
        if overflow == 0 {
            return;
        }
        let mut by_age: Vec<(DateTime<Utc>, u64, String)> = state
            .geocode
            .iter()
            .map(|(k, r)| (r.entry.stored_at, r.seq, k.clone()))
            .collect();
        by_age.sort_unstable();
        for (_, _, key) in by_age.into_iter().take(overflow) {
            state.geocode.remove(&key);
        }
        tracing::debug!(evicted = overflow, "geocode cache over capacity");
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache serialization failed; keeping in memory only");
                return;
            }
        };
        if let Err(e) = self.storage.set(key, &bytes) {
            tracing::warn!(key, error = %e, "cache persistence failed; keeping in memory only");
        }
    }

    fn remove_persisted(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            tracing::warn!(key, error = %e, "cache storage removal failed");
        }
    }

    fn read_persisted<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let bytes = match self.storage.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache storage read failed");
                return None;
            }
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| {
                tracing::warn!(key, error = %e, "discarding unreadable cache payload");
            })
            .ok()
    }
}

#[cfg(test)]
#[path = "result_cache_test.rs"]
mod tests;
