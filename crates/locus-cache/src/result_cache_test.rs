use chrono::Utc;
use locus_core::{AddressSource, ManualClock, PositionSource};

use super::*;
use crate::storage::MemoryStorage;

fn position(address: &str) -> Position {
    Position {
        address: address.to_string(),
        latitude: -4.3050,
        longitude: 15.3100,
        source: PositionSource::Sensor,
        address_source: AddressSource::Geocoded,
        accuracy_meters: Some(12.0),
        captured_at: Utc::now(),
    }
}

fn cache_with(storage: Arc<dyn Storage>) -> (ResultCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cache = ResultCache::new(storage, clock.clone(), CacheSettings::default());
    (cache, clock)
}

fn memory_cache() -> (ResultCache, Arc<ManualClock>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let (cache, clock) = cache_with(storage.clone());
    (cache, clock, storage)
}

#[test]
fn geocode_key_rounds_to_four_decimals() {
    assert_eq!(geocode_key(-4.321_749, 15.312_451), "-4.3217,15.3125");
    assert_eq!(geocode_key(-0.000_01, 0.000_01), "0.0000,0.0000");
}

#[test]
fn geocode_round_trip() {
    let (cache, _, _) = memory_cache();
    cache.set_geocode_result(-4.3050, 15.3100, "Gombe, Kinshasa");
    assert_eq!(
        cache.get_geocode_result(-4.3050, 15.3100).as_deref(),
        Some("Gombe, Kinshasa")
    );
}

#[test]
fn nearby_lookups_share_a_cell() {
    let (cache, _, _) = memory_cache();
    cache.set_geocode_result(-4.305_01, 15.310_02, "Gombe, Kinshasa");
    assert_eq!(
        cache.get_geocode_result(-4.304_98, 15.309_97).as_deref(),
        Some("Gombe, Kinshasa")
    );
}

#[test]
fn geocode_entry_expires_after_ttl_and_is_removed() {
    let (cache, clock, _) = memory_cache();
    cache.set_geocode_result(-4.3050, 15.3100, "Gombe, Kinshasa");

    clock.advance(chrono::Duration::minutes(30));
    assert!(cache.get_geocode_result(-4.3050, 15.3100).is_some());

    clock.advance(chrono::Duration::seconds(1));
    assert!(cache.get_geocode_result(-4.3050, 15.3100).is_none());
    assert_eq!(cache.geocode_len(), 0, "expired entry should be deleted on read");
}

#[test]
fn resetting_a_key_overwrites() {
    let (cache, _, _) = memory_cache();
    cache.set_geocode_result(-4.3050, 15.3100, "old");
    cache.set_geocode_result(-4.3050, 15.3100, "new");
    assert_eq!(cache.geocode_len(), 1);
    assert_eq!(cache.get_geocode_result(-4.3050, 15.3100).as_deref(), Some("new"));
}

#[test]
fn capacity_keeps_most_recently_stored() {
    let (cache, clock, _) = memory_cache();
    let max = cache.settings().max_geocode_entries;
    let extra = 7;

    for i in 0..(max + extra) {
        #[allow(clippy::cast_precision_loss)]
        let lat = i as f64 * 0.001;
        cache.set_geocode_result(lat, 15.0, &format!("addr-{i}"));
        clock.advance(chrono::Duration::seconds(1));
    }

    assert_eq!(cache.geocode_len(), max);
    for i in 0..(max + extra) {
        #[allow(clippy::cast_precision_loss)]
        let lat = i as f64 * 0.001;
        let hit = cache.get_geocode_result(lat, 15.0);
        if i < extra {
            assert!(hit.is_none(), "entry {i} should have been evicted");
        } else {
            assert_eq!(hit, Some(format!("addr-{i}")));
        }
    }
}

#[test]
fn capacity_tie_on_timestamp_evicts_by_insertion_order() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let settings = CacheSettings {
        max_geocode_entries: 2,
        ..CacheSettings::default()
    };
    let cache = ResultCache::new(storage, clock, settings);

    cache.set_geocode_result(1.0, 1.0, "first");
    cache.set_geocode_result(2.0, 2.0, "second");
    cache.set_geocode_result(3.0, 3.0, "third");

    assert_eq!(cache.geocode_len(), 2);
    assert!(cache.get_geocode_result(1.0, 1.0).is_none());
    assert!(cache.get_geocode_result(3.0, 3.0).is_some());
}

#[test]
fn current_position_respects_ttl() {
    let (cache, clock, storage) = memory_cache();
    cache.set_current_position(position("Gombe, Kinshasa"));
    assert!(storage.contains(CURRENT_POSITION_KEY));

    clock.advance(chrono::Duration::minutes(5));
    assert_eq!(
        cache.get_current_position().map(|p| p.address),
        Some("Gombe, Kinshasa".to_string())
    );

    clock.advance(chrono::Duration::seconds(1));
    assert!(cache.get_current_position().is_none());
    assert!(
        !storage.contains(CURRENT_POSITION_KEY),
        "expired slot should be evicted from storage too"
    );
}

#[test]
fn current_position_is_superseded_not_merged() {
    let (cache, _, _) = memory_cache();
    let mut first = position("first");
    first.accuracy_meters = Some(5.0);
    cache.set_current_position(first);

    let mut second = position("second");
    second.accuracy_meters = None;
    cache.set_current_position(second.clone());

    assert_eq!(cache.get_current_position(), Some(second));
}

#[test]
fn load_rehydrates_fresh_entries_only() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    {
        let cache = ResultCache::new(storage.clone(), clock.clone(), CacheSettings::default());
        cache.set_current_position(position("Gombe, Kinshasa"));
        cache.set_geocode_result(-4.3050, 15.3100, "Gombe, Kinshasa");
        clock.advance(chrono::Duration::minutes(20));
        cache.set_geocode_result(-4.4419, 15.2663, "Kalamu, Kinshasa");
    }

    // Position (5 min) has lapsed; first geocode entry is 20 min old, second is fresh.
    clock.advance(chrono::Duration::minutes(15));
    let reloaded = ResultCache::load(storage, clock, CacheSettings::default());

    assert!(reloaded.get_current_position().is_none());
    assert!(reloaded.get_geocode_result(-4.3050, 15.3100).is_none());
    assert_eq!(
        reloaded.get_geocode_result(-4.4419, 15.2663).as_deref(),
        Some("Kalamu, Kinshasa")
    );
}

#[test]
fn load_ignores_corrupt_payloads() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(GEOCODE_RESULTS_KEY, b"not json").unwrap();
    storage.set(CURRENT_POSITION_KEY, b"{\"value\":42}").unwrap();
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let cache = ResultCache::load(storage, clock, CacheSettings::default());

    assert!(cache.get_current_position().is_none());
    assert_eq!(cache.geocode_len(), 0);
}

#[test]
fn storage_failures_are_swallowed() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::with_quota(8));
    let (cache, _) = cache_with(storage);

    cache.set_current_position(position("Gombe, Kinshasa"));
    cache.set_geocode_result(-4.3050, 15.3100, "Gombe, Kinshasa");

    assert!(cache.get_current_position().is_some());
    assert_eq!(
        cache.get_geocode_result(-4.3050, 15.3100).as_deref(),
        Some("Gombe, Kinshasa")
    );
}

#[test]
fn clear_all_wipes_memory_and_storage() {
    let (cache, _, storage) = memory_cache();
    cache.set_current_position(position("Gombe, Kinshasa"));
    cache.set_geocode_result(-4.3050, 15.3100, "Gombe, Kinshasa");

    cache.clear_all();

    assert!(cache.get_current_position().is_none());
    assert_eq!(cache.geocode_len(), 0);
    assert!(!storage.contains(CURRENT_POSITION_KEY));
    assert!(!storage.contains(GEOCODE_RESULTS_KEY));
}

#[test]
fn snapshot_reports_region_sizes() {
    let (cache, _, _) = memory_cache();
    cache.set_geocode_result(1.0, 1.0, "a");
    cache.set_geocode_result(2.0, 2.0, "b");
    let snap = cache.snapshot();
    assert!(snap.current_position.is_none());
    assert_eq!(snap.geocode_entries, 2);
    assert_eq!(snap.max_geocode_entries, 100);
}
