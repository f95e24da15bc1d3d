//! End-to-end tests for `PositionResolver` with in-process fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use locus_cache::{CacheSettings, MemoryStorage, ResultCache};
use locus_core::{
    AddressSource, Coordinates, ManualClock, NetworkFix, NetworkLocator, PositionError,
    PositionSensor, PositionSource, RemoteSourceFailure, SearchResult, SensorOptions,
    SensorReading, SourceType,
};
use locus_resolver::{PositionResolver, ResolveRequest, ResolverPorts, ResolverSettings};

#[derive(Clone)]
enum Step {
    Read(Result<SensorReading, PositionError>),
    Hang,
}

/// Plays `steps` in order, repeating the last one.
struct ScriptedSensor {
    steps: Vec<Step>,
    calls: AtomicUsize,
}

impl ScriptedSensor {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PositionSensor for ScriptedSensor {
    fn current_position(
        &self,
        _options: SensorOptions,
    ) -> BoxFuture<'_, Result<SensorReading, PositionError>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.steps[n.min(self.steps.len() - 1)].clone() {
            Step::Read(result) => async move { result }.boxed(),
            Step::Hang => futures::future::pending().boxed(),
        }
    }
}

struct FakeLocator(Result<NetworkFix, RemoteSourceFailure>);

impl NetworkLocator for FakeLocator {
    fn locate(&self) -> BoxFuture<'_, Result<NetworkFix, RemoteSourceFailure>> {
        let result = self.0.clone();
        async move { result }.boxed()
    }
}

fn reading(lat: f64, lng: f64) -> Step {
    Step::Read(Ok(SensorReading {
        latitude: lat,
        longitude: lng,
        accuracy: Some(12.0),
    }))
}

fn cache(clock: &Arc<ManualClock>) -> Arc<ResultCache> {
    Arc::new(ResultCache::new(
        Arc::new(MemoryStorage::new()),
        clock.clone(),
        CacheSettings::default(),
    ))
}

struct Harness {
    resolver: PositionResolver,
    cache: Arc<ResultCache>,
    clock: Arc<ManualClock>,
}

fn harness(
    settings: &ResolverSettings,
    sensor: Arc<ScriptedSensor>,
    network: Option<FakeLocator>,
) -> Harness {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cache = cache(&clock);
    let ports = ResolverPorts {
        sensor,
        network: network.map(|n| Arc::new(n) as Arc<dyn NetworkLocator>),
        reverse_geocoder: None,
    };
    let resolver =
        PositionResolver::from_settings(settings, ports, Arc::clone(&cache), clock.clone());
    Harness {
        resolver,
        cache,
        clock,
    }
}

fn only_sensor() -> ResolverSettings {
    ResolverSettings {
        enable_network_fallback: false,
        enable_stored_default: false,
        enable_static_fallback: false,
        ..ResolverSettings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn valid_sensor_fix_is_resolved_and_cached() {
    let sensor = ScriptedSensor::new(vec![reading(-4.3040, 15.3090)]);
    let h = harness(&ResolverSettings::default(), sensor.clone(), None);

    let position = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();
    assert_eq!(position.source, PositionSource::Sensor);
    assert_eq!(position.address, "Gombe, Kinshasa");
    assert_eq!(position.address_source, AddressSource::RegionEstimate);
    assert_eq!(position.accuracy_meters, Some(12.0));

    let again = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();
    assert_eq!(again, position);
    assert_eq!(sensor.calls(), 1, "second call is served from cache");

    let refreshed = h
        .resolver
        .resolve(&ResolveRequest {
            force_refresh: true,
            ..ResolveRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(refreshed.source, PositionSource::Sensor);
    assert_eq!(sensor.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn cached_position_expires_after_five_minutes() {
    let sensor = ScriptedSensor::new(vec![reading(-4.3040, 15.3090)]);
    let h = harness(&ResolverSettings::default(), sensor.clone(), None);

    h.resolver.resolve(&ResolveRequest::default()).await.unwrap();
    h.clock.advance(chrono::Duration::minutes(6));
    h.resolver.resolve(&ResolveRequest::default()).await.unwrap();

    assert_eq!(sensor.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_coordinates_never_surface_as_sensor() {
    let sensor = ScriptedSensor::new(vec![reading(123.0, 15.3)]);
    let h = harness(&ResolverSettings::default(), sensor.clone(), None);

    let position = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();

    assert_ne!(position.source, PositionSource::Sensor);
    assert_eq!(position.source, PositionSource::StoredDefault);
    assert!(position.coordinates().is_valid());
    assert_eq!(sensor.calls(), 3, "three reads in total");
    assert_eq!(h.cache.get_current_position(), Some(position));
}

#[tokio::test(start_paused = true)]
async fn invalid_then_valid_reading_recovers_on_retry() {
    let sensor = ScriptedSensor::new(vec![reading(-91.0, 0.0), reading(-4.3217, 15.3125)]);
    let h = harness(&only_sensor(), sensor.clone(), None);

    let start = tokio::time::Instant::now();
    let position = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();

    assert_eq!(position.source, PositionSource::Sensor);
    assert_eq!(sensor.calls(), 2);
    assert_eq!(start.elapsed(), Duration::from_secs(1), "one back-off of 1 s");
}

#[tokio::test(start_paused = true)]
async fn denied_with_network_disabled_uses_stored_default() {
    let sensor = ScriptedSensor::new(vec![Step::Read(Err(PositionError::PermissionDenied))]);
    let settings = ResolverSettings {
        enable_network_fallback: false,
        enable_stored_default: true,
        ..ResolverSettings::default()
    };
    let h = harness(&settings, sensor.clone(), None);

    let position = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();

    assert_eq!(position.source, PositionSource::StoredDefault);
    assert_eq!(position.address, "Kinshasa, CD");
    assert_eq!(sensor.calls(), 1, "permission denied is not retried");
}

#[tokio::test(start_paused = true)]
async fn denied_with_every_fallback_disabled_surfaces_error() {
    let sensor = ScriptedSensor::new(vec![Step::Read(Err(PositionError::PermissionDenied))]);
    let h = harness(&only_sensor(), sensor, None);

    let err = h.resolver.resolve(&ResolveRequest::default()).await.unwrap_err();
    assert_eq!(err, PositionError::PermissionDenied);
}

#[tokio::test(start_paused = true)]
async fn invalid_readings_surface_as_unavailable() {
    let sensor = ScriptedSensor::new(vec![reading(0.0, 200.0)]);
    let h = harness(&only_sensor(), sensor, None);

    let err = h.resolver.resolve(&ResolveRequest::default()).await.unwrap_err();
    assert_eq!(err, PositionError::PositionUnavailable);
}

#[tokio::test(start_paused = true)]
async fn hanging_sensor_times_out_with_backoff_schedule() {
    let sensor = ScriptedSensor::new(vec![Step::Hang]);
    let h = harness(&only_sensor(), sensor.clone(), None);

    let start = tokio::time::Instant::now();
    let err = h
        .resolver
        .resolve(&ResolveRequest {
            sensor_timeout: Duration::from_secs(60),
            ..ResolveRequest::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err, PositionError::Timeout(Duration::from_secs(15)));
    assert_eq!(sensor.calls(), 3);
    // 3 clamped attempts of 15 s plus back-off 1 + 2 s.
    assert_eq!(start.elapsed(), Duration::from_secs(48));
}

#[tokio::test(start_paused = true)]
async fn network_estimate_is_used_and_cached() {
    let sensor = ScriptedSensor::new(vec![Step::Read(Err(PositionError::Unsupported))]);
    let locator = FakeLocator(Ok(NetworkFix {
        coordinates: Coordinates::new(48.8566, 2.3522),
        city: Some("Paris".to_string()),
        country_code: Some("FR".to_string()),
    }));
    let h = harness(&ResolverSettings::default(), sensor, Some(locator));

    let position = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();

    assert_eq!(position.source, PositionSource::NetworkEstimate);
    assert_eq!(position.address, "Paris, FR");
    assert_eq!(position.address_source, AddressSource::RegionEstimate);
    assert_eq!(h.cache.get_current_position(), Some(position));
}

#[tokio::test(start_paused = true)]
async fn network_failure_falls_through_to_stored_default() {
    let sensor = ScriptedSensor::new(vec![Step::Read(Err(PositionError::Unsupported))]);
    let locator = FakeLocator(Err(RemoteSourceFailure::Request {
        source_name: "ip_locator",
        reason: "connection refused".to_string(),
    }));
    let h = harness(&ResolverSettings::default(), sensor, Some(locator));

    let position = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();
    assert_eq!(position.source, PositionSource::StoredDefault);
}

#[tokio::test(start_paused = true)]
async fn static_fallback_is_last_resort() {
    let sensor = ScriptedSensor::new(vec![Step::Read(Err(PositionError::Unsupported))]);
    let settings = ResolverSettings {
        enable_network_fallback: false,
        enable_stored_default: false,
        enable_static_fallback: true,
        ..ResolverSettings::default()
    };
    let h = harness(&settings, sensor, None);

    assert_eq!(
        h.resolver.tier_sources(),
        vec![PositionSource::Sensor, PositionSource::StaticFallback]
    );
    let position = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();
    assert_eq!(position.source, PositionSource::StaticFallback);
}

#[tokio::test(start_paused = true)]
async fn fallback_position_is_cached_until_forced_refresh() {
    let sensor = ScriptedSensor::new(vec![
        Step::Read(Err(PositionError::PermissionDenied)),
        reading(-4.3217, 15.3125),
    ]);
    let settings = ResolverSettings {
        enable_network_fallback: false,
        ..ResolverSettings::default()
    };
    let h = harness(&settings, sensor.clone(), None);

    let fallback = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();
    assert_eq!(fallback.source, PositionSource::StoredDefault);
    assert_eq!(h.cache.get_current_position(), Some(fallback.clone()));

    let again = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();
    assert_eq!(again, fallback);
    assert_eq!(sensor.calls(), 1);

    let refreshed = h
        .resolver
        .resolve(&ResolveRequest {
            force_refresh: true,
            ..ResolveRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(refreshed.source, PositionSource::Sensor);
    assert_eq!(sensor.calls(), 2);
}

#[tokio::test]
async fn empty_chain_is_a_configuration_error() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let resolver = PositionResolver::new(cache(&clock), clock.clone());

    let err = resolver.resolve(&ResolveRequest::default()).await.unwrap_err();
    assert_eq!(err, PositionError::NoTiersEnabled);
}

#[tokio::test]
async fn adopted_search_result_becomes_current_position() {
    let sensor = ScriptedSensor::new(vec![Step::Read(Err(PositionError::Unsupported))]);
    let h = harness(&only_sensor(), sensor.clone(), None);
    let picked = SearchResult {
        id: "curated:gombe".to_string(),
        title: "Gombe".to_string(),
        subtitle: Some("Kinshasa".to_string()),
        latitude: -4.3019,
        longitude: 15.3045,
        source_type: SourceType::Curated,
        relevance_score: 130.0,
        hierarchy_level: 2,
        badge: None,
    };

    let adopted = h.resolver.adopt_search_result(&picked);
    let resolved = h.resolver.resolve(&ResolveRequest::default()).await.unwrap();

    assert_eq!(resolved, adopted);
    assert_eq!(resolved.source, PositionSource::Geocoded);
    assert_eq!(resolved.address, "Gombe, Kinshasa");
    assert_eq!(sensor.calls(), 0);
}
