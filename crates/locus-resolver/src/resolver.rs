use std::sync::Arc;
use std::time::Duration;

use locus_cache::ResultCache;
use locus_core::{
    AppConfig, Clock, NetworkLocator, Position, PositionError, PositionSensor, PositionSource,
    ReverseGeocoder, SearchResult,
};

use crate::address::{AddressResolver, DEFAULT_REVERSE_GEOCODE_TIMEOUT};
use crate::tiers::{
    NetworkTier, PositionTier, SensorTier, StaticFallbackTier, StoredDefaultTier, TierContext,
    MAX_SENSOR_TIMEOUT, MIN_MAXIMUM_AGE,
};

/// Options for one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Skip the cached current position.
    pub force_refresh: bool,
    /// Clamped to at most 15 s per attempt.
    pub sensor_timeout: Duration,
    /// Floored at 60 s.
    pub maximum_age: Duration,
}

impl Default for ResolveRequest {
    fn default() -> Self {
        Self {
            force_refresh: false,
            sensor_timeout: MAX_SENSOR_TIMEOUT,
            maximum_age: MIN_MAXIMUM_AGE,
        }
    }
}

/// Tier toggles and timing for [`PositionResolver::from_settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    pub enable_network_fallback: bool,
    pub enable_stored_default: bool,
    pub enable_static_fallback: bool,
    /// Total sensor reads, including the first.
    pub sensor_max_attempts: u32,
    pub sensor_backoff_base: Duration,
    pub network_timeout: Duration,
    pub reverse_geocode_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            enable_network_fallback: true,
            enable_stored_default: true,
            enable_static_fallback: true,
            sensor_max_attempts: 3,
            sensor_backoff_base: Duration::from_secs(1),
            network_timeout: Duration::from_secs(5),
            reverse_geocode_timeout: DEFAULT_REVERSE_GEOCODE_TIMEOUT,
        }
    }
}

impl ResolverSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            enable_network_fallback: config.enable_network_fallback,
            enable_stored_default: config.enable_stored_default,
            enable_static_fallback: config.enable_static_fallback,
            sensor_max_attempts: config.sensor_max_attempts,
            sensor_backoff_base: Duration::from_millis(config.sensor_backoff_base_ms),
            ..Self::default()
        }
    }
}

/// Collaborators the standard tier chain is built from.
pub struct ResolverPorts {
    pub sensor: Arc<dyn PositionSensor>,
    /// `None` drops the network tier even when enabled.
    pub network: Option<Arc<dyn NetworkLocator>>,
    pub reverse_geocoder: Option<Arc<dyn ReverseGeocoder>>,
}

/// Resolves the device position through an ordered tier chain.
pub struct PositionResolver {
    tiers: Vec<Box<dyn PositionTier>>,
    cache: Arc<ResultCache>,
    clock: Arc<dyn Clock>,
}

impl PositionResolver {
    /// Resolver with no tiers; add them with [`PositionResolver::with_tier`].
    #[must_use]
    pub fn new(cache: Arc<ResultCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tiers: Vec::new(),
            cache,
            clock,
        }
    }

    /// Append a tier after the existing ones.
    #[must_use]
    pub fn with_tier(mut self, tier: impl PositionTier + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    /// Standard chain: sensor, then each enabled fallback in order.
    #[must_use]
    pub fn from_settings(
        settings: &ResolverSettings,
        ports: ResolverPorts,
        cache: Arc<ResultCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let address = Arc::new(
            AddressResolver::new(Arc::clone(&cache), ports.reverse_geocoder)
                .with_timeout(settings.reverse_geocode_timeout),
        );

        let mut resolver = Self::new(cache, clock).with_tier(SensorTier::new(
            ports.sensor,
            Arc::clone(&address),
            settings.sensor_max_attempts,
            settings.sensor_backoff_base,
        ));
        if settings.enable_network_fallback {
            if let Some(locator) = ports.network {
                resolver = resolver.with_tier(NetworkTier::new(
                    locator,
                    Arc::clone(&address),
                    settings.network_timeout,
                ));
            }
        }
        if settings.enable_stored_default {
            resolver = resolver.with_tier(StoredDefaultTier);
        }
        if settings.enable_static_fallback {
            resolver = resolver.with_tier(StaticFallbackTier);
        }
        resolver
    }

    /// Tier sources in the order they are tried.
    #[must_use]
    pub fn tier_sources(&self) -> Vec<PositionSource> {
        self.tiers.iter().map(|t| t.source()).collect()
    }

    /// Resolve a position.
    ///
    /// Returns the cached current position when fresh unless
    /// `request.force_refresh`. Otherwise tries each tier in order; the next
    /// tier starts only after the previous one definitively failed. Every
    /// successful resolution replaces the cached current position; use
    /// `force_refresh` to retry the sensor before it expires.
    ///
    /// # Errors
    ///
    /// - [`PositionError::NoTiersEnabled`] when the chain is empty.
    /// - The first tier's error, when every tier failed. With any fallback
    ///   that cannot fail enabled this never happens.
    pub async fn resolve(&self, request: &ResolveRequest) -> Result<Position, PositionError> {
        if !request.force_refresh {
            if let Some(position) = self.cache.get_current_position() {
                tracing::debug!(source = %position.source, "using cached position");
                return Ok(position);
            }
        }

        if self.tiers.is_empty() {
            return Err(PositionError::NoTiersEnabled);
        }

        let ctx = TierContext {
            request,
            clock: self.clock.as_ref(),
        };
        let mut first_error: Option<PositionError> = None;

        for tier in &self.tiers {
            let source = tier.source();
            match tier.attempt(&ctx).await {
                Ok(position) if position.coordinates().is_valid() => {
                    tracing::info!(
                        source = %position.source,
                        address_source = ?position.address_source,
                        "position resolved"
                    );
                    self.cache.set_current_position(position.clone());
                    return Ok(position);
                }
                Ok(position) => {
                    tracing::warn!(
                        tier = %source,
                        lat = position.latitude,
                        lng = position.longitude,
                        "tier returned out-of-range coordinates"
                    );
                    first_error.get_or_insert(PositionError::InvalidCoordinates {
                        lat: position.latitude,
                        lng: position.longitude,
                    });
                }
                Err(e) => {
                    tracing::warn!(tier = %source, error = %e, "position tier failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        Err(first_error
            .unwrap_or(PositionError::PositionUnavailable)
            .surfaced())
    }

    /// Make a search result the user picked the current position.
    pub fn adopt_search_result(&self, result: &SearchResult) -> Position {
        let position = Position::from_search_result(result, self.clock.now());
        self.cache.set_current_position(position.clone());
        position
    }
}
