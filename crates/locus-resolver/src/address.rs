//! Coordinates to a human-readable address.
//!
//! Lookup order is cache, then the external geocoder (raced against a
//! timeout, written through on success), then a synthesized label from the
//! built-in zone table, then the raw coordinates. Never fails.

use std::sync::Arc;
use std::time::Duration;

use locus_cache::ResultCache;
use locus_core::{AddressSource, Coordinates, ReverseGeocoder};

use crate::regions::nearest_zone_label;

pub const DEFAULT_REVERSE_GEOCODE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub address: String,
    pub source: AddressSource,
}

pub struct AddressResolver {
    cache: Arc<ResultCache>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    timeout: Duration,
}

impl AddressResolver {
    #[must_use]
    pub fn new(cache: Arc<ResultCache>, geocoder: Option<Arc<dyn ReverseGeocoder>>) -> Self {
        Self {
            cache,
            geocoder,
            timeout: DEFAULT_REVERSE_GEOCODE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn resolve(&self, coordinates: Coordinates) -> ResolvedAddress {
        let Coordinates { lat, lng } = coordinates;

        if let Some(address) = self.cache.get_geocode_result(lat, lng) {
            tracing::debug!(%coordinates, "reverse geocode cache hit");
            return ResolvedAddress {
                address,
                source: AddressSource::Cached,
            };
        }

        if let Some(geocoder) = &self.geocoder {
            match tokio::time::timeout(self.timeout, geocoder.reverse_geocode(coordinates)).await {
                Ok(Ok(address)) => {
                    self.cache.set_geocode_result(lat, lng, &address);
                    return ResolvedAddress {
                        address,
                        source: AddressSource::Geocoded,
                    };
                }
                Ok(Err(e)) => {
                    tracing::warn!(%coordinates, error = %e, "reverse geocode failed");
                }
                Err(_) => {
                    tracing::warn!(
                        %coordinates,
                        timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                        "reverse geocode timed out"
                    );
                }
            }
        }

        Self::synthesize(coordinates)
    }

    /// Offline label: nearest known zone, else the coordinates themselves.
    #[must_use]
    pub fn synthesize(coordinates: Coordinates) -> ResolvedAddress {
        match nearest_zone_label(coordinates) {
            Some(address) => ResolvedAddress {
                address,
                source: AddressSource::RegionEstimate,
            },
            None => ResolvedAddress {
                address: coordinates.to_string(),
                source: AddressSource::RawCoordinates,
            },
        }
    }
}

#[cfg(test)]
#[path = "address_test.rs"]
mod tests;
