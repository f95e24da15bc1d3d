use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use locus_core::{
    AddressSource, NetworkFix, NetworkLocator, Position, PositionError, PositionSource,
};

use super::{PositionTier, TierContext};
use crate::address::{AddressResolver, ResolvedAddress};

/// Coarse IP-based estimate.
pub struct NetworkTier {
    locator: Arc<dyn NetworkLocator>,
    address: Arc<AddressResolver>,
    timeout: Duration,
}

impl NetworkTier {
    #[must_use]
    pub fn new(
        locator: Arc<dyn NetworkLocator>,
        address: Arc<AddressResolver>,
        timeout: Duration,
    ) -> Self {
        Self {
            locator,
            address,
            timeout,
        }
    }

    /// Prefer the locator's own city name over bare coordinates.
    fn label(fix: &NetworkFix, resolved: ResolvedAddress) -> ResolvedAddress {
        match (&fix.city, resolved.source) {
            (Some(city), AddressSource::RawCoordinates) => ResolvedAddress {
                address: match &fix.country_code {
                    Some(cc) => format!("{city}, {cc}"),
                    None => city.clone(),
                },
                source: AddressSource::RegionEstimate,
            },
            _ => resolved,
        }
    }
}

impl PositionTier for NetworkTier {
    fn source(&self) -> PositionSource {
        PositionSource::NetworkEstimate
    }

    fn attempt<'a>(
        &'a self,
        ctx: &'a TierContext<'a>,
    ) -> BoxFuture<'a, Result<Position, PositionError>> {
        async move {
            let fix = match tokio::time::timeout(self.timeout, self.locator.locate()).await {
                Ok(Ok(fix)) => fix,
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "network locator failed");
                    return Err(PositionError::PositionUnavailable);
                }
                Err(_) => return Err(PositionError::Timeout(self.timeout)),
            };
            if !fix.coordinates.is_valid() {
                return Err(PositionError::InvalidCoordinates {
                    lat: fix.coordinates.lat,
                    lng: fix.coordinates.lng,
                });
            }
            let resolved = Self::label(&fix, self.address.resolve(fix.coordinates).await);
            Ok(Position {
                address: resolved.address,
                latitude: fix.coordinates.lat,
                longitude: fix.coordinates.lng,
                source: PositionSource::NetworkEstimate,
                address_source: resolved.source,
                accuracy_meters: None,
                captured_at: ctx.clock.now(),
            })
        }
        .boxed()
    }
}
