use futures::future::{BoxFuture, FutureExt};
use locus_core::{AddressSource, Position, PositionError, PositionSource};

use super::{PositionTier, TierContext};
use crate::regions::HOME_CITY;

/// Hardcoded home city. Cannot fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticFallbackTier;

impl PositionTier for StaticFallbackTier {
    fn source(&self) -> PositionSource {
        PositionSource::StaticFallback
    }

    fn attempt<'a>(
        &'a self,
        ctx: &'a TierContext<'a>,
    ) -> BoxFuture<'a, Result<Position, PositionError>> {
        let position = Position {
            address: HOME_CITY.label(),
            latitude: HOME_CITY.center.lat,
            longitude: HOME_CITY.center.lng,
            source: PositionSource::StaticFallback,
            address_source: AddressSource::BuiltIn,
            accuracy_meters: None,
            captured_at: ctx.clock.now(),
        };
        async move { Ok(position) }.boxed()
    }
}
