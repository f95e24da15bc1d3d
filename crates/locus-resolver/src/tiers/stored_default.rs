use futures::future::{BoxFuture, FutureExt};
use locus_core::{AddressSource, Position, PositionError, PositionSource};

use super::{PositionTier, TierContext};
use crate::regions::CITY_CENTERS;

/// First entry of the built-in city-center table.
///
/// Always the same city regardless of any partial signal; a better pick
/// would need a region hint the resolver does not have.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoredDefaultTier;

impl PositionTier for StoredDefaultTier {
    fn source(&self) -> PositionSource {
        PositionSource::StoredDefault
    }

    fn attempt<'a>(
        &'a self,
        ctx: &'a TierContext<'a>,
    ) -> BoxFuture<'a, Result<Position, PositionError>> {
        let result = CITY_CENTERS
            .first()
            .map(|city| Position {
                address: city.label(),
                latitude: city.center.lat,
                longitude: city.center.lng,
                source: PositionSource::StoredDefault,
                address_source: AddressSource::BuiltIn,
                accuracy_meters: None,
                captured_at: ctx.clock.now(),
            })
            .ok_or(PositionError::PositionUnavailable);
        async move { result }.boxed()
    }
}
