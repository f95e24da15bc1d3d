//! Position tiers, tried strictly in order by the resolver.

mod network;
mod sensor;
mod static_fallback;
mod stored_default;

pub use network::NetworkTier;
pub use sensor::{SensorTier, MAX_SENSOR_TIMEOUT, MIN_MAXIMUM_AGE};
pub use static_fallback::StaticFallbackTier;
pub use stored_default::StoredDefaultTier;

use futures::future::BoxFuture;
use locus_core::{Clock, Position, PositionError, PositionSource};

use crate::resolver::ResolveRequest;

/// Per-call inputs shared by every tier.
pub struct TierContext<'a> {
    pub request: &'a ResolveRequest,
    pub clock: &'a dyn Clock,
}

/// One strategy for obtaining a position.
pub trait PositionTier: Send + Sync {
    fn source(&self) -> PositionSource;

    fn attempt<'a>(
        &'a self,
        ctx: &'a TierContext<'a>,
    ) -> BoxFuture<'a, Result<Position, PositionError>>;
}
