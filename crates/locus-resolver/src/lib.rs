//! Device position resolution with ordered fallback tiers.

pub mod address;
pub mod regions;
pub mod resolver;
pub mod sensors;
pub mod tiers;

pub use address::{AddressResolver, ResolvedAddress};
pub use regions::{nearest_city, nearest_zone_label, CityCenter, Zone, CITY_CENTERS, HOME_CITY};
pub use resolver::{PositionResolver, ResolveRequest, ResolverPorts, ResolverSettings};
pub use sensors::{FixedSensor, UnavailableSensor};
pub use tiers::{
    NetworkTier, PositionTier, SensorTier, StaticFallbackTier, StoredDefaultTier, TierContext,
};
