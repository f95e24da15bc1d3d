//! Shared domain types for location resolution and address search.
//!
//! Holds the position and search-result model, distance helpers, the
//! collaborator ports the resolver and aggregator are built against, and
//! env-driven application configuration.

pub mod app_config;
pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod places;
pub mod ports;
pub mod position;
pub mod results;

pub use app_config::{AppConfig, Environment};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, PositionError, RemoteSourceFailure};
pub use geo::{distance_meters, format_distance, format_duration, Coordinates};
pub use places::{load_curated_places, validate_places, CuratedPlace, PlacesFile};
pub use ports::{
    NetworkFix, NetworkLocator, PlacesQuery, PlacesStore, PositionSensor, ReverseGeocoder,
    SensorOptions, SensorReading, TextGeocoder,
};
pub use position::{AddressSource, Position, PositionSource};
pub use results::{GeocodeHit, PlaceRow, SearchResult, SourceType};
