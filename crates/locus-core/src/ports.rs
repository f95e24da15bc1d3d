//! Collaborator contracts consumed by the resolver and the aggregator.
//!
//! Methods return boxed futures so implementations can be shared as
//! `Arc<dyn Trait>` and swapped at construction time (HTTP adapters in
//! production, in-process fakes in tests).

use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::{PositionError, RemoteSourceFailure};
use crate::geo::Coordinates;
use crate::results::{GeocodeHit, PlaceRow};

/// Options passed to the device location API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the sensor may hand back.
    pub maximum_age: Duration,
}

/// Raw fix from the device location API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

/// Coarse IP-based location estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkFix {
    pub coordinates: Coordinates,
    pub city: Option<String>,
    pub country_code: Option<String>,
}

/// Parameters of a structured places store lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacesQuery {
    pub text: String,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
    pub max_results: usize,
    pub min_hierarchy_level: u8,
}

/// Live device location API.
pub trait PositionSensor: Send + Sync {
    fn current_position(
        &self,
        options: SensorOptions,
    ) -> BoxFuture<'_, Result<SensorReading, PositionError>>;
}

/// Coordinates to formatted address.
pub trait ReverseGeocoder: Send + Sync {
    fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> BoxFuture<'_, Result<String, RemoteSourceFailure>>;
}

/// Free text to candidate addresses.
pub trait TextGeocoder: Send + Sync {
    fn search<'a>(
        &'a self,
        text: &'a str,
        region_hint: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<GeocodeHit>, RemoteSourceFailure>>;
}

/// Remote structured places store (RPC-style).
pub trait PlacesStore: Send + Sync {
    fn query<'a>(
        &'a self,
        query: &'a PlacesQuery,
    ) -> BoxFuture<'a, Result<Vec<PlaceRow>, RemoteSourceFailure>>;
}

/// Coarse IP geolocation.
pub trait NetworkLocator: Send + Sync {
    fn locate(&self) -> BoxFuture<'_, Result<NetworkFix, RemoteSourceFailure>>;
}
