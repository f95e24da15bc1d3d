use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::results::SearchResult;

/// Which resolution tier produced a [`Position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSource {
    Sensor,
    NetworkEstimate,
    StoredDefault,
    StaticFallback,
    /// Picked by the user from a geocoded search result.
    Geocoded,
}

impl std::fmt::Display for PositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSource::Sensor => write!(f, "sensor"),
            PositionSource::NetworkEstimate => write!(f, "network_estimate"),
            PositionSource::StoredDefault => write!(f, "stored_default"),
            PositionSource::StaticFallback => write!(f, "static_fallback"),
            PositionSource::Geocoded => write!(f, "geocoded"),
        }
    }
}

/// Where the human-readable `address` of a [`Position`] came from.
///
/// Only `Geocoded` and `Cached` are verified by the geocoding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSource {
    Geocoded,
    Cached,
    /// Synthesized from the built-in zone table; plausible, not verified.
    RegionEstimate,
    RawCoordinates,
    /// Label taken from a built-in table entry (city centers, home city).
    BuiltIn,
}

impl AddressSource {
    #[must_use]
    pub fn is_verified(self) -> bool {
        matches!(self, AddressSource::Geocoded | AddressSource::Cached)
    }
}

/// A resolved device position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub source: PositionSource,
    pub address_source: AddressSource,
    pub accuracy_meters: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl Position {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Build a position from a search result the user picked.
    ///
    /// Curated and store rows carry their own label, so the address is
    /// `BuiltIn`; geocoder hits are verified.
    #[must_use]
    pub fn from_search_result(result: &SearchResult, captured_at: DateTime<Utc>) -> Self {
        let address = match &result.subtitle {
            Some(subtitle) if !subtitle.is_empty() => format!("{}, {subtitle}", result.title),
            _ => result.title.clone(),
        };
        let address_source = match result.source_type {
            crate::results::SourceType::GeocodedExternal if result.badge.is_none() => {
                AddressSource::Geocoded
            }
            _ => AddressSource::BuiltIn,
        };
        Self {
            address,
            latitude: result.latitude,
            longitude: result.longitude,
            source: PositionSource::Geocoded,
            address_source,
            accuracy_meters: None,
            captured_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::SourceType;

    fn result(source_type: SourceType, badge: Option<&str>) -> SearchResult {
        SearchResult {
            id: "place:1".to_string(),
            title: "Boulevard du 30 Juin".to_string(),
            subtitle: Some("Gombe, Kinshasa".to_string()),
            latitude: -4.3040,
            longitude: 15.3075,
            source_type,
            relevance_score: 100.0,
            hierarchy_level: 4,
            badge: badge.map(str::to_string),
        }
    }

    #[test]
    fn from_geocoded_result_is_verified() {
        let pos = Position::from_search_result(&result(SourceType::GeocodedExternal, None), Utc::now());
        assert_eq!(pos.source, PositionSource::Geocoded);
        assert_eq!(pos.address, "Boulevard du 30 Juin, Gombe, Kinshasa");
        assert!(pos.address_source.is_verified());
    }

    #[test]
    fn from_unverified_fallback_is_not_verified() {
        let pos = Position::from_search_result(
            &result(SourceType::GeocodedExternal, Some("unverified")),
            Utc::now(),
        );
        assert!(!pos.address_source.is_verified());
    }

    #[test]
    fn position_source_serializes_snake_case() {
        let json = serde_json::to_string(&PositionSource::NetworkEstimate).unwrap();
        assert_eq!(json, "\"network_estimate\"");
        assert_eq!(PositionSource::StoredDefault.to_string(), "stored_default");
    }
}
