//! Search result and upstream row types.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// Origin of a [`SearchResult`], in merge priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Curated,
    StructuredStore,
    GeocodedExternal,
}

impl SourceType {
    /// Higher wins ties. Curated > `StructuredStore` > `GeocodedExternal`.
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            SourceType::Curated => 3,
            SourceType::StructuredStore => 2,
            SourceType::GeocodedExternal => 1,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Curated => write!(f, "curated"),
            SourceType::StructuredStore => write!(f, "structured_store"),
            SourceType::GeocodedExternal => write!(f, "geocoded_external"),
        }
    }
}

/// One ranked address search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Unique within one ranked list.
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub source_type: SourceType,
    pub relevance_score: f64,
    /// 1 = city, 2 = commune, 3 = neighborhood, 4 = street, 5 = point of interest.
    pub hierarchy_level: u8,
    pub badge: Option<String>,
}

impl SearchResult {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Row returned by the structured places store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRow {
    pub id: String,
    pub name: String,
    pub commune: Option<String>,
    pub city: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub hierarchy_level: u8,
    #[serde(default)]
    pub popularity_score: f64,
    /// Server-side text relevance, when the store computes one.
    #[serde(default)]
    pub relevance: Option<f64>,
    /// Server-side distance to the caller's position, when supplied.
    #[serde(default)]
    pub distance_meters: Option<f64>,
}

/// One candidate from the external text geocoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeHit {
    pub formatted_address: String,
    pub lat: f64,
    pub lng: f64,
    pub place_id: String,
}
