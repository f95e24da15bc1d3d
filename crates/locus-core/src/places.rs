use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::ConfigError;

/// A hand-maintained popular place with search aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedPlace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub subtitle: Option<String>,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub hierarchy_level: u8,
    /// Higher is more popular; orders the short-query listing.
    #[serde(default)]
    pub popularity: u32,
    pub badge: Option<String>,
}

impl CuratedPlace {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Deserialize)]
pub struct PlacesFile {
    pub places: Vec<CuratedPlace>,
}

/// Load and validate a curated places table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_curated_places(path: &Path) -> Result<PlacesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlacesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let places_file: PlacesFile = serde_yaml::from_str(&content)?;

    validate_places(&places_file.places)?;

    Ok(places_file)
}

/// Check ids are unique, names non-empty, coordinates in range and
/// hierarchy levels within 1–5.
///
/// # Errors
///
/// Returns `ConfigError::Validation` describing the first offending entry.
pub fn validate_places(places: &[CuratedPlace]) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for place in places {
        if place.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "place '{}' has an empty name",
                place.id
            )));
        }

        if !(1..=5).contains(&place.hierarchy_level) {
            return Err(ConfigError::Validation(format!(
                "place '{}' has invalid hierarchy level {}; must be 1 through 5",
                place.name, place.hierarchy_level
            )));
        }

        if !place.coordinates().is_valid() {
            return Err(ConfigError::Validation(format!(
                "place '{}' has out-of-range coordinates ({}, {})",
                place.name, place.latitude, place.longitude
            )));
        }

        if !seen_ids.insert(place.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate place id: '{}'",
                place.id
            )));
        }
    }

    Ok(())
}
