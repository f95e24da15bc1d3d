//! Distance and formatting helpers.
//!
//! Pure functions over WGS84 coordinates. Nothing here allocates state or
//! can fail for finite input.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `true` when both components are finite and inside
    /// `[-90, 90]` / `[-180, 180]`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Round both components to `decimals` places.
    #[must_use]
    pub fn rounded(&self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        Self {
            lat: (self.lat * factor).round() / factor,
            lng: (self.lng * factor).round() / factor,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Great-circle distance between `a` and `b` in meters (haversine).
#[must_use]
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let to_rad = |deg: f64| deg * PI / 180.0;

    let dlat = to_rad(b.lat - a.lat);
    let dlng = to_rad(b.lng - a.lng);

    let h = (dlat / 2.0).sin().powi(2)
        + to_rad(a.lat).cos() * to_rad(b.lat).cos() * (dlng / 2.0).sin().powi(2);

    // Rounding can push `h` a hair above 1.0 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_METERS * c
}

/// Human-readable distance: whole meters below 1 km, else one decimal of km.
/// The unit is picked after rounding, so `999.6` renders as `"1.0km"`.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    let whole = meters.round();
    if whole < 1000.0 {
        format!("{whole}m")
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

/// Human-readable duration: seconds below a minute, whole minutes below an
/// hour, whole hours beyond that.
///
/// Leftover minutes are dropped in the hour range (`5400` renders as `"2h"`
/// after rounding, not `"1h 30min"`). Each unit is chosen from the rounded
/// value of the smaller one, so `59.7` is `"1min"` and `3599` is `"1h"`.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let whole_seconds = seconds.round();
    if whole_seconds < 60.0 {
        return format!("{whole_seconds}s");
    }
    let minutes = (whole_seconds / 60.0).round();
    if minutes < 60.0 {
        return format!("{minutes}min");
    }
    format!("{}h", (whole_seconds / 3600.0).round())
}
