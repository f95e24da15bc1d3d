//! Built-in city centers and their locally named zones.
//!
//! Used for the stored-default tier, the static fallback and the
//! pseudo-address synthesized when the geocoder is unreachable.

use locus_core::{distance_meters, Coordinates};

/// Points farther than this from every city center get raw coordinates.
pub const NEAREST_CITY_RADIUS_METERS: f64 = 55_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub name: &'static str,
    pub center: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityCenter {
    pub name: &'static str,
    pub country_code: &'static str,
    pub center: Coordinates,
    pub zones: &'static [Zone],
}

impl CityCenter {
    /// Display label, e.g. `"Kinshasa, CD"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country_code)
    }
}

const fn zone(name: &'static str, lat: f64, lng: f64) -> Zone {
    Zone {
        name,
        center: Coordinates::new(lat, lng),
    }
}

const KINSHASA_ZONES: &[Zone] = &[
    zone("Gombe", -4.3050, 15.3100),
    zone("Lingwala", -4.3240, 15.2980),
    zone("Barumbu", -4.3170, 15.3280),
    zone("Kinshasa", -4.3290, 15.3130),
    zone("Kintambo", -4.3300, 15.2650),
    zone("Ngaliema", -4.3650, 15.2520),
    zone("Bandalungwa", -4.3420, 15.2860),
    zone("Kasa-Vubu", -4.3380, 15.3020),
    zone("Kalamu", -4.3460, 15.3190),
    zone("Ngiri-Ngiri", -4.3530, 15.3000),
    zone("Bumbu", -4.3700, 15.2900),
    zone("Makala", -4.3850, 15.3080),
    zone("Selembao", -4.3830, 15.2770),
    zone("Lemba", -4.3930, 15.3250),
    zone("Limete", -4.3570, 15.3500),
    zone("Ngaba", -4.3800, 15.3280),
    zone("Matete", -4.3850, 15.3550),
    zone("Kisenso", -4.4100, 15.3450),
    zone("Mont-Ngafula", -4.4400, 15.2700),
    zone("Ndjili", -4.3900, 15.3850),
    zone("Masina", -4.3830, 15.4100),
    zone("Kimbanseke", -4.4300, 15.3950),
    zone("Nsele", -4.3750, 15.4950),
    zone("Maluku", -4.0650, 15.5300),
];

const LUBUMBASHI_ZONES: &[Zone] = &[
    zone("Lubumbashi", -11.6640, 27.4830),
    zone("Kampemba", -11.6450, 27.5050),
    zone("Kenya", -11.6850, 27.4850),
    zone("Katuba", -11.7050, 27.4550),
    zone("Kamalondo", -11.6780, 27.4940),
    zone("Ruashi", -11.6250, 27.5350),
    zone("Annexe", -11.6200, 27.4350),
];

const BRAZZAVILLE_ZONES: &[Zone] = &[
    zone("Poto-Poto", -4.2600, 15.2850),
    zone("Bacongo", -4.2820, 15.2580),
    zone("Moungali", -4.2500, 15.2650),
    zone("Ouenzé", -4.2400, 15.2800),
    zone("Talangaï", -4.2150, 15.2900),
    zone("Makélékélé", -4.2900, 15.2350),
    zone("Mfilou", -4.2600, 15.2100),
];

const GOMA_ZONES: &[Zone] = &[
    zone("Goma", -1.6790, 29.2280),
    zone("Karisimbi", -1.6550, 29.2200),
];

const KISANGANI_ZONES: &[Zone] = &[
    zone("Makiso", 0.5150, 25.1910),
    zone("Tshopo", 0.5400, 25.2050),
    zone("Kabondo", 0.4950, 25.2000),
    zone("Mangobo", 0.5300, 25.1650),
];

/// City centers in stored-default order; the first entry is the default.
pub const CITY_CENTERS: &[CityCenter] = &[
    CityCenter {
        name: "Kinshasa",
        country_code: "CD",
        center: Coordinates::new(-4.3217, 15.3125),
        zones: KINSHASA_ZONES,
    },
    CityCenter {
        name: "Lubumbashi",
        country_code: "CD",
        center: Coordinates::new(-11.6609, 27.4794),
        zones: LUBUMBASHI_ZONES,
    },
    CityCenter {
        name: "Brazzaville",
        country_code: "CG",
        center: Coordinates::new(-4.2634, 15.2429),
        zones: BRAZZAVILLE_ZONES,
    },
    CityCenter {
        name: "Goma",
        country_code: "CD",
        center: Coordinates::new(-1.6792, 29.2228),
        zones: GOMA_ZONES,
    },
    CityCenter {
        name: "Kisangani",
        country_code: "CD",
        center: Coordinates::new(0.5153, 25.1911),
        zones: KISANGANI_ZONES,
    },
];

/// Home city used by the static fallback tier.
pub const HOME_CITY: &CityCenter = &CITY_CENTERS[0];

/// Nearest zone among every city whose center lies within
/// [`NEAREST_CITY_RADIUS_METERS`], labelled `"Zone, City"`.
///
/// A city with no zones contributes its own center under its own name.
#[must_use]
pub fn nearest_zone_label(point: Coordinates) -> Option<String> {
    let mut best: Option<(f64, String)> = None;
    for city in CITY_CENTERS {
        if distance_meters(point, city.center) > NEAREST_CITY_RADIUS_METERS {
            continue;
        }
        let candidates = city
            .zones
            .iter()
            .map(|z| (distance_meters(point, z.center), format!("{}, {}", z.name, city.name)))
            .chain(city.zones.is_empty().then(|| {
                (distance_meters(point, city.center), city.name.to_string())
            }));
        for (distance, label) in candidates {
            if best.as_ref().is_none_or(|(d, _)| distance < *d) {
                best = Some((distance, label));
            }
        }
    }
    best.map(|(_, label)| label)
}

/// City center closest to `point`, if any lies within the radius.
#[must_use]
pub fn nearest_city(point: Coordinates) -> Option<&'static CityCenter> {
    CITY_CENTERS
        .iter()
        .map(|c| (distance_meters(point, c.center), c))
        .filter(|(d, _)| *d <= NEAREST_CITY_RADIUS_METERS)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_in_gombe_is_labelled_gombe() {
        let label = nearest_zone_label(Coordinates::new(-4.3040, 15.3090)).unwrap();
        assert_eq!(label, "Gombe, Kinshasa");
    }

    #[test]
    fn zone_across_the_river_wins_when_closer() {
        let label = nearest_zone_label(Coordinates::new(-4.2605, 15.2845)).unwrap();
        assert_eq!(label, "Poto-Poto, Brazzaville");
    }

    #[test]
    fn remote_point_has_no_zone() {
        assert!(nearest_zone_label(Coordinates::new(48.8566, 2.3522)).is_none());
        assert!(nearest_city(Coordinates::new(48.8566, 2.3522)).is_none());
    }

    #[test]
    fn radius_is_true_distance_not_degree_box() {
        // ~0.45° south of Kinshasa center is about 50 km: inside the radius.
        let inside = Coordinates::new(-4.7717, 15.3125);
        assert_eq!(nearest_city(inside).map(|c| c.name), Some("Kinshasa"));
        // ~0.55° is about 61 km: outside.
        let outside = Coordinates::new(-4.8717, 15.3125);
        assert!(nearest_city(outside).is_none());
    }

    #[test]
    fn table_is_valid() {
        assert_eq!(HOME_CITY.name, "Kinshasa");
        for city in CITY_CENTERS {
            assert!(city.center.is_valid(), "{}", city.name);
            for zone in city.zones {
                assert!(zone.center.is_valid(), "{}", zone.name);
                assert!(
                    distance_meters(zone.center, city.center) < NEAREST_CITY_RADIUS_METERS,
                    "{} is too far from {}",
                    zone.name,
                    city.name
                );
            }
        }
    }
}
