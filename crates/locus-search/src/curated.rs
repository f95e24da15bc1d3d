//! In-memory table of curated popular places with search aliases.

use std::path::Path;

use locus_core::{load_curated_places, validate_places, ConfigError, CuratedPlace};

use crate::text::{best_match, fold, MatchKind};

/// A curated place with its folded search keys precomputed.
#[derive(Debug, Clone)]
struct IndexedPlace {
    place: CuratedPlace,
    /// Folded name followed by folded aliases.
    titles: Vec<String>,
    subtitle: Option<String>,
    city: String,
}

impl IndexedPlace {
    fn new(place: CuratedPlace) -> Self {
        let titles = std::iter::once(place.name.as_str())
            .chain(place.aliases.iter().map(String::as_str))
            .map(fold)
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            subtitle: place.subtitle.as_deref().map(fold),
            city: fold(&place.city),
            titles,
            place,
        }
    }

    /// `city` is folded; `None` matches every city.
    fn in_city(&self, city: Option<&str>) -> bool {
        city.is_none_or(|c| self.city == c)
    }
}

#[derive(Debug, Clone)]
pub struct CuratedTable {
    places: Vec<IndexedPlace>,
}

impl CuratedTable {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if ids repeat, a name is empty,
    /// coordinates are out of range or a hierarchy level is outside 1–5.
    pub fn new(places: Vec<CuratedPlace>) -> Result<Self, ConfigError> {
        validate_places(&places)?;
        Ok(Self {
            places: places.into_iter().map(IndexedPlace::new).collect(),
        })
    }

    /// Replace the built-in table with a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or validated.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let file = load_curated_places(path)?;
        tracing::info!(path = %path.display(), places = file.places.len(), "loaded curated places");
        Self::new(file.places)
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self {
            places: builtin_places().into_iter().map(IndexedPlace::new).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.places.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }


    /// Places matching a folded query, in table order.
    ///
    /// `city` must be folded; `None` searches every city.
    #[must_use]
    pub fn search(&self, query: &str, city: Option<&str>) -> Vec<(&CuratedPlace, MatchKind)> {
        self.places
            .iter()
            .filter(|p| p.in_city(city))
            .filter_map(|p| {
                best_match(query, p.titles.iter().map(String::as_str), p.subtitle.as_deref())
                    .map(|kind| (&p.place, kind))
            })
            .collect()
    }

    /// Most popular places of a city, most popular first.
    #[must_use]
    pub fn popular(&self, city: Option<&str>, limit: usize) -> Vec<&CuratedPlace> {
        let mut places: Vec<&CuratedPlace> = self
            .places
            .iter()
            .filter(|p| p.in_city(city))
            .map(|p| &p.place)
            .collect();
        places.sort_by(|a, b| b.popularity.cmp(&a.popularity).then_with(|| a.id.cmp(&b.id)));
        places.truncate(limit);
        places
    }

    /// City-level entry (hierarchy level 1) for a folded city name.
    #[must_use]
    pub fn city_center(&self, city: &str) -> Option<&CuratedPlace> {
        self.places
            .iter()
            .filter(|p| p.in_city(Some(city)))
            .map(|p| &p.place)
            .find(|p| p.hierarchy_level == 1)
    }
}

impl Default for CuratedTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[allow(clippy::too_many_arguments)]
fn place(
    id: &str,
    name: &str,
    aliases: &[&str],
    subtitle: Option<&str>,
    city: &str,
    (latitude, longitude): (f64, f64),
    hierarchy_level: u8,
    popularity: u32,
) -> CuratedPlace {
    CuratedPlace {
        id: id.to_string(),
        name: name.to_string(),
        aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
        subtitle: subtitle.map(str::to_string),
        city: city.to_string(),
        latitude,
        longitude,
        hierarchy_level,
        popularity,
        badge: None,
    }
}

#[rustfmt::skip]
fn builtin_places() -> Vec<CuratedPlace> {
    let mut places = vec![
        place("kin-city", "Kinshasa", &["kin", "kinshasa ville"], Some("RD Congo"), "Kinshasa", (-4.3217, 15.3125), 1, 100),
        place("kin-gombe", "Gombe", &["la gombe"], Some("Kinshasa"), "Kinshasa", (-4.3019, 15.3045), 2, 95),
        place("kin-airport-ndjili", "Aéroport International de N'djili", &["aero", "aeroport", "ndjili airport", "fih"], Some("Nsele, Kinshasa"), "Kinshasa", (-4.3858, 15.4446), 5, 90),
        place("kin-boulevard-30-juin", "Boulevard du 30 Juin", &["30 juin", "boulevard"], Some("Gombe, Kinshasa"), "Kinshasa", (-4.3075, 15.3120), 4, 85),
        place("kin-matonge", "Matonge", &[], Some("Kalamu, Kinshasa"), "Kinshasa", (-4.3330, 15.3150), 3, 82),
        place("kin-rond-point-victoire", "Rond-Point Victoire", &["victoire"], Some("Kalamu, Kinshasa"), "Kinshasa", (-4.3395, 15.3128), 3, 80),
        place("kin-limete", "Limete", &[], Some("Kinshasa"), "Kinshasa", (-4.3570, 15.3500), 2, 78),
        place("kin-unikin", "Université de Kinshasa", &["unikin"], Some("Lemba, Kinshasa"), "Kinshasa", (-4.4190, 15.3090), 5, 75),
        place("kin-ngaliema", "Ngaliema", &[], Some("Kinshasa"), "Kinshasa", (-4.3650, 15.2520), 2, 74),
        place("kin-stade-martyrs", "Stade des Martyrs", &["martyrs", "stade"], Some("Lingwala, Kinshasa"), "Kinshasa", (-4.3330, 15.2960), 5, 72),
        place("kin-gare-centrale", "Gare Centrale", &["gare"], Some("Gombe, Kinshasa"), "Kinshasa", (-4.3005, 15.3140), 5, 70),
        place("kin-beach-ngobila", "Beach Ngobila", &["ngobila", "port"], Some("Gombe, Kinshasa"), "Kinshasa", (-4.2960, 15.3200), 5, 60),
        place("lub-city", "Lubumbashi", &["lushi", "l'shi"], Some("RD Congo"), "Lubumbashi", (-11.6609, 27.4794), 1, 90),
        place("lub-airport-luano", "Aéroport International de la Luano", &["aero", "aeroport", "luano"], Some("Annexe, Lubumbashi"), "Lubumbashi", (-11.5913, 27.5309), 5, 70),
        place("lub-place-poste", "Place de la Poste", &["poste"], Some("Lubumbashi"), "Lubumbashi", (-11.6660, 27.4850), 5, 60),
        place("bzv-city", "Brazzaville", &["brazza"], Some("Congo"), "Brazzaville", (-4.2634, 15.2429), 1, 80),
        place("bzv-airport-maya-maya", "Aéroport Maya-Maya", &["aero", "aeroport", "maya maya"], Some("Brazzaville"), "Brazzaville", (-4.2517, 15.2530), 5, 65),
    ];
    for p in &mut places {
        if p.hierarchy_level == 5 && p.popularity >= 70 {
            p.badge = Some("popular".to_string());
        }
    }
    places
}
