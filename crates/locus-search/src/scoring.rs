//! Relevance scoring, ranking and deduplication of merged results.

use std::cmp::Ordering;
use std::collections::HashSet;

use locus_core::{distance_meters, Coordinates, SearchResult, SourceType};

use crate::text::MatchKind;

/// Results closer than this to an already kept result are duplicates.
pub const DEDUP_RADIUS_METERS: f64 = 500.0;

const PROXIMITY_MAX_BONUS: f64 = 15.0;
const STORE_RELEVANCE_MAX_BONUS: f64 = 4.0;
const STORE_POPULARITY_MAX_BONUS: f64 = 1.0;
const PROXIMITY_RANGE_METERS: f64 = 20_000.0;

#[must_use]
pub fn source_bonus(source: SourceType) -> f64 {
    match source {
        SourceType::Curated => 30.0,
        SourceType::StructuredStore => 20.0,
        SourceType::GeocodedExternal => 10.0,
    }
}

/// Up to 15 points, decaying linearly to zero at 20 km.
#[must_use]
pub fn proximity_bonus(user: Option<Coordinates>, place: Coordinates) -> f64 {
    let Some(user) = user else {
        return 0.0;
    };
    let d = distance_meters(user, place);
    (PROXIMITY_MAX_BONUS * (1.0 - d / PROXIMITY_RANGE_METERS)).max(0.0)
}

/// Up to 5 points carrying the store's own ranking: server relevance
/// (0..=1) and popularity (0..=100), each clamped. Smaller than the gap
/// between match tiers, so it only orders rows within a tier.
#[must_use]
pub fn store_rank_bonus(relevance: Option<f64>, popularity: f64) -> f64 {
    let unit = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    STORE_RELEVANCE_MAX_BONUS * unit(relevance.unwrap_or(0.0))
        + STORE_POPULARITY_MAX_BONUS * unit(popularity / 100.0)
}

#[must_use]
pub fn score(kind: MatchKind, source: SourceType, user: Option<Coordinates>, place: Coordinates) -> f64 {
    kind.base_score() + source_bonus(source) + proximity_bonus(user, place)
}

/// Total order used for the final list: score descending, then source
/// priority, then title and id so equal inputs always rank identically.
fn compare(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.relevance_score
        .total_cmp(&a.relevance_score)
        .then_with(|| b.source_type.priority().cmp(&a.source_type.priority()))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn rank(results: &mut Vec<SearchResult>, max_results: usize) {
    results.sort_by(compare);
    results.truncate(max_results);
}

/// Drop results that share an id with, or lie within `radius_meters` of,
/// an earlier result. Input order is preserved, so earlier sources win.
#[must_use]
pub fn dedup(results: Vec<SearchResult>, radius_meters: f64) -> Vec<SearchResult> {
    let mut ids = HashSet::new();
    let mut kept: Vec<SearchResult> = Vec::with_capacity(results.len());
    for result in results {
        let near_kept = kept
            .iter()
            .any(|k| distance_meters(k.coordinates(), result.coordinates()) < radius_meters);
        if near_kept || ids.contains(&result.id) {
            tracing::trace!(id = %result.id, "dropping duplicate result");
            continue;
        }
        ids.insert(result.id.clone());
        kept.push(result);
    }
    kept
}
