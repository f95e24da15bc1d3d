//! Multi-source address search.
//!
//! Sources are merged in a fixed order (curated table, structured places
//! store, external text geocoder), deduplicated by distance, scored and
//! ranked. Remote failures count as zero results; an empty merge yields a
//! single unverified fallback entry so callers always have something to show.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use futures::future::FutureExt;
use locus_cache::{geocode_key, ResultCache};
use locus_core::{
    AppConfig, Coordinates, GeocodeHit, PlaceRow, PlacesQuery, PlacesStore, SearchResult,
    SourceType, TextGeocoder,
};
use regex::Regex;

use crate::coalesce::{Coalescer, Signature};
use crate::curated::CuratedTable;
use crate::debounce::Debouncer;
use crate::error::SearchError;
use crate::scoring::{dedup, rank, score, store_rank_bonus, DEDUP_RADIUS_METERS};
use crate::text::{best_match, fold, MatchKind};

/// Queries shorter than this (in characters, after trimming) list popular places.
pub const MIN_QUERY_CHARS: usize = 2;

pub const FALLBACK_BADGE: &str = "unverified";

/// Fallback center when neither the caller nor the curated table knows where
/// the user is (Kinshasa).
const DEFAULT_CENTER: Coordinates = Coordinates::new(-4.3217, 15.3125);

static COORDINATE_LITERAL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d{1,2}(?:\.\d+)?)\s*[,;\s]\s*(-?\d{1,3}(?:\.\d+)?)\s*$").ok()
});

/// Per-call search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchContext {
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
    pub max_results: usize,
}

impl Default for SearchContext {
    fn default() -> Self {
        Self {
            city: None,
            country_code: None,
            user_lat: None,
            user_lng: None,
            max_results: 10,
        }
    }
}

impl SearchContext {
    #[must_use]
    pub fn in_city(city: &str, country_code: &str) -> Self {
        Self {
            city: Some(city.to_string()),
            country_code: Some(country_code.to_string()),
            ..Self::default()
        }
    }

    fn user_position(&self) -> Option<Coordinates> {
        match (self.user_lat, self.user_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)).filter(Coordinates::is_valid),
            _ => None,
        }
    }

    fn stream_key(&self) -> String {
        format!(
            "{}|{}",
            self.city.as_deref().map(fold).unwrap_or_default(),
            self.country_code.as_deref().unwrap_or_default().to_lowercase()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Zero disables debouncing.
    pub debounce: Duration,
    pub memo_ttl: Duration,
    pub store_timeout: Duration,
    pub geocoder_timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            memo_ttl: Duration::from_secs(5 * 60),
            store_timeout: Duration::from_secs(5),
            geocoder_timeout: Duration::from_secs(5),
        }
    }
}

impl SearchSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.search_debounce_ms),
            ..Self::default()
        }
    }
}

/// Data sources the aggregator merges.
pub struct SearchSources {
    pub curated: CuratedTable,
    pub store: Option<Arc<dyn PlacesStore>>,
    pub geocoder: Option<Arc<dyn TextGeocoder>>,
    pub cache: Arc<ResultCache>,
}

struct Inner {
    sources: SearchSources,
    settings: SearchSettings,
    debouncer: Debouncer<Signature>,
    coalescer: Coalescer,
}

/// Cheap to clone; clones share debounce state and in-flight searches.
#[derive(Clone)]
pub struct SearchAggregator {
    inner: Arc<Inner>,
}

impl SearchAggregator {
    #[must_use]
    pub fn new(sources: SearchSources, settings: SearchSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                debouncer: Debouncer::new(settings.debounce),
                coalescer: Coalescer::new(settings.memo_ttl),
                sources,
                settings,
            }),
        }
    }

    /// Ranked, deduplicated results for `query`.
    ///
    /// Queries under two characters return the city's popular places
    /// immediately. Longer queries are debounced per `(city, country)`
    /// stream and coalesced with identical searches in flight. A newer call
    /// with the same signature does not supersede an older one; both get
    /// the shared result.
    ///
    /// # Errors
    ///
    /// [`SearchError::Superseded`] when a newer, different search on the
    /// same stream arrived within the debounce window or while this one was
    /// running.
    pub async fn search(
        &self,
        query: &str,
        ctx: &SearchContext,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            return Ok(self.popular_places(ctx));
        }

        let signature = Signature {
            query: fold(trimmed),
            city: ctx.city.as_deref().map(fold),
            max_results: ctx.max_results,
        };
        let stream = ctx.stream_key();
        let Some(ticket) = self
            .inner
            .debouncer
            .settle(&stream, signature.clone())
            .await
        else {
            tracing::debug!(query = trimmed, "search superseded before running");
            return Err(SearchError::Superseded);
        };

        let inner = Arc::clone(&self.inner);
        let owned_query = trimmed.to_string();
        let owned_ctx = ctx.clone();
        let results = self
            .inner
            .coalescer
            .run(signature.clone(), move || {
                async move { inner.execute(&owned_query, &owned_ctx).await }.boxed()
            })
            .await;

        if !self.inner.debouncer.is_current(&stream, ticket, &signature) {
            tracing::debug!(query = trimmed, "search overtaken in flight, discarding");
            return Err(SearchError::Superseded);
        }
        Ok(results)
    }

    /// Curated places of `ctx.city` by popularity; relevance is the popularity.
    #[must_use]
    pub fn popular_places(&self, ctx: &SearchContext) -> Vec<SearchResult> {
        let city = ctx.city.as_deref().map(fold);
        self.inner
            .sources
            .curated
            .popular(city.as_deref(), ctx.max_results)
            .into_iter()
            .map(|p| SearchResult {
                id: format!("curated:{}", p.id),
                title: p.name.clone(),
                subtitle: p.subtitle.clone(),
                latitude: p.latitude,
                longitude: p.longitude,
                source_type: SourceType::Curated,
                relevance_score: f64::from(p.popularity),
                hierarchy_level: p.hierarchy_level,
                badge: p.badge.clone(),
            })
            .collect()
    }

    /// Drop memoized results, e.g. after the cache was cleared.
    pub fn clear_memo(&self) {
        self.inner.coalescer.clear();
    }
}

impl Inner {
    /// The expensive path: query every source and merge.
    async fn execute(&self, query: &str, ctx: &SearchContext) -> Vec<SearchResult> {
        let folded = fold(query);
        let city = ctx.city.as_deref().map(fold);
        let user = ctx.user_position().or_else(|| {
            self.sources
                .cache
                .get_current_position()
                .map(|p| p.coordinates())
        });

        if let Some(literal) = self.coordinate_literal(query) {
            return vec![literal];
        }

        let mut merged = self.curated_results(&folded, city.as_deref(), user);
        merged.extend(self.store_results(query, &folded, ctx, user).await);
        let mut merged = dedup(merged, DEDUP_RADIUS_METERS);

        if merged.len() < ctx.max_results {
            let hits = self.geocoder_results(query, &folded, ctx, user).await;
            merged.extend(hits);
            merged = dedup(merged, DEDUP_RADIUS_METERS);
        }

        if merged.is_empty() {
            tracing::info!(query, "no source matched, returning fallback entry");
            return vec![self.fallback_entry(query, ctx, city.as_deref(), user)];
        }

        rank(&mut merged, ctx.max_results);
        tracing::debug!(query, results = merged.len(), "search complete");
        merged
    }

    fn curated_results(
        &self,
        folded: &str,
        city: Option<&str>,
        user: Option<Coordinates>,
    ) -> Vec<SearchResult> {
        self.sources
            .curated
            .search(folded, city)
            .into_iter()
            .map(|(p, kind)| SearchResult {
                id: format!("curated:{}", p.id),
                title: p.name.clone(),
                subtitle: p.subtitle.clone(),
                latitude: p.latitude,
                longitude: p.longitude,
                source_type: SourceType::Curated,
                relevance_score: score(kind, SourceType::Curated, user, p.coordinates()),
                hierarchy_level: p.hierarchy_level,
                badge: p.badge.clone(),
            })
            .collect()
    }

    async fn store_results(
        &self,
        query: &str,
        folded: &str,
        ctx: &SearchContext,
        user: Option<Coordinates>,
    ) -> Vec<SearchResult> {
        let Some(store) = &self.sources.store else {
            return Vec::new();
        };
        let places_query = PlacesQuery {
            text: query.to_string(),
            city: ctx.city.clone(),
            country_code: ctx.country_code.clone(),
            user_lat: user.map(|u| u.lat),
            user_lng: user.map(|u| u.lng),
            max_results: ctx.max_results,
            min_hierarchy_level: 1,
        };
        let rows = match tokio::time::timeout(
            self.settings.store_timeout,
            store.query(&places_query),
        )
        .await
        {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                tracing::warn!(source = "places_store", error = %e, "places store query failed");
                return Vec::new();
            }
            Err(_) => {
                tracing::warn!(source = "places_store", query, "places store query timed out");
                return Vec::new();
            }
        };
        tracing::debug!(count = rows.len(), "collected places store rows");
        rows.into_iter()
            .filter(|r| Coordinates::new(r.latitude, r.longitude).is_valid())
            .map(|r| store_row_result(r, folded, user))
            .collect()
    }

    async fn geocoder_results(
        &self,
        query: &str,
        folded: &str,
        ctx: &SearchContext,
        user: Option<Coordinates>,
    ) -> Vec<SearchResult> {
        let Some(geocoder) = &self.sources.geocoder else {
            return Vec::new();
        };
        let augmented = std::iter::once(query)
            .chain(ctx.city.as_deref())
            .chain(ctx.country_code.as_deref())
            .collect::<Vec<_>>()
            .join(", ");
        let hits = match tokio::time::timeout(
            self.settings.geocoder_timeout,
            geocoder.search(&augmented, ctx.country_code.as_deref()),
        )
        .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                tracing::warn!(source = "geocoder", error = %e, "text geocoding failed");
                return Vec::new();
            }
            Err(_) => {
                tracing::warn!(source = "geocoder", query, "text geocoding timed out");
                return Vec::new();
            }
        };
        tracing::debug!(count = hits.len(), "collected geocoder hits");
        hits.into_iter()
            .filter(|h| Coordinates::new(h.lat, h.lng).is_valid())
            .map(|h| {
                self.sources
                    .cache
                    .set_geocode_result(h.lat, h.lng, &h.formatted_address);
                geocode_hit_result(h, folded, user)
            })
            .collect()
    }

    /// `"-4.3217, 15.3125"` style queries become a direct hit.
    fn coordinate_literal(&self, query: &str) -> Option<SearchResult> {
        let captures = COORDINATE_LITERAL.as_ref()?.captures(query)?;
        let lat: f64 = captures.get(1)?.as_str().parse().ok()?;
        let lng: f64 = captures.get(2)?.as_str().parse().ok()?;
        let point = Coordinates::new(lat, lng);
        if !point.is_valid() {
            return None;
        }
        let cached = self.sources.cache.get_geocode_result(lat, lng);
        Some(SearchResult {
            id: format!("coords:{}", geocode_key(lat, lng)),
            title: cached.clone().unwrap_or_else(|| point.to_string()),
            subtitle: None,
            latitude: lat,
            longitude: lng,
            source_type: SourceType::GeocodedExternal,
            relevance_score: score(MatchKind::Exact, SourceType::GeocodedExternal, None, point),
            hierarchy_level: 5,
            badge: cached.is_none().then(|| FALLBACK_BADGE.to_string()),
        })
    }

    fn fallback_entry(
        &self,
        query: &str,
        ctx: &SearchContext,
        city: Option<&str>,
        user: Option<Coordinates>,
    ) -> SearchResult {
        let center = user
            .or_else(|| {
                city.and_then(|c| self.sources.curated.city_center(c))
                    .map(locus_core::CuratedPlace::coordinates)
            })
            .unwrap_or(DEFAULT_CENTER);
        let subtitle = [ctx.city.as_deref(), ctx.country_code.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        SearchResult {
            id: format!("fallback:{query}"),
            title: query.to_string(),
            subtitle: (!subtitle.is_empty()).then_some(subtitle),
            latitude: center.lat,
            longitude: center.lng,
            source_type: SourceType::GeocodedExternal,
            relevance_score: 0.0,
            hierarchy_level: 5,
            badge: Some(FALLBACK_BADGE.to_string()),
        }
    }
}

fn store_row_result(row: PlaceRow, folded: &str, user: Option<Coordinates>) -> SearchResult {
    let subtitle = [row.commune.as_deref(), row.city.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let name = fold(&row.name);
    // The store ranks server-side; rows it returns without a local text
    // match still earn the lowest match tier, and its relevance orders rows
    // within a tier.
    let kind = best_match(folded, [name.as_str()], Some(fold(&subtitle).as_str()))
        .unwrap_or(MatchKind::SubtitleOnly);
    let point = Coordinates::new(row.latitude, row.longitude);
    SearchResult {
        id: format!("store:{}", row.id),
        title: row.name,
        subtitle: (!subtitle.is_empty()).then_some(subtitle),
        latitude: row.latitude,
        longitude: row.longitude,
        source_type: SourceType::StructuredStore,
        relevance_score: score(kind, SourceType::StructuredStore, user, point)
            + store_rank_bonus(row.relevance, row.popularity_score),
        hierarchy_level: row.hierarchy_level.clamp(1, 5),
        badge: None,
    }
}

fn geocode_hit_result(hit: GeocodeHit, folded: &str, user: Option<Coordinates>) -> SearchResult {
    let (title, subtitle) = match hit.formatted_address.split_once(", ") {
        Some((head, rest)) => (head.to_string(), Some(rest.to_string())),
        None => (hit.formatted_address.clone(), None),
    };
    let kind = best_match(
        folded,
        [fold(&title).as_str()],
        subtitle.as_deref().map(fold).as_deref(),
    )
    .unwrap_or(MatchKind::SubtitleOnly);
    let point = Coordinates::new(hit.lat, hit.lng);
    let id = if hit.place_id.is_empty() {
        format!("geocoded:{}", geocode_key(hit.lat, hit.lng))
    } else {
        format!("geocoded:{}", hit.place_id)
    };
    SearchResult {
        id,
        title,
        subtitle,
        latitude: hit.lat,
        longitude: hit.lng,
        source_type: SourceType::GeocodedExternal,
        relevance_score: score(kind, SourceType::GeocodedExternal, user, point),
        hierarchy_level: 4,
        badge: None,
    }
}
