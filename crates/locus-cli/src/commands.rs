//! Subcommand handlers. Each prints pretty JSON to stdout.

use std::sync::Arc;

use locus_core::{AppConfig, PositionSensor, SensorReading};
use locus_resolver::{
    AddressResolver, FixedSensor, PositionResolver, ResolveRequest, ResolverPorts,
    ResolverSettings, UnavailableSensor,
};
use locus_search::{SearchContext, SearchError};

use crate::services::Services;

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolve a position. A fix given on the command line stands in for the
/// device sensor; without one the chain starts from the network tier.
pub(crate) async fn run_locate(
    services: &Services,
    config: &AppConfig,
    fix: Option<(f64, f64)>,
    accuracy: Option<f64>,
    force_refresh: bool,
) -> anyhow::Result<()> {
    let sensor: Arc<dyn PositionSensor> = match fix {
        Some((latitude, longitude)) => Arc::new(FixedSensor(SensorReading {
            latitude,
            longitude,
            accuracy,
        })),
        None => Arc::new(UnavailableSensor),
    };
    let resolver = PositionResolver::from_settings(
        &ResolverSettings::from_app_config(config),
        ResolverPorts {
            sensor,
            network: Some(services.network_locator()),
            reverse_geocoder: services.reverse_geocoder(),
        },
        Arc::clone(&services.cache),
        Arc::clone(&services.clock),
    );

    let position = resolver
        .resolve(&ResolveRequest {
            force_refresh,
            ..ResolveRequest::default()
        })
        .await
        .map_err(|e| anyhow::anyhow!("could not resolve a position: {e}"))?;
    print_json(&position)
}

pub(crate) async fn run_search(
    services: &Services,
    query: &str,
    ctx: &SearchContext,
) -> anyhow::Result<()> {
    match services.search.search(query, ctx).await {
        Ok(results) => print_json(&results),
        Err(SearchError::Superseded) => {
            anyhow::bail!("search was superseded; nothing to print")
        }
    }
}

pub(crate) async fn run_reverse(services: &Services, lat: f64, lng: f64) -> anyhow::Result<()> {
    let point = locus_core::Coordinates::new(lat, lng);
    if !point.is_valid() {
        anyhow::bail!("coordinates out of range: {point}");
    }
    let resolver = AddressResolver::new(Arc::clone(&services.cache), services.reverse_geocoder());
    let resolved = resolver.resolve(point).await;
    print_json(&serde_json::json!({
        "latitude": lat,
        "longitude": lng,
        "address": resolved.address,
        "address_source": resolved.source,
        "verified": resolved.source.is_verified(),
    }))
}

#[allow(clippy::unnecessary_wraps)]
pub(crate) fn run_cache_show(services: &Services) -> anyhow::Result<()> {
    print_json(&services.cache.snapshot())
}

#[allow(clippy::unnecessary_wraps)]
pub(crate) fn run_cache_clear(services: &Services) -> anyhow::Result<()> {
    services.cache.clear_all();
    services.search.clear_memo();
    println!("cache cleared");
    Ok(())
}
