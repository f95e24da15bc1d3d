use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default; remote collaborators without a URL or key
/// are simply left unconfigured and their tier/source is skipped at runtime.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_flag = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match optional(var) {
            None => Ok(default),
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got '{raw}'"),
            }),
        }
    };

    let env = parse_environment(&or_default("LOCUS_ENV", "development"))?;
    let log_level = or_default("LOCUS_LOG_LEVEL", "info");
    let cache_dir = PathBuf::from(or_default("LOCUS_CACHE_DIR", "./.locus-cache"));

    let geocoder_base_url = or_default(
        "LOCUS_GEOCODER_BASE_URL",
        "https://maps.googleapis.com/maps/api",
    );
    let geocoder_api_key = optional("LOCUS_GEOCODER_API_KEY");
    let places_store_url = optional("LOCUS_PLACES_STORE_URL");
    let places_store_api_key = optional("LOCUS_PLACES_STORE_API_KEY");
    let ip_locator_url = or_default("LOCUS_IP_LOCATOR_URL", "http://ip-api.com");

    let request_timeout_secs = parse_u64("LOCUS_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("LOCUS_USER_AGENT", "locus/0.1 (location-resolution)");
    let provider_max_retries = parse_u32("LOCUS_PROVIDER_MAX_RETRIES", "2")?;
    let provider_backoff_base_ms = parse_u64("LOCUS_PROVIDER_BACKOFF_BASE_MS", "500")?;

    let enable_network_fallback = parse_flag("LOCUS_ENABLE_NETWORK_FALLBACK", true)?;
    let enable_stored_default = parse_flag("LOCUS_ENABLE_STORED_DEFAULT", true)?;
    let enable_static_fallback = parse_flag("LOCUS_ENABLE_STATIC_FALLBACK", true)?;
    let sensor_max_attempts = parse_u32("LOCUS_SENSOR_MAX_ATTEMPTS", "3")?;
    let sensor_backoff_base_ms = parse_u64("LOCUS_SENSOR_BACKOFF_BASE_MS", "1000")?;

    let search_debounce_ms = parse_u64("LOCUS_SEARCH_DEBOUNCE_MS", "300")?;
    let search_max_results = parse_usize("LOCUS_SEARCH_MAX_RESULTS", "10")?;
    if search_max_results == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "LOCUS_SEARCH_MAX_RESULTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let curated_places_path = optional("LOCUS_CURATED_PLACES_PATH").map(PathBuf::from);

    Ok(AppConfig {
        env,
        log_level,
        cache_dir,
        geocoder_base_url,
        geocoder_api_key,
        places_store_url,
        places_store_api_key,
        ip_locator_url,
        request_timeout_secs,
        user_agent,
        provider_max_retries,
        provider_backoff_base_ms,
        enable_network_fallback,
        enable_stored_default,
        enable_static_fallback,
        sensor_max_attempts,
        sensor_backoff_base_ms,
        search_debounce_ms,
        search_max_results,
        curated_places_path,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LOCUS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
