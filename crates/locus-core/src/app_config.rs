use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub cache_dir: PathBuf,
    pub geocoder_base_url: String,
    pub geocoder_api_key: Option<String>,
    pub places_store_url: Option<String>,
    pub places_store_api_key: Option<String>,
    pub ip_locator_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub provider_max_retries: u32,
    pub provider_backoff_base_ms: u64,
    pub enable_network_fallback: bool,
    pub enable_stored_default: bool,
    pub enable_static_fallback: bool,
    pub sensor_max_attempts: u32,
    pub sensor_backoff_base_ms: u64,
    pub search_debounce_ms: u64,
    pub search_max_results: usize,
    pub curated_places_path: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("cache_dir", &self.cache_dir)
            .field("geocoder_base_url", &self.geocoder_base_url)
            .field(
                "geocoder_api_key",
                &self.geocoder_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("places_store_url", &self.places_store_url)
            .field(
                "places_store_api_key",
                &self.places_store_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("ip_locator_url", &self.ip_locator_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("provider_max_retries", &self.provider_max_retries)
            .field("provider_backoff_base_ms", &self.provider_backoff_base_ms)
            .field("enable_network_fallback", &self.enable_network_fallback)
            .field("enable_stored_default", &self.enable_stored_default)
            .field("enable_static_fallback", &self.enable_static_fallback)
            .field("sensor_max_attempts", &self.sensor_max_attempts)
            .field("sensor_backoff_base_ms", &self.sensor_backoff_base_ms)
            .field("search_debounce_ms", &self.search_debounce_ms)
            .field("search_max_results", &self.search_max_results)
            .field("curated_places_path", &self.curated_places_path)
            .finish()
    }
}
