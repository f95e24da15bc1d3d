//! HTTP adapters for the geocoding provider, the IP locator and the
//! structured places store.
//!
//! Each client implements the matching port from `locus_core`, so the
//! resolver and aggregator only ever see `Arc<dyn Trait>`.

pub mod error;
pub mod geocoding;
pub mod http;
pub mod ip_locator;
pub mod places_store;
pub(crate) mod retry;

pub use error::ProviderError;
pub use geocoding::GeocodingClient;
pub use http::HttpSettings;
pub use ip_locator::IpLocatorClient;
pub use places_store::PlacesStoreClient;
