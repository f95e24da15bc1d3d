//! Address search over curated places, a structured places store and an
//! external text geocoder.

pub mod aggregator;
pub mod coalesce;
pub mod curated;
pub mod debounce;
pub mod error;
pub mod scoring;
pub mod text;

pub use aggregator::{SearchAggregator, SearchContext, SearchSettings, SearchSources};
pub use curated::CuratedTable;
pub use error::SearchError;
