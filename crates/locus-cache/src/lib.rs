//! Result cache for resolved positions and reverse-geocoding lookups.

pub mod entry;
pub mod result_cache;
pub mod storage;

pub use entry::CacheEntry;
pub use result_cache::{geocode_key, CacheSettings, CacheSnapshot, ResultCache};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
