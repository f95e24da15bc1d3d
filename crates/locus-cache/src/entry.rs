use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached value with its write time and time-to-live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, stored_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            stored_at,
            ttl,
        }
    }

    /// Expired once strictly more than `ttl` has elapsed since `stored_at`.
    ///
    /// A `stored_at` in the future (clock stepped backwards) counts as fresh.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.stored_at).to_std() {
            Ok(age) => age > self.ttl,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_until_ttl_elapses() {
        let start = Utc::now();
        let entry = CacheEntry::new("x", start, Duration::from_secs(300));
        assert!(!entry.is_expired(start));
        assert!(!entry.is_expired(start + chrono::Duration::seconds(300)));
        assert!(entry.is_expired(start + chrono::Duration::seconds(301)));
    }

    #[test]
    fn future_stored_at_is_not_expired() {
        let start = Utc::now();
        let entry = CacheEntry::new(1, start + chrono::Duration::minutes(5), Duration::ZERO);
        assert!(!entry.is_expired(start));
    }
}
