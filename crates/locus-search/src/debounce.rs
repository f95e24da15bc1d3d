//! Per-stream debouncing: only the newest call in a stream gets to run.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Generation counter per logical stream.
///
/// A call takes a ticket, waits out the window, and proceeds only if no
/// newer ticket was issued for the same stream meanwhile, or the newer
/// ticket was taken for an equal key. Checking the ticket again after the
/// work completes discards results overtaken in flight by a different key.
#[derive(Debug)]
pub struct Debouncer<K> {
    window: Duration,
    latest: Mutex<HashMap<String, (u64, K)>>,
}

impl<K: PartialEq> Debouncer<K> {
    /// A zero `window` disables debouncing; every ticket stays current.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            latest: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Issue a new ticket for `stream`, superseding earlier ones.
    pub fn enter(&self, stream: &str, key: K) -> u64 {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let ticket = latest.get(stream).map_or(1, |(t, _)| t + 1);
        latest.insert(stream.to_string(), (ticket, key));
        ticket
    }

    /// `true` while `ticket` is the newest for `stream`, or the newest was
    /// issued for a key equal to `key`.
    #[must_use]
    pub fn is_current(&self, stream: &str, ticket: u64, key: &K) -> bool {
        if self.window.is_zero() {
            return true;
        }
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest
            .get(stream)
            .is_none_or(|(t, k)| *t == ticket || k == key)
    }

    /// Take a ticket and wait out the window.
    ///
    /// Returns the ticket if it is still current afterwards.
    pub async fn settle(&self, stream: &str, key: K) -> Option<u64>
    where
        K: Clone,
    {
        let ticket = self.enter(stream, key.clone());
        if !self.window.is_zero() {
            tokio::time::sleep(self.window).await;
        }
        self.is_current(stream, ticket, &key).then_some(ticket)
    }
}
