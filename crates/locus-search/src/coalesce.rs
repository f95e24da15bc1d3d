//! In-flight request sharing and short-lived memoization of results.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use locus_core::SearchResult;
use tokio::time::Instant;

type SharedSearch = Shared<BoxFuture<'static, Vec<SearchResult>>>;

/// Canonical identity of a search: folded query, folded city, result cap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub query: String,
    pub city: Option<String>,
    pub max_results: usize,
}

#[derive(Debug)]
struct Memo {
    results: Vec<SearchResult>,
    stored_at: Instant,
}

/// Removes its in-flight entry when released or dropped, provided the entry
/// still holds the same shared future.
struct InflightSlot<'a> {
    inflight: &'a Mutex<HashMap<Signature, SharedSearch>>,
    signature: &'a Signature,
    shared: &'a SharedSearch,
}

impl InflightSlot<'_> {
    fn release(&self) -> bool {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        let same = inflight
            .get(self.signature)
            .is_some_and(|s| s.ptr_eq(self.shared));
        if same {
            inflight.remove(self.signature);
        }
        same
    }
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct Coalescer {
    inflight: Mutex<HashMap<Signature, SharedSearch>>,
    memo: Mutex<HashMap<Signature, Memo>>,
    ttl: Duration,
}

impl Coalescer {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
            memo: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Fresh memoized results for `signature`, if any.
    #[must_use]
    pub fn memoized(&self, signature: &Signature) -> Option<Vec<SearchResult>> {
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        match memo.get(signature) {
            Some(m) if m.stored_at.elapsed() <= self.ttl => Some(m.results.clone()),
            Some(_) => {
                memo.remove(signature);
                None
            }
            None => None,
        }
    }

    /// Number of searches currently in flight.
    #[must_use]
    pub fn inflight_len(&self) -> usize {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run `make()` unless an identical search is in flight or memoized.
    ///
    /// Callers with equal signatures await one shared future. The first
    /// caller to observe completion clears the in-flight slot and memoizes.
    /// A caller dropped before completion clears the slot too, so an
    /// abandoned search is never handed to later callers.
    pub async fn run<F>(&self, signature: Signature, make: F) -> Vec<SearchResult>
    where
        F: FnOnce() -> BoxFuture<'static, Vec<SearchResult>>,
    {
        if let Some(results) = self.memoized(&signature) {
            tracing::debug!(query = %signature.query, "search memo hit");
            return results;
        }

        let shared = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            inflight
                .entry(signature.clone())
                .or_insert_with(|| make().shared())
                .clone()
        };

        let slot = InflightSlot {
            inflight: &self.inflight,
            signature: &signature,
            shared: &shared,
        };
        let results = shared.clone().await;
        let finished_here = slot.release();
        drop(slot);

        if finished_here {
            let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
            let ttl = self.ttl;
            memo.retain(|_, m| m.stored_at.elapsed() <= ttl);
            memo.insert(
                signature,
                Memo {
                    results: results.clone(),
                    stored_at: Instant::now(),
                },
            );
        }
        results
    }

    pub fn clear(&self) {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use locus_core::SourceType;

    use super::*;

    fn sig(query: &str) -> Signature {
        Signature {
            query: query.to_string(),
            city: Some("kinshasa".to_string()),
            max_results: 10,
        }
    }

    fn one_result() -> Vec<SearchResult> {
        vec![SearchResult {
            id: "curated:kin-gombe".to_string(),
            title: "Gombe".to_string(),
            subtitle: None,
            latitude: -4.3019,
            longitude: 15.3045,
            source_type: SourceType::Curated,
            relevance_score: 130.0,
            hierarchy_level: 2,
            badge: None,
        }]
    }

    fn counting_search(calls: &Arc<AtomicUsize>) -> BoxFuture<'static, Vec<SearchResult>> {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            one_result()
        }
        .boxed()
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_identical_searches_share_one_run() {
        let coalescer = Coalescer::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            coalescer.run(sig("gombe"), || counting_search(&calls)),
            coalescer.run(sig("gombe"), || counting_search(&calls)),
        );

        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coalescer.inflight_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn memo_serves_until_ttl() {
        let coalescer = Coalescer::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        coalescer.run(sig("gombe"), || counting_search(&calls)).await;
        coalescer.run(sig("gombe"), || counting_search(&calls)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(301)).await;
        coalescer.run(sig("gombe"), || counting_search(&calls)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_search_frees_its_slot() {
        let coalescer = Coalescer::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            coalescer.run(sig("gombe"), || counting_search(&calls)),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(coalescer.inflight_len(), 0);

        coalescer.run(sig("gombe"), || counting_search(&calls)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(coalescer.memoized(&sig("gombe")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn different_signatures_run_separately() {
        let coalescer = Coalescer::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        coalescer.run(sig("gombe"), || counting_search(&calls)).await;
        coalescer.run(sig("limete"), || counting_search(&calls)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
