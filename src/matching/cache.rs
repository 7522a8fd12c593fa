//! Time-bounded memoization of ranked results
//!
//! Repeated recommendation requests within a short window rescore
//! nothing. The cache changes latency, not correctness: a cold cache
//! and a warm cache produce identical output for the same inputs.
//!
//! Staleness is bounded only by the TTL; there is no invalidation on
//! pod or profile mutation. That trade-off is accepted: recommendation
//! freshness within a few minutes is good enough, and the store stays
//! the source of truth.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use crate::model::MatchResult;

struct CacheEntry {
    computed_at: DateTime<Utc>,
    results: Vec<MatchResult>,
}

/// In-process cache of ranked results keyed by (user, limit)
pub struct MatchCache {
    ttl: Duration,
    entries: Mutex<HashMap<(String, usize), CacheEntry>>,
}

impl MatchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached result list for (user_id, limit) when fresh,
    /// otherwise run `compute`, store its output stamped now, and
    /// return it.
    ///
    /// Concurrent misses for the same key may each recompute; the last
    /// writer wins. Duplicate work is acceptable, wrong results are
    /// not, and compute is pure over store state.
    pub async fn get_or_compute<F, Fut>(
        &self,
        user_id: &str,
        limit: usize,
        compute: F,
    ) -> Result<Vec<MatchResult>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<MatchResult>>>,
    {
        self.get_or_compute_at(user_id, limit, Utc::now(), compute).await
    }

    /// Clock-injected variant backing `get_or_compute`; lets tests
    /// drive TTL expiry deterministically.
    pub async fn get_or_compute_at<F, Fut>(
        &self,
        user_id: &str,
        limit: usize,
        now: DateTime<Utc>,
        compute: F,
    ) -> Result<Vec<MatchResult>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<MatchResult>>>,
    {
        let key = (user_id.to_string(), limit);

        // Lock scope kept tight; never held across the compute await
        {
            let entries = self.entries.lock().unwrap();
            if let Some(entry) = entries.get(&key) {
                if now - entry.computed_at < self.ttl {
                    tracing::debug!("Match cache hit for user {} (limit {})", user_id, limit);
                    return Ok(entry.results.clone());
                }
            }
        }

        tracing::debug!("Match cache miss for user {} (limit {})", user_id, limit);
        let results = compute().await?;

        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            CacheEntry {
                computed_at: now,
                results: results.clone(),
            },
        );
        Ok(results)
    }

    /// Number of live entries, fresh or stale
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
