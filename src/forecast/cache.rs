use super::clock::Clock;
use super::types::CombinedRawResponse;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

const MAX_ENTRIES: u64 = 1000;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: CombinedRawResponse,
    pub stored_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    /// An entry is servable strictly before `stored_at + ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match (now - self.stored_at).to_std() {
            Ok(age) => age < self.ttl,
            // now is before stored_at
            Err(_) => true,
        }
    }
}

/// Raw upstream responses keyed by query fingerprint.
///
/// moka evicts on its own timer as well; the clock check on read is what
/// decides freshness.
pub struct WeatherCache {
    entries: Cache<String, Arc<CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl WeatherCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let entries = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();

        Self {
            entries,
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the entry if present and not expired. Expired entries are
    /// dropped on the way out.
    pub async fn get(&self, key: &str) -> Option<Arc<CacheEntry>> {
        let Some(entry) = self.entries.get(key).await else {
            tracing::debug!(key, "cache miss");
            return None;
        };
        if entry.is_fresh(self.clock.now()) {
            tracing::debug!(key, "cache hit");
            Some(entry)
        } else {
            tracing::debug!(key, "cache entry expired");
            self.entries.invalidate(key).await;
            None
        }
    }

    pub async fn set(&self, key: &str, value: CombinedRawResponse) {
        let entry = CacheEntry {
            key: key.to_string(),
            value,
            stored_at: self.clock.now(),
            ttl: self.ttl,
        };
        self.entries.insert(key.to_string(), Arc::new(entry)).await;
    }

    pub async fn delete(&self, key: &str) {
        self.entries.invalidate(key).await;
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}
