//! Read-through content cache.
//!
//! Wraps an upstream fetch in a keyed, tagged, TTL-bound entry. The TTL comes
//! from the fetched value itself, so it is stored alongside the content at
//! write time. Misses on the same key share one upstream fetch, and tag
//! invalidation is fenced against fetches that started before it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::FutureExt;
use metrics::{counter, histogram};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::application::sources::FetchError;

use super::flight::{FlightRole, SingleFlight};
use super::keys::{CacheKey, CacheTag};
use super::store::{CacheError, CacheStore};

const SOURCE: &str = "hollow::cache::content";

/// How a value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// The cache was skipped entirely (preview requests).
    Bypass,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub status: CacheStatus,
}

type FlightOutput = Result<Option<Bytes>, FetchError>;

pub struct ContentCache {
    store: Arc<dyn CacheStore>,
    flight: SingleFlight<FlightOutput>,
    /// Invalidation epoch. Writers hold the read side while storing, so an
    /// invalidation (write side) never interleaves with a write of older data.
    epoch: Arc<RwLock<u64>>,
}

impl ContentCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            flight: SingleFlight::new(),
            epoch: Arc::new(RwLock::new(0)),
        }
    }

    /// Return the cached value for `key`, or fetch, store and return it.
    ///
    /// `Ok(None)` (not found) is never cached. Fetch failures are returned to
    /// every waiting caller and never replaced by stale data.
    pub async fn get_or_fetch<T, F, Fut, R>(
        &self,
        key: CacheKey,
        tags: Vec<CacheTag>,
        ttl_of: R,
        fetch: F,
    ) -> Result<Option<Cached<T>>, FetchError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, FetchError>> + Send + 'static,
        R: FnOnce(&T) -> Option<Duration> + Send + 'static,
    {
        match self.store.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    counter!("hollow_cache_hit_total").increment(1);
                    debug!(target = SOURCE, key = %key, outcome = "hit", "serving cached entry");
                    return Ok(Some(Cached {
                        value,
                        status: CacheStatus::Hit,
                    }));
                }
                Err(err) => {
                    warn!(target = SOURCE, key = %key, error = %err, "discarding undecodable cache entry");
                }
            },
            Ok(None) => {}
            Err(err) => {
                warn!(target = SOURCE, key = %key, error = %err, "cache read failed, treating as miss");
            }
        }

        counter!("hollow_cache_miss_total").increment(1);

        let epoch = *self.epoch.read().await;
        let flight_key = format!("{epoch}:{key}");
        let store = Arc::clone(&self.store);
        let fence = Arc::clone(&self.epoch);

        let (output, role) = self
            .flight
            .run(&flight_key, move || {
                let upstream = fetch();
                async move {
                    let started = Instant::now();
                    let fetched = upstream.await;
                    histogram!("hollow_upstream_fetch_ms")
                        .record(started.elapsed().as_secs_f64() * 1000.0);

                    let Some(value) = fetched? else {
                        return Ok(None);
                    };
                    let ttl = ttl_of(&value);
                    let bytes = Bytes::from(serde_json::to_vec(&value).map_err(FetchError::decode)?);

                    let current = fence.read().await;
                    if *current == epoch {
                        if let Err(err) = store.set(key.clone(), bytes.clone(), ttl, tags).await {
                            warn!(target = SOURCE, key = %key, error = %err, "cache write failed");
                        }
                    } else {
                        debug!(
                            target = SOURCE,
                            key = %key,
                            "skipping cache write for fetch started before an invalidation"
                        );
                    }
                    drop(current);

                    Ok(Some(bytes))
                }
                .boxed()
            })
            .await;

        if role == FlightRole::Follower {
            counter!("hollow_cache_shared_fetch_total").increment(1);
        }

        match output? {
            Some(bytes) => {
                let value = serde_json::from_slice::<T>(&bytes).map_err(FetchError::decode)?;
                Ok(Some(Cached {
                    value,
                    status: CacheStatus::Miss,
                }))
            }
            None => Ok(None),
        }
    }

    /// Drop every entry carrying `tag`. Reads starting after this returns do
    /// not observe the removed entries, and fetches already in flight will not
    /// write them back.
    pub async fn invalidate_tag(&self, tag: &CacheTag) -> Result<usize, CacheError> {
        let mut epoch = self.epoch.write().await;
        *epoch += 1;
        let removed = self.store.invalidate_tag(tag).await?;
        counter!("hollow_cache_invalidate_total").increment(1);
        debug!(target = SOURCE, tag = %tag, removed, "invalidated cache tag");
        Ok(removed)
    }
}
