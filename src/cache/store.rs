//! Tagged key/value cache storage.
//!
//! [`CacheStore`] is the seam between the content wrapper and whatever holds
//! the bytes. [`MemoryStore`] is the in-process implementation: an LRU of
//! entries plus a tag index, both behind one lock so that a tag invalidation
//! is atomic with respect to every read that starts after it.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;
use tokio::time::Instant;
use tracing::warn;

use super::config::CacheConfig;
use super::keys::{CacheKey, CacheTag};

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache entry codec failed: {0}")]
    Codec(String),
}

/// Storage contract for cached content.
///
/// `ttl == None` stores an entry that only leaves the cache through tag
/// invalidation or capacity eviction.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError>;

    async fn set(
        &self,
        key: CacheKey,
        value: Bytes,
        ttl: Option<Duration>,
        tags: Vec<CacheTag>,
    ) -> Result<(), CacheError>;

    /// Drop every entry carrying `tag`, returning how many were removed.
    async fn invalidate_tag(&self, tag: &CacheTag) -> Result<usize, CacheError>;
}

struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
    tags: Vec<CacheTag>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

struct Inner {
    entries: LruCache<CacheKey, Entry>,
    tags: HashMap<CacheTag, HashSet<CacheKey>>,
}

impl Inner {
    fn register(&mut self, key: &CacheKey, tags: &[CacheTag]) {
        for tag in tags {
            self.tags.entry(tag.clone()).or_default().insert(key.clone());
        }
    }

    fn unregister(&mut self, key: &CacheKey, tags: &[CacheTag]) {
        for tag in tags {
            if let Some(keys) = self.tags.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tags.remove(tag);
                }
            }
        }
    }

    fn remove(&mut self, key: &CacheKey) -> bool {
        match self.entries.pop(key) {
            Some(entry) => {
                self.unregister(key, &entry.tags);
                true
            }
            None => false,
        }
    }
}

/// In-process LRU store with tag-based invalidation.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(config.capacity_non_zero()),
                tags: HashMap::new(),
            }),
        }
    }

    fn lock(&self, op: &'static str) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    op,
                    target_module = SOURCE,
                    result = "poisoned_recovered",
                    "Recovered from poisoned cache lock"
                );
                poisoned.into_inner()
            }
        }
    }

    /// Number of live or not-yet-collected entries.
    pub fn len(&self) -> usize {
        self.lock("len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct tags currently indexed.
    pub fn tag_count(&self) -> usize {
        self.lock("tag_count").tags.len()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let mut inner = self.lock("get");
        let now = Instant::now();

        match inner.entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }

        inner.remove(key);
        Ok(None)
    }

    async fn set(
        &self,
        key: CacheKey,
        value: Bytes,
        ttl: Option<Duration>,
        tags: Vec<CacheTag>,
    ) -> Result<(), CacheError> {
        let mut inner = self.lock("set");
        inner.remove(&key);

        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        inner.register(&key, &tags);
        let evicted = inner.entries.push(
            key,
            Entry {
                value,
                expires_at,
                tags,
            },
        );

        if let Some((evicted_key, evicted_entry)) = evicted {
            inner.unregister(&evicted_key, &evicted_entry.tags);
        }
        Ok(())
    }

    async fn invalidate_tag(&self, tag: &CacheTag) -> Result<usize, CacheError> {
        let mut inner = self.lock("invalidate_tag");
        let keys = inner.tags.remove(tag).unwrap_or_default();

        let mut removed = 0;
        for key in keys {
            if inner.remove(&key) {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
