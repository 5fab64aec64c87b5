//! Cache configuration.
//!
//! Controls the in-memory store capacity and the revalidate windows applied by
//! the content wrapper and the search-index cache.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::domain::content::DEFAULT_REVALIDATE_SECS;

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_SEARCH_INDEX_TTL_SECS: u64 = 300;
const DEFAULT_SEARCH_INDEX_FALLBACK_TTL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries held by the in-memory store.
    pub capacity: usize,
    /// Revalidate window for records that carry no setting of their own.
    pub default_revalidate_secs: u64,
    /// TTL of a healthy search-index payload.
    pub search_index_ttl_secs: u64,
    /// TTL of a degraded search-index payload.
    pub search_index_fallback_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_revalidate_secs: DEFAULT_REVALIDATE_SECS,
            search_index_ttl_secs: DEFAULT_SEARCH_INDEX_TTL_SECS,
            search_index_fallback_ttl_secs: DEFAULT_SEARCH_INDEX_FALLBACK_TTL_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            capacity: settings.capacity.get(),
            default_revalidate_secs: settings.default_revalidate_seconds.get(),
            search_index_ttl_secs: settings.search_index_ttl_seconds.get(),
            search_index_fallback_ttl_secs: settings.search_index_fallback_ttl_seconds.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn search_index_ttl(&self) -> Duration {
        Duration::from_secs(self.search_index_ttl_secs)
    }

    pub fn search_index_fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.search_index_fallback_ttl_secs)
    }
}
