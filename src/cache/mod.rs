//! Content caching for the edge server.
//!
//! - [`store`]: tagged, TTL-aware key/value storage behind the [`CacheStore`] seam
//! - [`content`]: read-through wrapper with per-record TTL and single-flight fetches
//! - [`keys`]: cache keys and invalidation tags
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! capacity = 1024
//! default_revalidate_seconds = 3600
//! search_index_ttl_seconds = 300
//! search_index_fallback_ttl_seconds = 60
//! ```

mod config;
mod content;
mod flight;
mod keys;
mod store;

pub use config::CacheConfig;
pub use content::{CacheStatus, Cached, ContentCache};
pub use flight::{FlightRole, SingleFlight};
pub use keys::{CacheKey, CacheTag, ROOT_TAG, SEARCH_INDEX, content_tags};
pub use store::{CacheError, CacheStore, MemoryStore};
