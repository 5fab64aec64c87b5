//! Edge server for a headless WordPress site.
//!
//! Content is fetched from WPGraphQL, cached in-process with per-record
//! revalidate windows, and invalidated by a secret-guarded webhook.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
