//! Application services: page templates, revalidation, search index, preview
//! and newsletter, plus the traits for the upstream services they depend on.

pub mod error;
pub mod newsletter;
pub mod preview;
pub mod revalidate;
pub mod search_index;
pub mod site;
pub mod sources;
