//! Domain layer types and invariants.

pub mod content;
pub mod paths;
