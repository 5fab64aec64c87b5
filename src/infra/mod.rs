//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod http;
pub mod mailer;
pub mod telemetry;
pub mod wordpress;
