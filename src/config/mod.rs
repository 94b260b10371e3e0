//! Configuration model for the atomup CLI.
//!
//! This module defines the Config struct read from the YAML file passed via
//! `--config`. It supports forward-compatible YAML parsing (unknown fields are
//! ignored), defaults for every field, and validation of config values.
//!
//! The library API never reads configuration itself; callers convert a
//! `Config` into [`LockOptions`](crate::locks::LockOptions) and
//! [`RetryPolicy`](crate::locks::RetryPolicy).

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::LogFormat;
