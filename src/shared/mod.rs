//! Shared Module
//!
//! Types that carry no I/O: application settings and the validation error
//! payload returned by the JSON API.

/// Validation error payloads
pub mod error;

/// Application configuration
pub mod config;

pub use error::ValidationErrors;
pub use config::{ConfigError, Settings, SettingsBuilder};
