//! Backend Error Module
//!
//! Error types returned by HTTP handlers and their conversion into responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! # Response Mapping
//!
//! - `Validation` - 400 with the field map (`{"email": ["..."]}`)
//! - `Unauthorized` - 401
//! - `ServiceUnavailable` - 503
//! - `Mail` - 502
//! - database, hashing and token failures - 500 with a generic message

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::ApiError;
