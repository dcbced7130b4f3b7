//! Middleware Module
//!
//! Request processing shared by several handlers.
//!
//! - **`auth`** - the [`AuthUser`] extractor for routes that need a session

pub mod auth;

pub use auth::AuthUser;
