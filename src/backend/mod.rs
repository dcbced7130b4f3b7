//! Backend Module
//!
//! All server-side code: the Axum router, JSON API handlers, HTML pages,
//! persistence and outbound integrations (SMTP, Facebook Graph API).
//!
//! # Architecture
//!
//! - **`server`** - Settings loading, database setup, `AppState`, app creation
//! - **`routes`** - Router assembly (API routes, page routes, static files)
//! - **`auth`** - Users, email confirmations, sessions, password validation,
//!   Facebook login and the JSON handlers for all of them
//! - **`pages`** - HTML views for the site root and confirmation links
//! - **`i18n`** - Localized user-facing messages
//! - **`mail`** - Confirmation mail composition and delivery
//! - **`middleware`** - Request extractors for authenticated users
//! - **`error`** - `ApiError` and its HTTP response conversion
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── auth/           - Authentication
//! ├── pages/          - HTML views
//! ├── i18n/           - Message catalogue
//! ├── mail/           - Mail delivery
//! ├── middleware/     - Request extractors
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! Handlers share an `AppState` holding the SQLite pool, settings, session
//! keys, the password policy, the mail transport and the Facebook client. Everything in it is either
//! immutable or internally synchronised, so it is cloned freely per request.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Authentication and user management
pub mod auth;

/// HTML pages
pub mod pages;

/// Localized messages
pub mod i18n;

/// Confirmation mail delivery
pub mod mail;

/// Request extractors
pub mod middleware;

/// Backend error types
pub mod error;

pub use error::ApiError;
pub use server::{create_app, AppState};
