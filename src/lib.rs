//! REST Auth Toolkit - Main Library
//!
//! User registration and authentication endpoints for a web application,
//! built on Axum, sqlx and bcrypt.
//!
//! # Overview
//!
//! This library provides:
//! - Signup with configurable password validation
//! - Email confirmation through tokenized links (JSON API and HTML landing page)
//! - Password-based login issuing JWT session tokens
//! - Facebook login from a client-side signed request
//!
//! # Module Structure
//!
//! - **`shared`** - Types without I/O
//!   - Settings and their builder
//!   - Validation error payloads
//!
//! - **`backend`** - Server-side code
//!   - Axum router, handlers and pages
//!   - User and confirmation persistence (SQLite through sqlx)
//!   - Sessions, password validation, Facebook Graph client
//!   - Confirmation mail delivery
//!
//! # Usage
//!
//! ```rust,no_run
//! use rest_auth_toolkit::backend::server::{config::load_settings, create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = load_settings()?;
//! let app = create_app(settings).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `shared::ValidationErrors` carries per-field messages returned to clients
//! - `backend::error::ApiError` maps every handler failure to an HTTP response

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
