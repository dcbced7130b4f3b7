//! Server Module
//!
//! This module contains the server-side code for initializing and configuring
//! the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - Settings and database loading
//! └── init.rs         - Server initialization and app creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `.env` and environment variables into `Settings`
//! 2. **Database**: SQLite pool opened and migrated
//! 3. **State Creation**: session keys, password policy, mailer, Facebook client
//! 4. **Router Creation**: pages, API routes, static files and tracing
//!
//! # Example
//!
//! ```rust,no_run
//! use rest_auth_toolkit::backend::server::{config::load_settings, create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = load_settings()?;
//! let app = create_app(settings).await?;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Settings and database loading
pub mod config;

/// Server initialization
pub mod init;

pub use init::{create_app, create_app_with, InitError};
pub use state::AppState;
