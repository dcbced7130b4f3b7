//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! ├── page_routes.rs  - HTML pages
//! └── api_routes.rs   - JSON API endpoints
//! ```
//!
//! # Routes
//!
//! - `GET /` - Site root
//! - `GET /confirm-email/{token}` - Confirmation link landing page
//! - `POST /api/auth/signup` - User registration
//! - `POST /api/auth/confirm-email` - Email confirmation
//! - `POST /api/auth/login` - User login
//! - `POST /api/auth/facebook` - Facebook login
//! - `GET /api/auth/me` - Get current user
//! - `/static/*` - Files from `public/`
//!
//! Anything else answers 404.

/// Main router creation
pub mod router;

/// HTML page routes
pub mod page_routes;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
