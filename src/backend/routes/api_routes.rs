/**
 * API Route Configuration
 *
 * # Routes
 *
 * - `POST /api/auth/signup` - User registration
 * - `POST /api/auth/confirm-email` - Email confirmation
 * - `POST /api/auth/login` - User login
 * - `POST /api/auth/facebook` - Facebook login
 * - `GET /api/auth/me` - Get current user info (requires authentication)
 */

use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::auth::{confirm_email, facebook_login, get_me, login, signup};
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// Only `/api/auth/me` requires a JWT in the `Authorization` header; the
/// other routes are public.
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/confirm-email", post(confirm_email))
        .route("/api/auth/login", post(login))
        .route("/api/auth/facebook", post(facebook_login))
        .route("/api/auth/me", get(get_me))
}
