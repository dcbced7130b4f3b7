/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Page routes (site root, confirmation links)
 * 2. API routes (auth)
 * 3. Static files under `/static`
 * 4. Fallback handler (404)
 */

use axum::{http::StatusCode, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::page_routes::configure_page_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// Static files are served from the `public` directory. Every request is
/// traced through `tower_http::trace::TraceLayer`.
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new();

    // Add page routes
    let router = configure_page_routes(router);

    // Add API routes
    let router = configure_api_routes(router);

    // Add static file serving
    let router = router.nest_service("/static", ServeDir::new("public"));

    // Fallback handler for 404
    let router = router.fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") });

    router.layer(TraceLayer::new_for_http()).with_state(app_state)
}
