/**
 * Page Route Configuration
 *
 * - `GET /` - Site root
 * - `GET /confirm-email/{token}` - Landing page for confirmation links
 */

use axum::{routing::get, Router};

use crate::backend::pages::{confirm_email, index};
use crate::backend::server::state::AppState;

/// Configure HTML page routes
pub fn configure_page_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/", get(index))
        .route("/confirm-email/{token}", get(confirm_email))
}
