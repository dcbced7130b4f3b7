/**
 * Get Current User Handler
 *
 * GET /api/auth/me returns the user behind the `Authorization: Bearer`
 * session token. Token checks live in the [`AuthUser`] extractor.
 */

use axum::response::Json;

use crate::backend::auth::handlers::types::UserResponse;
use crate::backend::middleware::auth::AuthUser;

/// Get current user handler
///
/// # Errors
///
/// * `401 Unauthorized` - missing, invalid or expired token, unknown or
///   inactive user
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}
