/**
 * Authentication Extractor
 *
 * Routes that require a logged-in user take an [`AuthUser`] argument. The
 * extractor reads the JWT from the `Authorization: Bearer` header, verifies
 * it, and loads the user it names. Any failure rejects the request with
 * `401 Unauthorized`.
 */

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::backend::auth::users::{get_user_by_id, User};
use crate::backend::error::ApiError;
use crate::backend::server::state::AppState;

/// Authenticated, active user behind the request's session token
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            tracing::warn!("Missing or malformed Authorization header");
            ApiError::Unauthorized
        })?;

        let claims = state.sessions.verify(token).map_err(|e| {
            tracing::warn!("Invalid token: {:?}", e);
            ApiError::Unauthorized
        })?;

        let user_id = claims.user_id().map_err(|e| {
            tracing::warn!("Invalid user ID in token: {:?}", e);
            ApiError::Unauthorized
        })?;

        let user = get_user_by_id(&state.db_pool, user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| {
                tracing::warn!("Token for unknown or inactive user {}", user_id);
                ApiError::Unauthorized
            })?;

        Ok(AuthUser(user))
    }
}

/// Token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn test_bearer_token_rejects_other_forms() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc")), None);
    }
}
