/**
 * Facebook Login Handler
 *
 * POST /api/auth/facebook verifies the signed request from the JS SDK,
 * loads the Facebook profile and logs in (or creates) the matching user.
 *
 * # Failure Responses
 *
 * - app not configured - 503
 * - bad signature, payload or algorithm - `{"signed_request": ["Invalid signed request"]}`
 * - Graph API or network error - `{"errors": ["Facebook login failed"]}`
 * - profile without email - `{"errors": ["Your Facebook account must share an email address"]}`
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::facebook::FacebookError;
use crate::backend::auth::handlers::fields;
use crate::backend::auth::handlers::types::{AuthResponse, FacebookLoginRequest, UserResponse};
use crate::backend::auth::users::{get_or_create_facebook_user, normalize_email};
use crate::backend::error::ApiError;
use crate::backend::i18n::{Locale, Message, RequestLocale};
use crate::backend::server::state::AppState;
use crate::shared::ValidationErrors;

/// Facebook login handler
pub async fn facebook_login(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Json(request): Json<FacebookLoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let client = state.facebook.as_ref().ok_or_else(|| {
        tracing::error!("Facebook login attempted but no Facebook app is configured");
        ApiError::service_unavailable("Facebook login is not configured")
    })?;

    let mut errors = ValidationErrors::new();
    let Some(raw) = fields::required(&mut errors, locale, "signed_request", request.signed_request.as_deref()) else {
        return Err(errors.into());
    };

    let signed_request = client
        .parse_signed_request(raw)
        .map_err(|e| facebook_error(e, locale))?;
    let login = client
        .login(&signed_request)
        .await
        .map_err(|e| facebook_error(e, locale))?;

    let email = normalize_email(&login.email);
    let (user, created) = get_or_create_facebook_user(&state.db_pool, &email, &login.link).await?;
    if created {
        tracing::info!("New user {} signed up with Facebook", user.id);
    }

    let token = state.sessions.issue(&user)?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

fn facebook_error(error: FacebookError, locale: Locale) -> ApiError {
    tracing::warn!("Facebook login failed: {}", error);
    let errors = match error {
        FacebookError::InvalidSignedRequest(_) => {
            ValidationErrors::field("signed_request", locale.tr(Message::InvalidSignedRequest))
        }
        FacebookError::MissingEmail => ValidationErrors::non_field(locale.tr(Message::FacebookEmailRequired)),
        FacebookError::Http(_) | FacebookError::Graph { .. } | FacebookError::Decode(_) => {
            ValidationErrors::non_field(locale.tr(Message::FacebookLoginFailed))
        }
    };
    errors.into()
}
