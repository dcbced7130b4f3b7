/**
 * Email Confirmation Handler
 *
 * POST /api/auth/confirm-email takes the address and the token from the
 * confirmation link, activates the account and logs the user in.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::confirmations::{confirm_email as consume_confirmation, ConfirmationError, ConfirmationLookup};
use crate::backend::auth::handlers::fields;
use crate::backend::auth::handlers::types::{AuthResponse, ConfirmEmailRequest, UserResponse};
use crate::backend::error::ApiError;
use crate::backend::i18n::{Message, RequestLocale};
use crate::backend::server::state::AppState;
use crate::shared::ValidationErrors;

/// Confirm email handler
///
/// # Errors
///
/// * `400 Bad Request` - missing fields, or `{"errors": ["Invalid link"]}`,
///   or `{"errors": ["Email expired, please register again"]}`
pub async fn confirm_email(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Json(request): Json<ConfirmEmailRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut errors = ValidationErrors::new();
    let email = fields::email(&mut errors, locale, "email", request.email.as_deref());
    let token = fields::required(&mut errors, locale, "token", request.token.as_deref());
    let (Some(email), Some(token)) = (email, token) else {
        return Err(errors.into());
    };

    let lookup = ConfirmationLookup::TokenAndEmail { token, email: &email };
    let user = consume_confirmation(&state.db_pool, lookup, state.settings.email_confirmation_lifetime)
        .await
        .map_err(|e| match e {
            ConfirmationError::NotFound => {
                tracing::warn!("Invalid confirmation link for {}", email);
                ApiError::from(ValidationErrors::non_field(locale.tr(Message::InvalidLink)))
            }
            ConfirmationError::Expired => {
                ApiError::from(ValidationErrors::non_field(locale.tr(Message::EmailExpired)))
            }
            ConfirmationError::Database(e) => ApiError::Database(e),
        })?;

    let token = state.sessions.issue(&user)?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(&user),
    }))
}
