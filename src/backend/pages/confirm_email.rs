/**
 * Email Confirmation Landing Page
 *
 * GET /confirm-email/{token} is the link mailed after signup. Following it
 * consumes the confirmation and renders a welcome page; unknown and expired
 * links render an error page with 404 and 410 respectively.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};

use crate::backend::auth::confirmations::{confirm_email as consume_confirmation, ConfirmationError, ConfirmationLookup};
use crate::backend::error::ApiError;
use crate::backend::i18n::{Locale, Message, RequestLocale};
use crate::backend::pages::templates::{escape_html, layout};
use crate::backend::server::state::AppState;

/// GET /confirm-email/{token}
pub async fn confirm_email(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Path(token): Path<String>,
) -> Result<(StatusCode, Html<String>), ApiError> {
    let site_name = &state.settings.site_name;
    let result = consume_confirmation(
        &state.db_pool,
        ConfirmationLookup::Token(&token),
        state.settings.email_confirmation_lifetime,
    )
    .await;

    let (status, html) = match result {
        Ok(user) => (StatusCode::OK, render_welcome(locale, site_name, &user.email)),
        Err(ConfirmationError::NotFound) => (
            StatusCode::NOT_FOUND,
            render_error(locale, site_name, &locale.tr(Message::InvalidLink)),
        ),
        Err(ConfirmationError::Expired) => (
            StatusCode::GONE,
            render_error(locale, site_name, &locale.tr(Message::EmailExpired)),
        ),
        Err(ConfirmationError::Database(e)) => return Err(e.into()),
    };

    Ok((status, Html(html)))
}

pub fn render_welcome(locale: Locale, site_name: &str, email: &str) -> String {
    let title = locale.tr(Message::WelcomeTitle);
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n",
        escape_html(&title),
        escape_html(&locale.tr(Message::WelcomeBody { email })),
    );
    layout(locale, site_name, &title, &body)
}

pub fn render_error(locale: Locale, site_name: &str, error: &str) -> String {
    let title = locale.tr(Message::ErrorTitle);
    let body = format!(
        "<h1>{}</h1>\n<p class=\"error\">{}</p>\n",
        escape_html(&title),
        escape_html(error),
    );
    layout(locale, site_name, &title, &body)
}
