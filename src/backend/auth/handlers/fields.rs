//! Request field checks shared by the handlers.
//!
//! Each check records its message on the given field and returns the cleaned
//! value only when the field is valid, so handlers can gather every field's
//! errors before failing.

use crate::backend::auth::users::{is_valid_email, normalize_email};
use crate::backend::i18n::{Locale, Message};
use crate::shared::ValidationErrors;

/// Present and not blank
///
/// The value is returned untouched; passwords keep surrounding spaces.
pub fn required<'a>(
    errors: &mut ValidationErrors,
    locale: Locale,
    field: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ => {
            errors.add(field, locale.tr(Message::FieldRequired));
            None
        }
    }
}

/// Required, trimmed, and a syntactically valid address
///
/// Returns the normalized address.
pub fn email(
    errors: &mut ValidationErrors,
    locale: Locale,
    field: &str,
    value: Option<&str>,
) -> Option<String> {
    let value = required(errors, locale, field, value)?.trim();
    if !is_valid_email(value) {
        errors.add(field, locale.tr(Message::InvalidEmail));
        return None;
    }
    Some(normalize_email(value))
}
