//! Validation Error Payloads
//!
//! Field-keyed validation messages, serialized as
//! `{"field": ["message", ...]}`. Errors that do not belong to a single
//! field are stored under [`ValidationErrors::NON_FIELD`].
//!
//! # Usage
//!
//! ```rust
//! use rest_auth_toolkit::shared::ValidationErrors;
//!
//! let mut errors = ValidationErrors::new();
//! errors.add("email", "This field is required.");
//! assert!(errors.into_result().is_err());
//! ```
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation messages grouped by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(transparent)]
#[error("invalid input in {} field(s)", .0.len())]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Key used for errors that are not tied to a field
    pub const NON_FIELD: &'static str = "errors";

    pub fn new() -> Self {
        Self::default()
    }

    /// Single message attached to `field`
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Single message under the non-field key
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(Self::NON_FIELD, message)
    }

    /// Append a message to `field`
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Append several messages to `field`, keeping their order
    pub fn extend_field<I>(&mut self, field: impl Into<String>, messages: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut messages = messages.into_iter().peekable();
        if messages.peek().is_some() {
            self.0.entry(field.into()).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for `field`
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, `Err(self)` otherwise
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serializes_as_field_map() {
        let mut errors = ValidationErrors::new();
        errors.add("password", "This password is too short.");
        errors.add("password", "This password is too common.");
        errors.add("email", "Enter a valid email address.");

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "email": ["Enter a valid email address."],
                "password": ["This password is too short.", "This password is too common."],
            })
        );
    }

    #[test]
    fn test_non_field_key() {
        let errors = ValidationErrors::non_field("Invalid link");
        assert_eq!(errors.get("errors"), Some(&["Invalid link".to_string()][..]));
    }

    #[test]
    fn test_extend_field_ignores_empty_iterators() {
        let mut errors = ValidationErrors::new();
        errors.extend_field("password", Vec::new());
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }
}
