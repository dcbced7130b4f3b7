/**
 * Password Validation
 *
 * Signup runs every configured [`PasswordValidator`] against the candidate
 * password and reports all failures at once under the `password` field.
 *
 * # Default Policy
 *
 * 1. [`UserAttributeSimilarity`] - password must not resemble the email
 * 2. [`MinimumLength`] - at least `PASSWORD_MIN_LENGTH` characters
 * 3. [`CommonPassword`] - not in the embedded list of common passwords
 * 4. [`NumericPassword`] - not made of digits only
 */

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::backend::i18n::{Locale, Message, UserAttribute};

/// Data of the (possibly unsaved) user the password belongs to
#[derive(Debug, Clone, Copy)]
pub struct UserAttributes<'a> {
    pub email: &'a str,
}

/// A single password rule
pub trait PasswordValidator: Send + Sync {
    /// Returns the failure message, if any
    fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Option<Message<'static>>;
}

/// Rejects passwords too similar to the user's attributes
#[derive(Debug, Clone)]
pub struct UserAttributeSimilarity {
    pub max_similarity: f64,
}

impl Default for UserAttributeSimilarity {
    fn default() -> Self {
        Self { max_similarity: 0.7 }
    }
}

impl UserAttributeSimilarity {
    /// Long passwords are not compared against much shorter parts
    fn exceeds_maximum_length_ratio(&self, password: &str, value: &str) -> bool {
        let password_len = password.chars().count();
        let value_len = value.chars().count();
        let length_bound = self.max_similarity / 2.0 * password_len as f64;
        password_len >= 10 * value_len && (value_len as f64) < length_bound
    }

    fn too_similar(&self, password: &str, value: &str) -> bool {
        let value = value.to_lowercase();
        let mut parts: Vec<&str> = value
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .collect();
        parts.push(&value);

        parts.into_iter().any(|part| {
            !self.exceeds_maximum_length_ratio(password, part)
                && quick_ratio(password, part) >= self.max_similarity
        })
    }
}

impl PasswordValidator for UserAttributeSimilarity {
    fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Option<Message<'static>> {
        if user.email.is_empty() {
            return None;
        }
        let password = password.to_lowercase();
        self.too_similar(&password, user.email).then_some(Message::PasswordTooSimilar {
            attribute: UserAttribute::Email,
        })
    }
}

/// Requires a minimum number of characters
#[derive(Debug, Clone)]
pub struct MinimumLength {
    pub min_length: usize,
}

impl Default for MinimumLength {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordValidator for MinimumLength {
    fn validate(&self, password: &str, _user: &UserAttributes<'_>) -> Option<Message<'static>> {
        (password.chars().count() < self.min_length).then_some(Message::PasswordTooShort {
            min_length: self.min_length,
        })
    }
}

/// Rejects passwords found in a list of common passwords
#[derive(Debug, Clone, Default)]
pub struct CommonPassword;

impl PasswordValidator for CommonPassword {
    fn validate(&self, password: &str, _user: &UserAttributes<'_>) -> Option<Message<'static>> {
        let candidate = password.trim().to_lowercase();
        COMMON_PASSWORDS
            .contains(candidate.as_str())
            .then_some(Message::PasswordTooCommon)
    }
}

/// Rejects passwords made only of decimal digits
#[derive(Debug, Clone, Default)]
pub struct NumericPassword;

impl PasswordValidator for NumericPassword {
    fn validate(&self, password: &str, _user: &UserAttributes<'_>) -> Option<Message<'static>> {
        (!password.is_empty() && password.chars().all(|c| c.is_ascii_digit()))
            .then_some(Message::PasswordEntirelyNumeric)
    }
}

/// Ordered list of validators
pub struct PasswordPolicy {
    validators: Vec<Box<dyn PasswordValidator>>,
}

impl PasswordPolicy {
    pub fn new(validators: Vec<Box<dyn PasswordValidator>>) -> Self {
        Self { validators }
    }

    /// The four standard validators
    pub fn default_for(min_length: usize) -> Self {
        Self::new(vec![
            Box::new(UserAttributeSimilarity::default()),
            Box::new(MinimumLength { min_length }),
            Box::new(CommonPassword),
            Box::new(NumericPassword),
        ])
    }

    /// Run every validator, collecting localized messages
    pub fn validate(
        &self,
        password: &str,
        user: &UserAttributes<'_>,
        locale: Locale,
    ) -> Result<(), Vec<String>> {
        let messages: Vec<String> = self
            .validators
            .iter()
            .filter_map(|validator| validator.validate(password, user))
            .map(|message| locale.tr(message))
            .collect();

        if messages.is_empty() {
            Ok(())
        } else {
            Err(messages)
        }
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::default_for(MinimumLength::default().min_length)
    }
}

/// Upper bound on the similarity of two strings: `2 * M / T`, where `M` is
/// the size of their character multiset intersection and `T` their combined
/// length.
pub fn quick_ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_default() += 1;
    }

    let mut matches = 0usize;
    for c in a.chars() {
        if let Some(count) = available.get_mut(&c) {
            if *count > 0 {
                *count -= 1;
                matches += 1;
            }
        }
    }

    2.0 * matches as f64 / total as f64
}

/// Lowercased common passwords, one per line
static COMMON_PASSWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    include_str!("common_passwords.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
});
