//! Declarative request validation.
//!
//! Each endpoint lists its fields with a slice of [`Rule`]s; the
//! [`Validator`] walks them and collects every failure into a
//! [`FieldErrors`] map instead of stopping at the first one.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::AppError;

/// Field name -> messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Short human summary: the first message, plus a count of the rest.
    pub fn summary(&self) -> String {
        let total: usize = self.0.values().map(Vec::len).sum();
        let first = self
            .0
            .values()
            .flat_map(|m| m.iter())
            .next()
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".into());
        match total {
            0 | 1 => first,
            2 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {} more errors)", n - 1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Must be present and not blank.
    Required,
    /// May be absent, but if present must not be blank.
    Filled,
    MinLen(usize),
    MaxLen(usize),
    Email,
    /// Letters, digits, dots, dashes and underscores only.
    Username,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `rules` to one field. Absent values are skipped unless the
    /// rules include [`Rule::Required`].
    pub fn check(&mut self, field: &str, value: Option<&str>, rules: &[Rule]) -> &mut Self {
        let label = field.replace('_', " ");
        let required = rules.iter().any(|r| matches!(r, Rule::Required));

        let Some(value) = value else {
            if required {
                self.errors.push(field, format!("The {label} field is required."));
            }
            return self;
        };

        if value.trim().is_empty() {
            if required {
                self.errors.push(field, format!("The {label} field is required."));
                return self;
            }
            if rules.iter().any(|r| matches!(r, Rule::Filled)) {
                self.errors.push(field, format!("The {label} field must not be empty."));
                return self;
            }
        }

        let len = value.chars().count();
        for rule in rules {
            match *rule {
                Rule::Required | Rule::Filled => {}
                Rule::MinLen(min) if len < min => {
                    self.errors
                        .push(field, format!("The {label} field must be at least {min} characters."));
                }
                Rule::MaxLen(max) if len > max => {
                    self.errors
                        .push(field, format!("The {label} field must not exceed {max} characters."));
                }
                Rule::Email if !is_valid_email(value) => {
                    self.errors
                        .push(field, format!("The {label} field must be a valid email address."));
                }
                Rule::Username if !is_valid_username(value) => {
                    self.errors.push(
                        field,
                        format!(
                            "The {label} field may only contain letters, numbers, dots, dashes and underscores."
                        ),
                    );
                }
                Rule::OneOf(allowed) if !allowed.contains(&value) => {
                    self.errors.push(
                        field,
                        format!("The {label} field must be one of: {}.", allowed.join(", ")),
                    );
                }
                _ => {}
            }
        }
        self
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(field, message);
        self
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains(field)
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9._-]+$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Escape characters that would let stored text be interpreted as markup.
pub fn escape_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
