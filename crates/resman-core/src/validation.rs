//! Structured input validation.
//!
//! Validation never stops at the first problem: every violated field is
//! collected so a client can fix all of them in one round trip.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of names and titles.
pub const MAX_NAME_LEN: usize = 64;

/// Maximum length of free-form text such as resource notes.
pub const MAX_TEXT_LEN: usize = 4096;

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// The collected violations for one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// Convenience for a single violation.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Accumulates violations across a set of checks.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violation(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.violations.push(FieldViolation {
            field: field.to_string(),
            message: message.into(),
        });
        self
    }

    /// Required, non-blank, at most `max` characters.
    pub fn text(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.violation(field, "is required")
        } else if trimmed.chars().count() > max {
            self.violation(field, format!("must be at most {max} characters"))
        } else {
            self
        }
    }

    /// Like [`Validator::text`] but only when a value is supplied.
    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        match value {
            Some(v) => self.text(field, v, max),
            None => self,
        }
    }

    pub fn positive_id(&mut self, field: &str, value: i64) -> &mut Self {
        if value <= 0 {
            self.violation(field, "must be a positive id")
        } else {
            self
        }
    }

    pub fn password(&mut self, field: &str, value: &str, min_len: usize) -> &mut Self {
        if value.is_empty() {
            self.violation(field, "is required")
        } else if value.chars().count() < min_len {
            self.violation(field, format!("must be at least {min_len} characters"))
        } else {
            self
        }
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        let value = value.trim();
        let well_formed = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            }
            None => false,
        };
        if well_formed {
            self
        } else {
            self.violation(field, "must be a valid email address")
        }
    }

    /// An absolute http(s) URL.
    pub fn link(&mut self, field: &str, value: &str) -> &mut Self {
        let value = value.trim();
        let rest = value
            .strip_prefix("https://")
            .or_else(|| value.strip_prefix("http://"));
        match rest {
            Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => self,
            _ => self.violation(field, "must be an http or https URL"),
        }
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}
