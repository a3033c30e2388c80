//! Client-side field validation.
//!
//! Forms are checked in full before any store call is made: every failing
//! field is reported at once so a client can show all messages inline.
//!
//! ```
//! use cabinetapp::validation::Validator;
//!
//! let mut v = Validator::new();
//! v.min_chars("first_name", "A", 2, "first name is required");
//! v.email("email", "not-an-email");
//! let errors = v.finish().unwrap_err();
//! assert_eq!(errors.len(), 2);
//! assert!(errors.has("email"));
//! ```

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All field errors collected for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Accumulates field errors.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> bool {
        if !ok {
            self.fail(field, message);
        }
        ok
    }

    /// Value must be non-blank.
    pub fn required(&mut self, field: &str, value: &str) -> bool {
        self.check(
            !value.trim().is_empty(),
            field,
            &format!("{} is required", field.replace('_', " ")),
        )
    }

    /// Value (trimmed) must hold at least `min` characters.
    pub fn min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) -> bool {
        self.check(value.trim().chars().count() >= min, field, message)
    }

    pub fn email(&mut self, field: &str, value: &str) -> bool {
        self.check(is_valid_email(value), field, "invalid email address")
    }

    pub fn http_url(&mut self, field: &str, value: &str) -> bool {
        self.check(is_http_url(value), field, "must be an http(s) URL")
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Shape check only: one `@`, a non-empty local part, and a dotted domain
/// with no empty labels.
pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

pub fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}
