//! Field constraint checks shared by all record types.
//!
//! # Invariants
//! - Length limits are counted in Unicode scalar values, not bytes.
//! - Bounded text fields must not be blank after trimming.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Longest accepted email address.
pub const EMAIL_MAX_CHARS: usize = 254;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("valid email regex")
});

/// Field-level validation failure for record inputs and patches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Required text field is empty or whitespace only.
    Blank { field: &'static str },
    /// Text field exceeds its maximum length.
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Email field does not look like `local@domain.tld`.
    InvalidEmail(String),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "`{field}` must not be blank"),
            Self::TooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "`{field}` has {actual_chars} characters, at most {max_chars} allowed"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
        }
    }
}

impl Error for ModelValidationError {}

/// Checks a required bounded text field.
pub fn validate_bounded_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::Blank { field });
    }

    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(ModelValidationError::TooLong {
            field,
            max_chars,
            actual_chars,
        });
    }

    Ok(())
}

/// Checks email syntax and length.
pub fn validate_email(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    validate_bounded_text(field, value, EMAIL_MAX_CHARS)?;
    if !EMAIL_RE.is_match(value) {
        return Err(ModelValidationError::InvalidEmail(value.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_bounded_text, validate_email, ModelValidationError};

    #[test]
    fn bounded_text_counts_chars_not_bytes() {
        let value = "é".repeat(100);
        assert!(validate_bounded_text("name", &value, 100).is_ok());

        let err = validate_bounded_text("name", &format!("{value}é"), 100).unwrap_err();
        assert_eq!(
            err,
            ModelValidationError::TooLong {
                field: "name",
                max_chars: 100,
                actual_chars: 101,
            }
        );
    }

    #[test]
    fn email_accepts_common_shapes() {
        for value in ["paul@example.com", "first.last+tag@mail.example.co.uk"] {
            assert!(validate_email("email", value).is_ok(), "{value}");
        }
    }

    #[test]
    fn email_rejects_malformed_values() {
        for value in ["no-at-sign", "a@b", "a@@example.com", "a b@example.com"] {
            assert!(matches!(
                validate_email("email", value),
                Err(ModelValidationError::InvalidEmail(_))
            ));
        }
        assert_eq!(
            validate_email("email", "  "),
            Err(ModelValidationError::Blank { field: "email" })
        );
    }
}
