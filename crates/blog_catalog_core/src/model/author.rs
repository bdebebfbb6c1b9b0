//! Author record.
//!
//! # Invariants
//! - `name` is 1..=200 characters and not blank.
//! - `email` matches `local@domain.tld` syntax.

use crate::model::field::{Field, FieldKind, FieldValue};
use crate::model::validation::{validate_bounded_text, validate_email, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const AUTHOR_NAME_MAX_CHARS: usize = 200;

/// Store-assigned author id.
pub type AuthorId = i64;

/// Persisted author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_author_fields(&self.name, &self.email)
    }

    /// Applies set patch fields in place without validation.
    pub fn apply(&mut self, patch: &AuthorPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
    }
}

impl Display for Author {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Input for creating an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    pub email: String,
}

impl NewAuthor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_author_fields(&self.name, &self.email)
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl AuthorPatch {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(name) = &self.name {
            validate_bounded_text("name", name, AUTHOR_NAME_MAX_CHARS)?;
        }
        if let Some(email) = &self.email {
            validate_email("email", email)?;
        }
        Ok(())
    }

    pub fn assignments(&self) -> Vec<(AuthorField, FieldValue)> {
        let mut assignments = Vec::new();
        if let Some(name) = &self.name {
            assignments.push((AuthorField::Name, FieldValue::from(name.as_str())));
        }
        if let Some(email) = &self.email {
            assignments.push((AuthorField::Email, FieldValue::from(email.as_str())));
        }
        assignments
    }
}

/// Queryable author fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorField {
    Id,
    Name,
    Email,
}

impl Field for AuthorField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Self::Id => FieldKind::Id,
            Self::Name | Self::Email => FieldKind::Text,
        }
    }
}

fn validate_author_fields(name: &str, email: &str) -> Result<(), ModelValidationError> {
    validate_bounded_text("name", name, AUTHOR_NAME_MAX_CHARS)?;
    validate_email("email", email)
}
