//! Blog record.
//!
//! # Invariants
//! - `name` is 1..=100 characters and not blank.
//! - `tagline` is unbounded and may be empty.

use crate::model::field::{Field, FieldKind, FieldValue};
use crate::model::validation::{validate_bounded_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const BLOG_NAME_MAX_CHARS: usize = 100;

/// Store-assigned blog id.
pub type BlogId = i64;

/// Persisted blog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: BlogId,
    pub name: String,
    pub tagline: String,
}

impl Blog {
    /// Checks field constraints on the current values.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_bounded_text("name", &self.name, BLOG_NAME_MAX_CHARS)
    }

    /// Applies set patch fields in place without validation.
    pub fn apply(&mut self, patch: &BlogPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(tagline) = &patch.tagline {
            self.tagline = tagline.clone();
        }
    }
}

impl Display for Blog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Input for creating a blog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlog {
    pub name: String,
    pub tagline: String,
}

impl NewBlog {
    pub fn new(name: impl Into<String>, tagline: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tagline: tagline.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_bounded_text("name", &self.name, BLOG_NAME_MAX_CHARS)
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPatch {
    pub name: Option<String>,
    pub tagline: Option<String>,
}

impl BlogPatch {
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            name: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn tagline(value: impl Into<String>) -> Self {
        Self {
            tagline: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(name) = &self.name {
            validate_bounded_text("name", name, BLOG_NAME_MAX_CHARS)?;
        }
        Ok(())
    }

    /// Column assignments for the fields that are set.
    pub fn assignments(&self) -> Vec<(BlogField, FieldValue)> {
        let mut assignments = Vec::new();
        if let Some(name) = &self.name {
            assignments.push((BlogField::Name, FieldValue::from(name.as_str())));
        }
        if let Some(tagline) = &self.tagline {
            assignments.push((BlogField::Tagline, FieldValue::from(tagline.as_str())));
        }
        assignments
    }
}

/// Queryable blog fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlogField {
    Id,
    Name,
    Tagline,
}

impl Field for BlogField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Tagline => "tagline",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Self::Id => FieldKind::Id,
            Self::Name | Self::Tagline => FieldKind::Text,
        }
    }
}
