//! Entry record.
//!
//! # Responsibility
//! - Define the blog post record and its many-to-one / many-to-many links.
//!
//! # Invariants
//! - `headline` is 1..=255 characters and not blank.
//! - `blog` must reference an existing blog when written.
//! - `authors` is sorted ascending and free of duplicates.
//! - Saving an entry never rewrites its author links; those are changed
//!   through the association operations only.

use crate::model::author::AuthorId;
use crate::model::blog::BlogId;
use crate::model::field::{Field, FieldKind, FieldValue};
use crate::model::validation::{validate_bounded_text, ModelValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub const ENTRY_HEADLINE_MAX_CHARS: usize = 255;

/// Store-assigned entry id.
pub type EntryId = i64;

/// Persisted entry with its author links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub blog: BlogId,
    pub headline: String,
    pub body_text: String,
    pub pub_date: NaiveDate,
    pub mod_date: NaiveDate,
    pub number_of_comments: i32,
    pub number_of_pingbacks: i32,
    pub rating: i32,
    /// Linked author ids, ascending.
    pub authors: Vec<AuthorId>,
}

impl Entry {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_bounded_text("headline", &self.headline, ENTRY_HEADLINE_MAX_CHARS)
    }

    /// Applies set patch fields in place without validation.
    pub fn apply(&mut self, patch: &EntryPatch) {
        if let Some(blog) = patch.blog {
            self.blog = blog;
        }
        if let Some(headline) = &patch.headline {
            self.headline = headline.clone();
        }
        if let Some(body_text) = &patch.body_text {
            self.body_text = body_text.clone();
        }
        if let Some(pub_date) = patch.pub_date {
            self.pub_date = pub_date;
        }
        if let Some(mod_date) = patch.mod_date {
            self.mod_date = mod_date;
        }
        if let Some(value) = patch.number_of_comments {
            self.number_of_comments = value;
        }
        if let Some(value) = patch.number_of_pingbacks {
            self.number_of_pingbacks = value;
        }
        if let Some(value) = patch.rating {
            self.rating = value;
        }
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.headline)
    }
}

/// Input for creating an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub blog: BlogId,
    pub headline: String,
    pub body_text: String,
    pub pub_date: NaiveDate,
    pub mod_date: NaiveDate,
    pub number_of_comments: i32,
    pub number_of_pingbacks: i32,
    pub rating: i32,
    /// Authors to link on creation; duplicates are collapsed.
    pub authors: Vec<AuthorId>,
}

impl NewEntry {
    /// Creates an entry input with empty body, zero counters, no authors and
    /// `mod_date == pub_date`.
    pub fn new(blog: BlogId, headline: impl Into<String>, pub_date: NaiveDate) -> Self {
        Self {
            blog,
            headline: headline.into(),
            body_text: String::new(),
            pub_date,
            mod_date: pub_date,
            number_of_comments: 0,
            number_of_pingbacks: 0,
            rating: 0,
            authors: Vec::new(),
        }
    }

    pub fn with_body(mut self, body_text: impl Into<String>) -> Self {
        self.body_text = body_text.into();
        self
    }

    pub fn with_authors(mut self, authors: impl IntoIterator<Item = AuthorId>) -> Self {
        self.authors = authors.into_iter().collect();
        self
    }

    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = rating;
        self
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_bounded_text("headline", &self.headline, ENTRY_HEADLINE_MAX_CHARS)
    }

    /// Author ids sorted and deduplicated.
    pub fn normalized_authors(&self) -> Vec<AuthorId> {
        normalize_author_ids(&self.authors)
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPatch {
    pub blog: Option<BlogId>,
    pub headline: Option<String>,
    pub body_text: Option<String>,
    pub pub_date: Option<NaiveDate>,
    pub mod_date: Option<NaiveDate>,
    pub number_of_comments: Option<i32>,
    pub number_of_pingbacks: Option<i32>,
    pub rating: Option<i32>,
}

impl EntryPatch {
    pub fn headline(value: impl Into<String>) -> Self {
        Self {
            headline: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(headline) = &self.headline {
            validate_bounded_text("headline", headline, ENTRY_HEADLINE_MAX_CHARS)?;
        }
        Ok(())
    }

    pub fn assignments(&self) -> Vec<(EntryField, FieldValue)> {
        let mut assignments = Vec::new();
        if let Some(blog) = self.blog {
            assignments.push((EntryField::Blog, FieldValue::from(blog)));
        }
        if let Some(headline) = &self.headline {
            assignments.push((EntryField::Headline, FieldValue::from(headline.as_str())));
        }
        if let Some(body_text) = &self.body_text {
            assignments.push((EntryField::BodyText, FieldValue::from(body_text.as_str())));
        }
        if let Some(pub_date) = self.pub_date {
            assignments.push((EntryField::PubDate, FieldValue::from(pub_date)));
        }
        if let Some(mod_date) = self.mod_date {
            assignments.push((EntryField::ModDate, FieldValue::from(mod_date)));
        }
        if let Some(value) = self.number_of_comments {
            assignments.push((EntryField::NumberOfComments, FieldValue::from(value)));
        }
        if let Some(value) = self.number_of_pingbacks {
            assignments.push((EntryField::NumberOfPingbacks, FieldValue::from(value)));
        }
        if let Some(value) = self.rating {
            assignments.push((EntryField::Rating, FieldValue::from(value)));
        }
        assignments
    }
}

/// Queryable entry fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Id,
    Blog,
    Headline,
    BodyText,
    PubDate,
    ModDate,
    NumberOfComments,
    NumberOfPingbacks,
    Rating,
}

impl Field for EntryField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Blog => "blog_id",
            Self::Headline => "headline",
            Self::BodyText => "body_text",
            Self::PubDate => "pub_date",
            Self::ModDate => "mod_date",
            Self::NumberOfComments => "number_of_comments",
            Self::NumberOfPingbacks => "number_of_pingbacks",
            Self::Rating => "rating",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Self::Id => FieldKind::Id,
            Self::Blog => FieldKind::Reference,
            Self::Headline | Self::BodyText => FieldKind::Text,
            Self::PubDate | Self::ModDate => FieldKind::Date,
            Self::NumberOfComments | Self::NumberOfPingbacks | Self::Rating => {
                FieldKind::Integer
            }
        }
    }
}

/// Sorts and deduplicates author ids.
pub fn normalize_author_ids(ids: &[AuthorId]) -> Vec<AuthorId> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}
