//! Blog / Author / Entry domain model.
//!
//! # Responsibility
//! - Define persisted records, their creation inputs and partial patches.
//! - Own field-level constraints so every write path validates the same way.
//!
//! # Invariants
//! - Ids are assigned by the record store and never reused.
//! - An `Entry` always belongs to exactly one `Blog`.
//! - Entry/Author links live in a separate join table.

pub mod author;
pub mod blog;
pub mod entry;
pub mod field;
pub mod validation;

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Table-level entity identity, used for deletion accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EntityKind {
    #[serde(rename = "blog.Blog")]
    Blog,
    #[serde(rename = "blog.Author")]
    Author,
    #[serde(rename = "blog.Entry")]
    Entry,
    /// Join rows linking entries and authors.
    #[serde(rename = "blog.Entry_authors")]
    EntryAuthor,
}

impl EntityKind {
    /// Qualified label, e.g. `blog.Entry_authors`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Blog => "blog.Blog",
            Self::Author => "blog.Author",
            Self::Entry => "blog.Entry",
            Self::EntryAuthor => "blog.Entry_authors",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
