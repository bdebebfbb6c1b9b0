//! Core data model and catalog operations for the Blog / Author / Entry
//! record store.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::author::{Author, AuthorField, AuthorId, AuthorPatch, NewAuthor};
pub use model::blog::{Blog, BlogField, BlogId, BlogPatch, NewBlog};
pub use model::entry::{Entry, EntryField, EntryId, EntryPatch, NewEntry};
pub use model::field::{Field, FieldKind, FieldValue};
pub use model::validation::ModelValidationError;
pub use model::EntityKind;
pub use repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
pub use repo::blog_repo::{BlogRepository, SqliteBlogRepository};
pub use repo::entry_repo::{EntryRepository, SqliteEntryRepository};
pub use repo::query::{Comparison, ListQuery, OrderBy, Predicate};
pub use repo::record_store::DeletionSummary;
pub use repo::{RepoError, RepoResult};
pub use service::catalog::{Catalog, SqliteCatalog};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
