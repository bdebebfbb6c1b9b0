//! Author repository contract and SQLite implementation.
//!
//! # Invariants
//! - Deleting authors removes only their entry links; entries survive.

use crate::model::author::{Author, AuthorField, AuthorId, AuthorPatch, NewAuthor};
use crate::model::EntityKind;
use crate::repo::query::{ListQuery, Predicate};
use crate::repo::record_store::{
    count_where, delete_in, delete_where, select_one, select_where, update_where,
    DeletionSummary, IdSubquery, Record,
};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

impl Record for Author {
    type Field = AuthorField;

    const ENTITY: EntityKind = EntityKind::Author;
    const TABLE: &'static str = "authors";
    const COLUMNS: &'static str = "id, name, email";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
        })
    }
}

/// Repository interface for author persistence.
pub trait AuthorRepository {
    fn create_author(&self, author: &NewAuthor) -> RepoResult<AuthorId>;
    fn save_author(&self, author: &Author) -> RepoResult<()>;
    fn get_author(&self, predicate: &Predicate<AuthorField>) -> RepoResult<Author>;
    fn list_authors(
        &self,
        predicate: &Predicate<AuthorField>,
        query: &ListQuery<AuthorField>,
    ) -> RepoResult<Vec<Author>>;
    fn count_authors(&self, predicate: &Predicate<AuthorField>) -> RepoResult<usize>;
    fn update_authors(
        &self,
        predicate: &Predicate<AuthorField>,
        patch: &AuthorPatch,
    ) -> RepoResult<usize>;
    /// Deletes matching authors and their entry links.
    fn delete_authors(&self, predicate: &Predicate<AuthorField>) -> RepoResult<DeletionSummary>;
}

/// SQLite-backed author repository.
pub struct SqliteAuthorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthorRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AuthorRepository for SqliteAuthorRepository<'_> {
    fn create_author(&self, author: &NewAuthor) -> RepoResult<AuthorId> {
        author.validate()?;

        self.conn.execute(
            "INSERT INTO authors (name, email) VALUES (?1, ?2);",
            params![author.name.as_str(), author.email.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn save_author(&self, author: &Author) -> RepoResult<()> {
        author.validate()?;

        let changed = self.conn.execute(
            "UPDATE authors SET name = ?1, email = ?2 WHERE id = ?3;",
            params![author.name.as_str(), author.email.as_str(), author.id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Author,
                lookup: format!("id={}", author.id),
            });
        }
        Ok(())
    }

    fn get_author(&self, predicate: &Predicate<AuthorField>) -> RepoResult<Author> {
        select_one(self.conn, predicate)
    }

    fn list_authors(
        &self,
        predicate: &Predicate<AuthorField>,
        query: &ListQuery<AuthorField>,
    ) -> RepoResult<Vec<Author>> {
        select_where(self.conn, predicate, query)
    }

    fn count_authors(&self, predicate: &Predicate<AuthorField>) -> RepoResult<usize> {
        count_where::<Author>(self.conn, predicate)
    }

    fn update_authors(
        &self,
        predicate: &Predicate<AuthorField>,
        patch: &AuthorPatch,
    ) -> RepoResult<usize> {
        patch.validate()?;
        update_where::<Author>(self.conn, predicate, &patch.assignments())
    }

    fn delete_authors(&self, predicate: &Predicate<AuthorField>) -> RepoResult<DeletionSummary> {
        let authors = IdSubquery::matching::<Author>(predicate)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut summary = DeletionSummary::default();
        summary.record(
            EntityKind::EntryAuthor,
            delete_in(&tx, "entry_authors", "author_id", &authors)?,
        );
        summary.record(EntityKind::Author, delete_where::<Author>(&tx, predicate)?);
        tx.commit()?;

        Ok(summary)
    }
}
