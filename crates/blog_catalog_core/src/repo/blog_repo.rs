//! Blog repository contract and SQLite implementation.
//!
//! # Invariants
//! - Deleting blogs removes their entries and those entries' author links
//!   first, in the same transaction.
//! - Writes validate `Blog` constraints before touching storage.

use crate::model::blog::{Blog, BlogField, BlogId, BlogPatch, NewBlog};
use crate::model::EntityKind;
use crate::repo::query::{ListQuery, Predicate};
use crate::repo::record_store::{
    count_where, delete_in, delete_where, select_one, select_where, update_where,
    DeletionSummary, IdSubquery, Record,
};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

impl Record for Blog {
    type Field = BlogField;

    const ENTITY: EntityKind = EntityKind::Blog;
    const TABLE: &'static str = "blogs";
    const COLUMNS: &'static str = "id, name, tagline";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            tagline: row.get("tagline")?,
        })
    }
}

/// Repository interface for blog persistence.
pub trait BlogRepository {
    fn create_blog(&self, blog: &NewBlog) -> RepoResult<BlogId>;
    /// Persists every field of an existing blog.
    fn save_blog(&self, blog: &Blog) -> RepoResult<()>;
    /// Returns the single blog matching `predicate`.
    fn get_blog(&self, predicate: &Predicate<BlogField>) -> RepoResult<Blog>;
    fn list_blogs(
        &self,
        predicate: &Predicate<BlogField>,
        query: &ListQuery<BlogField>,
    ) -> RepoResult<Vec<Blog>>;
    fn count_blogs(&self, predicate: &Predicate<BlogField>) -> RepoResult<usize>;
    /// Bulk-assigns patch fields; returns matched row count.
    fn update_blogs(
        &self,
        predicate: &Predicate<BlogField>,
        patch: &BlogPatch,
    ) -> RepoResult<usize>;
    /// Deletes matching blogs with cascade to entries and their author links.
    fn delete_blogs(&self, predicate: &Predicate<BlogField>) -> RepoResult<DeletionSummary>;
}

/// SQLite-backed blog repository.
pub struct SqliteBlogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlogRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BlogRepository for SqliteBlogRepository<'_> {
    fn create_blog(&self, blog: &NewBlog) -> RepoResult<BlogId> {
        blog.validate()?;

        self.conn.execute(
            "INSERT INTO blogs (name, tagline) VALUES (?1, ?2);",
            params![blog.name.as_str(), blog.tagline.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn save_blog(&self, blog: &Blog) -> RepoResult<()> {
        blog.validate()?;

        let changed = self.conn.execute(
            "UPDATE blogs SET name = ?1, tagline = ?2 WHERE id = ?3;",
            params![blog.name.as_str(), blog.tagline.as_str(), blog.id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Blog,
                lookup: format!("id={}", blog.id),
            });
        }
        Ok(())
    }

    fn get_blog(&self, predicate: &Predicate<BlogField>) -> RepoResult<Blog> {
        select_one(self.conn, predicate)
    }

    fn list_blogs(
        &self,
        predicate: &Predicate<BlogField>,
        query: &ListQuery<BlogField>,
    ) -> RepoResult<Vec<Blog>> {
        select_where(self.conn, predicate, query)
    }

    fn count_blogs(&self, predicate: &Predicate<BlogField>) -> RepoResult<usize> {
        count_where::<Blog>(self.conn, predicate)
    }

    fn update_blogs(
        &self,
        predicate: &Predicate<BlogField>,
        patch: &BlogPatch,
    ) -> RepoResult<usize> {
        patch.validate()?;
        update_where::<Blog>(self.conn, predicate, &patch.assignments())
    }

    fn delete_blogs(&self, predicate: &Predicate<BlogField>) -> RepoResult<DeletionSummary> {
        let blogs = IdSubquery::matching::<Blog>(predicate)?;
        let entries = blogs.children("entries", "blog_id");

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut summary = DeletionSummary::default();
        summary.record(
            EntityKind::EntryAuthor,
            delete_in(&tx, "entry_authors", "entry_id", &entries)?,
        );
        summary.record(EntityKind::Entry, delete_in(&tx, "entries", "id", &entries)?);
        summary.record(EntityKind::Blog, delete_where::<Blog>(&tx, predicate)?);
        tx.commit()?;

        Ok(summary)
    }
}
