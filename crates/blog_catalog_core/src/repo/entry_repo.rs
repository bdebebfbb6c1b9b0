//! Entry repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist entries together with their `entry_authors` join rows.
//! - Enforce the entry -> blog and entry -> author references on write.
//!
//! # Invariants
//! - An entry is never written with a `blog` that does not exist.
//! - Author link replacement (`set_entry_authors`) is atomic.
//! - Read paths always return `authors` sorted ascending.

use crate::model::author::AuthorId;
use crate::model::blog::BlogId;
use crate::model::entry::{normalize_author_ids, Entry, EntryField, EntryId, EntryPatch, NewEntry};
use crate::model::EntityKind;
use crate::repo::query::{push_placeholders, ListQuery, Predicate};
use crate::repo::record_store::{
    count_where, delete_in, delete_where, select_column_where_in, select_in, select_one,
    select_where, update_where, DeletionSummary, IdSubquery, Record, MAX_BOUND_IDS,
};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};

impl Record for Entry {
    type Field = EntryField;

    const ENTITY: EntityKind = EntityKind::Entry;
    const TABLE: &'static str = "entries";
    const COLUMNS: &'static str = "id,
        blog_id,
        headline,
        body_text,
        pub_date,
        mod_date,
        number_of_comments,
        number_of_pingbacks,
        rating";

    /// Maps scalar columns only; `authors` is filled by the repository.
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            blog: row.get("blog_id")?,
            headline: row.get("headline")?,
            body_text: row.get("body_text")?,
            pub_date: row.get("pub_date")?,
            mod_date: row.get("mod_date")?,
            number_of_comments: row.get("number_of_comments")?,
            number_of_pingbacks: row.get("number_of_pingbacks")?,
            rating: row.get("rating")?,
            authors: Vec::new(),
        })
    }
}

/// Repository interface for entries and their author links.
pub trait EntryRepository {
    /// Inserts the entry and its author links in one transaction.
    fn create_entry(&self, entry: &NewEntry) -> RepoResult<EntryId>;
    /// Persists scalar fields and `blog`; author links are left untouched.
    fn save_entry(&self, entry: &Entry) -> RepoResult<()>;
    fn get_entry(&self, predicate: &Predicate<EntryField>) -> RepoResult<Entry>;
    fn list_entries(
        &self,
        predicate: &Predicate<EntryField>,
        query: &ListQuery<EntryField>,
    ) -> RepoResult<Vec<Entry>>;
    fn count_entries(&self, predicate: &Predicate<EntryField>) -> RepoResult<usize>;
    fn update_entries(
        &self,
        predicate: &Predicate<EntryField>,
        patch: &EntryPatch,
    ) -> RepoResult<usize>;
    /// Deletes matching entries and their author links.
    fn delete_entries(&self, predicate: &Predicate<EntryField>) -> RepoResult<DeletionSummary>;
    /// Links authors to an entry; existing links are kept. Returns links added.
    fn add_entry_authors(&self, entry_id: EntryId, authors: &[AuthorId]) -> RepoResult<usize>;
    /// Unlinks authors from an entry. Returns links removed.
    fn remove_entry_authors(&self, entry_id: EntryId, authors: &[AuthorId]) -> RepoResult<usize>;
    /// Replaces the full author set of an entry.
    fn set_entry_authors(&self, entry_id: EntryId, authors: &[AuthorId]) -> RepoResult<()>;
    /// Lists entries linked to one author.
    fn list_entries_by_author(
        &self,
        author_id: AuthorId,
        query: &ListQuery<EntryField>,
    ) -> RepoResult<Vec<Entry>>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn create_entry(&self, entry: &NewEntry) -> RepoResult<EntryId> {
        entry.validate()?;
        let authors = entry.normalized_authors();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_blog_exists(&tx, entry.blog)?;
        ensure_authors_exist(&tx, &authors)?;

        tx.execute(
            "INSERT INTO entries (
                blog_id,
                headline,
                body_text,
                pub_date,
                mod_date,
                number_of_comments,
                number_of_pingbacks,
                rating
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                entry.blog,
                entry.headline.as_str(),
                entry.body_text.as_str(),
                entry.pub_date,
                entry.mod_date,
                entry.number_of_comments,
                entry.number_of_pingbacks,
                entry.rating,
            ],
        )?;
        let entry_id = tx.last_insert_rowid();
        insert_links(&tx, entry_id, &authors)?;
        tx.commit()?;

        Ok(entry_id)
    }

    fn save_entry(&self, entry: &Entry) -> RepoResult<()> {
        entry.validate()?;
        ensure_blog_exists(self.conn, entry.blog)?;

        let changed = self.conn.execute(
            "UPDATE entries
             SET
                blog_id = ?1,
                headline = ?2,
                body_text = ?3,
                pub_date = ?4,
                mod_date = ?5,
                number_of_comments = ?6,
                number_of_pingbacks = ?7,
                rating = ?8
             WHERE id = ?9;",
            params![
                entry.blog,
                entry.headline.as_str(),
                entry.body_text.as_str(),
                entry.pub_date,
                entry.mod_date,
                entry.number_of_comments,
                entry.number_of_pingbacks,
                entry.rating,
                entry.id,
            ],
        )?;
        if changed == 0 {
            return Err(entry_not_found(entry.id));
        }
        Ok(())
    }

    fn get_entry(&self, predicate: &Predicate<EntryField>) -> RepoResult<Entry> {
        let mut entry: Entry = select_one(self.conn, predicate)?;
        attach_authors(self.conn, std::slice::from_mut(&mut entry))?;
        Ok(entry)
    }

    fn list_entries(
        &self,
        predicate: &Predicate<EntryField>,
        query: &ListQuery<EntryField>,
    ) -> RepoResult<Vec<Entry>> {
        let mut entries = select_where::<Entry>(self.conn, predicate, query)?;
        attach_authors(self.conn, &mut entries)?;
        Ok(entries)
    }

    fn count_entries(&self, predicate: &Predicate<EntryField>) -> RepoResult<usize> {
        count_where::<Entry>(self.conn, predicate)
    }

    fn update_entries(
        &self,
        predicate: &Predicate<EntryField>,
        patch: &EntryPatch,
    ) -> RepoResult<usize> {
        patch.validate()?;
        if let Some(blog_id) = patch.blog {
            ensure_blog_exists(self.conn, blog_id)?;
        }
        update_where::<Entry>(self.conn, predicate, &patch.assignments())
    }

    fn delete_entries(&self, predicate: &Predicate<EntryField>) -> RepoResult<DeletionSummary> {
        let entries = IdSubquery::matching::<Entry>(predicate)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut summary = DeletionSummary::default();
        summary.record(
            EntityKind::EntryAuthor,
            delete_in(&tx, "entry_authors", "entry_id", &entries)?,
        );
        summary.record(EntityKind::Entry, delete_where::<Entry>(&tx, predicate)?);
        tx.commit()?;

        Ok(summary)
    }

    fn add_entry_authors(&self, entry_id: EntryId, authors: &[AuthorId]) -> RepoResult<usize> {
        let authors = normalize_author_ids(authors);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_entry_exists(&tx, entry_id)?;
        ensure_authors_exist(&tx, &authors)?;
        let added = insert_links(&tx, entry_id, &authors)?;
        tx.commit()?;
        Ok(added)
    }

    fn remove_entry_authors(&self, entry_id: EntryId, authors: &[AuthorId]) -> RepoResult<usize> {
        let authors = normalize_author_ids(authors);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_entry_exists(&tx, entry_id)?;

        let mut removed = 0;
        for chunk in authors.chunks(MAX_BOUND_IDS) {
            let mut sql =
                String::from("DELETE FROM entry_authors WHERE entry_id = ? AND author_id IN (");
            push_placeholders(&mut sql, chunk.len());
            sql.push_str(");");
            let binds = std::iter::once(entry_id).chain(chunk.iter().copied());
            removed += tx.execute(&sql, params_from_iter(binds))?;
        }
        tx.commit()?;
        Ok(removed)
    }

    fn set_entry_authors(&self, entry_id: EntryId, authors: &[AuthorId]) -> RepoResult<()> {
        let authors = normalize_author_ids(authors);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_entry_exists(&tx, entry_id)?;
        ensure_authors_exist(&tx, &authors)?;

        tx.execute("DELETE FROM entry_authors WHERE entry_id = ?1;", [entry_id])?;
        insert_links(&tx, entry_id, &authors)?;
        tx.commit()?;
        Ok(())
    }

    fn list_entries_by_author(
        &self,
        author_id: AuthorId,
        query: &ListQuery<EntryField>,
    ) -> RepoResult<Vec<Entry>> {
        if !row_exists(self.conn, "authors", author_id)? {
            return Err(RepoError::NotFound {
                entity: EntityKind::Author,
                lookup: format!("id={author_id}"),
            });
        }

        let linked = IdSubquery::linked("entry_authors", "entry_id", "author_id", author_id);
        let mut entries = select_in::<Entry>(self.conn, &linked, query)?;
        attach_authors(self.conn, &mut entries)?;
        Ok(entries)
    }
}

fn insert_links(conn: &Connection, entry_id: EntryId, authors: &[AuthorId]) -> RepoResult<usize> {
    let mut added = 0;
    for author_id in authors {
        added += conn.execute(
            "INSERT OR IGNORE INTO entry_authors (entry_id, author_id) VALUES (?1, ?2);",
            params![entry_id, author_id],
        )?;
    }
    Ok(added)
}

fn attach_authors(conn: &Connection, entries: &mut [Entry]) -> RepoResult<()> {
    let mut links: BTreeMap<EntryId, Vec<AuthorId>> = BTreeMap::new();
    for chunk in entries.chunks(MAX_BOUND_IDS) {
        let mut sql =
            String::from("SELECT entry_id, author_id FROM entry_authors WHERE entry_id IN (");
        push_placeholders(&mut sql, chunk.len());
        sql.push_str(") ORDER BY entry_id ASC, author_id ASC;");

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(chunk.iter().map(|entry| entry.id)))?;
        while let Some(row) = rows.next()? {
            links
                .entry(row.get("entry_id")?)
                .or_default()
                .push(row.get("author_id")?);
        }
    }

    for entry in entries.iter_mut() {
        entry.authors = links.remove(&entry.id).unwrap_or_default();
    }
    Ok(())
}

fn ensure_blog_exists(conn: &Connection, blog_id: BlogId) -> RepoResult<()> {
    if row_exists(conn, "blogs", blog_id)? {
        return Ok(());
    }
    Err(RepoError::ConstraintViolation(format!(
        "entry references missing blog id={blog_id}"
    )))
}

fn ensure_entry_exists(conn: &Connection, entry_id: EntryId) -> RepoResult<()> {
    if row_exists(conn, "entries", entry_id)? {
        return Ok(());
    }
    Err(entry_not_found(entry_id))
}

fn ensure_authors_exist(conn: &Connection, authors: &[AuthorId]) -> RepoResult<()> {
    let found: BTreeSet<AuthorId> = select_column_where_in(conn, "authors", "id", "id", authors)?
        .into_iter()
        .collect();
    let missing: Vec<String> = authors
        .iter()
        .filter(|id| !found.contains(*id))
        .map(|id| id.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    Err(RepoError::ConstraintViolation(format!(
        "entry references missing author id(s) {}",
        missing.join(", ")
    )))
}

fn row_exists(conn: &Connection, table: &str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn entry_not_found(entry_id: EntryId) -> RepoError {
    RepoError::NotFound {
        entity: EntityKind::Entry,
        lookup: format!("id={entry_id}"),
    }
}
