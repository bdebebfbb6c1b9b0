//! Entity catalog: create/read/update/delete use-cases over blogs, authors
//! and entries.
//!
//! # Responsibility
//! - Expose one storage-agnostic facade for every catalog operation.
//! - Read records back after writes so callers get store-assigned ids.
//! - Emit metadata-only `key=value` log events for mutations.
//!
//! # Invariants
//! - `update_*` on a single record validates and persists before mutating
//!   the caller's copy; on error the copy is unchanged.
//! - Deletes report removed rows per entity label, cascades included.

use crate::model::author::{Author, AuthorField, AuthorId, AuthorPatch, NewAuthor};
use crate::model::blog::{Blog, BlogField, BlogId, BlogPatch, NewBlog};
use crate::model::entry::{Entry, EntryField, EntryId, EntryPatch, NewEntry};
use crate::repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
use crate::repo::blog_repo::{BlogRepository, SqliteBlogRepository};
use crate::repo::entry_repo::{EntryRepository, SqliteEntryRepository};
use crate::repo::query::{ListQuery, Predicate};
use crate::repo::record_store::DeletionSummary;
use crate::repo::RepoResult;
use log::{debug, info};
use rusqlite::Connection;

/// Catalog facade over the three entity repositories.
pub struct Catalog<B, A, E> {
    blogs: B,
    authors: A,
    entries: E,
}

/// Catalog backed by one SQLite connection.
pub type SqliteCatalog<'conn> = Catalog<
    SqliteBlogRepository<'conn>,
    SqliteAuthorRepository<'conn>,
    SqliteEntryRepository<'conn>,
>;

impl<'conn> SqliteCatalog<'conn> {
    /// Builds a catalog on a connection opened via `db::open_db*`.
    pub fn try_from_connection(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Catalog::new(
            SqliteBlogRepository::try_new(conn)?,
            SqliteAuthorRepository::try_new(conn)?,
            SqliteEntryRepository::try_new(conn)?,
        ))
    }
}

impl<B, A, E> Catalog<B, A, E>
where
    B: BlogRepository,
    A: AuthorRepository,
    E: EntryRepository,
{
    pub fn new(blogs: B, authors: A, entries: E) -> Self {
        Self {
            blogs,
            authors,
            entries,
        }
    }

    // Blogs

    pub fn create_blog(&self, blog: NewBlog) -> RepoResult<Blog> {
        let id = self.blogs.create_blog(&blog)?;
        info!("event=blog_create module=catalog status=ok id={id}");
        self.blog(id)
    }

    pub fn all_blogs(&self, query: &ListQuery<BlogField>) -> RepoResult<Vec<Blog>> {
        self.blogs.list_blogs(&Predicate::All, query)
    }

    pub fn blog(&self, id: BlogId) -> RepoResult<Blog> {
        self.blogs.get_blog(&Predicate::id(id))
    }

    /// Single blog whose id is one of `ids`; fails unless exactly one exists.
    pub fn blog_by_ids(&self, ids: &[BlogId]) -> RepoResult<Blog> {
        self.blogs.get_blog(&Predicate::id_in(ids.iter().copied()))
    }

    /// Single blog whose text `field` equals `value`, ignoring case.
    pub fn blog_by_iexact(&self, field: BlogField, value: &str) -> RepoResult<Blog> {
        self.blogs.get_blog(&Predicate::iexact(field, value))
    }

    pub fn get_blog(&self, predicate: &Predicate<BlogField>) -> RepoResult<Blog> {
        self.blogs.get_blog(predicate)
    }

    pub fn filter_blogs(
        &self,
        predicate: &Predicate<BlogField>,
        query: &ListQuery<BlogField>,
    ) -> RepoResult<Vec<Blog>> {
        self.blogs.list_blogs(predicate, query)
    }

    pub fn count_blogs(&self, predicate: &Predicate<BlogField>) -> RepoResult<usize> {
        self.blogs.count_blogs(predicate)
    }

    pub fn update_all_blogs(&self, patch: &BlogPatch) -> RepoResult<usize> {
        self.update_blogs(&Predicate::All, patch)
    }

    pub fn update_blogs(
        &self,
        predicate: &Predicate<BlogField>,
        patch: &BlogPatch,
    ) -> RepoResult<usize> {
        let updated = self.blogs.update_blogs(predicate, patch)?;
        info!("event=blog_bulk_update module=catalog status=ok updated={updated}");
        Ok(updated)
    }

    pub fn update_blog(&self, blog: &mut Blog, patch: &BlogPatch) -> RepoResult<()> {
        let mut patched = blog.clone();
        patched.apply(patch);
        self.save_blog(&patched)?;
        *blog = patched;
        Ok(())
    }

    pub fn save_blog(&self, blog: &Blog) -> RepoResult<()> {
        self.blogs.save_blog(blog)?;
        debug!("event=blog_save module=catalog status=ok id={}", blog.id);
        Ok(())
    }

    pub fn delete_blog(&self, blog: &Blog) -> RepoResult<DeletionSummary> {
        self.delete_blogs(&Predicate::id(blog.id))
    }

    pub fn delete_all_blogs(&self) -> RepoResult<DeletionSummary> {
        self.delete_blogs(&Predicate::All)
    }

    pub fn delete_blogs(&self, predicate: &Predicate<BlogField>) -> RepoResult<DeletionSummary> {
        let summary = self.blogs.delete_blogs(predicate)?;
        log_deletion("blog_delete", &summary);
        Ok(summary)
    }

    // Authors

    pub fn create_author(&self, author: NewAuthor) -> RepoResult<Author> {
        let id = self.authors.create_author(&author)?;
        info!("event=author_create module=catalog status=ok id={id}");
        self.author(id)
    }

    pub fn all_authors(&self, query: &ListQuery<AuthorField>) -> RepoResult<Vec<Author>> {
        self.authors.list_authors(&Predicate::All, query)
    }

    pub fn author(&self, id: AuthorId) -> RepoResult<Author> {
        self.authors.get_author(&Predicate::id(id))
    }

    pub fn author_by_ids(&self, ids: &[AuthorId]) -> RepoResult<Author> {
        self.authors.get_author(&Predicate::id_in(ids.iter().copied()))
    }

    pub fn author_by_iexact(&self, field: AuthorField, value: &str) -> RepoResult<Author> {
        self.authors.get_author(&Predicate::iexact(field, value))
    }

    pub fn get_author(&self, predicate: &Predicate<AuthorField>) -> RepoResult<Author> {
        self.authors.get_author(predicate)
    }

    pub fn filter_authors(
        &self,
        predicate: &Predicate<AuthorField>,
        query: &ListQuery<AuthorField>,
    ) -> RepoResult<Vec<Author>> {
        self.authors.list_authors(predicate, query)
    }

    pub fn count_authors(&self, predicate: &Predicate<AuthorField>) -> RepoResult<usize> {
        self.authors.count_authors(predicate)
    }

    pub fn update_all_authors(&self, patch: &AuthorPatch) -> RepoResult<usize> {
        self.update_authors(&Predicate::All, patch)
    }

    pub fn update_authors(
        &self,
        predicate: &Predicate<AuthorField>,
        patch: &AuthorPatch,
    ) -> RepoResult<usize> {
        let updated = self.authors.update_authors(predicate, patch)?;
        info!("event=author_bulk_update module=catalog status=ok updated={updated}");
        Ok(updated)
    }

    pub fn update_author(&self, author: &mut Author, patch: &AuthorPatch) -> RepoResult<()> {
        let mut patched = author.clone();
        patched.apply(patch);
        self.save_author(&patched)?;
        *author = patched;
        Ok(())
    }

    pub fn save_author(&self, author: &Author) -> RepoResult<()> {
        self.authors.save_author(author)?;
        debug!("event=author_save module=catalog status=ok id={}", author.id);
        Ok(())
    }

    pub fn delete_author(&self, author: &Author) -> RepoResult<DeletionSummary> {
        self.delete_authors(&Predicate::id(author.id))
    }

    pub fn delete_all_authors(&self) -> RepoResult<DeletionSummary> {
        self.delete_authors(&Predicate::All)
    }

    pub fn delete_authors(
        &self,
        predicate: &Predicate<AuthorField>,
    ) -> RepoResult<DeletionSummary> {
        let summary = self.authors.delete_authors(predicate)?;
        log_deletion("author_delete", &summary);
        Ok(summary)
    }

    // Entries

    pub fn create_entry(&self, entry: NewEntry) -> RepoResult<Entry> {
        let id = self.entries.create_entry(&entry)?;
        info!(
            "event=entry_create module=catalog status=ok id={id} blog_id={} author_count={}",
            entry.blog,
            entry.normalized_authors().len()
        );
        self.entry(id)
    }

    pub fn all_entries(&self, query: &ListQuery<EntryField>) -> RepoResult<Vec<Entry>> {
        self.entries.list_entries(&Predicate::All, query)
    }

    pub fn entry(&self, id: EntryId) -> RepoResult<Entry> {
        self.entries.get_entry(&Predicate::id(id))
    }

    pub fn entry_by_ids(&self, ids: &[EntryId]) -> RepoResult<Entry> {
        self.entries.get_entry(&Predicate::id_in(ids.iter().copied()))
    }

    pub fn entry_by_iexact(&self, field: EntryField, value: &str) -> RepoResult<Entry> {
        self.entries.get_entry(&Predicate::iexact(field, value))
    }

    pub fn get_entry(&self, predicate: &Predicate<EntryField>) -> RepoResult<Entry> {
        self.entries.get_entry(predicate)
    }

    pub fn filter_entries(
        &self,
        predicate: &Predicate<EntryField>,
        query: &ListQuery<EntryField>,
    ) -> RepoResult<Vec<Entry>> {
        self.entries.list_entries(predicate, query)
    }

    pub fn count_entries(&self, predicate: &Predicate<EntryField>) -> RepoResult<usize> {
        self.entries.count_entries(predicate)
    }

    /// Entries owned by one blog.
    pub fn entries_of_blog(
        &self,
        blog_id: BlogId,
        query: &ListQuery<EntryField>,
    ) -> RepoResult<Vec<Entry>> {
        self.entries.list_entries(&Predicate::exact(EntryField::Blog, blog_id), query)
    }

    /// Entries linked to one author.
    pub fn entries_by_author(
        &self,
        author_id: AuthorId,
        query: &ListQuery<EntryField>,
    ) -> RepoResult<Vec<Entry>> {
        self.entries.list_entries_by_author(author_id, query)
    }

    pub fn update_all_entries(&self, patch: &EntryPatch) -> RepoResult<usize> {
        self.update_entries(&Predicate::All, patch)
    }

    pub fn update_entries(
        &self,
        predicate: &Predicate<EntryField>,
        patch: &EntryPatch,
    ) -> RepoResult<usize> {
        let updated = self.entries.update_entries(predicate, patch)?;
        info!("event=entry_bulk_update module=catalog status=ok updated={updated}");
        Ok(updated)
    }

    pub fn update_entry(&self, entry: &mut Entry, patch: &EntryPatch) -> RepoResult<()> {
        let mut patched = entry.clone();
        patched.apply(patch);
        self.save_entry(&patched)?;
        *entry = patched;
        Ok(())
    }

    pub fn save_entry(&self, entry: &Entry) -> RepoResult<()> {
        self.entries.save_entry(entry)?;
        debug!("event=entry_save module=catalog status=ok id={}", entry.id);
        Ok(())
    }

    pub fn delete_entry(&self, entry: &Entry) -> RepoResult<DeletionSummary> {
        self.delete_entries(&Predicate::id(entry.id))
    }

    pub fn delete_all_entries(&self) -> RepoResult<DeletionSummary> {
        self.delete_entries(&Predicate::All)
    }

    pub fn delete_entries(&self, predicate: &Predicate<EntryField>) -> RepoResult<DeletionSummary> {
        let summary = self.entries.delete_entries(predicate)?;
        log_deletion("entry_delete", &summary);
        Ok(summary)
    }

    // Entry <-> Author links

    pub fn add_authors(&self, entry_id: EntryId, authors: &[AuthorId]) -> RepoResult<Entry> {
        let added = self.entries.add_entry_authors(entry_id, authors)?;
        debug!(
            "event=entry_authors_add module=catalog status=ok entry_id={entry_id} added={added}"
        );
        self.entry(entry_id)
    }

    pub fn remove_authors(&self, entry_id: EntryId, authors: &[AuthorId]) -> RepoResult<Entry> {
        let removed = self.entries.remove_entry_authors(entry_id, authors)?;
        debug!(
            "event=entry_authors_remove module=catalog status=ok entry_id={entry_id} removed={removed}"
        );
        self.entry(entry_id)
    }

    pub fn set_authors(&self, entry_id: EntryId, authors: &[AuthorId]) -> RepoResult<Entry> {
        self.entries.set_entry_authors(entry_id, authors)?;
        debug!("event=entry_authors_set module=catalog status=ok entry_id={entry_id}");
        self.entry(entry_id)
    }

    pub fn clear_authors(&self, entry_id: EntryId) -> RepoResult<Entry> {
        self.set_authors(entry_id, &[])
    }
}

fn log_deletion(event: &str, summary: &DeletionSummary) {
    let details = summary
        .labeled_counts()
        .iter()
        .map(|(label, count)| format!("{label}:{count}"))
        .collect::<Vec<_>>()
        .join(",");
    info!(
        "event={event} module=catalog status=ok total={} removed={}",
        summary.total(),
        if details.is_empty() { "none" } else { details.as_str() }
    );
}
