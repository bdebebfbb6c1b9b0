//! Repository layer: typed queries and SQLite-backed record stores.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Keep SQL details out of the catalog service.
//!
//! # Invariants
//! - Write paths validate field constraints before SQL mutations.
//! - Single-record lookups fail with `NotFound` / `MultipleResults` instead
//!   of returning an arbitrary match.
//! - Multi-statement writes run in one immediate transaction.

pub mod author_repo;
pub mod blog_repo;
pub mod entry_repo;
pub mod query;
pub mod record_store;

use crate::db::migrations::{current_user_version, latest_version, REQUIRED_TABLES};
use crate::db::DbError;
use crate::model::validation::ModelValidationError;
use crate::model::EntityKind;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by every repository and catalog operation.
#[derive(Debug)]
pub enum RepoError {
    /// A field constraint rejected the input.
    Validation(ModelValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// A single-record lookup matched nothing.
    NotFound {
        entity: EntityKind,
        lookup: String,
    },
    /// A single-record lookup matched more than one record.
    MultipleResults { entity: EntityKind, count: usize },
    /// A relationship constraint would be broken, e.g. an entry without a blog.
    ConstraintViolation(String),
    /// A predicate, ordering or assignment does not fit the field kind.
    InvalidLookup(String),
    /// Persisted data cannot be converted into a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, lookup } => {
                write!(f, "{entity} matching query does not exist: {lookup}")
            }
            Self::MultipleResults { entity, count } => write!(
                f,
                "get() returned more than one {entity} -- it returned {count}"
            ),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::InvalidLookup(message) => write!(f, "invalid lookup: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Rejects connections that were not opened through `db::open_db*`.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
