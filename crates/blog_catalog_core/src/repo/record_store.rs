//! Generic record-store primitives shared by the entity repositories.
//!
//! # Responsibility
//! - Run select/count/update/delete statements for any `Record` type.
//! - Account removed rows per entity for deletion summaries.
//!
//! # Invariants
//! - Functions take `&Connection`, so they run unchanged inside a
//!   `Transaction` (which derefs to `Connection`).
//! - `select_one` never returns an arbitrary row out of several matches.

use crate::model::field::{Field, FieldValue};
use crate::model::EntityKind;
use crate::repo::query::{ensure_assignable, push_placeholders, ListQuery, Predicate};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::BTreeMap;

/// Most ids bound into one `IN (...)` list; SQLite caps a statement at
/// 32766 variables.
pub(crate) const MAX_BOUND_IDS: usize = 500;

/// Row-mapped record stored in one table.
pub trait Record: Sized {
    /// Field enum used by predicates for this record.
    type Field: Field;

    const ENTITY: EntityKind;
    const TABLE: &'static str;
    /// Comma-separated select list consumed by `from_row`.
    const COLUMNS: &'static str;

    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

/// Removed row counts per entity, zero counts omitted.
///
/// Serializes as `{"total": n, "removed": {"blog.Entry": n, ...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionSummary {
    counts: BTreeMap<EntityKind, usize>,
}

impl DeletionSummary {
    /// Adds `removed` rows for `entity`.
    pub fn record(&mut self, entity: EntityKind, removed: usize) {
        if removed > 0 {
            *self.counts.entry(entity).or_insert(0) += removed;
        }
    }

    /// Rows removed across every entity.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Rows removed for one entity.
    pub fn count(&self, entity: EntityKind) -> usize {
        self.counts.get(&entity).copied().unwrap_or(0)
    }

    /// Non-zero counts keyed by entity.
    pub fn counts(&self) -> &BTreeMap<EntityKind, usize> {
        &self.counts
    }

    /// Counts keyed by entity label, e.g. `blog.Entry`.
    pub fn labeled_counts(&self) -> BTreeMap<&'static str, usize> {
        self.counts
            .iter()
            .map(|(entity, count)| (entity.label(), *count))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl Serialize for DeletionSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DeletionSummary", 2)?;
        state.serialize_field("total", &self.total())?;
        state.serialize_field("removed", &self.labeled_counts())?;
        state.end()
    }
}

/// Id-returning `SELECT` embedded into `IN (...)` clauses, with its binds.
///
/// Keeps matched id sets inside SQLite instead of binding them one by one.
#[derive(Debug, Clone)]
pub(crate) struct IdSubquery {
    sql: String,
    binds: Vec<Value>,
}

impl IdSubquery {
    /// Ids of `T` records matching `predicate`.
    pub(crate) fn matching<T: Record>(predicate: &Predicate<T::Field>) -> RepoResult<Self> {
        let mut binds = Vec::new();
        let mut sql = format!("SELECT id FROM {} WHERE ", T::TABLE);
        predicate.write_sql(&mut sql, &mut binds)?;
        Ok(Self { sql, binds })
    }

    /// `column` of `table` rows whose `key_column` equals `key`.
    pub(crate) fn linked(table: &str, column: &str, key_column: &str, key: i64) -> Self {
        Self {
            sql: format!("SELECT {column} FROM {table} WHERE {key_column} = ?"),
            binds: vec![Value::Integer(key)],
        }
    }

    /// Ids of `table` rows whose `fk_column` is one of these ids.
    pub(crate) fn children(&self, table: &str, fk_column: &str) -> Self {
        Self {
            sql: format!("SELECT id FROM {table} WHERE {fk_column} IN ({})", self.sql),
            binds: self.binds.clone(),
        }
    }
}

/// Selects every record matching `predicate`, ordered and paginated by `query`.
pub fn select_where<T: Record>(
    conn: &Connection,
    predicate: &Predicate<T::Field>,
    query: &ListQuery<T::Field>,
) -> RepoResult<Vec<T>> {
    let mut binds = Vec::new();
    let mut sql = format!("SELECT {} FROM {} WHERE ", T::COLUMNS, T::TABLE);
    predicate.write_sql(&mut sql, &mut binds)?;
    query.write_sql(&mut sql, &mut binds);
    collect_records(conn, &sql, binds)
}

/// Selects exactly one record.
///
/// # Errors
/// - `NotFound` when nothing matches.
/// - `MultipleResults` when more than one record matches.
pub fn select_one<T: Record>(conn: &Connection, predicate: &Predicate<T::Field>) -> RepoResult<T> {
    let count = count_where::<T>(conn, predicate)?;
    match count {
        0 => Err(RepoError::NotFound {
            entity: T::ENTITY,
            lookup: format!("{predicate:?}"),
        }),
        1 => select_where::<T>(conn, predicate, &ListQuery::default())?
            .pop()
            .ok_or_else(|| RepoError::NotFound {
                entity: T::ENTITY,
                lookup: format!("{predicate:?}"),
            }),
        count => Err(RepoError::MultipleResults {
            entity: T::ENTITY,
            count,
        }),
    }
}

/// Counts records matching `predicate`.
pub fn count_where<T: Record>(
    conn: &Connection,
    predicate: &Predicate<T::Field>,
) -> RepoResult<usize> {
    let mut binds = Vec::new();
    let mut sql = format!("SELECT COUNT(*) FROM {} WHERE ", T::TABLE);
    predicate.write_sql(&mut sql, &mut binds)?;

    let count: i64 = conn.query_row(&sql, params_from_iter(binds), |row| row.get(0))?;
    usize::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
}

/// Deletes every `T` record matching `predicate`; dependents are the
/// caller's job.
pub fn delete_where<T: Record>(
    conn: &Connection,
    predicate: &Predicate<T::Field>,
) -> RepoResult<usize> {
    let mut binds = Vec::new();
    let mut sql = format!("DELETE FROM {} WHERE ", T::TABLE);
    predicate.write_sql(&mut sql, &mut binds)?;
    Ok(conn.execute(&sql, params_from_iter(binds))?)
}

/// Assigns `assignments` to every record matching `predicate`.
///
/// Returns the number of matched rows. An empty assignment list touches
/// nothing and returns 0.
pub fn update_where<T: Record>(
    conn: &Connection,
    predicate: &Predicate<T::Field>,
    assignments: &[(T::Field, FieldValue)],
) -> RepoResult<usize> {
    if assignments.is_empty() {
        return Ok(0);
    }

    let mut binds = Vec::with_capacity(assignments.len());
    let mut sql = format!("UPDATE {} SET ", T::TABLE);
    for (idx, (field, value)) in assignments.iter().enumerate() {
        ensure_assignable(*field, value)?;
        if idx > 0 {
            sql.push_str(", ");
        }
        sql.push_str(field.column());
        sql.push_str(" = ?");
        binds.push(value.to_sql_value());
    }
    sql.push_str(" WHERE ");
    predicate.write_sql(&mut sql, &mut binds)?;

    Ok(conn.execute(&sql, params_from_iter(binds))?)
}

/// Selects records whose id is returned by `ids`.
pub(crate) fn select_in<T: Record>(
    conn: &Connection,
    ids: &IdSubquery,
    query: &ListQuery<T::Field>,
) -> RepoResult<Vec<T>> {
    let mut binds = ids.binds.clone();
    let mut sql = format!("SELECT {} FROM {} WHERE id IN ({})", T::COLUMNS, T::TABLE, ids.sql);
    query.write_sql(&mut sql, &mut binds);
    collect_records(conn, &sql, binds)
}

/// Deletes rows of `table` whose `column` is returned by `ids`.
pub(crate) fn delete_in(
    conn: &Connection,
    table: &str,
    column: &str,
    ids: &IdSubquery,
) -> RepoResult<usize> {
    let sql = format!("DELETE FROM {table} WHERE {column} IN ({});", ids.sql);
    Ok(conn.execute(&sql, params_from_iter(ids.binds.iter()))?)
}

/// Selects one column of `table` for rows whose `filter_column` is in `ids`.
///
/// Binds at most [`MAX_BOUND_IDS`] ids per statement.
pub(crate) fn select_column_where_in(
    conn: &Connection,
    table: &str,
    column: &str,
    filter_column: &str,
    ids: &[i64],
) -> RepoResult<Vec<i64>> {
    let mut values = Vec::new();
    for chunk in ids.chunks(MAX_BOUND_IDS) {
        let mut sql = format!("SELECT {column} FROM {table} WHERE {filter_column} IN (");
        push_placeholders(&mut sql, chunk.len());
        sql.push_str(");");

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            values.push(row.get(0)?);
        }
    }
    values.sort_unstable();
    Ok(values)
}

fn collect_records<T: Record>(
    conn: &Connection,
    sql: &str,
    binds: Vec<Value>,
) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(T::from_row(row)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::DeletionSummary;
    use crate::model::EntityKind;
    use serde_json::json;

    #[test]
    fn summary_omits_zero_counts_and_totals() {
        let mut summary = DeletionSummary::default();
        summary.record(EntityKind::EntryAuthor, 3);
        summary.record(EntityKind::Entry, 1);
        summary.record(EntityKind::Author, 0);
        summary.record(EntityKind::Blog, 2);

        assert_eq!(summary.total(), 6);
        assert_eq!(summary.count(EntityKind::Author), 0);
        assert!(!summary.counts().contains_key(&EntityKind::Author));
        assert_eq!(summary.labeled_counts().get("blog.Entry_authors"), Some(&3));
    }

    #[test]
    fn summary_serializes_with_entity_labels() {
        let mut summary = DeletionSummary::default();
        summary.record(EntityKind::Blog, 1);
        summary.record(EntityKind::EntryAuthor, 2);

        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({
                "total": 3,
                "removed": { "blog.Blog": 1, "blog.Entry_authors": 2 },
            })
        );
    }
}
