//! Typed predicates, ordering and pagination compiled to SQL.
//!
//! # Responsibility
//! - Express lookups (exact, case-insensitive, year-of-date, ranges) as
//!   plain values instead of query strings.
//! - Compile them into a `WHERE` fragment plus positional bind values.
//!
//! # Invariants
//! - Column names come only from `Field::column`; user values are always
//!   bound, never interpolated.
//! - A lookup that does not fit the field kind fails with `InvalidLookup`.

use crate::model::field::{Field, FieldKind, FieldValue};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;

const LIKE_ESCAPE: char = '\\';

/// Comparison operators for range lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    fn operator(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// Record filter over the fields `F` of one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate<F> {
    /// Matches every record.
    All,
    /// Primary key is one of the listed ids.
    IdIn(Vec<i64>),
    /// Field equals value.
    Exact(F, FieldValue),
    /// Text field equals value, ignoring ASCII case.
    IExact(F, String),
    /// Text field contains value, ignoring ASCII case.
    IContains(F, String),
    /// Year component of a date field equals the value.
    Year(F, i32),
    /// Ordered comparison against a value.
    Compare(F, Comparison, FieldValue),
    And(Vec<Predicate<F>>),
    Or(Vec<Predicate<F>>),
    Not(Box<Predicate<F>>),
}

impl<F: Field> Predicate<F> {
    pub fn all() -> Self {
        Self::All
    }

    pub fn id(id: i64) -> Self {
        Self::IdIn(vec![id])
    }

    pub fn id_in(ids: impl IntoIterator<Item = i64>) -> Self {
        Self::IdIn(ids.into_iter().collect())
    }

    pub fn exact(field: F, value: impl Into<FieldValue>) -> Self {
        Self::Exact(field, value.into())
    }

    pub fn iexact(field: F, value: impl Into<String>) -> Self {
        Self::IExact(field, value.into())
    }

    pub fn icontains(field: F, value: impl Into<String>) -> Self {
        Self::IContains(field, value.into())
    }

    pub fn year(field: F, year: i32) -> Self {
        Self::Year(field, year)
    }

    pub fn gt(field: F, value: impl Into<FieldValue>) -> Self {
        Self::Compare(field, Comparison::Gt, value.into())
    }

    pub fn gte(field: F, value: impl Into<FieldValue>) -> Self {
        Self::Compare(field, Comparison::Gte, value.into())
    }

    pub fn lt(field: F, value: impl Into<FieldValue>) -> Self {
        Self::Compare(field, Comparison::Lt, value.into())
    }

    pub fn lte(field: F, value: impl Into<FieldValue>) -> Self {
        Self::Compare(field, Comparison::Lte, value.into())
    }

    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            first => Self::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut parts) => {
                parts.push(other);
                Self::Or(parts)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Appends this predicate as a SQL boolean expression.
    pub(crate) fn write_sql(&self, sql: &mut String, binds: &mut Vec<Value>) -> RepoResult<()> {
        match self {
            Self::All => sql.push_str("1 = 1"),
            Self::IdIn(ids) if ids.is_empty() => sql.push_str("1 = 0"),
            Self::IdIn(ids) => {
                sql.push_str("id IN (");
                push_placeholders(sql, ids.len());
                sql.push(')');
                binds.extend(ids.iter().map(|id| Value::Integer(*id)));
            }
            Self::Exact(field, value) => {
                ensure_accepts(*field, value, "exact")?;
                sql.push_str(field.column());
                sql.push_str(" = ?");
                binds.push(value.to_sql_value());
            }
            Self::IExact(field, value) => {
                ensure_kind(*field, FieldKind::Text, "iexact")?;
                sql.push_str(field.column());
                sql.push_str(" = ? COLLATE NOCASE");
                binds.push(Value::Text(value.clone()));
            }
            Self::IContains(field, value) => {
                ensure_kind(*field, FieldKind::Text, "icontains")?;
                sql.push_str(field.column());
                sql.push_str(" LIKE ? ESCAPE '\\'");
                binds.push(Value::Text(format!("%{}%", escape_like(value))));
            }
            Self::Year(field, year) => {
                ensure_kind(*field, FieldKind::Date, "year")?;
                sql.push_str("CAST(strftime('%Y', ");
                sql.push_str(field.column());
                sql.push_str(") AS INTEGER) = ?");
                binds.push(Value::Integer(i64::from(*year)));
            }
            Self::Compare(field, comparison, value) => {
                ensure_accepts(*field, value, comparison.operator())?;
                sql.push_str(field.column());
                sql.push(' ');
                sql.push_str(comparison.operator());
                sql.push_str(" ?");
                binds.push(value.to_sql_value());
            }
            Self::And(parts) => write_group(parts, " AND ", "1 = 1", sql, binds)?,
            Self::Or(parts) => write_group(parts, " OR ", "1 = 0", sql, binds)?,
            Self::Not(inner) => {
                sql.push_str("NOT (");
                inner.write_sql(sql, binds)?;
                sql.push(')');
            }
        }
        Ok(())
    }
}

/// Sort key for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy<F> {
    pub field: F,
    pub descending: bool,
}

impl<F> OrderBy<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

/// Ordering and pagination options for list operations.
///
/// Rows are always finally ordered by ascending id, so results are stable
/// even without explicit sort keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery<F> {
    pub order_by: Vec<OrderBy<F>>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl<F> Default for ListQuery<F> {
    fn default() -> Self {
        Self {
            order_by: Vec::new(),
            limit: None,
            offset: 0,
        }
    }
}

impl<F: Field> ListQuery<F> {
    pub fn ordered_by(order_by: OrderBy<F>) -> Self {
        Self {
            order_by: vec![order_by],
            ..Self::default()
        }
    }

    /// Appends `ORDER BY` and `LIMIT/OFFSET` clauses.
    pub(crate) fn write_sql(&self, sql: &mut String, binds: &mut Vec<Value>) {
        sql.push_str(" ORDER BY ");
        for order in &self.order_by {
            sql.push_str(order.field.column());
            sql.push_str(if order.descending { " DESC, " } else { " ASC, " });
        }
        sql.push_str("id ASC");

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(i64::from(limit)));
            if self.offset > 0 {
                sql.push_str(" OFFSET ?");
                binds.push(Value::Integer(i64::from(self.offset)));
            }
        } else if self.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            binds.push(Value::Integer(i64::from(self.offset)));
        }
    }
}

/// Validates a bulk assignment against its field kind.
pub(crate) fn ensure_assignable<F: Field>(field: F, value: &FieldValue) -> RepoResult<()> {
    if field.kind() == FieldKind::Id {
        return Err(RepoError::InvalidLookup(format!(
            "`{}` is store-assigned and cannot be updated",
            field.column()
        )));
    }
    ensure_accepts(field, value, "assignment")
}

pub(crate) fn push_placeholders(sql: &mut String, count: usize) {
    for idx in 0..count {
        if idx > 0 {
            sql.push_str(", ");
        }
        sql.push('?');
    }
}

fn write_group<F: Field>(
    parts: &[Predicate<F>],
    separator: &str,
    empty: &str,
    sql: &mut String,
    binds: &mut Vec<Value>,
) -> RepoResult<()> {
    if parts.is_empty() {
        sql.push_str(empty);
        return Ok(());
    }

    sql.push('(');
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            sql.push_str(separator);
        }
        part.write_sql(sql, binds)?;
    }
    sql.push(')');
    Ok(())
}

fn ensure_kind<F: Field>(field: F, expected: FieldKind, lookup: &str) -> RepoResult<()> {
    if field.kind() == expected {
        return Ok(());
    }
    Err(RepoError::InvalidLookup(format!(
        "`{lookup}` is not supported on {:?} field `{}`",
        field.kind(),
        field.column()
    )))
}

fn ensure_accepts<F: Field>(field: F, value: &FieldValue, lookup: &str) -> RepoResult<()> {
    if field.kind().accepts(value) {
        return Ok(());
    }
    Err(RepoError::InvalidLookup(format!(
        "{lookup} on {:?} field `{}` got incompatible value {value}",
        field.kind(),
        field.column()
    )))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_like, ListQuery, OrderBy, Predicate};
    use crate::model::blog::BlogField;
    use crate::model::entry::EntryField;
    use crate::repo::RepoError;
    use rusqlite::types::Value;

    fn compile<F: crate::model::field::Field>(predicate: &Predicate<F>) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut binds = Vec::new();
        predicate.write_sql(&mut sql, &mut binds).unwrap();
        (sql, binds)
    }

    #[test]
    fn year_lookup_compiles_to_strftime() {
        let (sql, binds) = compile(&Predicate::year(EntryField::PubDate, 2007));
        assert_eq!(sql, "CAST(strftime('%Y', pub_date) AS INTEGER) = ?");
        assert_eq!(binds, vec![Value::Integer(2007)]);
    }

    #[test]
    fn combinators_flatten_and_group() {
        let predicate = Predicate::iexact(BlogField::Name, "Laptops")
            .or(Predicate::id(3))
            .or(Predicate::icontains(BlogField::Tagline, "news"))
            .negate();
        let (sql, binds) = compile(&predicate);
        assert_eq!(
            sql,
            "NOT ((name = ? COLLATE NOCASE OR id IN (?) OR tagline LIKE ? ESCAPE '\\'))"
        );
        assert_eq!(binds.len(), 3);
    }

    #[test]
    fn empty_id_list_matches_nothing() {
        let (sql, binds) = compile(&Predicate::<BlogField>::id_in(Vec::new()));
        assert_eq!(sql, "1 = 0");
        assert!(binds.is_empty());
    }

    #[test]
    fn year_on_text_field_is_rejected() {
        let mut sql = String::new();
        let mut binds = Vec::new();
        let err = Predicate::year(BlogField::Name, 2007)
            .write_sql(&mut sql, &mut binds)
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidLookup(_)));
    }

    #[test]
    fn exact_with_mismatched_value_is_rejected() {
        let mut sql = String::new();
        let mut binds = Vec::new();
        let err = Predicate::exact(EntryField::Rating, "five")
            .write_sql(&mut sql, &mut binds)
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidLookup(_)));
    }

    #[test]
    fn list_query_always_ends_with_id_tiebreak() {
        let query = ListQuery {
            order_by: vec![OrderBy::desc(EntryField::Rating)],
            limit: Some(5),
            offset: 10,
        };
        let mut sql = String::new();
        let mut binds = Vec::new();
        query.write_sql(&mut sql, &mut binds);
        assert_eq!(sql, " ORDER BY rating DESC, id ASC LIMIT ? OFFSET ?");
        assert_eq!(binds, vec![Value::Integer(5), Value::Integer(10)]);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
    }
}
