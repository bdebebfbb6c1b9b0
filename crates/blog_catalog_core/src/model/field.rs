//! Typed field descriptors and values used by predicates, patches and
//! ordering.
//!
//! # Invariants
//! - Every `Field` maps to exactly one storage column.
//! - A `FieldValue` is only bound against a field of a compatible kind.

use chrono::NaiveDate;
use rusqlite::types::Value;
use std::fmt::{Display, Formatter};

/// Storage shape of a field, used to reject ill-typed lookups early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Store-assigned primary key.
    Id,
    /// Free text, bounded or not.
    Text,
    /// Signed integer.
    Integer,
    /// Calendar date stored as `YYYY-MM-DD`.
    Date,
    /// Integer id of a row in another table.
    Reference,
}

impl FieldKind {
    /// Returns whether `value` can be compared with or assigned to this kind.
    pub fn accepts(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (Self::Text, FieldValue::Text(_))
                | (Self::Date, FieldValue::Date(_))
                | (
                    Self::Id | Self::Integer | Self::Reference,
                    FieldValue::Integer(_)
                )
        )
    }
}

/// Column descriptor implemented by the per-record field enums.
pub trait Field: Copy + std::fmt::Debug {
    /// Column name in the record's table.
    fn column(self) -> &'static str;
    /// Storage kind of the column.
    fn kind(self) -> FieldKind;
}

/// Dynamically typed value for predicates and bulk assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    pub(crate) fn to_sql_value(&self) -> Value {
        match self {
            Self::Integer(value) => Value::Integer(*value),
            Self::Text(value) => Value::Text(value.clone()),
            Self::Date(value) => Value::Text(value.format("%Y-%m-%d").to_string()),
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
            Self::Date(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}
