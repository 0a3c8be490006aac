//! Typed statements with positional bound parameters
//!
//! Every statement the repositories send is a [`Statement`]: SQL text with `?`
//! placeholders plus the values bound to them, in order. [`Upsert`] and
//! [`InsertIgnore`] generate the multi-column statements so a column list is
//! written exactly once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;

use crate::models::ValidationError;

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Bool(bool),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u16> for SqlValue {
    fn from(v: u16) -> Self {
        Self::Int(v.into())
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        Self::Text(v.clone())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl SqlValue {
    fn redacted(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Int(_) => "int".to_string(),
            Self::Bool(_) => "bool".to_string(),
            Self::Text(s) => format!("text({} bytes)", s.len()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{:?}", v),
        }
    }
}

/// How bound values show up in statement logs.
///
/// Payloads and permission data can be sensitive, so the default only
/// records value types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueLogging {
    /// Values verbatim.
    Full,
    /// Type and size of each value.
    #[default]
    Redacted,
    /// Value count only.
    Off,
}

impl FromStr for ValueLogging {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "redacted" => Ok(Self::Redacted),
            "off" | "none" => Ok(Self::Off),
            other => Err(ValidationError::InvalidVariant {
                field: "value logging",
                value: other.to_owned(),
            }),
        }
    }
}

impl ValueLogging {
    pub fn render(self, values: &[SqlValue]) -> String {
        match self {
            Self::Full => render_list(values.iter().map(ToString::to_string)),
            Self::Redacted => render_list(values.iter().map(SqlValue::redacted)),
            Self::Off => format!("<{} values>", values.len()),
        }
    }
}

fn render_list(items: impl Iterator<Item = String>) -> String {
    format!("[{}]", items.collect::<Vec<_>>().join(", "))
}

/// `?, ?, ?` for `n` placeholders.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// SQL text plus its positional values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    values: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            values: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn bind_all<V: Into<SqlValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.values.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// sqlx query with every value bound in order.
    pub(crate) fn query(&self) -> Query<'_, MySql, MySqlArguments> {
        self.values
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| match value {
                SqlValue::Null => query.bind(None::<i64>),
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Bool(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
            })
    }
}

/// `INSERT ... ON DUPLICATE KEY UPDATE` over one column list.
///
/// Columns added with [`value`](Self::value) are also refreshed on conflict,
/// through `VALUES(col)` so each value is bound once. Columns added with
/// [`insert_only`](Self::insert_only) keep their stored value.
///
/// `VALUES(col)` in the update clause is deprecated as of MySQL 8.0.20 (it
/// still works there, with a warning) and is the supported form on MariaDB.
#[derive(Debug, Clone)]
pub struct Upsert {
    table: &'static str,
    columns: Vec<UpsertColumn>,
}

#[derive(Debug, Clone)]
struct UpsertColumn {
    name: &'static str,
    value: SqlValue,
    refresh: bool,
}

impl Upsert {
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
        }
    }

    pub fn value(self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.push(column, value.into(), true)
    }

    /// Written on insert, left untouched when the row already exists.
    pub fn insert_only(self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.push(column, value.into(), false)
    }

    fn push(mut self, name: &'static str, value: SqlValue, refresh: bool) -> Self {
        self.columns.push(UpsertColumn {
            name,
            value,
            refresh,
        });
        self
    }

    pub fn build(self) -> Statement {
        let names: Vec<&str> = self.columns.iter().map(|column| column.name).collect();
        let mut updates: Vec<String> = self
            .columns
            .iter()
            .filter(|column| column.refresh)
            .map(|column| format!("{0} = VALUES({0})", column.name))
            .collect();
        if updates.is_empty() {
            // Nothing to refresh: keep the statement valid as a no-op update.
            if let Some(first) = names.first() {
                updates.push(format!("{0} = {0}", first));
            }
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON DUPLICATE KEY UPDATE {}",
            self.table,
            names.join(", "),
            placeholders(names.len()),
            updates.join(", "),
        );

        Statement::new(sql).bind_all(self.columns.into_iter().map(|column| column.value))
    }
}

/// Multi-row `INSERT IGNORE`; rows hitting a unique key are skipped.
#[derive(Debug, Clone)]
pub struct InsertIgnore {
    table: &'static str,
    columns: &'static [&'static str],
    rows: Vec<Vec<SqlValue>>,
}

impl InsertIgnore {
    pub fn table(table: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            table,
            columns,
            rows: Vec::new(),
        }
    }

    /// Panics in debug builds when the row width doesn't match the columns.
    pub fn row(mut self, row: Vec<SqlValue>) -> Self {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch");
        self.rows.push(row);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn build(self) -> Statement {
        let tuple = format!("({})", placeholders(self.columns.len()));
        let tuples = vec![tuple; self.rows.len()].join(", ");
        let sql = format!(
            "INSERT IGNORE INTO {} ({}) VALUES {}",
            self.table,
            self.columns.join(", "),
            tuples,
        );

        Statement::new(sql).bind_all(self.rows.into_iter().flatten())
    }
}
