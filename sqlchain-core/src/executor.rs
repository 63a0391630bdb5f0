//! Statement execution interface and fetched results

use crate::{Column, Error, Grammar, Result, Value};
use serde::de::DeserializeOwned;
use std::future::Future;

static NULL_VALUE: Value = Value::Null;

/// Runs compiled statements against a database.
///
/// Implementations bind `bindings` in order to the `@binding0`,
/// `@binding1`, ... placeholders of `sql`.
pub trait Executor: Send + Sync {
    /// Execute a statement that returns rows
    fn execute_query(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl Future<Output = Result<ResultSet>> + Send;

    /// Execute a statement that returns no rows; resolves to the affected row count
    fn execute_non_query(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Grammar for builders created from this executor
    fn grammar(&self) -> Grammar {
        Grammar::standard()
    }
}

/// One fetched row: named cells in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<Column>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Look up a cell by column name
    pub fn get(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .ok_or_else(|| Error::column_not_found(name))
    }

    /// Value of a cell; a cell without a value reads as null
    pub fn value(&self, name: &str) -> Result<&Value> {
        Ok(self.get(name)?.value.as_ref().unwrap_or(&NULL_VALUE))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    /// JSON object keyed by column name
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .map(|column| {
                let value = column
                    .value
                    .as_ref()
                    .map(Value::to_json)
                    .unwrap_or(serde_json::Value::Null);
                (column.name.clone(), value)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }

    /// Deserialize the row into `T` by column name
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl FromIterator<Column> for Row {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// Rows returned by a query, in fetch order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn into_first(self) -> Option<Row> {
        self.rows.into_iter().next()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Deserialize every row into `T`
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.rows.iter().map(Row::deserialize).collect()
    }
}

impl From<Vec<Row>> for ResultSet {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

impl FromIterator<Row> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// SQLite executor backed by an sqlx pool.
///
/// sqlx only binds `?`, `?NNN` and `$NNN` parameters, so every
/// `@binding<N>` is rewritten to `?<N+1>` before the statement is sent.
#[cfg(feature = "sqlite")]
pub mod sqlite {
    use super::{ResultSet, Row};
    use crate::{Column, Executor, Result, Value, BINDING_PREFIX};
    use sqlx::query::Query;
    use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteRow};
    use sqlx::{Column as _, Row as _, TypeInfo as _, ValueRef as _};
    use tracing::debug;

    /// SQLite connection pool wrapper
    #[derive(Debug, Clone)]
    pub struct SqliteExecutor {
        pool: SqlitePool,
    }

    impl SqliteExecutor {
        /// Connect to `database_url`
        pub async fn new(database_url: &str) -> Result<Self> {
            let pool = SqlitePool::connect(database_url).await?;
            Ok(Self { pool })
        }

        /// Wrap an existing pool
        pub fn from_pool(pool: SqlitePool) -> Self {
            Self { pool }
        }

        pub fn pool(&self) -> &SqlitePool {
            &self.pool
        }
    }

    impl Executor for SqliteExecutor {
        async fn execute_query(&self, sql: &str, bindings: &[Value]) -> Result<ResultSet> {
            let sql = numbered_parameters(sql);
            let rows = bind_values(sqlx::query(&sql), bindings)
                .fetch_all(&self.pool)
                .await?;
            debug!(rows = rows.len(), "sqlite query returned");
            rows.iter().map(decode_row).collect()
        }

        async fn execute_non_query(&self, sql: &str, bindings: &[Value]) -> Result<u64> {
            let sql = numbered_parameters(sql);
            let result = bind_values(sqlx::query(&sql), bindings)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        }
    }

    /// Rewrite `@binding<N>` to `?<N+1>`. Quoted literals and identifiers
    /// are copied untouched.
    fn numbered_parameters(sql: &str) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut quote: Option<char> = None;
        let mut rest = sql;

        while let Some(ch) = rest.chars().next() {
            match quote {
                Some(q) if ch == q => quote = None,
                None if matches!(ch, '\'' | '"' | '`') => quote = Some(ch),
                _ => {}
            }

            if quote.is_none() {
                if let Some(after) = rest.strip_prefix(BINDING_PREFIX) {
                    let digits = after.len()
                        - after.trim_start_matches(|c: char| c.is_ascii_digit()).len();
                    if let Ok(index) = after[..digits].parse::<usize>() {
                        out.push('?');
                        out.push_str(&(index + 1).to_string());
                        rest = &after[digits..];
                        continue;
                    }
                }
            }

            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
        out
    }

    fn bind_values<'q>(
        mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
        bindings: &[Value],
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        for value in bindings {
            query = match value {
                Value::Null => query.bind(None::<String>),
                Value::Integer(i) => query.bind(*i),
                Value::Float(f) => query.bind(*f),
                Value::String(s) => query.bind(s.clone()),
                Value::Timestamp(ts) => query.bind(ts.to_string()),
                // inlined by the grammar, never registered as a binding
                Value::Raw(_) => query,
            };
        }
        query
    }

    /// Map each cell by its runtime storage class
    fn decode_row(row: &SqliteRow) -> Result<Row> {
        let mut decoded = Row::new();
        for (index, column) in row.columns().iter().enumerate() {
            let raw = row.try_get_raw(index)?;
            let value = if raw.is_null() {
                Value::Null
            } else {
                match raw.type_info().name() {
                    "INTEGER" | "BOOLEAN" => Value::Integer(row.try_get::<i64, _>(index)?),
                    "REAL" => Value::Float(row.try_get::<f64, _>(index)?),
                    "BLOB" => {
                        let bytes = row.try_get::<Vec<u8>, _>(index)?;
                        Value::String(String::from_utf8_lossy(&bytes).into_owned())
                    }
                    _ => Value::String(row.try_get::<String, _>(index)?),
                }
            };
            decoded.push(Column::with_value(column.name(), value));
        }
        Ok(decoded)
    }

}
