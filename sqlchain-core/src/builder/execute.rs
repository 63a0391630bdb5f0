//! Terminal operations: compile, hand to an executor, read back results

use super::{Aggregate, AggregateFunction, Builder};
use crate::grammar::AGGREGATE_ALIAS;
use crate::{Column, ColumnList, Executor, IntoColumns, Operator, ResultSet, Result, Row, Value};
use serde::de::DeserializeOwned;
use std::str::FromStr;
use tracing::debug;

impl Builder {
    /// Run the SELECT and return every row
    pub async fn get<E: Executor>(&self, executor: &E) -> Result<ResultSet> {
        let sql = self.to_sql();
        let bindings = self.binding_values();
        debug!(sql = %sql, bindings = bindings.len(), "executing select");
        executor.execute_query(&sql, &bindings).await
    }

    /// Run the SELECT, selecting `columns` when no columns were chosen yet
    pub async fn get_columns<E, C>(&mut self, executor: &E, columns: C) -> Result<ResultSet>
    where
        E: Executor,
        C: IntoColumns,
    {
        if self.columns.is_empty() {
            self.columns = columns.into_columns();
        }
        self.get(executor).await
    }

    /// Run the SELECT and deserialize each row into `T`
    pub async fn get_as<T, E>(&self, executor: &E) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        E: Executor,
    {
        self.get(executor).await?.deserialize()
    }

    /// First row, if any. Sets LIMIT 1 on the query.
    pub async fn first<E: Executor>(&mut self, executor: &E) -> Result<Option<Row>> {
        self.limit(1);
        Ok(self.get(executor).await?.into_first())
    }

    pub async fn first_columns<E, C>(&mut self, executor: &E, columns: C) -> Result<Option<Row>>
    where
        E: Executor,
        C: IntoColumns,
    {
        self.limit(1);
        Ok(self.get_columns(executor, columns).await?.into_first())
    }

    /// Row whose `id` equals `id`
    pub async fn find<E, C>(
        &mut self,
        executor: &E,
        id: impl Into<Value>,
        columns: C,
    ) -> Result<Option<Row>>
    where
        E: Executor,
        C: IntoColumns,
    {
        self.where_("id", Operator::EQ, id)?;
        self.first_columns(executor, columns).await
    }

    /// INSERT one row into the query's table; unnamed columns are dropped.
    /// Returns the affected row count.
    pub async fn insert<E, I>(&self, executor: &E, columns: I) -> Result<u64>
    where
        E: Executor,
        I: IntoIterator<Item = Column>,
    {
        let columns: ColumnList = columns.into_iter().collect();
        let sql = self.grammar.compile_insert(&self.table, &columns);
        let bindings: Vec<Value> = columns
            .iter()
            .map(|column| column.value.clone().unwrap_or(Value::Null))
            .filter(|value| !value.is_raw())
            .collect();

        debug!(sql = %sql, bindings = bindings.len(), "executing insert");
        executor.execute_non_query(&sql, &bindings).await
    }

    /// `count(*)`
    pub async fn count<E: Executor>(&mut self, executor: &E) -> Result<i64> {
        self.count_columns(executor, ColumnList::new()).await
    }

    pub async fn count_columns<E, C>(&mut self, executor: &E, columns: C) -> Result<i64>
    where
        E: Executor,
        C: IntoColumns,
    {
        let value = self
            .aggregate(executor, AggregateFunction::Count, columns)
            .await?;
        Ok(parse_aggregate(value))
    }

    pub async fn min<E: Executor>(&mut self, executor: &E, column: &str) -> Result<i64> {
        let value = self.aggregate(executor, AggregateFunction::Min, column).await?;
        Ok(parse_aggregate(value))
    }

    pub async fn max<E: Executor>(&mut self, executor: &E, column: &str) -> Result<i64> {
        let value = self.aggregate(executor, AggregateFunction::Max, column).await?;
        Ok(parse_aggregate(value))
    }

    /// Integer sum; a fractional sum does not parse and reads as zero
    pub async fn sum<E: Executor>(&mut self, executor: &E, column: &str) -> Result<i64> {
        let value = self.aggregate(executor, AggregateFunction::Sum, column).await?;
        Ok(parse_aggregate(value))
    }

    pub async fn avg<E: Executor>(&mut self, executor: &E, column: &str) -> Result<f64> {
        let value = self.aggregate(executor, AggregateFunction::Avg, column).await?;
        Ok(parse_aggregate(value))
    }

    /// Run an aggregate query and return the raw `aggregate` cell.
    ///
    /// The previous column selection is restored afterwards, also when the
    /// executor fails, so the builder can be reused.
    pub async fn aggregate<E, C>(
        &mut self,
        executor: &E,
        function: AggregateFunction,
        columns: C,
    ) -> Result<Option<Value>>
    where
        E: Executor,
        C: IntoColumns,
    {
        let mut columns = columns.into_columns();
        if columns.is_empty() {
            columns.add_all_column();
        }

        let previous = self.columns.clone();
        self.aggregate = Some(Aggregate { function, columns });
        let results = self.get(executor).await;
        self.aggregate = None;
        self.columns = previous;

        let results = results?;
        Ok(results
            .first()
            .and_then(|row| row.value(AGGREGATE_ALIAS).ok())
            .cloned())
    }
}

/// Parse an aggregate cell, reading anything unparsable as zero
fn parse_aggregate<T>(value: Option<Value>) -> T
where
    T: FromStr + Default,
{
    let Some(value) = value else {
        debug!("aggregate query returned no row, using zero");
        return T::default();
    };

    match value.to_string().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            debug!(value = %value, "aggregate result is not numeric, using zero");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{op, Builder, Column, Error, Executor, Grammar, ResultSet, Result, Row, Value};
    use serde::Deserialize;
    use std::sync::Mutex;

    /// Records every statement and answers queries with canned rows
    #[derive(Default)]
    struct MockExecutor {
        rows: Vec<Row>,
        statements: Mutex<Vec<(String, Vec<Value>)>>,
        fail: bool,
    }

    impl MockExecutor {
        fn returning(rows: Vec<Row>) -> Self {
            Self {
                rows,
                ..Default::default()
            }
        }

        fn aggregate(value: impl Into<Value>) -> Self {
            Self::returning(vec![vec![Column::with_value("aggregate", value)]
                .into_iter()
                .collect()])
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn statements(&self) -> Vec<(String, Vec<Value>)> {
            self.statements.lock().unwrap().clone()
        }

        fn record(&self, sql: &str, bindings: &[Value]) -> Result<()> {
            self.statements
                .lock()
                .unwrap()
                .push((sql.to_string(), bindings.to_vec()));
            if self.fail {
                return Err(Error::execution("connection reset"));
            }
            Ok(())
        }
    }

    impl Executor for MockExecutor {
        async fn execute_query(&self, sql: &str, bindings: &[Value]) -> Result<ResultSet> {
            self.record(sql, bindings)?;
            Ok(self.rows.clone().into())
        }

        async fn execute_non_query(&self, sql: &str, bindings: &[Value]) -> Result<u64> {
            self.record(sql, bindings)?;
            Ok(1)
        }

        fn grammar(&self) -> Grammar {
            Grammar::mysql()
        }
    }

    fn user(id: i64, name: &str) -> Row {
        vec![Column::with_value("id", id), Column::with_value("name", name)]
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_get_sends_sql_and_bindings() {
        let db = MockExecutor::returning(vec![user(1, "Ada"), user(2, "Bob")]);
        let mut query = Builder::with_connection(&db);
        query.from("users").where_("age", op::GT, 18).unwrap();

        let rows = query.get(&db).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            db.statements(),
            vec![(
                "select * from `users` where `age` > @binding0".to_string(),
                vec![Value::Integer(18)]
            )]
        );
    }

    #[tokio::test]
    async fn test_get_columns_only_fills_empty_selection() {
        let db = MockExecutor::default();
        let mut query = Builder::with_connection(&db);
        query.from("users");
        query.get_columns(&db, ("id", "name")).await.unwrap();

        query.select("email");
        query.get_columns(&db, "id").await.unwrap();

        let statements = db.statements();
        assert_eq!(statements[0].0, "select `id`, `name` from `users`");
        assert_eq!(statements[1].0, "select `email` from `users`");
    }

    #[tokio::test]
    async fn test_get_as_deserializes_rows() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: i64,
            name: String,
        }

        let db = MockExecutor::returning(vec![user(1, "Ada")]);
        let mut query = Builder::with_connection(&db);
        query.from("users");
        let users: Vec<User> = query.get_as(&db).await.unwrap();
        assert_eq!(
            users,
            vec![User {
                id: 1,
                name: "Ada".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_first_limits_to_one() {
        let db = MockExecutor::returning(vec![user(1, "Ada"), user(2, "Bob")]);
        let mut query = Builder::with_connection(&db);
        query.from("users").latest();

        let row = query.first(&db).await.unwrap().unwrap();
        assert_eq!(row.value("name").unwrap(), &Value::String("Ada".into()));
        assert_eq!(
            db.statements()[0].0,
            "select * from `users` order by `created_at` desc limit 1"
        );
    }

    #[tokio::test]
    async fn test_first_on_empty_result_is_none() {
        let db = MockExecutor::default();
        let mut query = Builder::with_connection(&db);
        query.from("users");
        assert!(query.first(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_adds_id_condition() {
        let db = MockExecutor::returning(vec![user(5, "Eve")]);
        let mut query = Builder::with_connection(&db);
        query.from("users");

        let row = query.find(&db, 5, vec!["id", "name"]).await.unwrap();
        assert!(row.is_some());
        assert_eq!(
            db.statements(),
            vec![(
                "select `id`, `name` from `users` where `id` = @binding0 limit 1".to_string(),
                vec![Value::Integer(5)]
            )]
        );
    }

    #[tokio::test]
    async fn test_insert_filters_unnamed_columns() {
        let db = MockExecutor::default();
        let mut query = Builder::with_connection(&db);
        query.from("users");

        let affected = query
            .insert(
                &db,
                vec![
                    Column::with_value("name", "Ada"),
                    Column::with_value("", "ignored"),
                    Column::new("nickname"),
                    Column::with_value("created_at", crate::raw("now()")),
                ],
            )
            .await
            .unwrap();

        assert_eq!(affected, 1);
        assert_eq!(
            db.statements(),
            vec![(
                "insert into `users` (`name`, `nickname`, `created_at`) values (@binding0, @binding1, now())"
                    .to_string(),
                vec![Value::String("Ada".into()), Value::Null]
            )]
        );
    }

    #[tokio::test]
    async fn test_count_restores_columns() {
        let db = MockExecutor::aggregate(42);
        let mut query = Builder::with_connection(&db);
        query.from("users").select(("id", "name"));

        assert_eq!(query.count(&db).await.unwrap(), 42);
        assert!(query.aggregate_clause().is_none());
        assert_eq!(
            query.columns().names().collect::<Vec<_>>(),
            vec!["id", "name"]
        );
        assert_eq!(
            db.statements()[0].0,
            "select count(*) as aggregate from `users`"
        );
        assert_eq!(query.to_sql(), "select `id`, `name` from `users`");
    }

    #[tokio::test]
    async fn test_distinct_count_column() {
        let db = MockExecutor::aggregate(3);
        let mut query = Builder::with_connection(&db);
        query.from("users").distinct();
        assert_eq!(query.count_columns(&db, "country").await.unwrap(), 3);
        assert_eq!(
            db.statements()[0].0,
            "select count(distinct `country`) as aggregate from `users`"
        );
    }

    #[tokio::test]
    async fn test_min_max_sum_avg() {
        let db = MockExecutor::aggregate("17");
        let mut query = Builder::with_connection(&db);
        query.from("orders").where_("status", op::EQ, "paid").unwrap();

        assert_eq!(query.min(&db, "total").await.unwrap(), 17);
        assert_eq!(query.max(&db, "total").await.unwrap(), 17);
        assert_eq!(query.sum(&db, "total").await.unwrap(), 17);
        assert_eq!(query.avg(&db, "total").await.unwrap(), 17.0);

        let sql: Vec<String> = db.statements().into_iter().map(|(sql, _)| sql).collect();
        assert_eq!(
            sql,
            vec![
                "select min(`total`) as aggregate from `orders` where `status` = @binding0",
                "select max(`total`) as aggregate from `orders` where `status` = @binding0",
                "select sum(`total`) as aggregate from `orders` where `status` = @binding0",
                "select avg(`total`) as aggregate from `orders` where `status` = @binding0",
            ]
        );
    }

    #[tokio::test]
    async fn test_unparsable_aggregate_reads_as_zero() {
        let db = MockExecutor::aggregate(12.5);
        let mut query = Builder::with_connection(&db);
        query.from("orders");
        assert_eq!(query.sum(&db, "total").await.unwrap(), 0);
        assert_eq!(query.avg(&db, "total").await.unwrap(), 12.5);

        let db = MockExecutor::aggregate("n/a");
        assert_eq!(query.count(&db).await.unwrap(), 0);

        let db = MockExecutor::default();
        assert_eq!(query.max(&db, "total").await.unwrap(), 0);

        let db = MockExecutor::returning(vec![user(1, "Ada")]);
        assert_eq!(query.count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_aggregate_restores_state_on_error() {
        let db = MockExecutor::failing();
        let mut query = Builder::with_connection(&db);
        query.from("users").select("id");

        let err = query.count(&db).await.unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
        assert!(query.aggregate_clause().is_none());
        assert_eq!(query.to_sql(), "select `id` from `users`");
    }

    #[tokio::test]
    async fn test_executor_errors_propagate() {
        let db = MockExecutor::failing();
        let mut query = Builder::with_connection(&db);
        query.from("users");
        assert!(query.get(&db).await.is_err());
        assert!(query.insert(&db, vec![Column::with_value("a", 1)]).await.is_err());
    }
}
