//! Fluent query model
//!
//! A `Builder` accumulates the clauses of one statement and registers bound
//! values as each clause is added. Compilation is delegated to its
//! [`Grammar`]; execution to an [`Executor`] passed to the terminal
//! operations in `execute`.

mod bindings;
mod clause;
mod execute;
mod wheres;

pub use bindings::{BindingType, Bindings};
pub use clause::{
    Aggregate, AggregateFunction, Conjunction, HavingClause, JoinClause, JoinCondition,
    JoinOperand, JoinType, OrderClause, OrderDirection, UnionClause, WhereClause, WhereKind,
    WhereValue,
};

use crate::{ColumnList, Executor, Grammar, IntoColumns, IntoOperator, Result, Value};

/// Column used by `latest` / `oldest`
pub const CREATED_AT: &str = "created_at";

/// A mutable, chainable representation of one SQL statement
#[derive(Debug, Clone)]
pub struct Builder {
    pub(crate) grammar: Grammar,
    pub(crate) bindings: Bindings,
    pub(crate) aggregate: Option<Aggregate>,
    pub(crate) columns: ColumnList,
    pub(crate) distinct: bool,
    pub(crate) table: String,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) wheres: Vec<WhereClause>,
    pub(crate) groups: Vec<String>,
    pub(crate) havings: Vec<HavingClause>,
    pub(crate) orders: Vec<OrderClause>,
    pub(crate) limit: u64,
    pub(crate) offset: u64,
    pub(crate) unions: Vec<UnionClause>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new(Grammar::standard())
    }
}

impl Builder {
    /// Create an empty query compiled by `grammar`
    pub fn new(grammar: Grammar) -> Self {
        Self {
            grammar,
            bindings: Bindings::new(),
            aggregate: None,
            columns: ColumnList::new(),
            distinct: false,
            table: String::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            limit: 0,
            offset: 0,
            unions: Vec::new(),
        }
    }

    /// Create an empty query using the executor's grammar
    pub fn with_connection<E: Executor>(executor: &E) -> Self {
        Self::new(executor.grammar())
    }

    /// Fresh query sharing this query's grammar
    pub fn new_query(&self) -> Builder {
        Builder::new(self.grammar.clone())
    }

    /// Replace the column selection
    pub fn select<C: IntoColumns>(&mut self, columns: C) -> &mut Self {
        self.columns = columns.into_columns();
        self
    }

    /// Append to the column selection; unnamed columns are skipped
    pub fn add_select<C: IntoColumns>(&mut self, columns: C) -> &mut Self {
        self.columns.extend(columns.into_columns());
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    pub fn from(&mut self, table: &str) -> &mut Self {
        self.table = table.to_string();
        self
    }

    /// INNER JOIN comparing two columns
    pub fn join(
        &mut self,
        table: &str,
        first: &str,
        operator: impl IntoOperator,
        second: &str,
    ) -> &mut Self {
        self.add_join(JoinClause::new(JoinType::Inner, table).on(first, operator, second))
    }

    /// INNER JOIN comparing a column with a bound value
    pub fn join_where(
        &mut self,
        table: &str,
        first: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.add_join(JoinClause::new(JoinType::Inner, table).where_(first, operator, value))
    }

    pub fn left_join(
        &mut self,
        table: &str,
        first: &str,
        operator: impl IntoOperator,
        second: &str,
    ) -> &mut Self {
        self.add_join(JoinClause::new(JoinType::Left, table).on(first, operator, second))
    }

    pub fn left_join_where(
        &mut self,
        table: &str,
        first: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.add_join(JoinClause::new(JoinType::Left, table).where_(first, operator, value))
    }

    pub fn right_join(
        &mut self,
        table: &str,
        first: &str,
        operator: impl IntoOperator,
        second: &str,
    ) -> &mut Self {
        self.add_join(JoinClause::new(JoinType::Right, table).on(first, operator, second))
    }

    pub fn right_join_where(
        &mut self,
        table: &str,
        first: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.add_join(JoinClause::new(JoinType::Right, table).where_(first, operator, value))
    }

    /// Append a prepared join and register its parameter values
    pub fn add_join(&mut self, join: JoinClause) -> &mut Self {
        self.bindings
            .extend(BindingType::Join, join.bindings.iter().cloned());
        self.joins.push(join);
        self
    }

    /// Append GROUP BY columns; unnamed columns are skipped
    pub fn group_by<C: IntoColumns>(&mut self, columns: C) -> &mut Self {
        self.groups
            .extend(columns.into_columns().names().map(str::to_string));
        self
    }

    /// Add a HAVING condition. The column is emitted as written so it may be
    /// an aggregate expression.
    pub fn having(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.having_with(column, operator, value, Conjunction::And)
    }

    pub fn or_having(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.having_with(column, operator, value, Conjunction::Or)
    }

    pub fn having_with(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
        conjunction: Conjunction,
    ) -> Result<&mut Self> {
        let operator = operator.try_into_operator()?;
        let value = value.into();
        self.add_binding(BindingType::Having, value.clone());
        self.havings.push(HavingClause {
            column: column.to_string(),
            operator,
            value,
            conjunction,
        });
        Ok(self)
    }

    pub fn order_by(&mut self, column: &str, direction: OrderDirection) -> &mut Self {
        self.orders.push(OrderClause {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Newest first by `created_at`
    pub fn latest(&mut self) -> &mut Self {
        self.latest_by(CREATED_AT)
    }

    pub fn latest_by(&mut self, column: &str) -> &mut Self {
        self.order_by(column, OrderDirection::Desc)
    }

    /// Oldest first by `created_at`
    pub fn oldest(&mut self) -> &mut Self {
        self.oldest_by(CREATED_AT)
    }

    pub fn oldest_by(&mut self, column: &str) -> &mut Self {
        self.order_by(column, OrderDirection::Asc)
    }

    /// Set LIMIT. Non-positive values leave the current limit untouched.
    pub fn limit(&mut self, limit: i64) -> &mut Self {
        if limit > 0 {
            self.limit = limit as u64;
        }
        self
    }

    /// Set OFFSET, clamped at zero
    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.offset = offset.max(0) as u64;
        self
    }

    /// Append `query` as a UNION (or UNION ALL) and copy its bindings.
    /// `query` stays usable on its own.
    ///
    /// Unions render after every other clause, so the unioned values are
    /// registered in their own positional order under `BindingType::Order`,
    /// the last category traversed.
    pub fn union(&mut self, query: &Builder, all: bool) -> &mut Self {
        self.bindings
            .extend(BindingType::Order, query.bindings.flatten());
        self.unions.push(UnionClause {
            query: Box::new(query.clone()),
            all,
        });
        self
    }

    /// Build the unioned query in a callback on a fresh builder
    pub fn union_with<F>(&mut self, callback: F, all: bool) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        let mut query = self.new_query();
        callback(&mut query)?;
        Ok(self.union(&query, all))
    }

    /// Register a bound value under `binding_type`; raw values are skipped
    pub fn add_binding(&mut self, binding_type: BindingType, value: Value) -> &mut Self {
        self.bindings.add(binding_type, value);
        self
    }

    /// Compiled SELECT statement text
    pub fn to_sql(&self) -> String {
        self.grammar.compile_select(self)
    }

    /// Compiled SELECT statement with its bindings in positional order
    pub fn compile(&self) -> (String, Vec<(BindingType, Value)>) {
        let bindings = self
            .bindings
            .iter()
            .map(|(binding_type, value)| (binding_type, value.clone()))
            .collect();
        (self.to_sql(), bindings)
    }

    /// Bound values in positional order
    pub fn binding_values(&self) -> Vec<Value> {
        self.bindings.flatten()
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &ColumnList {
        &self.columns
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn aggregate_clause(&self) -> Option<&Aggregate> {
        self.aggregate.as_ref()
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn wheres(&self) -> &[WhereClause] {
        &self.wheres
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn havings(&self) -> &[HavingClause] {
        &self.havings
    }

    pub fn orders(&self) -> &[OrderClause] {
        &self.orders
    }

    pub fn unions(&self) -> &[UnionClause] {
        &self.unions
    }

    /// Current limit, 0 when unset
    pub fn limit_value(&self) -> u64 {
        self.limit
    }

    /// Current offset, 0 when unset
    pub fn offset_value(&self) -> u64 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op;

    fn query() -> Builder {
        let mut query = Builder::new(Grammar::standard());
        query.from("users");
        query
    }

    #[test]
    fn test_defaults() {
        let builder = Builder::default();
        assert_eq!(builder.table(), "");
        assert!(builder.columns().is_empty());
        assert!(!builder.is_distinct());
        assert!(builder.aggregate_clause().is_none());
        assert_eq!(builder.limit_value(), 0);
        assert_eq!(builder.offset_value(), 0);
        assert!(builder.bindings().is_empty());
    }

    #[test]
    fn test_select_replaces_and_add_select_appends() {
        let mut builder = query();
        builder.select(("id", "name"));
        builder.select("email");
        assert_eq!(builder.columns().names().collect::<Vec<_>>(), vec!["email"]);

        builder.add_select(vec!["id", ""]);
        assert_eq!(
            builder.columns().names().collect::<Vec<_>>(),
            vec!["email", "id"]
        );
    }

    #[test]
    fn test_limit_ignores_non_positive() {
        let mut builder = query();
        builder.limit(10);
        builder.limit(0);
        builder.limit(-1);
        assert_eq!(builder.limit_value(), 10);
    }

    #[test]
    fn test_offset_clamps() {
        let mut builder = query();
        builder.offset(15);
        assert_eq!(builder.offset_value(), 15);
        builder.offset(-4);
        assert_eq!(builder.offset_value(), 0);
    }

    #[test]
    fn test_group_by_skips_empty_names() {
        let mut builder = query();
        builder.group_by(vec!["country", "", "city"]).group_by("zip");
        assert_eq!(builder.groups(), &["country", "city", "zip"]);
    }

    #[test]
    fn test_having_registers_bindings() {
        let mut builder = query();
        builder
            .having("count(*)", op::GT, 3)
            .unwrap()
            .or_having("max(age)", op::LT, Value::Raw("100".into()))
            .unwrap();
        assert_eq!(builder.havings().len(), 2);
        assert_eq!(builder.havings()[1].conjunction, Conjunction::Or);
        assert_eq!(
            builder.bindings().get(BindingType::Having),
            &[Value::Integer(3)]
        );
    }

    #[test]
    fn test_having_rejects_unknown_operator() {
        let mut builder = query();
        let err = builder.having("count(*)", "bogus", 1).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidArgument { .. }));
        assert!(builder.havings().is_empty());
        assert!(builder.bindings().is_empty());
    }

    #[test]
    fn test_latest_and_oldest() {
        let mut builder = query();
        builder.latest().oldest_by("id");
        assert_eq!(
            builder.orders(),
            &[
                OrderClause {
                    column: "created_at".into(),
                    direction: OrderDirection::Desc
                },
                OrderClause {
                    column: "id".into(),
                    direction: OrderDirection::Asc
                },
            ]
        );
        assert_eq!(
            builder.to_sql(),
            "select * from \"users\" order by \"created_at\" desc, \"id\" asc"
        );
    }

    #[test]
    fn test_join_bindings_are_join_category() {
        let mut builder = query();
        builder
            .join("posts", "users.id", op::EQ, "posts.user_id")
            .right_join_where("teams", "teams.active", op::EQ, 1);
        assert_eq!(builder.joins().len(), 2);
        assert_eq!(builder.joins()[1].join_type, JoinType::Right);
        assert_eq!(builder.bindings().get(BindingType::Join), &[Value::Integer(1)]);
        assert!(builder.bindings().get(BindingType::Where).is_empty());
    }

    #[test]
    fn test_union_copies_bindings_without_moving() {
        let mut other = query();
        other.where_("id", op::EQ, 2).unwrap();

        let mut builder = query();
        builder.where_("id", op::EQ, 1).unwrap().union(&other, true);

        assert_eq!(
            builder.binding_values(),
            vec![Value::Integer(1), Value::Integer(2)]
        );
        assert_eq!(other.binding_values(), vec![Value::Integer(2)]);
        assert!(builder.unions()[0].all);
    }

    #[test]
    fn test_union_binds_after_having() {
        let mut other = query();
        other.where_("id", op::EQ, 2).unwrap();

        let mut builder = query();
        builder
            .group_by("age")
            .having("count(*)", op::GT, 1)
            .unwrap()
            .union(&other, false);

        let (sql, bindings) = builder.compile();
        assert_eq!(
            sql,
            "select * from \"users\" group by \"age\" having count(*) > @binding0 union select * from \"users\" where \"id\" = @binding1"
        );
        assert_eq!(
            bindings,
            vec![
                (BindingType::Having, Value::Integer(1)),
                (BindingType::Order, Value::Integer(2)),
            ]
        );
    }

    #[test]
    fn test_union_join_binding_follows_parent_where() {
        let mut builder = query();
        builder
            .where_("a", op::EQ, 1)
            .unwrap()
            .union_with(
                |q| Ok(q.from("posts").join_where("tags", "tags.name", op::EQ, "rust")),
                false,
            )
            .unwrap();

        let (sql, _) = builder.compile();
        assert_eq!(
            sql,
            "select * from \"users\" where \"a\" = @binding0 union select * from \"posts\" inner join \"tags\" on \"tags\".\"name\" = @binding1"
        );
        assert_eq!(
            builder.binding_values(),
            vec![Value::Integer(1), Value::String("rust".into())]
        );
    }

    #[test]
    fn test_union_with_callback_error_propagates() {
        let mut builder = query();
        let result = builder.union_with(|q| q.from("b").where_("x", op::GT, ()), false);
        assert!(matches!(result, Err(crate::Error::InvalidArgument { .. })));
        assert!(builder.unions().is_empty());
    }

    #[test]
    fn test_new_query_shares_grammar() {
        let mut builder = Builder::new(Grammar::mysql());
        builder.from("users").where_("a", op::EQ, 1).unwrap();
        let mut fresh = builder.new_query();
        assert_eq!(fresh.table(), "");
        assert!(fresh.bindings().is_empty());
        fresh.from("t");
        assert_eq!(fresh.to_sql(), "select * from `t`");
    }

    #[test]
    fn test_compile_tags_bindings() {
        let mut builder = query();
        builder
            .left_join_where("roles", "roles.name", op::EQ, "admin")
            .where_("age", op::GTE, 21)
            .unwrap()
            .group_by("age")
            .having("count(*)", op::GT, 1)
            .unwrap();

        let (sql, bindings) = builder.compile();
        assert_eq!(
            sql,
            "select * from \"users\" left join \"roles\" on \"roles\".\"name\" = @binding0 where \"age\" >= @binding1 group by \"age\" having count(*) > @binding2"
        );
        assert_eq!(
            bindings,
            vec![
                (BindingType::Join, Value::String("admin".into())),
                (BindingType::Where, Value::Integer(21)),
                (BindingType::Having, Value::Integer(1)),
            ]
        );
    }

    #[test]
    fn test_add_binding_skips_raw() {
        let mut builder = query();
        builder
            .add_binding(BindingType::Select, Value::Integer(1))
            .add_binding(BindingType::Order, Value::Raw("rand()".into()));
        assert_eq!(builder.bindings().len(), 1);
    }
}
