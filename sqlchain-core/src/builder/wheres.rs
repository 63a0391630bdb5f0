//! WHERE clause builder methods

use super::{BindingType, Builder, Conjunction, WhereClause, WhereKind, WhereValue};
use crate::{Error, IntoOperator, Operator, Result, Value};

impl Builder {
    /// Add a basic `column operator value` condition.
    ///
    /// A null value is only accepted with equality, where it becomes
    /// `is null`; any other operator is rejected with `InvalidArgument`.
    ///
    /// # Examples
    /// ```
    /// use sqlchain_core::{op, table};
    ///
    /// # fn main() -> sqlchain_core::Result<()> {
    /// let mut query = table("users");
    /// query.where_("age", op::GT, 18)?.where_("name", "like", "J%")?;
    /// assert_eq!(
    ///     query.to_sql(),
    ///     "select * from \"users\" where \"age\" > @binding0 and \"name\" like @binding1"
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn where_(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.where_with(column, operator, value, Conjunction::And)
    }

    pub fn or_where(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.where_with(column, operator, value, Conjunction::Or)
    }

    pub fn where_with(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
        conjunction: Conjunction,
    ) -> Result<&mut Self> {
        let operator = operator.try_into_operator()?;
        let value = value.into();

        if value.is_null() {
            if !operator.is_equality() {
                return Err(Error::invalid_argument(format!(
                    "Null value compared with '{}' on column '{}'; use where_null or where_not_null",
                    operator, column
                )));
            }
            return Ok(self.null_with(column, conjunction, false));
        }

        self.add_binding(BindingType::Where, value.clone());
        self.wheres.push(
            WhereClause::new(WhereKind::Basic, column, conjunction)
                .with_operator(operator)
                .with_value(WhereValue::Scalar(value)),
        );
        Ok(self)
    }

    /// Group conditions in parentheses. The callback receives a query on
    /// the same table; if it adds no conditions nothing is appended.
    pub fn where_nested<F>(&mut self, callback: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        self.nested_with(callback, Conjunction::And)
    }

    pub fn or_where_nested<F>(&mut self, callback: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        self.nested_with(callback, Conjunction::Or)
    }

    fn nested_with<F>(&mut self, callback: F, conjunction: Conjunction) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        let mut query = self.new_query();
        query.from(&self.table);
        callback(&mut query)?;
        Ok(self.add_nested_where_query(query, conjunction))
    }

    /// Append an already built query's conditions as a parenthesized group.
    /// A query without conditions is dropped.
    pub fn add_nested_where_query(&mut self, query: Builder, conjunction: Conjunction) -> &mut Self {
        if query.wheres.is_empty() {
            return self;
        }
        self.push_query(WhereKind::Nested, "", Operator::EQ, query, conjunction)
    }

    pub fn where_between(
        &mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.between_with(column, low.into(), high.into(), Conjunction::And, false)
    }

    pub fn or_where_between(
        &mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.between_with(column, low.into(), high.into(), Conjunction::Or, false)
    }

    pub fn where_not_between(
        &mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.between_with(column, low.into(), high.into(), Conjunction::And, true)
    }

    pub fn or_where_not_between(
        &mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.between_with(column, low.into(), high.into(), Conjunction::Or, true)
    }

    fn between_with(
        &mut self,
        column: &str,
        low: Value,
        high: Value,
        conjunction: Conjunction,
        not: bool,
    ) -> &mut Self {
        let values = vec![low, high];
        self.bindings
            .extend(BindingType::Where, values.iter().cloned());
        self.wheres.push(
            WhereClause::new(WhereKind::Between, column, conjunction)
                .with_operator(Operator::BETWEEN)
                .with_value(WhereValue::List(values))
                .negated(not),
        );
        self
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.null_with(column, Conjunction::And, false)
    }

    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.null_with(column, Conjunction::Or, false)
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.null_with(column, Conjunction::And, true)
    }

    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.null_with(column, Conjunction::Or, true)
    }

    fn null_with(&mut self, column: &str, conjunction: Conjunction, not: bool) -> &mut Self {
        let kind = if not { WhereKind::NotNull } else { WhereKind::Null };
        self.wheres
            .push(WhereClause::new(kind, column, conjunction).negated(not));
        self
    }

    /// `column in (...)`. An empty list matches nothing.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_with(column, values, Conjunction::And, false)
    }

    pub fn or_where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_with(column, values, Conjunction::Or, false)
    }

    /// `column not in (...)`. An empty list matches everything.
    pub fn where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_with(column, values, Conjunction::And, true)
    }

    pub fn or_where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_with(column, values, Conjunction::Or, true)
    }

    fn in_with<I, V>(&mut self, column: &str, values: I, conjunction: Conjunction, not: bool) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.bindings
            .extend(BindingType::Where, values.iter().cloned());

        let kind = if not { WhereKind::NotIn } else { WhereKind::In };
        self.wheres.push(
            WhereClause::new(kind, column, conjunction)
                .with_operator(Operator::IN)
                .with_value(WhereValue::List(values))
                .negated(not),
        );
        self
    }

    /// `column in (select ...)` with the sub-select built in a callback
    pub fn where_in_sub<F>(&mut self, column: &str, callback: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        self.sub_with(WhereKind::InSub, column, Operator::IN, callback, Conjunction::And)
    }

    pub fn or_where_in_sub<F>(&mut self, column: &str, callback: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        self.sub_with(WhereKind::InSub, column, Operator::IN, callback, Conjunction::Or)
    }

    pub fn where_not_in_sub<F>(&mut self, column: &str, callback: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        self.sub_with(WhereKind::NotInSub, column, Operator::IN, callback, Conjunction::And)
    }

    pub fn or_where_not_in_sub<F>(&mut self, column: &str, callback: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        self.sub_with(WhereKind::NotInSub, column, Operator::IN, callback, Conjunction::Or)
    }

    pub fn where_exists<F>(&mut self, callback: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        self.sub_with(WhereKind::Exists, "", Operator::EQ, callback, Conjunction::And)
    }

    pub fn or_where_exists<F>(&mut self, callback: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        self.sub_with(WhereKind::Exists, "", Operator::EQ, callback, Conjunction::Or)
    }

    pub fn where_not_exists<F>(&mut self, callback: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        self.sub_with(WhereKind::NotExists, "", Operator::EQ, callback, Conjunction::And)
    }

    pub fn or_where_not_exists<F>(&mut self, callback: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        self.sub_with(WhereKind::NotExists, "", Operator::EQ, callback, Conjunction::Or)
    }

    /// Compare a column with the result of a sub-select
    pub fn where_sub<F>(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        callback: F,
    ) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        let operator = operator.try_into_operator()?;
        self.sub_with(WhereKind::Sub, column, operator, callback, Conjunction::And)
    }

    pub fn or_where_sub<F>(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        callback: F,
    ) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        let operator = operator.try_into_operator()?;
        self.sub_with(WhereKind::Sub, column, operator, callback, Conjunction::Or)
    }

    fn sub_with<F>(
        &mut self,
        kind: WhereKind,
        column: &str,
        operator: Operator,
        callback: F,
        conjunction: Conjunction,
    ) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder) -> Result<&mut Builder>,
    {
        let mut query = self.new_query();
        callback(&mut query)?;
        Ok(self.push_query(kind, column, operator, query, conjunction))
    }

    /// Append a clause owning a child query.
    ///
    /// A nested group renders only the child's conditions, so only its Where
    /// values are registered. Sub-selects render the whole child inside the
    /// WHERE clause and register every child value in the child's own
    /// positional order.
    fn push_query(
        &mut self,
        kind: WhereKind,
        column: &str,
        operator: Operator,
        query: Builder,
        conjunction: Conjunction,
    ) -> &mut Self {
        let values = if kind == WhereKind::Nested {
            query.bindings.get(BindingType::Where).to_vec()
        } else {
            query.bindings.flatten()
        };
        self.bindings.extend(BindingType::Where, values);
        self.wheres.push(
            WhereClause::new(kind, column, conjunction)
                .with_operator(operator)
                .with_value(WhereValue::Query(Box::new(query))),
        );
        self
    }

    /// `day(column) operator value`
    pub fn where_day(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.date_with(WhereKind::Day, column, operator, value, Conjunction::And)
    }

    pub fn or_where_day(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.date_with(WhereKind::Day, column, operator, value, Conjunction::Or)
    }

    /// `month(column) operator value`
    pub fn where_month(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.date_with(WhereKind::Month, column, operator, value, Conjunction::And)
    }

    pub fn or_where_month(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.date_with(WhereKind::Month, column, operator, value, Conjunction::Or)
    }

    /// `year(column) operator value`
    pub fn where_year(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.date_with(WhereKind::Year, column, operator, value, Conjunction::And)
    }

    pub fn or_where_year(
        &mut self,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.date_with(WhereKind::Year, column, operator, value, Conjunction::Or)
    }

    /// Date-part comparison joined with an explicit conjunction
    pub fn where_date_part(
        &mut self,
        kind: WhereKind,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
        conjunction: Conjunction,
    ) -> Result<&mut Self> {
        if kind.date_part().is_none() {
            return Err(Error::invalid_argument(format!(
                "{:?} is not a date part",
                kind
            )));
        }
        self.date_with(kind, column, operator, value, conjunction)
    }

    fn date_with(
        &mut self,
        kind: WhereKind,
        column: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
        conjunction: Conjunction,
    ) -> Result<&mut Self> {
        let operator = operator.try_into_operator()?;
        let value = value.into();
        self.add_binding(BindingType::Where, value.clone());
        self.wheres.push(
            WhereClause::new(kind, column, conjunction)
                .with_operator(operator)
                .with_value(WhereValue::Scalar(value)),
        );
        Ok(self)
    }

    /// Append SQL verbatim. Nothing is bound.
    pub fn where_raw(&mut self, sql: &str) -> &mut Self {
        self.raw_with(sql, Conjunction::And)
    }

    pub fn or_where_raw(&mut self, sql: &str) -> &mut Self {
        self.raw_with(sql, Conjunction::Or)
    }

    fn raw_with(&mut self, sql: &str, conjunction: Conjunction) -> &mut Self {
        self.wheres.push(
            WhereClause::new(WhereKind::Raw, "", conjunction)
                .with_value(WhereValue::Scalar(Value::Raw(sql.to_string()))),
        );
        self
    }
}
