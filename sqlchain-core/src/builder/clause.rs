//! Clause value types accumulated by a `Builder`

use super::Builder;
use crate::{ColumnList, IntoOperator, Operator, Value};
use std::fmt;

/// How a clause is joined to the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conjunction::And => "and",
            Conjunction::Or => "or",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where clause kinds; the grammar dispatches on this tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereKind {
    Basic,
    Raw,
    Between,
    Nested,
    Sub,
    Exists,
    NotExists,
    In,
    NotIn,
    InSub,
    NotInSub,
    Null,
    NotNull,
    Day,
    Month,
    Year,
}

impl WhereKind {
    /// SQL function name for the date-part kinds
    pub fn date_part(&self) -> Option<&'static str> {
        match self {
            WhereKind::Day => Some("day"),
            WhereKind::Month => Some("month"),
            WhereKind::Year => Some("year"),
            _ => None,
        }
    }
}

/// The operand of a where clause. Exactly one shape is active per clause.
#[derive(Debug, Clone)]
pub enum WhereValue {
    None,
    Scalar(Value),
    List(Vec<Value>),
    Query(Box<Builder>),
}

/// A WHERE condition
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub kind: WhereKind,
    pub column: String,
    pub operator: Operator,
    pub value: WhereValue,
    pub conjunction: Conjunction,
    pub not: bool,
}

impl WhereClause {
    pub fn new(kind: WhereKind, column: impl Into<String>, conjunction: Conjunction) -> Self {
        Self {
            kind,
            column: column.into(),
            operator: Operator::EQ,
            value: WhereValue::None,
            conjunction,
            not: false,
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_value(mut self, value: WhereValue) -> Self {
        self.value = value;
        self
    }

    pub fn negated(mut self, not: bool) -> Self {
        self.not = not;
        self
    }

    /// The child query of nested, sub-select and exists clauses
    pub fn query(&self) -> Option<&Builder> {
        match &self.value {
            WhereValue::Query(query) => Some(query),
            _ => None,
        }
    }
}

/// A HAVING condition (used with GROUP BY)
#[derive(Debug, Clone, PartialEq)]
pub struct HavingClause {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
    pub conjunction: Conjunction,
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "asc"),
            OrderDirection::Desc => write!(f, "desc"),
        }
    }
}

/// An ORDER BY term
#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    pub column: String,
    pub direction: OrderDirection,
}

/// A query appended with UNION / UNION ALL
#[derive(Debug, Clone)]
pub struct UnionClause {
    pub query: Box<Builder>,
    pub all: bool,
}

/// JOIN types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "inner"),
            JoinType::Left => write!(f, "left"),
            JoinType::Right => write!(f, "right"),
            JoinType::Outer => write!(f, "outer"),
            JoinType::LeftOuter => write!(f, "left outer"),
            JoinType::RightOuter => write!(f, "right outer"),
            JoinType::FullOuter => write!(f, "full outer"),
        }
    }
}

/// Right-hand side of a join condition
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOperand {
    /// Another column, wrapped as an identifier
    Column(String),
    /// A parameter, emitted as a placeholder
    Value(Value),
}

/// A condition in a JOIN ON clause
#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition {
    pub first: String,
    pub operator: Operator,
    pub second: JoinOperand,
    pub conjunction: Conjunction,
}

/// A complete JOIN clause with table and conditions
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub conditions: Vec<JoinCondition>,
    pub bindings: Vec<Value>,
}

impl JoinClause {
    pub fn new(join_type: JoinType, table: impl Into<String>) -> Self {
        Self {
            join_type,
            table: table.into(),
            conditions: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Compare two columns
    pub fn on(self, first: &str, operator: impl IntoOperator, second: &str) -> Self {
        self.push_column(first, operator.into_operator(), second, Conjunction::And)
    }

    pub fn or_on(self, first: &str, operator: impl IntoOperator, second: &str) -> Self {
        self.push_column(first, operator.into_operator(), second, Conjunction::Or)
    }

    /// Compare a column with a bound parameter
    pub fn where_(self, first: &str, operator: impl IntoOperator, value: impl Into<Value>) -> Self {
        self.push_value(first, operator.into_operator(), value.into(), Conjunction::And)
    }

    pub fn or_where(
        self,
        first: &str,
        operator: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Self {
        self.push_value(first, operator.into_operator(), value.into(), Conjunction::Or)
    }

    fn push_column(
        mut self,
        first: &str,
        operator: Operator,
        second: &str,
        conjunction: Conjunction,
    ) -> Self {
        self.conditions.push(JoinCondition {
            first: first.to_string(),
            operator,
            second: JoinOperand::Column(second.to_string()),
            conjunction,
        });
        self
    }

    fn push_value(
        mut self,
        first: &str,
        operator: Operator,
        value: Value,
        conjunction: Conjunction,
    ) -> Self {
        if !value.is_raw() {
            self.bindings.push(value.clone());
        }
        self.conditions.push(JoinCondition {
            first: first.to_string(),
            operator,
            second: JoinOperand::Value(value),
            conjunction,
        });
        self
    }
}

/// Aggregation function types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFunction::Count => write!(f, "count"),
            AggregateFunction::Sum => write!(f, "sum"),
            AggregateFunction::Avg => write!(f, "avg"),
            AggregateFunction::Min => write!(f, "min"),
            AggregateFunction::Max => write!(f, "max"),
        }
    }
}

/// Aggregate installed on a builder while an aggregate query runs
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub columns: ColumnList,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op;

    #[test]
    fn test_join_type_words() {
        assert_eq!(JoinType::Inner.to_string(), "inner");
        assert_eq!(JoinType::LeftOuter.to_string(), "left outer");
        assert_eq!(JoinType::FullOuter.to_string(), "full outer");
    }

    #[test]
    fn test_join_where_collects_bindings() {
        let join = JoinClause::new(JoinType::Left, "posts")
            .on("users.id", op::EQ, "posts.user_id")
            .where_("posts.published", op::EQ, 1)
            .or_where("posts.pinned", op::EQ, Value::Raw("true".into()));

        assert_eq!(join.conditions.len(), 3);
        assert_eq!(join.bindings, vec![Value::Integer(1)]);
        assert_eq!(join.conditions[2].conjunction, Conjunction::Or);
        assert!(matches!(join.conditions[0].second, JoinOperand::Column(_)));
    }

    #[test]
    fn test_where_clause_shape() {
        let clause = WhereClause::new(WhereKind::Between, "age", Conjunction::Or)
            .with_value(WhereValue::List(vec![1.into(), 2.into()]))
            .negated(true);
        assert!(clause.not);
        assert!(clause.query().is_none());
        assert_eq!(clause.operator, Operator::EQ);
    }

    #[test]
    fn test_date_part_names() {
        assert_eq!(WhereKind::Day.date_part(), Some("day"));
        assert_eq!(WhereKind::Year.date_part(), Some("year"));
        assert_eq!(WhereKind::Basic.date_part(), None);
    }

    #[test]
    fn test_display_lowercase() {
        assert_eq!(AggregateFunction::Count.to_string(), "count");
        assert_eq!(OrderDirection::Desc.to_string(), "desc");
        assert_eq!(Conjunction::Or.to_string(), "or");
    }
}
