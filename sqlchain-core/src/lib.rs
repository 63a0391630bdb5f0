//! sqlchain - a fluent SQL query builder with dialect-aware compilation
//!
//! Queries are assembled on a mutable [`Builder`], compiled by a [`Grammar`]
//! into SQL text with numbered `@binding<N>` placeholders, and executed
//! through any [`Executor`].
//!
//! ```
//! use sqlchain_core::{op, table, OrderDirection, Value};
//!
//! # fn main() -> sqlchain_core::Result<()> {
//! let mut query = table("users");
//! query
//!     .where_("age", op::GT, 18)?
//!     .order_by("name", OrderDirection::Asc)
//!     .limit(10);
//!
//! assert_eq!(
//!     query.to_sql(),
//!     "select * from \"users\" where \"age\" > @binding0 order by \"name\" asc limit 10"
//! );
//! assert_eq!(query.binding_values(), vec![Value::Integer(18)]);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod column;
pub mod error;
pub mod executor;
pub mod grammar;
pub mod operator;
pub mod value;

// Re-export main types
pub use builder::{
    Aggregate, AggregateFunction, BindingType, Bindings, Builder, Conjunction, HavingClause,
    JoinClause, JoinCondition, JoinOperand, JoinType, OrderClause, OrderDirection, UnionClause,
    WhereClause, WhereKind, WhereValue,
};
pub use column::{Column, ColumnList, IntoColumns, ALL_COLUMNS};
pub use error::{Error, Result};
pub use executor::{Executor, ResultSet, Row};
pub use grammar::{Backtick, Dialect, DoubleQuote, Grammar, Quoter, BINDING_PREFIX};
pub use operator::{op, IntoOperator, Operator};
pub use value::{Value, ValueType};

/// Create a query on `name` compiled with the standard grammar
pub fn table(name: &str) -> Builder {
    let mut query = Builder::new(Grammar::standard());
    query.from(name);
    query
}

/// A SQL expression inlined verbatim instead of bound
pub fn raw(sql: impl Into<String>) -> Value {
    Value::Raw(sql.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_entry_point() {
        let query = table("users");
        assert_eq!(query.table(), "users");
        assert_eq!(query.to_sql(), "select * from \"users\"");
    }

    #[test]
    fn test_raw_marker() {
        assert_eq!(raw("now()"), Value::Raw("now()".to_string()));
        assert!(raw(String::from("1")).is_raw());
    }
}
