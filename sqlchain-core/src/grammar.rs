//! SQL grammar: renders a `Builder` into SQL text with numbered placeholders.
//!
//! Dialects differ only in how an identifier is quoted, so a single
//! [`Grammar`] carries an injected [`Quoter`] instead of one compiler per
//! database. Compilation is pure; the only state is the placeholder counter
//! of the current top-level statement, which lives in a short-lived
//! compiler context so nested sub-selects keep numbering where the parent
//! left off.

use crate::builder::{
    Aggregate, Builder, HavingClause, JoinClause, JoinOperand, OrderClause, UnionClause,
    WhereClause, WhereKind, WhereValue,
};
use crate::column::{ColumnList, ALL_COLUMNS};
use crate::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::trace;

/// Prefix of every placeholder; the executor binds `@binding0`, `@binding1`, ... in order
pub const BINDING_PREFIX: &str = "@binding";

/// Alias given to the single result column of an aggregate query
pub const AGGREGATE_ALIAS: &str = "aggregate";

static NULL_VALUE: Value = Value::Null;

/// Identifier quoting capability, the one point of dialect variation
pub trait Quoter: fmt::Debug + Send + Sync {
    /// Quote a single identifier segment, escaping the quote character
    fn quote(&self, identifier: &str) -> String;
}

/// ANSI double-quote quoting (`"name"`, embedded `"` doubled)
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleQuote;

impl Quoter for DoubleQuote {
    fn quote(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }
}

/// MySQL backtick quoting (`` `name` ``, embedded backtick doubled)
#[derive(Debug, Clone, Copy, Default)]
pub struct Backtick;

impl Quoter for Backtick {
    fn quote(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }
}

/// Database dialects with a known quoting rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Standard,
    MySql,
    Sqlite,
    Postgres,
}

impl FromStr for Dialect {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "ansi" => Ok(Dialect::Standard),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            _ => Err(crate::Error::invalid_argument(format!(
                "Unknown dialect '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Standard => write!(f, "standard"),
            Dialect::MySql => write!(f, "mysql"),
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// Dialect-aware SQL compiler
#[derive(Debug, Clone)]
pub struct Grammar {
    quoter: Arc<dyn Quoter>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::standard()
    }
}

impl Grammar {
    /// Create a grammar around a custom quoting rule
    pub fn new(quoter: impl Quoter + 'static) -> Self {
        Self {
            quoter: Arc::new(quoter),
        }
    }

    /// Double-quote grammar
    pub fn standard() -> Self {
        Self::new(DoubleQuote)
    }

    /// Backtick grammar
    pub fn mysql() -> Self {
        Self::new(Backtick)
    }

    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::MySql => Self::mysql(),
            Dialect::Standard | Dialect::Sqlite | Dialect::Postgres => Self::standard(),
        }
    }

    /// Wrap a column or table reference in identifier quotes.
    ///
    /// `a.b` quotes each segment, `x as y` quotes both sides, and a bare `*`
    /// is left alone.
    pub fn wrap(&self, value: &str) -> String {
        if let Some((base, alias)) = value.split_once(" as ") {
            return format!("{} as {}", self.wrap(base), self.wrap_value(alias));
        }

        value
            .split('.')
            .map(|segment| self.wrap_value(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn wrap_table(&self, table: &str) -> String {
        self.wrap(table)
    }

    /// Quote a single identifier segment
    pub fn wrap_value(&self, value: &str) -> String {
        if value == ALL_COLUMNS {
            return value.to_string();
        }
        self.quoter.quote(value)
    }

    /// Compile a SELECT statement. Placeholder numbering starts at zero.
    pub fn compile_select(&self, query: &Builder) -> String {
        let sql = Compiler::new(self).select(query);
        trace!(sql = %sql, "compiled select");
        sql
    }

    /// Compile an INSERT statement with one placeholder per column
    pub fn compile_insert(&self, table: &str, columns: &ColumnList) -> String {
        let mut compiler = Compiler::new(self);
        let names = compiler.columnize(columns);
        let values = columns
            .iter()
            .map(|column| compiler.parameter(column.value.as_ref().unwrap_or(&NULL_VALUE)))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "insert into {} ({}) values ({})",
            self.wrap_table(table),
            names,
            values
        );
        trace!(sql = %sql, "compiled insert");
        sql
    }
}

/// Compile context for one top-level statement
struct Compiler<'g> {
    grammar: &'g Grammar,
    next_binding: usize,
}

impl<'g> Compiler<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            next_binding: 0,
        }
    }

    /// Next placeholder, or the expression itself for raw values
    fn parameter(&mut self, value: &Value) -> String {
        if let Value::Raw(sql) = value {
            return sql.clone();
        }
        let placeholder = format!("{}{}", BINDING_PREFIX, self.next_binding);
        self.next_binding += 1;
        placeholder
    }

    fn parameterize(&mut self, values: &[Value]) -> String {
        values
            .iter()
            .map(|value| self.parameter(value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn wrap(&self, value: &str) -> String {
        self.grammar.wrap(value)
    }

    fn columnize(&self, columns: &ColumnList) -> String {
        columns
            .names()
            .map(|name| self.wrap(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn select(&mut self, query: &Builder) -> String {
        let mut components: Vec<String> = Vec::new();

        match &query.aggregate {
            Some(aggregate) => components.push(self.aggregate(query, aggregate)),
            None => components.push(self.columns(query)),
        }

        if !query.table.is_empty() {
            components.push(format!("from {}", self.grammar.wrap_table(&query.table)));
        }

        if !query.joins.is_empty() {
            components.push(self.joins(&query.joins));
        }

        if !query.wheres.is_empty() {
            components.push(format!("where {}", self.where_conditions(&query.wheres)));
        }

        if !query.groups.is_empty() {
            let groups = query
                .groups
                .iter()
                .map(|group| self.wrap(group))
                .collect::<Vec<_>>()
                .join(", ");
            components.push(format!("group by {}", groups));
        }

        if !query.havings.is_empty() {
            components.push(self.havings(&query.havings));
        }

        if !query.orders.is_empty() {
            components.push(self.orders(&query.orders));
        }

        if query.limit > 0 {
            components.push(format!("limit {}", query.limit));
        }

        if query.offset > 0 {
            components.push(format!("offset {}", query.offset));
        }

        if !query.unions.is_empty() {
            components.push(self.unions(&query.unions));
        }

        components.retain(|component| !component.is_empty());
        components.join(" ")
    }

    fn aggregate(&self, query: &Builder, aggregate: &Aggregate) -> String {
        let mut column = if aggregate.columns.is_empty() {
            ALL_COLUMNS.to_string()
        } else {
            self.columnize(&aggregate.columns)
        };

        if query.distinct && column != ALL_COLUMNS {
            column = format!("distinct {}", column);
        }

        format!(
            "select {}({}) as {}",
            aggregate.function, column, AGGREGATE_ALIAS
        )
    }

    fn columns(&self, query: &Builder) -> String {
        let select = if query.distinct {
            "select distinct"
        } else {
            "select"
        };

        if query.columns.is_empty() {
            format!("{} {}", select, ALL_COLUMNS)
        } else {
            format!("{} {}", select, self.columnize(&query.columns))
        }
    }

    fn joins(&mut self, joins: &[JoinClause]) -> String {
        joins
            .iter()
            .map(|join| self.join(join))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn join(&mut self, join: &JoinClause) -> String {
        let table = self.grammar.wrap_table(&join.table);
        if join.conditions.is_empty() {
            return format!("{} join {}", join.join_type, table);
        }

        let mut conditions = Vec::with_capacity(join.conditions.len());
        for (i, condition) in join.conditions.iter().enumerate() {
            let second = match &condition.second {
                JoinOperand::Column(column) => self.wrap(column),
                JoinOperand::Value(value) => self.parameter(value),
            };
            let sql = format!(
                "{} {} {}",
                self.wrap(&condition.first),
                condition.operator,
                second
            );
            conditions.push(if i == 0 {
                sql
            } else {
                format!("{} {}", condition.conjunction, sql)
            });
        }

        format!(
            "{} join {} on {}",
            join.join_type,
            table,
            conditions.join(" ")
        )
    }

    /// Conjunction-joined conditions without the `where` keyword; the first
    /// clause's conjunction is never emitted.
    fn where_conditions(&mut self, wheres: &[WhereClause]) -> String {
        let mut conditions = Vec::with_capacity(wheres.len());
        for (i, clause) in wheres.iter().enumerate() {
            let sql = self.where_clause(clause);
            conditions.push(if i == 0 {
                sql
            } else {
                format!("{} {}", clause.conjunction, sql)
            });
        }
        conditions.join(" ")
    }

    fn where_clause(&mut self, clause: &WhereClause) -> String {
        match clause.kind {
            WhereKind::Basic => {
                let value = self.parameter(scalar(clause));
                format!("{} {} {}", self.wrap(&clause.column), clause.operator, value)
            }
            WhereKind::Raw => scalar(clause).to_string(),
            WhereKind::Between => {
                let values = list(clause);
                let low = self.parameter(values.first().unwrap_or(&NULL_VALUE));
                let high = self.parameter(values.get(1).unwrap_or(&NULL_VALUE));
                let between = if clause.not { "not between" } else { "between" };
                format!("{} {} {} and {}", self.wrap(&clause.column), between, low, high)
            }
            WhereKind::Null => format!("{} is null", self.wrap(&clause.column)),
            WhereKind::NotNull => format!("{} is not null", self.wrap(&clause.column)),
            WhereKind::In | WhereKind::NotIn => {
                let not = clause.kind == WhereKind::NotIn;
                let values = list(clause);
                if values.is_empty() {
                    let always = if not { "1 = 1" } else { "0 = 1" };
                    return always.to_string();
                }
                let keyword = if not { "not in" } else { "in" };
                let placeholders = self.parameterize(values);
                format!("{} {} ({})", self.wrap(&clause.column), keyword, placeholders)
            }
            WhereKind::InSub | WhereKind::NotInSub => {
                let keyword = if clause.kind == WhereKind::NotInSub {
                    "not in"
                } else {
                    "in"
                };
                let sub = self.sub_select(clause);
                format!("{} {} ({})", self.wrap(&clause.column), keyword, sub)
            }
            WhereKind::Exists => format!("exists ({})", self.sub_select(clause)),
            WhereKind::NotExists => format!("not exists ({})", self.sub_select(clause)),
            WhereKind::Nested => match clause.query() {
                Some(query) => format!("({})", self.where_conditions(&query.wheres)),
                None => String::new(),
            },
            WhereKind::Sub => {
                let sub = self.sub_select(clause);
                format!("{} {} ({})", self.wrap(&clause.column), clause.operator, sub)
            }
            WhereKind::Day | WhereKind::Month | WhereKind::Year => {
                let part = clause.kind.date_part().unwrap_or_default();
                let value = self.parameter(scalar(clause));
                format!(
                    "{}({}) {} {}",
                    part,
                    self.wrap(&clause.column),
                    clause.operator,
                    value
                )
            }
        }
    }

    /// Compile the clause's child query inside the current statement
    fn sub_select(&mut self, clause: &WhereClause) -> String {
        match clause.query() {
            Some(query) => self.select(query),
            None => String::new(),
        }
    }

    fn havings(&mut self, havings: &[HavingClause]) -> String {
        let mut conditions = Vec::with_capacity(havings.len());
        for (i, having) in havings.iter().enumerate() {
            let sql = format!(
                "{} {} {}",
                having.column,
                having.operator,
                self.parameter(&having.value)
            );
            conditions.push(if i == 0 {
                sql
            } else {
                format!("{} {}", having.conjunction, sql)
            });
        }
        format!("having {}", conditions.join(" "))
    }

    fn orders(&self, orders: &[OrderClause]) -> String {
        let terms = orders
            .iter()
            .map(|order| format!("{} {}", self.wrap(&order.column), order.direction))
            .collect::<Vec<_>>()
            .join(", ");
        format!("order by {}", terms)
    }

    fn unions(&mut self, unions: &[UnionClause]) -> String {
        unions
            .iter()
            .map(|union| {
                let keyword = if union.all { "union all" } else { "union" };
                format!("{} {}", keyword, self.select(&union.query))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn scalar(clause: &WhereClause) -> &Value {
    match &clause.value {
        WhereValue::Scalar(value) => value,
        _ => &NULL_VALUE,
    }
}

fn list(clause: &WhereClause) -> &[Value] {
    match &clause.value {
        WhereValue::List(values) => values,
        _ => &[],
    }
}
