//! Column descriptors and ordered column lists

use crate::value::{Value, ValueType};

/// The "select all" sentinel
pub const ALL_COLUMNS: &str = "*";

/// A named column, optionally carrying a value.
///
/// Used as a selection descriptor, as an insert assignment, and as a cell
/// in a fetched row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub value: Option<Value>,
    pub value_type: ValueType,
}

impl Column {
    /// Create a column with no value
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_type: ValueType::String,
        }
    }

    /// Create a column carrying a value; the type tag follows the value
    pub fn with_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            value_type: value.value_type(),
            value: Some(value),
        }
    }

    /// Create a column carrying a value under an explicit type tag
    pub fn typed(name: impl Into<String>, value: impl Into<Value>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_type,
        }
    }

    /// A column is usable for insert/update only when it is named
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn is_all(&self) -> bool {
        self.name == ALL_COLUMNS
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::new(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::new(name)
    }
}

/// Ordered column list; insertion order is SQL column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnList {
    columns: Vec<Column>,
}

impl ColumnList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, silently skipping unnamed ones
    pub fn push(&mut self, column: impl Into<Column>) {
        let column = column.into();
        if column.is_valid() {
            self.columns.push(column);
        }
    }

    /// Append every named column from `columns`
    pub fn extend<I>(&mut self, columns: I)
    where
        I: IntoIterator<Item = Column>,
    {
        for column in columns {
            self.push(column);
        }
    }

    /// Add the `*` sentinel unless it is already present
    pub fn add_all_column(&mut self) {
        if !self.columns.iter().any(Column::is_all) {
            self.columns.push(Column::new(ALL_COLUMNS));
        }
    }

    /// True when the list is exactly `*`
    pub fn is_all(&self) -> bool {
        self.columns.len() == 1 && self.columns[0].is_all()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
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

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

impl IntoIterator for ColumnList {
    type Item = Column;
    type IntoIter = std::vec::IntoIter<Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl<'a> IntoIterator for &'a ColumnList {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl FromIterator<Column> for ColumnList {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        let mut list = ColumnList::new();
        list.extend(iter);
        list
    }
}

impl From<&str> for ColumnList {
    fn from(name: &str) -> Self {
        name.into_columns()
    }
}

/// Trait to convert various types into a column list
pub trait IntoColumns {
    fn into_columns(self) -> ColumnList;
}

impl IntoColumns for ColumnList {
    fn into_columns(self) -> ColumnList {
        self
    }
}

impl IntoColumns for Column {
    fn into_columns(self) -> ColumnList {
        std::iter::once(self).collect()
    }
}

impl IntoColumns for Vec<Column> {
    fn into_columns(self) -> ColumnList {
        self.into_iter().collect()
    }
}

impl IntoColumns for &str {
    fn into_columns(self) -> ColumnList {
        Column::new(self).into_columns()
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> ColumnList {
        Column::new(self).into_columns()
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> ColumnList {
        self.into_iter().map(Column::new).collect()
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> ColumnList {
        self.into_iter().map(Column::new).collect()
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> ColumnList {
        self.into_iter().map(Column::new).collect()
    }
}

// For tuples
impl IntoColumns for (&str, &str) {
    fn into_columns(self) -> ColumnList {
        [self.0, self.1].into_columns()
    }
}

impl IntoColumns for (&str, &str, &str) {
    fn into_columns(self) -> ColumnList {
        [self.0, self.1, self.2].into_columns()
    }
}

impl IntoColumns for (&str, &str, &str, &str) {
    fn into_columns(self) -> ColumnList {
        [self.0, self.1, self.2, self.3].into_columns()
    }
}

impl IntoColumns for (&str, &str, &str, &str, &str) {
    fn into_columns(self) -> ColumnList {
        [self.0, self.1, self.2, self.3, self.4].into_columns()
    }
}
