//! Bindings registry partitioned by clause category

use crate::Value;

/// Clause category a bound value belongs to.
///
/// Declaration order is the traversal order used when flattening the
/// registry into positional parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    Select,
    Join,
    Where,
    Having,
    Order,
}

impl BindingType {
    pub const ALL: [BindingType; 5] = [
        BindingType::Select,
        BindingType::Join,
        BindingType::Where,
        BindingType::Having,
        BindingType::Order,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Ordered bound values for every category of one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: [Vec<Value>; 5],
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value. Raw expressions are inlined by the grammar and never bound.
    pub fn add(&mut self, binding_type: BindingType, value: Value) {
        if !value.is_raw() {
            self.values[binding_type.index()].push(value);
        }
    }

    pub fn extend<I>(&mut self, binding_type: BindingType, values: I)
    where
        I: IntoIterator<Item = Value>,
    {
        for value in values {
            self.add(binding_type, value);
        }
    }

    pub fn get(&self, binding_type: BindingType) -> &[Value] {
        &self.values[binding_type.index()]
    }

    /// Every value tagged with its category, in positional order
    pub fn iter(&self) -> impl Iterator<Item = (BindingType, &Value)> {
        BindingType::ALL
            .into_iter()
            .flat_map(move |t| self.get(t).iter().map(move |v| (t, v)))
    }

    /// Every value in positional order
    pub fn flatten(&self) -> Vec<Value> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.values.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
