//! Binding registry: parameter values grouped by the clause that emits them.

use crate::error::BuildError;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// The clause category a binding belongs to.
///
/// Declaration order is the flattening order and matches the order in which
/// the grammar emits the corresponding clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKind {
    Select,
    Join,
    Where,
    Having,
    Order,
    Union,
}

impl BindingKind {
    /// All categories in flattening order.
    pub const ALL: [BindingKind; 6] = [
        BindingKind::Select,
        BindingKind::Join,
        BindingKind::Where,
        BindingKind::Having,
        BindingKind::Order,
        BindingKind::Union,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BindingKind::Select => "select",
            BindingKind::Join => "join",
            BindingKind::Where => "where",
            BindingKind::Having => "having",
            BindingKind::Order => "order",
            BindingKind::Union => "union",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BindingKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| BuildError::InvalidBindingType(s.to_string()))
    }
}

/// Values pending parameterization, one ordered list per [`BindingKind`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    slots: [Vec<Value>; 6],
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value to a category.
    pub fn push(&mut self, kind: BindingKind, value: Value) {
        self.slots[kind.index()].push(value);
    }

    /// Append many values to a category, in order.
    pub fn extend(&mut self, kind: BindingKind, values: impl IntoIterator<Item = Value>) {
        self.slots[kind.index()].extend(values);
    }

    /// Replace a category.
    pub fn set(&mut self, kind: BindingKind, values: Vec<Value>) {
        self.slots[kind.index()] = values;
    }

    /// Empty a category.
    pub fn clear_kind(&mut self, kind: BindingKind) {
        self.slots[kind.index()].clear();
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    pub fn get(&self, kind: BindingKind) -> &[Value] {
        &self.slots[kind.index()]
    }

    /// Total number of values across all categories.
    pub fn len(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }

    /// Flatten in the fixed category order, never insertion order.
    pub fn flatten(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.len());
        for kind in BindingKind::ALL {
            out.extend(self.get(kind).iter().cloned());
        }
        out
    }

    /// Flatten only the given categories, still in the fixed order.
    pub fn flatten_only(&self, kinds: &[BindingKind]) -> Vec<Value> {
        BindingKind::ALL
            .into_iter()
            .filter(|k| kinds.contains(k))
            .flat_map(|k| self.get(k).iter().cloned())
            .collect()
    }

    /// Merge another registry category by category.
    pub fn merge(&mut self, other: &Bindings) {
        for kind in BindingKind::ALL {
            self.extend(kind, other.get(kind).iter().cloned());
        }
    }
}

/// Drop raw expressions from a list of values.
pub fn without_expressions(values: impl IntoIterator<Item = Value>) -> Vec<Value> {
    values.into_iter().filter(|v| !v.is_expression()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_uses_category_order() {
        let mut b = Bindings::new();
        b.push(BindingKind::Union, Value::from("u"));
        b.push(BindingKind::Where, Value::from(1));
        b.push(BindingKind::Select, Value::from("s"));
        b.push(BindingKind::Where, Value::from(2));
        assert_eq!(
            b.flatten(),
            vec![Value::from("s"), Value::from(1), Value::from(2), Value::from("u")]
        );
    }

    #[test]
    fn parse_kind() {
        assert_eq!("having".parse::<BindingKind>(), Ok(BindingKind::Having));
        assert_eq!(
            "limit".parse::<BindingKind>(),
            Err(BuildError::InvalidBindingType("limit".into()))
        );
    }

    #[test]
    fn flatten_only_skips_other_kinds() {
        let mut b = Bindings::new();
        b.push(BindingKind::Join, Value::from(1));
        b.push(BindingKind::Where, Value::from(2));
        b.push(BindingKind::Select, Value::from(3));
        assert_eq!(
            b.flatten_only(&[BindingKind::Where, BindingKind::Join]),
            vec![Value::from(1), Value::from(2)]
        );
    }
}
