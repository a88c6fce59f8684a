//! Ordered column/value records.
//!
//! A [`Row`] is both what a [`Connection`](crate::Connection) hands back from a
//! select and what [`Builder::insert`](crate::Builder::insert) /
//! [`Builder::update`](crate::Builder::update) take as input. Column order is
//! preserved, since it decides placeholder order on insert.

use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column, replacing an existing value in place.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Merge `other` into a copy of `self`; `other` wins on conflicts.
    pub fn merged(&self, other: &Row) -> Row {
        let mut out = self.clone();
        for (column, value) in other.iter() {
            out.set(column, value.clone());
        }
        out
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keeps_first_position() {
        let mut row = Row::new().with("a", 1).with("b", 2);
        row.set("a", 3);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn merged_prefers_other() {
        let a = Row::new().with("email", "x@y").with("name", "old");
        let b = Row::new().with("name", "new").with("votes", 1);
        let m = a.merged(&b);
        assert_eq!(m.columns().collect::<Vec<_>>(), vec!["email", "name", "votes"]);
        assert_eq!(m.get("name"), Some(&Value::from("new")));
    }
}
