//! JOIN nodes.
//!
//! A join owns a private [`Builder`] whose where list holds the ON
//! conditions. `on` compares columns; the `where_*` methods compare against
//! bound values, which end up in the parent's `join` bindings.

use super::expr::{Boolean, JoinType};
use super::Builder;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct JoinClause {
    pub kind: JoinType,
    pub table: String,
    pub(crate) clause: Builder,
}

impl JoinClause {
    pub(crate) fn new(clause: Builder, kind: JoinType, table: &str) -> Self {
        Self {
            kind,
            table: table.to_string(),
            clause,
        }
    }

    /// `on first operator second`
    pub fn on(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.clause.where_column_clause(first, operator, second, Boolean::And);
        self
    }

    /// `or first operator second`
    pub fn or_on(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.clause.where_column_clause(first, operator, second, Boolean::Or);
        self
    }

    pub fn where_(&mut self, column: &str, operator: impl Into<Value>, value: impl Into<Value>) -> &mut Self {
        self.clause.where_(column, operator, value);
        self
    }

    pub fn or_where(&mut self, column: &str, operator: impl Into<Value>, value: impl Into<Value>) -> &mut Self {
        self.clause.or_where(column, operator, value);
        self
    }

    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.clause.where_in(column, values);
        self
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.clause.where_null(column);
        self
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.clause.where_not_null(column);
        self
    }

    /// The condition builder, for clause kinds without a shortcut here.
    pub fn conditions(&mut self) -> &mut Builder {
        &mut self.clause
    }

    pub fn clause(&self) -> &Builder {
        &self.clause
    }
}
