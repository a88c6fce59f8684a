//! Clause tree nodes: WHERE/HAVING predicates, ORDER entries, UNIONs, locks.
//!
//! Each predicate is a tagged node with one payload shape per kind. Nodes that
//! hold a sub-query own their nested [`Builder`] outright.

use crate::qb::Builder;
use crate::value::Value;
use std::fmt;

/// Connector placed before a predicate. Never rendered for the first node of
/// a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    pub fn as_str(self) -> &'static str {
        match self {
            Boolean::And => "and",
            Boolean::Or => "or",
        }
    }
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date component compared by the date-based where kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Date,
    Day,
    Month,
    Year,
}

impl DatePart {
    pub fn as_str(self) -> &'static str {
        match self {
            DatePart::Date => "date",
            DatePart::Day => "day",
            DatePart::Month => "month",
            DatePart::Year => "year",
        }
    }
}

/// One WHERE predicate.
#[derive(Debug, Clone)]
pub struct Where {
    pub boolean: Boolean,
    pub kind: WhereKind,
}

#[derive(Debug, Clone)]
pub enum WhereKind {
    /// column op value
    Basic {
        column: String,
        operator: String,
        value: Value,
    },
    /// column op column
    Column {
        first: String,
        operator: String,
        second: String,
    },
    /// Raw SQL; its bindings live in the registry.
    Raw { sql: String },
    /// column [not] in (values...)
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    /// column [not] in (select ...)
    InSub {
        column: String,
        query: Box<Builder>,
        negated: bool,
    },
    /// column is [not] null
    Null { column: String, negated: bool },
    /// column [not] between low and high
    Between {
        column: String,
        low: Value,
        high: Value,
        negated: bool,
    },
    /// [not] exists (select ...)
    Exists { query: Box<Builder>, negated: bool },
    /// Parenthesized group of the nested builder's wheres.
    Nested { query: Box<Builder> },
    /// column op (select ...)
    Sub {
        column: String,
        operator: String,
        query: Box<Builder>,
    },
    /// part(column) op value
    DatePart {
        part: DatePart,
        column: String,
        operator: String,
        value: Value,
    },
}

impl Where {
    pub fn new(boolean: Boolean, kind: WhereKind) -> Self {
        Self { boolean, kind }
    }
}

/// One HAVING predicate.
#[derive(Debug, Clone)]
pub struct Having {
    pub boolean: Boolean,
    pub kind: HavingKind,
}

#[derive(Debug, Clone)]
pub enum HavingKind {
    Basic {
        column: String,
        operator: String,
        value: Value,
    },
    Raw { sql: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Only the literal `"asc"` sorts ascending; anything else is descending.
    pub fn parse(direction: &str) -> Self {
        if direction == "asc" {
            Direction::Asc
        } else {
            Direction::Desc
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone)]
pub enum Order {
    Column { column: Value, direction: Direction },
    Raw { sql: String },
}

impl Order {
    pub fn column(&self) -> Option<&Value> {
        match self {
            Order::Column { column, .. } => Some(column),
            Order::Raw { .. } => None,
        }
    }
}

/// A query appended with UNION [ALL].
#[derive(Debug, Clone)]
pub struct Union {
    pub query: Box<Builder>,
    pub all: bool,
}

/// Aggregate function applied in place of the column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: String,
    pub columns: Vec<Value>,
}

/// Row lock requested by the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lock {
    /// Exclusive lock (`for update`).
    Update,
    /// Shared lock.
    Shared,
    /// Dialect-specific lock text used verbatim.
    Raw(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinType {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Cross => "cross",
        }
    }
}
