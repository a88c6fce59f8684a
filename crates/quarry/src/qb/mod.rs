//! Fluent query builder.
//!
//! A [`Builder`] holds the state of one statement under construction: table,
//! selected columns, joins, the where/having clause trees, grouping, ordering,
//! unions, limits and a [`Bindings`] registry. Every fluent method mutates the
//! builder in place and returns `&mut Self`, so calls chain:
//!
//! ```ignore
//! use quarry::Builder;
//!
//! let mut q = Builder::new();
//! q.from("users")
//!     .select(["id", "name"])
//!     .where_in("id", [1, 2, 3])
//!     .where_eq("status", "active")
//!     .order_by("created_at", "desc")
//!     .limit(10);
//!
//! let sql = q.to_sql();
//! let params = q.get_bindings();
//! ```
//!
//! Sub-selects, nested groups, exists checks and unions are built in their
//! own `Builder` (see [`Builder::new_query`]) and moved into the clause node
//! that uses them. Their bindings are merged into the parent when the node is
//! pushed, so the parent registry always mirrors emission order.

mod exec;
mod expr;
mod join;
mod param;
mod select;
mod where_clause;

pub use expr::{
    Aggregate, Boolean, DatePart, Direction, Having, HavingKind, JoinType, Lock, Order, Union,
    Where, WhereKind,
};
pub use join::JoinClause;
pub use param::{BindingKind, Bindings, without_expressions};
pub use where_clause::{ArrayWhereMethod, WhereSpec};

use crate::client::Connection;
use crate::error::{BuildError, QueryResult};
use crate::grammar::{GenericGrammar, Grammar};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Operators every builder recognises, whatever the dialect.
pub const OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "<=>",
    "like", "like binary", "not like", "between", "ilike",
    "&", "|", "^", "<<", ">>",
    "rlike", "regexp", "not regexp",
    "~", "~*", "!~", "!~*", "similar to",
    "not similar to", "not ilike", "~~*", "!~~*",
];

/// In-progress representation of one SQL statement.
#[derive(Clone)]
pub struct Builder {
    pub(crate) connection: Option<Arc<dyn Connection>>,
    pub(crate) grammar: Arc<dyn Grammar>,
    pub(crate) bindings: Bindings,
    pub(crate) aggregate: Option<Aggregate>,
    pub(crate) columns: Vec<Value>,
    pub(crate) distinct: bool,
    pub(crate) from: String,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) wheres: Vec<Where>,
    pub(crate) groups: Vec<Value>,
    pub(crate) havings: Vec<Having>,
    pub(crate) orders: Vec<Order>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) unions: Vec<Union>,
    pub(crate) union_limit: Option<u64>,
    pub(crate) union_offset: Option<u64>,
    pub(crate) union_orders: Vec<Order>,
    /// Trailing `union` bindings owned by raw union orders.
    pub(crate) union_order_bindings: usize,
    pub(crate) lock: Option<Lock>,
    pub(crate) operators: Vec<String>,
    pub(crate) build_error: Option<BuildError>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("grammar", &self.grammar)
            .field("from", &self.from)
            .field("columns", &self.columns)
            .field("distinct", &self.distinct)
            .field("joins", &self.joins)
            .field("wheres", &self.wheres)
            .field("groups", &self.groups)
            .field("havings", &self.havings)
            .field("orders", &self.orders)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("unions", &self.unions)
            .field("lock", &self.lock)
            .field("bindings", &self.bindings)
            .field("build_error", &self.build_error)
            .finish_non_exhaustive()
    }
}

impl Builder {
    /// Create a builder with the generic grammar and no connection.
    pub fn new() -> Self {
        Self::with_grammar(Arc::new(GenericGrammar::new()))
    }

    /// Create a builder compiling with `grammar`.
    pub fn with_grammar(grammar: Arc<dyn Grammar>) -> Self {
        Self {
            connection: None,
            grammar,
            bindings: Bindings::new(),
            aggregate: None,
            columns: Vec::new(),
            distinct: false,
            from: String::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            unions: Vec::new(),
            union_limit: None,
            union_offset: None,
            union_orders: Vec::new(),
            union_order_bindings: 0,
            lock: None,
            operators: OPERATORS.iter().map(|op| op.to_string()).collect(),
            build_error: None,
        }
    }

    /// Create a builder that runs against `connection`, using its grammar.
    pub fn with_connection(connection: Arc<dyn Connection>) -> Self {
        let grammar = connection.query_grammar();
        let mut builder = Self::with_grammar(grammar);
        builder.connection = Some(connection);
        builder
    }

    /// A fresh, empty builder sharing this one's connection and grammar.
    pub fn new_query(&self) -> Builder {
        let mut query = Builder::with_grammar(Arc::clone(&self.grammar));
        query.connection = self.connection.clone();
        query
    }

    pub fn grammar(&self) -> &Arc<dyn Grammar> {
        &self.grammar
    }

    pub fn connection(&self) -> Option<&Arc<dyn Connection>> {
        self.connection.as_ref()
    }

    // ==================== State accessors ====================

    pub fn table_name(&self) -> &str {
        &self.from
    }

    pub fn columns(&self) -> &[Value] {
        &self.columns
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn wheres(&self) -> &[Where] {
        &self.wheres
    }

    pub fn groups(&self) -> &[Value] {
        &self.groups
    }

    pub fn havings(&self) -> &[Having] {
        &self.havings
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn union_orders(&self) -> &[Order] {
        &self.union_orders
    }

    pub fn unions(&self) -> &[Union] {
        &self.unions
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn union_limit_value(&self) -> Option<u64> {
        self.union_limit
    }

    pub fn union_offset_value(&self) -> Option<u64> {
        self.union_offset
    }

    pub fn aggregate_value(&self) -> Option<&Aggregate> {
        self.aggregate.as_ref()
    }

    pub fn lock_value(&self) -> Option<&Lock> {
        self.lock.as_ref()
    }

    pub fn operators(&self) -> &[String] {
        &self.operators
    }

    // ==================== Operators ====================

    /// `true` when `operator` is neither a core operator nor one the grammar
    /// adds.
    pub fn invalid_operator(&self, operator: &str) -> bool {
        !self.operators.iter().any(|op| op == operator)
            && !self.grammar.operators().contains(&operator)
    }

    pub(crate) fn invalid_operator_value(&self, operator: &Value) -> bool {
        match operator {
            Value::Text(op) => self.invalid_operator(op),
            _ => true,
        }
    }

    /// An empty value may only be paired with `=`, `<>` or `!=`.
    fn invalid_operator_and_value(&self, operator: &Value, value: &Value) -> bool {
        let Some(op) = operator.as_str() else {
            return false;
        };
        value.is_empty()
            && self.operators.iter().any(|known| known == op)
            && !matches!(op, "=" | "<>" | "!=")
    }

    /// Resolve the (value, operator) pair of a comparison.
    ///
    /// With `use_default` the caller supplied a single operand: it becomes the
    /// value and the operator is forced to `=`.
    pub fn prepare_value_and_operator(
        &self,
        value: Value,
        operator: Value,
        use_default: bool,
    ) -> Result<(Value, Value), BuildError> {
        if use_default {
            return Ok((operator, Value::from("=")));
        }
        if self.invalid_operator_and_value(&operator, &value) {
            return Err(BuildError::IllegalOperatorAndValue {
                operator: operator.to_string(),
            });
        }
        Ok((value, operator))
    }

    // ==================== Bindings ====================

    /// Append a binding to a category.
    pub fn add_binding(&mut self, value: impl Into<Value>, kind: BindingKind) -> &mut Self {
        self.bindings.push(kind, value.into());
        self
    }

    /// Append bindings to a category.
    pub fn add_bindings(
        &mut self,
        values: impl IntoIterator<Item = Value>,
        kind: BindingKind,
    ) -> &mut Self {
        self.bindings.extend(kind, values);
        self
    }

    /// Append bindings to a category named by string.
    ///
    /// An unknown category is a contract error recorded on the builder.
    pub fn add_bindings_named(
        &mut self,
        values: impl IntoIterator<Item = Value>,
        kind: &str,
    ) -> &mut Self {
        match kind.parse::<BindingKind>() {
            Ok(kind) => self.add_bindings(values, kind),
            Err(err) => self.record_error(err),
        }
    }

    /// Replace one binding category.
    pub fn set_bindings(&mut self, values: Vec<Value>, kind: BindingKind) -> &mut Self {
        self.bindings.set(kind, values);
        self
    }

    /// Merge another builder's bindings category by category.
    pub fn merge_bindings(&mut self, query: &Builder) -> &mut Self {
        self.bindings.merge(&query.bindings);
        self
    }

    /// Bindings flattened in `select, join, where, having, order, union` order.
    pub fn get_bindings(&self) -> Vec<Value> {
        self.bindings.flatten()
    }

    /// The registry itself, per category.
    pub fn get_raw_bindings(&self) -> &Bindings {
        &self.bindings
    }

    // ==================== Reset ====================

    /// Reset every piece of query state. Grammar, connection and the operator
    /// set are kept.
    pub fn clear(&mut self) -> &mut Self {
        self.bindings.clear();
        self.aggregate = None;
        self.columns.clear();
        self.distinct = false;
        self.from.clear();
        self.joins.clear();
        self.wheres.clear();
        self.groups.clear();
        self.havings.clear();
        self.orders.clear();
        self.limit = None;
        self.offset = None;
        self.unions.clear();
        self.union_limit = None;
        self.union_offset = None;
        self.union_orders.clear();
        self.union_order_bindings = 0;
        self.lock = None;
        self.build_error = None;
        self
    }

    /// Reset exactly one field by name. Unknown names are ignored.
    pub fn clean(&mut self, field: &str) -> &mut Self {
        match field {
            "columns" => self.columns.clear(),
            "distinct" => self.distinct = false,
            "from" => self.from.clear(),
            "joins" => self.joins.clear(),
            "wheres" => self.wheres.clear(),
            "groups" => self.groups.clear(),
            "havings" => self.havings.clear(),
            "orders" => self.orders.clear(),
            "limit" => self.limit = None,
            "offset" => self.offset = None,
            "unions" => self.unions.clear(),
            "union_limit" => self.union_limit = None,
            "union_offset" => self.union_offset = None,
            "union_orders" => self.union_orders.clear(),
            "lock" => self.lock = None,
            "operators" => self.operators.clear(),
            _ => {}
        }
        self
    }

    /// Empty the given binding categories.
    pub fn clean_bindings(&mut self, kinds: &[BindingKind]) -> &mut Self {
        for kind in kinds {
            self.bindings.clear_kind(*kind);
        }
        self
    }

    /// Run `callback` against the builder and return it.
    pub fn tap<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        callback(self);
        self
    }

    // ==================== Compilation ====================

    /// Compile the builder as a select statement.
    pub fn to_sql(&self) -> String {
        self.grammar.compile_select(self)
    }

    /// Like [`Builder::to_sql`], but fails on a recorded contract error.
    pub fn try_to_sql(&self) -> QueryResult<String> {
        self.validate()?;
        Ok(self.to_sql())
    }

    /// Surface the first contract error recorded while building.
    pub fn validate(&self) -> QueryResult<()> {
        match &self.build_error {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }

    /// The first contract error recorded while building, if any.
    pub fn build_error(&self) -> Option<&BuildError> {
        self.build_error.as_ref()
    }

    pub(crate) fn record_error(&mut self, err: BuildError) -> &mut Self {
        tracing::warn!(target: "quarry.builder", error = %err, "builder contract violation");
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
        self
    }

    /// Carry a nested builder's contract error up into this one.
    pub(crate) fn absorb_error(&mut self, query: &Builder) {
        if self.build_error.is_none() {
            self.build_error = query.build_error.clone();
        }
    }
}

#[cfg(test)]
mod tests;
