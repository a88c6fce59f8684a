//! Connection trait the builder executes compiled SQL against.

use crate::error::QueryResult;
use crate::grammar::Grammar;
use crate::row::Row;
use crate::value::{Value, raw};
use std::sync::Arc;

/// A database connection that runs compiled SQL.
///
/// Placeholders in `sql` are positional `?` markers; `bindings` is already
/// flattened in placeholder order. Implementations own pooling, transactions
/// and error mapping.
pub trait Connection: Send + Sync {
    /// Run a select statement and return its rows.
    fn select(&self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>>;

    /// Run an insert statement.
    fn insert(&self, sql: &str, bindings: &[Value]) -> QueryResult<bool>;

    /// Run an update statement and return the number of affected rows.
    fn update(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64>;

    /// Run a delete statement and return the number of affected rows.
    fn delete(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64>;

    /// Run any other statement.
    fn statement(&self, sql: &str, bindings: &[Value]) -> QueryResult<bool>;

    /// Wrap SQL text as a raw expression value.
    fn raw(&self, sql: &str) -> Value {
        raw(sql)
    }

    /// The query grammar matching this connection's dialect.
    fn query_grammar(&self) -> Arc<dyn Grammar>;
}
