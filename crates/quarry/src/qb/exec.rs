//! Running compiled statements against the builder's connection.
//!
//! Every method validates the builder first, so a contract error recorded
//! while chaining surfaces here instead of reaching the database.

use super::param::{BindingKind, without_expressions};
use super::Builder;
use crate::client::Connection;
use crate::error::{QueryError, QueryResult};
use crate::row::Row;
use crate::value::{Value, raw};
use std::sync::Arc;

fn log_statement(query_type: &'static str, sql: &str, bindings: &[Value]) {
    tracing::debug!(
        target: "quarry.sql",
        query_type,
        param_count = bindings.len(),
        sql = %sql,
    );
}

impl Builder {
    fn runner(&self) -> QueryResult<&Arc<dyn Connection>> {
        self.validate()?;
        self.connection
            .as_ref()
            .ok_or_else(|| QueryError::NoConnection("builder was created without a connection".into()))
    }

    /// Wrap SQL text as a raw expression, through the connection when there
    /// is one.
    pub fn raw(&self, sql: &str) -> Value {
        match &self.connection {
            Some(connection) => connection.raw(sql),
            None => raw(sql),
        }
    }

    // ==================== Reads ====================

    /// Run the query and return every row.
    pub fn get(&self) -> QueryResult<Vec<Row>> {
        self.run_select()
    }

    /// Run the query selecting `columns` unless the builder already has a
    /// column list.
    pub fn get_columns<I, V>(&self, columns: I) -> QueryResult<Vec<Row>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if !self.columns.is_empty() {
            return self.run_select();
        }
        let mut query = self.clone();
        query.columns = columns.into_iter().map(Into::into).collect();
        query.run_select()
    }

    fn run_select(&self) -> QueryResult<Vec<Row>> {
        let connection = self.runner()?;
        let sql = self.to_sql();
        let bindings = self.get_bindings();
        log_statement("select", &sql, &bindings);
        connection.select(&sql, &bindings)
    }

    /// The first row, if any.
    pub fn first(&self) -> QueryResult<Option<Row>> {
        let mut query = self.clone();
        query.take(1);
        Ok(query.get()?.into_iter().next())
    }

    /// The row whose `id` equals `id`.
    pub fn find(&self, id: impl Into<Value>) -> QueryResult<Option<Row>> {
        let mut query = self.clone();
        query.where_("id", "=", id);
        query.first()
    }

    /// A single column of the first row.
    pub fn value(&self, column: &str) -> QueryResult<Option<Value>> {
        let mut query = self.clone();
        query.select([column]);
        let row = query.first()?;
        Ok(row.and_then(|row| row.values().next().cloned()))
    }

    /// Whether the query matches any row.
    pub fn exists(&self) -> QueryResult<bool> {
        let connection = self.runner()?;
        let sql = self.grammar.compile_exists(self);
        let bindings = self.get_bindings();
        log_statement("exists", &sql, &bindings);
        let rows = connection.select(&sql, &bindings)?;
        Ok(rows
            .first()
            .and_then(|row| row.get("exists"))
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    pub fn doesnt_exist(&self) -> QueryResult<bool> {
        Ok(!self.exists()?)
    }

    /// Process the results `count` rows at a time. Stops early when
    /// `callback` returns `false`, and then returns `false` itself.
    ///
    /// Fails with [`QueryError::MissingOrderBy`] when the query has no
    /// ordering, since pages would not be stable.
    pub fn chunk<F>(&self, count: i64, mut callback: F) -> QueryResult<bool>
    where
        F: FnMut(Vec<Row>, i64) -> bool,
    {
        self.enforce_order_by("chunk")?;
        let mut page = 1;
        loop {
            let mut query = self.clone();
            query.for_page(page, count);
            let rows = query.get()?;
            let fetched = rows.len();
            if fetched == 0 {
                break;
            }
            if !callback(rows, page) {
                return Ok(false);
            }
            if i64::try_from(fetched).map_or(true, |n| n != count) {
                break;
            }
            page += 1;
        }
        Ok(true)
    }

    /// Fail unless the query (or its union) is ordered.
    pub fn enforce_order_by(&self, operation: &'static str) -> QueryResult<()> {
        if self.orders.is_empty() && self.union_orders.is_empty() {
            return Err(QueryError::MissingOrderBy(operation));
        }
        Ok(())
    }

    // ==================== Aggregates ====================

    /// Run an aggregate function and return the `aggregate` column.
    ///
    /// Runs on a copy: this builder's columns and bindings are left alone.
    pub fn aggregate<I, V>(&self, function: &str, columns: I) -> QueryResult<Value>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let columns: Vec<Value> = columns.into_iter().map(Into::into).collect();
        let mut query = self.clone();
        query
            .clean("columns")
            .clean_bindings(&[BindingKind::Select])
            .set_aggregate(function, columns.clone());
        let rows = query.get_columns(columns)?;
        Ok(rows
            .first()
            .and_then(|row| row.get("aggregate"))
            .cloned()
            .unwrap_or_default())
    }

    /// Aggregate coerced to a number: no result is `0`, text with a `.` is a
    /// float and other text an integer.
    pub fn numeric_aggregate<I, V>(&self, function: &str, columns: I) -> QueryResult<Value>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let result = self.aggregate(function, columns)?;
        if result.is_empty() {
            return Ok(Value::Int(0));
        }
        let Value::Text(text) = &result else {
            return Ok(result);
        };
        let coerced = if text.contains('.') {
            result.as_f64().map(Value::Float)
        } else {
            result.as_i64().map(Value::Int)
        };
        coerced.ok_or_else(|| QueryError::decode("aggregate", format!("not a number: {text}")))
    }

    pub fn count(&self) -> QueryResult<i64> {
        self.count_column("*")
    }

    pub fn count_column(&self, column: &str) -> QueryResult<i64> {
        let value = self.numeric_aggregate("count", [column])?;
        Ok(value.as_i64().unwrap_or(0))
    }

    pub fn min(&self, column: &str) -> QueryResult<Value> {
        self.numeric_aggregate("min", [column])
    }

    pub fn max(&self, column: &str) -> QueryResult<Value> {
        self.numeric_aggregate("max", [column])
    }

    pub fn sum(&self, column: &str) -> QueryResult<Value> {
        self.numeric_aggregate("sum", [column])
    }

    pub fn avg(&self, column: &str) -> QueryResult<Value> {
        self.numeric_aggregate("avg", [column])
    }

    // ==================== Writes ====================

    /// Insert `rows`. The first row's column order applies to all of them.
    pub fn insert(&self, rows: &[Row]) -> QueryResult<bool> {
        let Some(first) = rows.first() else {
            return Ok(true);
        };
        let connection = self.runner()?;
        let sql = self.grammar.compile_insert(self, rows);
        let bindings = without_expressions(rows.iter().flat_map(|row| {
            first
                .columns()
                .map(|column| row.get(column).cloned().unwrap_or_default())
                .collect::<Vec<_>>()
        }));
        log_statement("insert", &sql, &bindings);
        connection.insert(&sql, &bindings)
    }

    /// Update matching rows with `values`; returns the affected count.
    pub fn update(&self, values: &Row) -> QueryResult<u64> {
        let connection = self.runner()?;
        let sql = self.grammar.compile_update(self, values);
        let bindings =
            without_expressions(self.grammar.prepare_bindings_for_update(&self.bindings, values));
        log_statement("update", &sql, &bindings);
        connection.update(&sql, &bindings)
    }

    /// Insert `attributes` merged with `values` when no row matches
    /// `attributes`, otherwise update the matching rows with `values`.
    pub fn update_or_insert(&self, attributes: &Row, values: &Row) -> QueryResult<bool> {
        let mut query = self.clone();
        for (column, value) in attributes.iter() {
            query.where_(column, "=", value);
        }
        if query.doesnt_exist()? {
            return self.insert(&[attributes.merged(values)]);
        }
        if values.is_empty() {
            return Ok(true);
        }
        Ok(query.update(values)? > 0)
    }

    /// `column = column + amount`, plus any `extra` assignments.
    pub fn increment(&self, column: &str, amount: i64, extra: &Row) -> QueryResult<u64> {
        self.adjust(column, "+", amount, extra)
    }

    /// `column = column - amount`, plus any `extra` assignments.
    pub fn decrement(&self, column: &str, amount: i64, extra: &Row) -> QueryResult<u64> {
        self.adjust(column, "-", amount, extra)
    }

    fn adjust(&self, column: &str, sign: &str, amount: i64, extra: &Row) -> QueryResult<u64> {
        let wrapped = self.grammar.wrap_str(column);
        let values = Row::new()
            .with(column, raw(format!("{wrapped} {sign} {amount}")))
            .merged(extra);
        self.update(&values)
    }

    /// Delete matching rows. With `id`, only the row whose `<table>.id`
    /// equals it.
    pub fn delete(&self, id: Option<Value>) -> QueryResult<u64> {
        let mut query = self.clone();
        if let Some(id) = id {
            let column = format!("{}.id", self.from);
            query.where_(&column, "=", id);
        }
        let connection = query.runner()?;
        let sql = query.grammar.compile_delete(&query);
        let bindings = without_expressions(query.grammar.prepare_bindings_for_delete(&query.bindings));
        log_statement("delete", &sql, &bindings);
        connection.delete(&sql, &bindings)
    }

    /// Empty the table. Dialects may need more than one statement; each runs
    /// on its own.
    pub fn truncate(&self) -> QueryResult<()> {
        let connection = self.runner()?;
        for (sql, bindings) in self.grammar.compile_truncate(self) {
            log_statement("truncate", &sql, &bindings);
            connection.statement(&sql, &bindings)?;
        }
        Ok(())
    }
}
