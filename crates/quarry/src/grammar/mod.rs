//! SQL compilation.
//!
//! A [`Grammar`] walks a [`Builder`]'s state into SQL text with positional
//! `?` placeholders. The provided methods implement the shared compilation
//! rules; dialects override identifier quoting and the few clauses whose
//! syntax differs (date parts, locks, truncation, random ordering, unions).
//!
//! Select sections are always emitted in this order:
//! aggregate/columns, from, joins, wheres, groups, havings, orders, limit,
//! offset, unions, lock. Placeholder order therefore matches the binding
//! category order `select, join, where, having, order, union`.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;

use crate::qb::{
    Bindings, BindingKind, Builder, DatePart, Having, HavingKind, Lock, Order, Union, Where,
    WhereKind,
};
use crate::row::Row;
use crate::value::Value;
use std::fmt;
use std::sync::OnceLock;

static ALIAS_RE: OnceLock<regex::Regex> = OnceLock::new();

/// Split `value` on its first case-insensitive ` as ` boundary.
pub(crate) fn split_alias(value: &str) -> Option<(&str, &str)> {
    let re = ALIAS_RE
        .get_or_init(|| regex::Regex::new(r"(?i)\s+as\s+").expect("invalid built-in alias regex"));
    let found = re.find(value)?;
    Some((&value[..found.start()], &value[found.end()..]))
}

/// Join non-empty segments with a single space.
pub(crate) fn concatenate<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(segment);
    }
    out
}

/// Dialect-specific compiler from builder state to SQL.
pub trait Grammar: Send + Sync + fmt::Debug {
    /// Prefix applied to table names.
    fn table_prefix(&self) -> &str;

    /// Operators this dialect recognises on top of the builder's core set.
    fn operators(&self) -> &[&'static str] {
        &[]
    }

    // ==================== Wrapping ====================

    /// Quote a single identifier segment.
    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return value.to_string();
        }
        format!("\"{}\"", value.replace('"', "\"\""))
    }

    /// Wrap a column or table reference.
    fn wrap(&self, value: &Value) -> String {
        self.wrap_prefixed(value, false)
    }

    fn wrap_str(&self, value: &str) -> String {
        self.wrap(&Value::from(value))
    }

    /// Wrap a reference, optionally prefixing its alias with the table prefix.
    ///
    /// Expressions are returned verbatim.
    fn wrap_prefixed(&self, value: &Value, prefix_alias: bool) -> String {
        if let Value::Expression(expr) = value {
            return expr.as_str().to_string();
        }
        let text = value.to_string();
        if split_alias(&text).is_some() {
            return self.wrap_aliased_value(&text, prefix_alias);
        }
        let segments: Vec<&str> = text.split('.').collect();
        self.wrap_segments(&segments)
    }

    /// Wrap `reference as alias`.
    fn wrap_aliased_value(&self, value: &str, prefix_alias: bool) -> String {
        let Some((reference, alias)) = split_alias(value) else {
            return self.wrap_str(value);
        };
        let alias = if prefix_alias {
            format!("{}{}", self.table_prefix(), alias)
        } else {
            alias.to_string()
        };
        format!("{} as {}", self.wrap_str(reference), self.wrap_value(&alias))
    }

    /// Wrap dotted segments. Everything before the last segment of a
    /// qualified name is a table reference and gets the table prefix once.
    fn wrap_segments(&self, segments: &[&str]) -> String {
        match segments.split_last() {
            Some((column, table)) if !table.is_empty() => {
                format!("{}.{}", self.wrap_table_str(&table.join(".")), self.wrap_value(column))
            }
            _ => segments
                .iter()
                .map(|segment| self.wrap_value(segment))
                .collect::<Vec<_>>()
                .join("."),
        }
    }

    /// Wrap a table name, prefixing its last segment. A schema qualifier
    /// and an alias are left unprefixed.
    fn wrap_table(&self, table: &Value) -> String {
        if let Value::Expression(expr) = table {
            return expr.as_str().to_string();
        }
        let text = table.to_string();
        if let Some((reference, alias)) = split_alias(&text) {
            return format!("{} as {}", self.wrap_table_str(reference), self.wrap_value(alias));
        }
        let prefix = self.table_prefix();
        match text.rsplit_once('.') {
            Some((schema, name)) => {
                let schema: Vec<String> = schema.split('.').map(|s| self.wrap_value(s)).collect();
                format!("{}.{}", schema.join("."), self.wrap_value(&format!("{prefix}{name}")))
            }
            None => self.wrap_value(&format!("{prefix}{text}")),
        }
    }

    fn wrap_table_str(&self, table: &str) -> String {
        self.wrap_table(&Value::from(table))
    }

    /// Wrap each column and join with `", "`.
    fn columnize(&self, columns: &[Value]) -> String {
        columns
            .iter()
            .map(|column| self.wrap(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One placeholder per value, joined with `", "`.
    fn parameterize(&self, values: &[Value]) -> String {
        values
            .iter()
            .map(|value| self.parameter(value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `?` for bound values, the SQL text for expressions.
    fn parameter(&self, value: &Value) -> String {
        match value {
            Value::Expression(expr) => expr.as_str().to_string(),
            _ => "?".to_string(),
        }
    }

    // ==================== Select ====================

    /// Compile a select statement.
    fn compile_select(&self, query: &Builder) -> String {
        if query.aggregate.is_some() && !query.unions.is_empty() {
            return self.compile_union_aggregate(query);
        }

        let mut sql = self.compile_components(query);
        if !query.unions.is_empty() {
            sql = format!("{} {}", self.wrap_union_base(sql), self.compile_unions(query));
        }
        if let Some(lock) = &query.lock {
            sql = concatenate([sql, self.compile_lock(lock)]);
        }
        sql
    }

    /// Every select section up to and including the offset.
    fn compile_components(&self, query: &Builder) -> String {
        let head = match &query.aggregate {
            Some(aggregate) => self.compile_aggregate(query, &aggregate.function, &aggregate.columns),
            None => self.compile_columns(query),
        };
        concatenate([
            head,
            self.compile_from(query),
            self.compile_joins(query),
            self.compile_wheres(query),
            self.compile_groups(query),
            self.compile_havings(query),
            self.compile_orders(&query.orders),
            query.limit.map(|n| self.compile_limit(n)).unwrap_or_default(),
            query.offset.map(|n| self.compile_offset(n)).unwrap_or_default(),
        ])
    }

    fn compile_aggregate(&self, query: &Builder, function: &str, columns: &[Value]) -> String {
        let mut column = self.columnize(columns);
        if query.distinct && column != "*" {
            column = format!("distinct {column}");
        }
        format!("select {function}({column}) as aggregate")
    }

    fn compile_columns(&self, query: &Builder) -> String {
        let select = if query.distinct { "select distinct" } else { "select" };
        if query.columns.is_empty() {
            return format!("{select} *");
        }
        format!("{select} {}", self.columnize(&query.columns))
    }

    fn compile_from(&self, query: &Builder) -> String {
        if query.from.is_empty() {
            return String::new();
        }
        format!("from {}", self.wrap_table_str(&query.from))
    }

    fn compile_joins(&self, query: &Builder) -> String {
        let joins: Vec<String> = query
            .joins
            .iter()
            .map(|join| {
                let table = self.wrap_table_str(&join.table);
                let conditions = self.compile_where_list(&join.clause.wheres);
                let on = if conditions.is_empty() {
                    String::new()
                } else {
                    format!("on {conditions}")
                };
                concatenate([format!("{} join", join.kind.as_str()), table, on])
            })
            .collect();
        concatenate(joins)
    }

    fn compile_wheres(&self, query: &Builder) -> String {
        let list = self.compile_where_list(&query.wheres);
        if list.is_empty() {
            return list;
        }
        format!("where {list}")
    }

    /// Render a where list; the first node's connector is dropped.
    fn compile_where_list(&self, wheres: &[Where]) -> String {
        let mut parts = Vec::with_capacity(wheres.len());
        for (i, where_) in wheres.iter().enumerate() {
            let body = self.compile_where(where_);
            if i == 0 {
                parts.push(body);
            } else {
                parts.push(format!("{} {}", where_.boolean.as_str(), body));
            }
        }
        parts.join(" ")
    }

    /// Render one predicate, without its connector.
    fn compile_where(&self, where_: &Where) -> String {
        match &where_.kind {
            WhereKind::Basic {
                column,
                operator,
                value,
            } => format!("{} {} {}", self.wrap_str(column), operator, self.parameter(value)),
            WhereKind::Column {
                first,
                operator,
                second,
            } => format!("{} {} {}", self.wrap_str(first), operator, self.wrap_str(second)),
            WhereKind::Raw { sql } => sql.clone(),
            WhereKind::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return if *negated { "1 = 1" } else { "0 = 1" }.to_string();
                }
                let not = if *negated { " not" } else { "" };
                format!("{}{} in ({})", self.wrap_str(column), not, self.parameterize(values))
            }
            WhereKind::InSub {
                column,
                query,
                negated,
            } => {
                let not = if *negated { " not" } else { "" };
                format!("{}{} in ({})", self.wrap_str(column), not, self.compile_select(query))
            }
            WhereKind::Null { column, negated } => {
                let not = if *negated { " not" } else { "" };
                format!("{} is{} null", self.wrap_str(column), not)
            }
            WhereKind::Between {
                column,
                low,
                high,
                negated,
            } => {
                let between = if *negated { "not between" } else { "between" };
                format!(
                    "{} {} {} and {}",
                    self.wrap_str(column),
                    between,
                    self.parameter(low),
                    self.parameter(high)
                )
            }
            WhereKind::Exists { query, negated } => {
                let not = if *negated { "not " } else { "" };
                format!("{not}exists ({})", self.compile_select(query))
            }
            WhereKind::Nested { query } => format!("({})", self.compile_where_list(&query.wheres)),
            WhereKind::Sub {
                column,
                operator,
                query,
            } => format!("{} {} ({})", self.wrap_str(column), operator, self.compile_select(query)),
            WhereKind::DatePart {
                part,
                column,
                operator,
                value,
            } => self.compile_date_part(*part, column, operator, value),
        }
    }

    /// `part(column) operator value`
    fn compile_date_part(&self, part: DatePart, column: &str, operator: &str, value: &Value) -> String {
        format!(
            "{}({}) {} {}",
            part.as_str(),
            self.wrap_str(column),
            operator,
            self.parameter(value)
        )
    }

    fn compile_groups(&self, query: &Builder) -> String {
        if query.groups.is_empty() {
            return String::new();
        }
        format!("group by {}", self.columnize(&query.groups))
    }

    fn compile_havings(&self, query: &Builder) -> String {
        if query.havings.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = query
            .havings
            .iter()
            .enumerate()
            .map(|(i, having)| {
                let body = self.compile_having(having);
                if i == 0 {
                    body
                } else {
                    format!("{} {}", having.boolean.as_str(), body)
                }
            })
            .collect();
        format!("having {}", parts.join(" "))
    }

    fn compile_having(&self, having: &Having) -> String {
        match &having.kind {
            HavingKind::Basic {
                column,
                operator,
                value,
            } => format!("{} {} {}", self.wrap_str(column), operator, self.parameter(value)),
            HavingKind::Raw { sql } => sql.clone(),
        }
    }

    fn compile_orders(&self, orders: &[Order]) -> String {
        if orders.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = orders
            .iter()
            .map(|order| match order {
                Order::Column { column, direction } => {
                    format!("{} {}", self.wrap(column), direction.as_str())
                }
                Order::Raw { sql } => sql.clone(),
            })
            .collect();
        format!("order by {}", parts.join(", "))
    }

    /// SQL for a random ordering.
    fn compile_random(&self, _seed: &str) -> String {
        "RANDOM()".to_string()
    }

    fn compile_limit(&self, limit: u64) -> String {
        format!("limit {limit}")
    }

    fn compile_offset(&self, offset: u64) -> String {
        format!("offset {offset}")
    }

    /// How the main select reads when followed by unions.
    fn wrap_union_base(&self, sql: String) -> String {
        sql
    }

    fn compile_unions(&self, query: &Builder) -> String {
        let mut sql: Vec<String> = query.unions.iter().map(|union| self.compile_union(union)).collect();
        sql.push(self.compile_orders(&query.union_orders));
        if let Some(limit) = query.union_limit {
            sql.push(self.compile_limit(limit));
        }
        if let Some(offset) = query.union_offset {
            sql.push(self.compile_offset(offset));
        }
        concatenate(sql)
    }

    fn compile_union(&self, union: &Union) -> String {
        let joiner = if union.all { "union all" } else { "union" };
        format!("{joiner} {}", self.compile_select(&union.query))
    }

    /// Aggregate over a union: count the rows of the whole union.
    fn compile_union_aggregate(&self, query: &Builder) -> String {
        let mut inner = query.clone();
        inner.aggregate = None;
        let Some(aggregate) = &query.aggregate else {
            return self.compile_select(&inner);
        };
        let head = self.compile_aggregate(query, &aggregate.function, &aggregate.columns);
        format!(
            "{head} from ({}) as {}",
            self.compile_select(&inner),
            self.wrap_table_str("temp_table")
        )
    }

    fn compile_lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::Raw(sql) => sql.clone(),
            Lock::Update | Lock::Shared => String::new(),
        }
    }

    /// `select exists(<select>) as exists`
    fn compile_exists(&self, query: &Builder) -> String {
        format!(
            "select exists({}) as {}",
            self.compile_select(query),
            self.wrap_str("exists")
        )
    }

    // ==================== Insert / update / delete ====================

    /// Compile an insert of `rows`. The first row's columns decide the column
    /// list and the value order of every row.
    fn compile_insert(&self, query: &Builder, rows: &[Row]) -> String {
        let table = self.wrap_table_str(&query.from);
        let Some(first) = rows.first() else {
            return format!("insert into {table} default values");
        };
        let columns: Vec<Value> = first.columns().map(Value::from).collect();
        let records: Vec<String> = rows
            .iter()
            .map(|row| {
                let values: Vec<Value> = first
                    .columns()
                    .map(|column| row.get(column).cloned().unwrap_or_default())
                    .collect();
                format!("({})", self.parameterize(&values))
            })
            .collect();
        format!(
            "insert into {table} ({}) values {}",
            self.columnize(&columns),
            records.join(", ")
        )
    }

    fn compile_update(&self, query: &Builder, values: &Row) -> String {
        let table = self.wrap_table_str(&query.from);
        let columns: Vec<String> = values
            .iter()
            .map(|(column, value)| format!("{} = {}", self.wrap_str(column), self.parameter(value)))
            .collect();
        concatenate([
            format!("update {table}"),
            self.compile_joins(query),
            format!("set {}", columns.join(", ")),
            self.compile_wheres(query),
        ])
    }

    /// Join bindings, then the update values, then everything but selects.
    fn prepare_bindings_for_update(&self, bindings: &Bindings, values: &Row) -> Vec<Value> {
        let mut out: Vec<Value> = bindings.get(BindingKind::Join).to_vec();
        out.extend(values.values().cloned());
        out.extend(bindings.flatten_only(&[
            BindingKind::Where,
            BindingKind::Having,
            BindingKind::Order,
            BindingKind::Union,
        ]));
        out
    }

    fn compile_delete(&self, query: &Builder) -> String {
        concatenate([
            format!("delete from {}", self.wrap_table_str(&query.from)),
            self.compile_wheres(query),
        ])
    }

    fn prepare_bindings_for_delete(&self, bindings: &Bindings) -> Vec<Value> {
        bindings.flatten_only(&[BindingKind::Where])
    }

    /// Statements (with their bindings) that empty the table.
    fn compile_truncate(&self, query: &Builder) -> Vec<(String, Vec<Value>)> {
        vec![(format!("truncate {}", self.wrap_table_str(&query.from)), Vec::new())]
    }

    /// Date format used for stored timestamps.
    fn date_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }
}

/// Dialect-neutral grammar with bare identifiers.
#[derive(Debug, Clone, Default)]
pub struct GenericGrammar {
    table_prefix: String,
}

impl GenericGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: prefix.into(),
        }
    }
}

impl Grammar for GenericGrammar {
    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn wrap_value(&self, value: &str) -> String {
        value.to_string()
    }
}

#[cfg(test)]
mod tests;
