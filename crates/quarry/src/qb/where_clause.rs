//! WHERE / HAVING clause construction.
//!
//! Every method appends a node to the clause tree first and then pushes the
//! node's non-expression values onto the matching binding category, so the
//! registry always follows emission order.

use super::expr::{Boolean, DatePart, Having, HavingKind, Where, WhereKind};
use super::param::BindingKind;
use super::Builder;
use crate::value::{Value, raw};

/// Which clause method a batch of [`WhereSpec`]s is applied with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrayWhereMethod {
    #[default]
    Where,
    Column,
}

/// One entry of a bulk where, see [`Builder::add_array_of_wheres`].
#[derive(Debug, Clone)]
pub struct WhereSpec {
    pub column: String,
    pub operator: Value,
    pub value: Option<Value>,
    pub boolean: Boolean,
}

impl WhereSpec {
    /// `column operator value`
    pub fn new(column: impl Into<String>, operator: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            value: Some(value.into()),
            boolean: Boolean::And,
        }
    }

    /// Two-operand form: `column = value`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator: value.into(),
            value: None,
            boolean: Boolean::And,
        }
    }

    /// Join this entry with `or` inside the group.
    pub fn or(mut self) -> Self {
        self.boolean = Boolean::Or;
        self
    }
}

impl Builder {
    // ==================== Basic ====================

    /// Add `column operator value`.
    ///
    /// An empty value turns into `is null` (for `=`) or `is not null`
    /// (any other operator). An unknown operator is taken as the value and
    /// compared with `=`.
    pub fn where_(
        &mut self,
        column: &str,
        operator: impl Into<Value>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.where_clause(column, operator.into(), Some(value.into()), Boolean::And)
    }

    pub fn or_where(
        &mut self,
        column: &str,
        operator: impl Into<Value>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.where_clause(column, operator.into(), Some(value.into()), Boolean::Or)
    }

    /// Two-operand form, same as `where_(column, "=", value)`.
    pub fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_clause(column, value.into(), None, Boolean::And)
    }

    pub fn or_where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_clause(column, Value::from("="), Some(value.into()), Boolean::Or)
    }

    /// Full form of a basic where. `value: None` means only one operand was
    /// given, which then sits in the `operator` slot.
    pub fn where_clause(
        &mut self,
        column: &str,
        operator: Value,
        value: Option<Value>,
        boolean: Boolean,
    ) -> &mut Self {
        let use_default = value.is_none() && boolean == Boolean::And;
        let (mut value, mut operator) =
            match self.prepare_value_and_operator(value.unwrap_or_default(), operator, use_default) {
                Ok(pair) => pair,
                Err(err) => return self.record_error(err),
            };

        if self.invalid_operator_value(&operator) {
            value = operator;
            operator = Value::from("=");
        }
        let operator = operator.to_string();

        if value.is_empty() {
            return self.where_null_clause(column, boolean, operator != "=");
        }

        if column.contains("->") {
            if let Value::Bool(flag) = value {
                value = raw(if flag { "true" } else { "false" });
            }
        }

        self.wheres.push(Where::new(
            boolean,
            WhereKind::Basic {
                column: column.to_string(),
                operator,
                value: value.clone(),
            },
        ));
        if !value.is_expression() {
            self.add_binding(value, BindingKind::Where);
        }
        self
    }

    /// Compare `column` against a sub-select built by `callback`.
    ///
    /// An empty or unknown operator compares with `=`.
    pub fn where_query<F>(&mut self, column: &str, operator: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let operator = if self.invalid_operator(operator) { "=" } else { operator };
        let mut query = self.new_query();
        callback(&mut query);
        self.push_sub(column, operator, query, Boolean::And)
    }

    pub fn or_where_query<F>(&mut self, column: &str, operator: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let operator = if self.invalid_operator(operator) { "=" } else { operator };
        let mut query = self.new_query();
        callback(&mut query);
        self.push_sub(column, operator, query, Boolean::Or)
    }

    /// Add `column operator (select ...)`.
    pub fn where_sub<F>(&mut self, column: &str, operator: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut query = self.new_query();
        callback(&mut query);
        self.push_sub(column, operator, query, Boolean::And)
    }

    fn push_sub(&mut self, column: &str, operator: &str, query: Builder, boolean: Boolean) -> &mut Self {
        self.absorb_error(&query);
        let bindings = query.get_bindings();
        self.wheres.push(Where::new(
            boolean,
            WhereKind::Sub {
                column: column.to_string(),
                operator: operator.to_string(),
                query: Box::new(query),
            },
        ));
        self.add_bindings(bindings, BindingKind::Where)
    }

    // ==================== Column / raw ====================

    /// Compare two columns. An unknown operator is taken as the second column.
    pub fn where_column(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.where_column_clause(first, operator, second, Boolean::And)
    }

    pub fn or_where_column(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.where_column_clause(first, operator, second, Boolean::Or)
    }

    pub fn where_column_clause(
        &mut self,
        first: &str,
        operator: &str,
        second: &str,
        boolean: Boolean,
    ) -> &mut Self {
        let (operator, second) = if self.invalid_operator(operator) {
            ("=", operator)
        } else {
            (operator, second)
        };
        self.wheres.push(Where::new(
            boolean,
            WhereKind::Column {
                first: first.to_string(),
                operator: operator.to_string(),
                second: second.to_string(),
            },
        ));
        self
    }

    /// Add a raw predicate with its own bindings.
    pub fn where_raw(&mut self, sql: &str, bindings: impl IntoIterator<Item = Value>) -> &mut Self {
        self.where_raw_clause(sql, bindings, Boolean::And)
    }

    pub fn or_where_raw(&mut self, sql: &str, bindings: impl IntoIterator<Item = Value>) -> &mut Self {
        self.where_raw_clause(sql, bindings, Boolean::Or)
    }

    fn where_raw_clause(
        &mut self,
        sql: &str,
        bindings: impl IntoIterator<Item = Value>,
        boolean: Boolean,
    ) -> &mut Self {
        self.wheres
            .push(Where::new(boolean, WhereKind::Raw { sql: sql.to_string() }));
        self.add_bindings(bindings, BindingKind::Where)
    }

    // ==================== In ====================

    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_in_clause(column, collect_values(values), Boolean::And, false)
    }

    pub fn or_where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_in_clause(column, collect_values(values), Boolean::Or, false)
    }

    pub fn where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_in_clause(column, collect_values(values), Boolean::And, true)
    }

    pub fn or_where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_in_clause(column, collect_values(values), Boolean::Or, true)
    }

    pub fn where_in_clause(
        &mut self,
        column: &str,
        values: Vec<Value>,
        boolean: Boolean,
        negated: bool,
    ) -> &mut Self {
        let bindings: Vec<Value> = values.iter().filter(|v| !v.is_expression()).cloned().collect();
        self.wheres.push(Where::new(
            boolean,
            WhereKind::In {
                column: column.to_string(),
                values,
                negated,
            },
        ));
        self.add_bindings(bindings, BindingKind::Where)
    }

    /// `column in (select ...)` with the sub-select built by `callback`.
    pub fn where_in_sub<F>(&mut self, column: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut query = self.new_query();
        callback(&mut query);
        self.where_in_query_clause(column, query, Boolean::And, false)
    }

    pub fn where_not_in_sub<F>(&mut self, column: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut query = self.new_query();
        callback(&mut query);
        self.where_in_query_clause(column, query, Boolean::And, true)
    }

    /// `column in (select ...)` with an already built query.
    pub fn where_in_query(&mut self, column: &str, query: Builder) -> &mut Self {
        self.where_in_query_clause(column, query, Boolean::And, false)
    }

    pub fn where_not_in_query(&mut self, column: &str, query: Builder) -> &mut Self {
        self.where_in_query_clause(column, query, Boolean::And, true)
    }

    pub fn where_in_query_clause(
        &mut self,
        column: &str,
        query: Builder,
        boolean: Boolean,
        negated: bool,
    ) -> &mut Self {
        self.absorb_error(&query);
        let bindings = query.get_bindings();
        self.wheres.push(Where::new(
            boolean,
            WhereKind::InSub {
                column: column.to_string(),
                query: Box::new(query),
                negated,
            },
        ));
        self.add_bindings(bindings, BindingKind::Where)
    }

    // ==================== Null ====================

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.where_null_clause(column, Boolean::And, false)
    }

    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.where_null_clause(column, Boolean::Or, false)
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.where_null_clause(column, Boolean::And, true)
    }

    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.where_null_clause(column, Boolean::Or, true)
    }

    pub fn where_null_clause(&mut self, column: &str, boolean: Boolean, negated: bool) -> &mut Self {
        self.wheres.push(Where::new(
            boolean,
            WhereKind::Null {
                column: column.to_string(),
                negated,
            },
        ));
        self
    }

    // ==================== Between ====================

    pub fn where_between(
        &mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.where_between_clause(column, low.into(), high.into(), Boolean::And, false)
    }

    pub fn or_where_between(
        &mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.where_between_clause(column, low.into(), high.into(), Boolean::Or, false)
    }

    pub fn where_not_between(
        &mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.where_between_clause(column, low.into(), high.into(), Boolean::And, true)
    }

    pub fn or_where_not_between(
        &mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.where_between_clause(column, low.into(), high.into(), Boolean::Or, true)
    }

    pub fn where_between_clause(
        &mut self,
        column: &str,
        low: Value,
        high: Value,
        boolean: Boolean,
        negated: bool,
    ) -> &mut Self {
        let bindings: Vec<Value> = [&low, &high]
            .into_iter()
            .filter(|v| !v.is_expression())
            .cloned()
            .collect();
        self.wheres.push(Where::new(
            boolean,
            WhereKind::Between {
                column: column.to_string(),
                low,
                high,
                negated,
            },
        ));
        self.add_bindings(bindings, BindingKind::Where)
    }

    // ==================== Exists ====================

    pub fn where_exists<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut query = self.new_query();
        callback(&mut query);
        self.add_where_exists_query(query, Boolean::And, false)
    }

    pub fn or_where_exists<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut query = self.new_query();
        callback(&mut query);
        self.add_where_exists_query(query, Boolean::Or, false)
    }

    pub fn where_not_exists<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut query = self.new_query();
        callback(&mut query);
        self.add_where_exists_query(query, Boolean::And, true)
    }

    pub fn or_where_not_exists<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut query = self.new_query();
        callback(&mut query);
        self.add_where_exists_query(query, Boolean::Or, true)
    }

    pub fn add_where_exists_query(&mut self, query: Builder, boolean: Boolean, negated: bool) -> &mut Self {
        self.absorb_error(&query);
        let bindings = query.get_bindings();
        self.wheres.push(Where::new(
            boolean,
            WhereKind::Exists {
                query: Box::new(query),
                negated,
            },
        ));
        self.add_bindings(bindings, BindingKind::Where)
    }

    // ==================== Nested ====================

    /// Add a parenthesized group built by `callback`.
    pub fn where_nested<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        self.where_nested_clause(callback, Boolean::And)
    }

    pub fn or_where_nested<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        self.where_nested_clause(callback, Boolean::Or)
    }

    pub fn where_nested_clause<F>(&mut self, callback: F, boolean: Boolean) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut query = self.new_query();
        query.from = self.from.clone();
        callback(&mut query);
        self.add_nested_where_query(query, boolean)
    }

    /// Push `query`'s wheres as one group. A query without wheres adds
    /// nothing.
    pub fn add_nested_where_query(&mut self, query: Builder, boolean: Boolean) -> &mut Self {
        self.absorb_error(&query);
        if query.wheres.is_empty() {
            return self;
        }
        let bindings = query.get_bindings();
        self.wheres
            .push(Where::new(boolean, WhereKind::Nested { query: Box::new(query) }));
        self.add_bindings(bindings, BindingKind::Where)
    }

    /// Add a batch of conditions as a single nested group joined with
    /// `boolean`. Per-entry connectors only apply inside the group.
    pub fn add_array_of_wheres(
        &mut self,
        specs: impl IntoIterator<Item = WhereSpec>,
        boolean: Boolean,
        method: ArrayWhereMethod,
    ) -> &mut Self {
        self.where_nested_clause(
            |query| {
                for spec in specs {
                    match method {
                        ArrayWhereMethod::Where => {
                            query.where_clause(&spec.column, spec.operator, spec.value, spec.boolean);
                        }
                        ArrayWhereMethod::Column => {
                            let operator = spec.operator.to_string();
                            let second = spec.value.map(|v| v.to_string()).unwrap_or_default();
                            query.where_column_clause(&spec.column, &operator, &second, spec.boolean);
                        }
                    }
                }
            },
            boolean,
        )
    }

    // ==================== Date parts ====================

    pub fn where_date(&mut self, column: &str, operator: &str, value: impl Into<Value>) -> &mut Self {
        self.where_date_part(DatePart::Date, column, operator, Some(value.into()), Boolean::And)
    }

    pub fn where_day(&mut self, column: &str, operator: &str, value: impl Into<Value>) -> &mut Self {
        self.where_date_part(DatePart::Day, column, operator, Some(value.into()), Boolean::And)
    }

    pub fn where_month(&mut self, column: &str, operator: &str, value: impl Into<Value>) -> &mut Self {
        self.where_date_part(DatePart::Month, column, operator, Some(value.into()), Boolean::And)
    }

    pub fn where_year(&mut self, column: &str, operator: &str, value: impl Into<Value>) -> &mut Self {
        self.where_date_part(DatePart::Year, column, operator, Some(value.into()), Boolean::And)
    }

    /// Compare one date component of `column`. With `value: None` the
    /// operator slot holds the value.
    pub fn where_date_part(
        &mut self,
        part: DatePart,
        column: &str,
        operator: &str,
        value: Option<Value>,
        boolean: Boolean,
    ) -> &mut Self {
        let use_default = value.is_none() && boolean == Boolean::And;
        let (value, operator) = match self.prepare_value_and_operator(
            value.unwrap_or_default(),
            Value::from(operator),
            use_default,
        ) {
            Ok(pair) => pair,
            Err(err) => return self.record_error(err),
        };
        self.add_date_based_where(part, column, &operator.to_string(), value, boolean)
    }

    fn add_date_based_where(
        &mut self,
        part: DatePart,
        column: &str,
        operator: &str,
        value: Value,
        boolean: Boolean,
    ) -> &mut Self {
        self.wheres.push(Where::new(
            boolean,
            WhereKind::DatePart {
                part,
                column: column.to_string(),
                operator: operator.to_string(),
                value: value.clone(),
            },
        ));
        if !value.is_expression() {
            self.add_binding(value, BindingKind::Where);
        }
        self
    }

    // ==================== Having ====================

    pub fn having(
        &mut self,
        column: &str,
        operator: impl Into<Value>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.having_clause(column, operator.into(), Some(value.into()), Boolean::And)
    }

    pub fn or_having(
        &mut self,
        column: &str,
        operator: impl Into<Value>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.having_clause(column, operator.into(), Some(value.into()), Boolean::Or)
    }

    pub fn having_clause(
        &mut self,
        column: &str,
        operator: Value,
        value: Option<Value>,
        boolean: Boolean,
    ) -> &mut Self {
        let use_default = value.is_none() && boolean == Boolean::And;
        let (mut value, mut operator) =
            match self.prepare_value_and_operator(value.unwrap_or_default(), operator, use_default) {
                Ok(pair) => pair,
                Err(err) => return self.record_error(err),
            };
        if self.invalid_operator_value(&operator) {
            value = operator;
            operator = Value::from("=");
        }

        self.havings.push(Having {
            boolean,
            kind: HavingKind::Basic {
                column: column.to_string(),
                operator: operator.to_string(),
                value: value.clone(),
            },
        });
        if !value.is_expression() {
            self.add_binding(value, BindingKind::Having);
        }
        self
    }

    pub fn having_raw(&mut self, sql: &str, bindings: impl IntoIterator<Item = Value>) -> &mut Self {
        self.having_raw_clause(sql, bindings, Boolean::And)
    }

    pub fn or_having_raw(&mut self, sql: &str, bindings: impl IntoIterator<Item = Value>) -> &mut Self {
        self.having_raw_clause(sql, bindings, Boolean::Or)
    }

    fn having_raw_clause(
        &mut self,
        sql: &str,
        bindings: impl IntoIterator<Item = Value>,
        boolean: Boolean,
    ) -> &mut Self {
        self.havings.push(Having {
            boolean,
            kind: HavingKind::Raw { sql: sql.to_string() },
        });
        self.add_bindings(bindings, BindingKind::Having)
    }
}

fn collect_values<I, V>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    values.into_iter().map(Into::into).collect()
}
