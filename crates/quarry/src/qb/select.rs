//! Column list, FROM, joins, grouping, ordering, paging, unions and locks.

use super::expr::{Aggregate, Direction, JoinType, Lock, Order, Union};
use super::join::JoinClause;
use super::param::BindingKind;
use super::Builder;
use crate::value::{Value, raw};

impl Builder {
    // ==================== Columns ====================

    /// Set the selected columns, replacing any previous list.
    pub fn select<I, V>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append a raw select expression with its bindings.
    pub fn select_raw(&mut self, expression: &str, bindings: impl IntoIterator<Item = Value>) -> &mut Self {
        self.columns.push(raw(expression));
        self.add_bindings(bindings, BindingKind::Select)
    }

    /// Select `(sub-query) as alias`, the sub-query built by `callback`.
    pub fn select_sub<F>(&mut self, callback: F, alias: &str) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut query = self.new_query();
        callback(&mut query);
        self.select_sub_query(query, alias)
    }

    /// Select `(query) as alias`. Only the query's first column is kept.
    pub fn select_sub_query(&mut self, mut query: Builder, alias: &str) -> &mut Self {
        self.absorb_error(&query);
        query.columns.truncate(1);
        let sql = format!("({}) as {}", query.to_sql(), self.grammar.wrap(&Value::from(alias)));
        self.select_raw(&sql, query.get_bindings())
    }

    /// Append columns to the select list.
    pub fn add_select<I, V>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Set the table the query targets.
    pub fn from(&mut self, table: &str) -> &mut Self {
        self.from = table.to_string();
        self
    }

    // ==================== Joins ====================

    /// `inner join table on first operator second`
    pub fn join(&mut self, table: &str, first: &str, operator: &str, second: &str) -> &mut Self {
        self.join_clause(table, first, operator, second, JoinType::Inner, false)
    }

    pub fn left_join(&mut self, table: &str, first: &str, operator: &str, second: &str) -> &mut Self {
        self.join_clause(table, first, operator, second, JoinType::Left, false)
    }

    pub fn right_join(&mut self, table: &str, first: &str, operator: &str, second: &str) -> &mut Self {
        self.join_clause(table, first, operator, second, JoinType::Right, false)
    }

    /// Inner join whose condition compares `first` with a bound value.
    pub fn join_where(&mut self, table: &str, first: &str, operator: &str, second: impl Into<Value>) -> &mut Self {
        let mut join = JoinClause::new(self.new_query(), JoinType::Inner, table);
        join.where_(first, operator, second);
        self.push_join(join)
    }

    pub fn join_clause(
        &mut self,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
        kind: JoinType,
        bind_second: bool,
    ) -> &mut Self {
        let mut join = JoinClause::new(self.new_query(), kind, table);
        if bind_second {
            join.where_(first, operator, second);
        } else {
            join.on(first, operator, second);
        }
        self.push_join(join)
    }

    /// Join with a condition list built by `callback`.
    pub fn join_with<F>(&mut self, table: &str, kind: JoinType, callback: F) -> &mut Self
    where
        F: FnOnce(&mut JoinClause),
    {
        let mut join = JoinClause::new(self.new_query(), kind, table);
        callback(&mut join);
        self.push_join(join)
    }

    /// `cross join table` without conditions.
    pub fn cross_join(&mut self, table: &str) -> &mut Self {
        let join = JoinClause::new(self.new_query(), JoinType::Cross, table);
        self.push_join(join)
    }

    fn push_join(&mut self, join: JoinClause) -> &mut Self {
        self.absorb_error(&join.clause);
        let bindings = join.clause.get_bindings();
        self.joins.push(join);
        self.add_bindings(bindings, BindingKind::Join)
    }

    // ==================== Grouping ====================

    pub fn group_by<I, V>(&mut self, groups: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    // ==================== Ordering ====================

    /// Order by `column`. Only the literal `"asc"` sorts ascending.
    ///
    /// Once a union exists the order applies to the union as a whole.
    pub fn order_by(&mut self, column: impl Into<Value>, direction: &str) -> &mut Self {
        let order = Order::Column {
            column: column.into(),
            direction: Direction::parse(direction),
        };
        self.push_order(order)
    }

    pub fn order_by_desc(&mut self, column: impl Into<Value>) -> &mut Self {
        self.order_by(column, "desc")
    }

    /// Newest first on `column`.
    pub fn latest(&mut self, column: &str) -> &mut Self {
        self.order_by(column, "desc")
    }

    /// Oldest first on `column`.
    pub fn oldest(&mut self, column: &str) -> &mut Self {
        self.order_by(column, "asc")
    }

    /// Raw order clause. After a union it orders the whole union, so its
    /// bindings land in the `union` category behind the unioned queries.
    pub fn order_by_raw(&mut self, sql: &str, bindings: impl IntoIterator<Item = Value>) -> &mut Self {
        self.push_order(Order::Raw { sql: sql.to_string() });
        if self.unions.is_empty() {
            return self.add_bindings(bindings, BindingKind::Order);
        }
        let bindings: Vec<Value> = bindings.into_iter().collect();
        self.union_order_bindings += bindings.len();
        self.add_bindings(bindings, BindingKind::Union)
    }

    /// Random order using the dialect's random function.
    pub fn in_random_order(&mut self, seed: &str) -> &mut Self {
        let sql = self.grammar.compile_random(seed);
        self.order_by_raw(&sql, Vec::new())
    }

    fn push_order(&mut self, order: Order) -> &mut Self {
        if self.unions.is_empty() {
            self.orders.push(order);
        } else {
            self.union_orders.push(order);
        }
        self
    }

    /// The current orders minus the ones on `column`.
    pub fn remove_existing_orders_for(&self, column: &str) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|order| order.column().is_none_or(|c| *c != column))
            .cloned()
            .collect()
    }

    /// Keyset page: rows with `column > last_id`, ascending, `per_page` of them.
    pub fn for_page_after_id(&mut self, per_page: i64, last_id: Option<Value>, column: &str) -> &mut Self {
        self.orders = self.remove_existing_orders_for(column);
        if let Some(last_id) = last_id {
            self.where_(column, ">", last_id);
        }
        self.order_by(column, "asc").limit(per_page)
    }

    // ==================== Paging ====================

    /// Negative values are ignored.
    pub fn limit(&mut self, value: i64) -> &mut Self {
        if let Ok(value) = u64::try_from(value) {
            if self.unions.is_empty() {
                self.limit = Some(value);
            } else {
                self.union_limit = Some(value);
            }
        }
        self
    }

    /// Negative values clamp to zero.
    pub fn offset(&mut self, value: i64) -> &mut Self {
        let value = u64::try_from(value).unwrap_or(0);
        if self.unions.is_empty() {
            self.offset = Some(value);
        } else {
            self.union_offset = Some(value);
        }
        self
    }

    pub fn take(&mut self, value: i64) -> &mut Self {
        self.limit(value)
    }

    pub fn skip(&mut self, value: i64) -> &mut Self {
        self.offset(value)
    }

    /// Page `page` (1-based) of `per_page` rows.
    pub fn for_page(&mut self, page: i64, per_page: i64) -> &mut Self {
        let skip = (page.max(1) - 1).saturating_mul(per_page);
        self.skip(skip).take(per_page)
    }

    // ==================== Unions ====================

    /// `union query`
    pub fn union(&mut self, query: Builder) -> &mut Self {
        self.push_union(query, false)
    }

    /// `union all query`
    pub fn union_all(&mut self, query: Builder) -> &mut Self {
        self.push_union(query, true)
    }

    /// Union with a query built by `callback`.
    pub fn union_with<F>(&mut self, all: bool, callback: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut query = self.new_query();
        callback(&mut query);
        self.push_union(query, all)
    }

    fn push_union(&mut self, query: Builder, all: bool) -> &mut Self {
        self.absorb_error(&query);
        let bindings = query.get_bindings();
        self.unions.push(Union {
            query: Box::new(query),
            all,
        });
        // Keep raw union order bindings last, where their placeholders are.
        let mut slot = self.bindings.get(BindingKind::Union).to_vec();
        let at = slot.len().saturating_sub(self.union_order_bindings);
        slot.splice(at..at, bindings);
        self.bindings.set(BindingKind::Union, slot);
        self
    }

    // ==================== Locks ====================

    pub fn lock(&mut self, lock: Lock) -> &mut Self {
        self.lock = Some(lock);
        self
    }

    pub fn lock_for_update(&mut self) -> &mut Self {
        self.lock(Lock::Update)
    }

    pub fn shared_lock(&mut self) -> &mut Self {
        self.lock(Lock::Shared)
    }

    // ==================== Aggregates ====================

    /// Turn the query into an aggregate without running it.
    ///
    /// Without grouping, orders and their bindings are dropped since they
    /// cannot affect a single aggregate row. Union orders stay: together with
    /// the union limit they decide which rows the aggregate sees.
    pub fn set_aggregate<I, V>(&mut self, function: &str, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.aggregate = Some(Aggregate {
            function: function.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        if self.groups.is_empty() {
            self.orders.clear();
            self.bindings.clear_kind(BindingKind::Order);
        }
        self
    }
}
