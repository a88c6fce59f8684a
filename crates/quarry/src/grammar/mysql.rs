use super::Grammar;
use crate::qb::{Bindings, BindingKind, Builder, Lock, Union};
use crate::value::Value;

/// MySQL: backtick identifiers, `json_extract` selectors, parenthesized unions.
#[derive(Debug, Clone, Default)]
pub struct MySqlGrammar {
    table_prefix: String,
}

impl MySqlGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: prefix.into(),
        }
    }

    fn wrap_json_selector(&self, value: &str) -> String {
        let mut path = value.split("->");
        let field = self.wrap_value(path.next().unwrap_or_default());
        let path: Vec<String> = path.map(|segment| format!("\"{segment}\"")).collect();
        format!("json_unquote(json_extract({field}, '$.{}'))", path.join("."))
    }
}

impl Grammar for MySqlGrammar {
    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn operators(&self) -> &[&'static str] {
        &["sounds like"]
    }

    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return value.to_string();
        }
        if value.contains("->") {
            return self.wrap_json_selector(value);
        }
        format!("`{}`", value.replace('`', "``"))
    }

    fn compile_random(&self, seed: &str) -> String {
        format!("RAND({seed})")
    }

    fn wrap_union_base(&self, sql: String) -> String {
        format!("({sql})")
    }

    fn compile_union(&self, union: &Union) -> String {
        let joiner = if union.all { "union all" } else { "union" };
        format!("{joiner} ({})", self.compile_select(&union.query))
    }

    fn compile_lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::Update => "for update".to_string(),
            Lock::Shared => "lock in share mode".to_string(),
            Lock::Raw(sql) => sql.clone(),
        }
    }

    /// Joined deletes name the target table twice.
    fn compile_delete(&self, query: &Builder) -> String {
        let table = self.wrap_table_str(&query.from);
        if query.joins.is_empty() {
            return super::concatenate([
                format!("delete from {table}"),
                self.compile_wheres(query),
                query.limit.map(|n| self.compile_limit(n)).unwrap_or_default(),
            ]);
        }
        super::concatenate([
            format!("delete {table} from {table}"),
            self.compile_joins(query),
            self.compile_wheres(query),
        ])
    }

    fn prepare_bindings_for_delete(&self, bindings: &Bindings) -> Vec<Value> {
        bindings.flatten_only(&[BindingKind::Join, BindingKind::Where])
    }
}
