use super::Grammar;
use crate::qb::{Builder, DatePart, Lock};
use crate::value::Value;

/// PostgreSQL: double-quoted identifiers, `->`/`->>` JSON selectors.
///
/// Placeholders stay `?`; the connection renumbers them to `$n`.
#[derive(Debug, Clone, Default)]
pub struct PostgresGrammar {
    table_prefix: String,
}

impl PostgresGrammar {
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
        let mut segments: Vec<String> = path.map(|segment| format!("'{segment}'")).collect();
        let Some(attribute) = segments.pop() else {
            return field;
        };
        if segments.is_empty() {
            format!("{field}->>{attribute}")
        } else {
            format!("{field}->{}->>{attribute}", segments.join("->"))
        }
    }
}

impl Grammar for PostgresGrammar {
    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn operators(&self) -> &[&'static str] {
        &[
            "=", "<", ">", "<=", ">=", "<>", "!=",
            "like", "not like", "between", "ilike",
            "&", "|", "#", "<<", ">>",
            "@>", "<@", "||", "-", "#-",
        ]
    }

    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return value.to_string();
        }
        if value.contains("->") {
            return self.wrap_json_selector(value);
        }
        format!("\"{}\"", value.replace('"', "\"\""))
    }

    fn compile_date_part(&self, part: DatePart, column: &str, operator: &str, value: &Value) -> String {
        let column = self.wrap_str(column);
        match part {
            DatePart::Date => format!("{column}::date {operator} {}", self.parameter(value)),
            _ => format!(
                "extract({} from {column}) {operator} {}",
                part.as_str(),
                self.parameter(value)
            ),
        }
    }

    fn compile_lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::Update => "for update".to_string(),
            Lock::Shared => "for share".to_string(),
            Lock::Raw(sql) => sql.clone(),
        }
    }

    fn compile_truncate(&self, query: &Builder) -> Vec<(String, Vec<Value>)> {
        vec![(
            format!("truncate {} restart identity", self.wrap_table_str(&query.from)),
            Vec::new(),
        )]
    }
}
