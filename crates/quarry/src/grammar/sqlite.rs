use super::Grammar;
use crate::qb::{Builder, DatePart, Lock};
use crate::value::Value;

/// SQLite: double-quoted identifiers, `strftime` date parts, no row locks.
#[derive(Debug, Clone, Default)]
pub struct SqliteGrammar {
    table_prefix: String,
}

impl SqliteGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: prefix.into(),
        }
    }
}

impl Grammar for SqliteGrammar {
    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn compile_date_part(&self, part: DatePart, column: &str, operator: &str, value: &Value) -> String {
        let format = match part {
            DatePart::Date => "%Y-%m-%d",
            DatePart::Day => "%d",
            DatePart::Month => "%m",
            DatePart::Year => "%Y",
        };
        format!(
            "strftime('{format}', {}) {operator} cast({} as text)",
            self.wrap_str(column),
            self.parameter(value)
        )
    }

    fn compile_lock(&self, _lock: &Lock) -> String {
        String::new()
    }

    /// SQLite has no truncate: delete the rows and reset the rowid sequence.
    fn compile_truncate(&self, query: &Builder) -> Vec<(String, Vec<Value>)> {
        let table = format!("{}{}", self.table_prefix, query.from);
        vec![
            (
                "delete from sqlite_sequence where name = ?".to_string(),
                vec![Value::from(table)],
            ),
            (format!("delete from {}", self.wrap_table_str(&query.from)), Vec::new()),
        ]
    }
}
