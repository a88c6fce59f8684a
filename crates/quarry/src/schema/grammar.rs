//! DDL compilation.

use super::blueprint::{Blueprint, ColumnDefinition, Command, ForeignKey, IndexCommand};
use crate::value::Value;
use std::fmt;

/// Dialect-specific compiler from a [`Blueprint`] to DDL statements.
///
/// Every `compile_*` command method returns zero or more statements, to be
/// run in order.
pub trait SchemaGrammar: Send + Sync + fmt::Debug {
    fn table_prefix(&self) -> &str;

    // ==================== Wrapping ====================

    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return value.to_string();
        }
        format!("\"{}\"", value.replace('"', "\"\""))
    }

    /// Wrap a dotted reference segment by segment.
    fn wrap(&self, value: &str) -> String {
        value
            .split('.')
            .map(|segment| self.wrap_value(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn wrap_table_name(&self, table: &str) -> String {
        self.wrap(&format!("{}{}", self.table_prefix(), table))
    }

    fn wrap_table(&self, blueprint: &Blueprint) -> String {
        self.wrap_table_name(blueprint.table())
    }

    fn columnize(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|column| self.wrap(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Literal SQL for a column default.
    fn default_value(&self, value: &Value) -> String {
        match value {
            Value::Expression(expr) => expr.as_str().to_string(),
            Value::Bool(flag) => format!("'{}'", i32::from(*flag)),
            other => format!("'{}'", other.to_string().replace('\'', "''")),
        }
    }

    // ==================== Columns ====================

    /// SQL type of `column`.
    fn column_type(&self, column: &ColumnDefinition) -> String;

    /// `name type modifiers` for every column of the blueprint.
    fn get_columns(&self, blueprint: &Blueprint) -> Vec<String> {
        blueprint
            .columns()
            .iter()
            .map(|column| {
                let sql = format!("{} {}", self.wrap(&column.name), self.column_type(column));
                self.add_modifiers(sql, blueprint, column)
            })
            .collect()
    }

    /// Append modifiers in their fixed order: virtual-as, stored-as,
    /// unsigned, charset, collate, nullable, default, increment.
    fn add_modifiers(&self, mut sql: String, blueprint: &Blueprint, column: &ColumnDefinition) -> String {
        let modifiers = [
            self.modify_virtual_as(blueprint, column),
            self.modify_stored_as(blueprint, column),
            self.modify_unsigned(blueprint, column),
            self.modify_charset(blueprint, column),
            self.modify_collate(blueprint, column),
            self.modify_nullable(blueprint, column),
            self.modify_default(blueprint, column),
            self.modify_increment(blueprint, column),
        ];
        for modifier in modifiers.into_iter().flatten() {
            sql.push_str(&modifier);
        }
        sql
    }

    fn modify_virtual_as(&self, _blueprint: &Blueprint, _column: &ColumnDefinition) -> Option<String> {
        None
    }

    fn modify_stored_as(&self, _blueprint: &Blueprint, _column: &ColumnDefinition) -> Option<String> {
        None
    }

    fn modify_unsigned(&self, _blueprint: &Blueprint, _column: &ColumnDefinition) -> Option<String> {
        None
    }

    fn modify_charset(&self, _blueprint: &Blueprint, _column: &ColumnDefinition) -> Option<String> {
        None
    }

    fn modify_collate(&self, _blueprint: &Blueprint, _column: &ColumnDefinition) -> Option<String> {
        None
    }

    fn modify_nullable(&self, _blueprint: &Blueprint, _column: &ColumnDefinition) -> Option<String> {
        None
    }

    fn modify_default(&self, _blueprint: &Blueprint, _column: &ColumnDefinition) -> Option<String> {
        None
    }

    fn modify_increment(&self, _blueprint: &Blueprint, _column: &ColumnDefinition) -> Option<String> {
        None
    }

    // ==================== Commands ====================

    /// Compile one command.
    fn compile(&self, blueprint: &Blueprint, command: &Command) -> Vec<String> {
        match command {
            Command::Create => self.compile_create(blueprint),
            Command::Add => self.compile_add(blueprint),
            Command::Drop => self.compile_drop(blueprint),
            Command::DropIfExists => self.compile_drop_if_exists(blueprint),
            Command::DropColumn { columns } => self.compile_drop_column(blueprint, columns),
            Command::RenameColumn { from, to } => self.compile_rename_column(blueprint, from, to),
            Command::Rename { to } => self.compile_rename(blueprint, to),
            Command::Primary(index) => self.compile_primary(blueprint, index),
            Command::Unique(index) => self.compile_unique(blueprint, index),
            Command::Index(index) => self.compile_index(blueprint, index),
            Command::Foreign(key) => self.compile_foreign(blueprint, key),
            Command::DropPrimary { index } => self.compile_drop_primary(blueprint, index),
            Command::DropUnique { index } => self.compile_drop_unique(blueprint, index),
            Command::DropIndex { index } => self.compile_drop_index(blueprint, index),
            Command::DropForeign { index } => self.compile_drop_foreign(blueprint, index),
        }
    }

    fn compile_create(&self, blueprint: &Blueprint) -> Vec<String>;
    fn compile_add(&self, blueprint: &Blueprint) -> Vec<String>;
    fn compile_primary(&self, blueprint: &Blueprint, index: &IndexCommand) -> Vec<String>;
    fn compile_unique(&self, blueprint: &Blueprint, index: &IndexCommand) -> Vec<String>;
    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Vec<String>;
    fn compile_foreign(&self, blueprint: &Blueprint, key: &ForeignKey) -> Vec<String>;
    fn compile_drop_primary(&self, blueprint: &Blueprint, index: &str) -> Vec<String>;
    fn compile_drop_unique(&self, blueprint: &Blueprint, index: &str) -> Vec<String>;
    fn compile_drop_index(&self, blueprint: &Blueprint, index: &str) -> Vec<String>;
    fn compile_drop_foreign(&self, blueprint: &Blueprint, index: &str) -> Vec<String>;

    fn compile_drop(&self, blueprint: &Blueprint) -> Vec<String> {
        vec![format!("drop table {}", self.wrap_table(blueprint))]
    }

    fn compile_drop_if_exists(&self, blueprint: &Blueprint) -> Vec<String> {
        vec![format!("drop table if exists {}", self.wrap_table(blueprint))]
    }

    /// One `alter table ... drop column` per column.
    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Vec<String> {
        let table = self.wrap_table(blueprint);
        columns
            .iter()
            .map(|column| format!("alter table {table} drop column {}", self.wrap(column)))
            .collect()
    }

    fn compile_rename_column(&self, blueprint: &Blueprint, from: &str, to: &str) -> Vec<String> {
        vec![format!(
            "alter table {} rename column {} to {}",
            self.wrap_table(blueprint),
            self.wrap(from),
            self.wrap(to)
        )]
    }

    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> Vec<String> {
        vec![format!(
            "alter table {} rename to {}",
            self.wrap_table(blueprint),
            self.wrap_table_name(to)
        )]
    }

    // ==================== Introspection ====================

    /// Query with one `?` for the table name.
    fn compile_table_exists(&self) -> String;

    fn compile_column_listing(&self, table: &str) -> String;

    fn compile_enable_foreign_key_constraints(&self) -> String;

    fn compile_disable_foreign_key_constraints(&self) -> String;
}
