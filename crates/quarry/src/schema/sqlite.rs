use super::blueprint::{Blueprint, ColumnDefinition, ColumnType, ForeignKey, IndexCommand};
use super::grammar::SchemaGrammar;

/// SQLite DDL.
///
/// Foreign keys and the primary key are written inline by `compile_create`;
/// SQLite cannot add them to an existing table. Other indexes are separate
/// `create index` statements.
#[derive(Debug, Clone, Default)]
pub struct SqliteSchemaGrammar {
    table_prefix: String,
}

impl SqliteSchemaGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: prefix.into(),
        }
    }

    fn add_foreign_keys(&self, blueprint: &Blueprint) -> String {
        blueprint
            .foreign_keys()
            .map(|key| self.get_foreign_key(key))
            .collect()
    }

    fn get_foreign_key(&self, key: &ForeignKey) -> String {
        let mut sql = format!(
            ", foreign key({}) references {}({})",
            self.columnize(&key.columns),
            self.wrap_table_name(&key.on),
            self.columnize(&key.references)
        );
        if let Some(action) = &key.on_delete {
            sql.push_str(&format!(" on delete {action}"));
        }
        if let Some(action) = &key.on_update {
            sql.push_str(&format!(" on update {action}"));
        }
        sql
    }

    fn add_primary_keys(&self, blueprint: &Blueprint) -> String {
        match blueprint.primary_key() {
            Some(primary) => format!(", primary key ({})", self.columnize(&primary.columns)),
            None => String::new(),
        }
    }

    fn quote_strings(values: &[String]) -> String {
        values
            .iter()
            .map(|value| format!("'{}'", value.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn type_char(&self, _column: &ColumnDefinition) -> String {
        "varchar".to_string()
    }

    fn type_string(&self, _column: &ColumnDefinition) -> String {
        "varchar".to_string()
    }

    fn type_text(&self, _column: &ColumnDefinition) -> String {
        "text".to_string()
    }

    fn type_medium_text(&self, _column: &ColumnDefinition) -> String {
        "text".to_string()
    }

    fn type_long_text(&self, _column: &ColumnDefinition) -> String {
        "text".to_string()
    }

    fn type_integer(&self, _column: &ColumnDefinition) -> String {
        "integer".to_string()
    }

    fn type_big_integer(&self, _column: &ColumnDefinition) -> String {
        "integer".to_string()
    }

    fn type_medium_integer(&self, _column: &ColumnDefinition) -> String {
        "integer".to_string()
    }

    fn type_tiny_integer(&self, _column: &ColumnDefinition) -> String {
        "integer".to_string()
    }

    fn type_small_integer(&self, _column: &ColumnDefinition) -> String {
        "integer".to_string()
    }

    fn type_float(&self, _column: &ColumnDefinition) -> String {
        "float".to_string()
    }

    fn type_double(&self, _column: &ColumnDefinition) -> String {
        "float".to_string()
    }

    fn type_decimal(&self, _column: &ColumnDefinition) -> String {
        "numeric".to_string()
    }

    fn type_boolean(&self, _column: &ColumnDefinition) -> String {
        "tinyint(1)".to_string()
    }

    fn type_enum(&self, column: &ColumnDefinition) -> String {
        format!(
            "varchar check ({} in ({}))",
            self.wrap(&column.name),
            Self::quote_strings(&column.allowed)
        )
    }

    fn type_json(&self, _column: &ColumnDefinition) -> String {
        "text".to_string()
    }

    fn type_jsonb(&self, _column: &ColumnDefinition) -> String {
        "text".to_string()
    }

    fn type_date(&self, _column: &ColumnDefinition) -> String {
        "date".to_string()
    }

    fn type_date_time(&self, _column: &ColumnDefinition) -> String {
        "datetime".to_string()
    }

    fn type_date_time_tz(&self, _column: &ColumnDefinition) -> String {
        "datetime".to_string()
    }

    fn type_time(&self, _column: &ColumnDefinition) -> String {
        "time".to_string()
    }

    fn type_time_tz(&self, _column: &ColumnDefinition) -> String {
        "time".to_string()
    }

    fn type_timestamp(&self, column: &ColumnDefinition) -> String {
        if column.use_current {
            "datetime default CURRENT_TIMESTAMP".to_string()
        } else {
            "datetime".to_string()
        }
    }

    fn type_timestamp_tz(&self, column: &ColumnDefinition) -> String {
        self.type_timestamp(column)
    }

    fn type_binary(&self, _column: &ColumnDefinition) -> String {
        "blob".to_string()
    }

    fn type_uuid(&self, _column: &ColumnDefinition) -> String {
        "varchar".to_string()
    }

    fn type_ip_address(&self, _column: &ColumnDefinition) -> String {
        "varchar".to_string()
    }

    fn type_mac_address(&self, _column: &ColumnDefinition) -> String {
        "varchar".to_string()
    }
}

impl SchemaGrammar for SqliteSchemaGrammar {
    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn column_type(&self, column: &ColumnDefinition) -> String {
        match column.kind {
            ColumnType::Char => self.type_char(column),
            ColumnType::String => self.type_string(column),
            ColumnType::Text => self.type_text(column),
            ColumnType::MediumText => self.type_medium_text(column),
            ColumnType::LongText => self.type_long_text(column),
            ColumnType::BigInteger => self.type_big_integer(column),
            ColumnType::Integer => self.type_integer(column),
            ColumnType::MediumInteger => self.type_medium_integer(column),
            ColumnType::TinyInteger => self.type_tiny_integer(column),
            ColumnType::SmallInteger => self.type_small_integer(column),
            ColumnType::Float => self.type_float(column),
            ColumnType::Double => self.type_double(column),
            ColumnType::Decimal => self.type_decimal(column),
            ColumnType::Boolean => self.type_boolean(column),
            ColumnType::Enum => self.type_enum(column),
            ColumnType::Json => self.type_json(column),
            ColumnType::Jsonb => self.type_jsonb(column),
            ColumnType::Date => self.type_date(column),
            ColumnType::DateTime => self.type_date_time(column),
            ColumnType::DateTimeTz => self.type_date_time_tz(column),
            ColumnType::Time => self.type_time(column),
            ColumnType::TimeTz => self.type_time_tz(column),
            ColumnType::Timestamp => self.type_timestamp(column),
            ColumnType::TimestampTz => self.type_timestamp_tz(column),
            ColumnType::Binary => self.type_binary(column),
            ColumnType::Uuid => self.type_uuid(column),
            ColumnType::IpAddress => self.type_ip_address(column),
            ColumnType::MacAddress => self.type_mac_address(column),
        }
    }

    fn modify_virtual_as(&self, _blueprint: &Blueprint, column: &ColumnDefinition) -> Option<String> {
        column.virtual_as.as_ref().map(|expr| format!(" as ({expr})"))
    }

    fn modify_stored_as(&self, _blueprint: &Blueprint, column: &ColumnDefinition) -> Option<String> {
        column.stored_as.as_ref().map(|expr| format!(" as ({expr}) stored"))
    }

    fn modify_collate(&self, _blueprint: &Blueprint, column: &ColumnDefinition) -> Option<String> {
        column.collation.as_ref().map(|name| format!(" collate {name}"))
    }

    fn modify_nullable(&self, _blueprint: &Blueprint, column: &ColumnDefinition) -> Option<String> {
        Some(if column.nullable { " null" } else { " not null" }.to_string())
    }

    fn modify_default(&self, _blueprint: &Blueprint, column: &ColumnDefinition) -> Option<String> {
        column
            .default
            .as_ref()
            .map(|value| format!(" default {}", self.default_value(value)))
    }

    fn modify_increment(&self, _blueprint: &Blueprint, column: &ColumnDefinition) -> Option<String> {
        (column.kind.is_serial() && column.auto_increment).then(|| " primary key autoincrement".to_string())
    }

    fn compile_create(&self, blueprint: &Blueprint) -> Vec<String> {
        let create = if blueprint.is_temporary() {
            "create temporary"
        } else {
            "create"
        };
        vec![format!(
            "{create} table {} ({}{}{})",
            self.wrap_table(blueprint),
            self.get_columns(blueprint).join(", "),
            self.add_foreign_keys(blueprint),
            self.add_primary_keys(blueprint)
        )]
    }

    fn compile_add(&self, blueprint: &Blueprint) -> Vec<String> {
        let table = self.wrap_table(blueprint);
        self.get_columns(blueprint)
            .into_iter()
            .map(|column| format!("alter table {table} add column {column}"))
            .collect()
    }

    /// Inline on create; on an existing table the closest SQLite has is a
    /// unique index.
    fn compile_primary(&self, blueprint: &Blueprint, index: &IndexCommand) -> Vec<String> {
        if blueprint.is_creating() {
            return Vec::new();
        }
        self.compile_unique(blueprint, index)
    }

    fn compile_unique(&self, blueprint: &Blueprint, index: &IndexCommand) -> Vec<String> {
        vec![format!(
            "create unique index {} on {} ({})",
            self.wrap(&index.index),
            self.wrap_table(blueprint),
            self.columnize(&index.columns)
        )]
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Vec<String> {
        vec![format!(
            "create index {} on {} ({})",
            self.wrap(&index.index),
            self.wrap_table(blueprint),
            self.columnize(&index.columns)
        )]
    }

    /// Written inline by `compile_create`.
    fn compile_foreign(&self, _blueprint: &Blueprint, _key: &ForeignKey) -> Vec<String> {
        Vec::new()
    }

    fn compile_drop_primary(&self, _blueprint: &Blueprint, _index: &str) -> Vec<String> {
        Vec::new()
    }

    fn compile_drop_unique(&self, _blueprint: &Blueprint, index: &str) -> Vec<String> {
        vec![format!("drop index {}", self.wrap(index))]
    }

    fn compile_drop_index(&self, _blueprint: &Blueprint, index: &str) -> Vec<String> {
        vec![format!("drop index {}", self.wrap(index))]
    }

    fn compile_drop_foreign(&self, _blueprint: &Blueprint, _index: &str) -> Vec<String> {
        Vec::new()
    }

    fn compile_table_exists(&self) -> String {
        "select * from sqlite_master where type = 'table' and name = ?".to_string()
    }

    fn compile_column_listing(&self, table: &str) -> String {
        let table = format!("{}{}", self.table_prefix, table).replace('.', "__");
        format!("pragma table_info({})", self.wrap(&table))
    }

    fn compile_enable_foreign_key_constraints(&self) -> String {
        "PRAGMA foreign_keys = ON;".to_string()
    }

    fn compile_disable_foreign_key_constraints(&self) -> String {
        "PRAGMA foreign_keys = OFF;".to_string()
    }
}
