//! Table blueprints: the columns and commands a schema change is made of.

use super::grammar::SchemaGrammar;
use crate::value::Value;

/// Logical column type, mapped to SQL by each schema grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Char,
    String,
    Text,
    MediumText,
    LongText,
    BigInteger,
    Integer,
    MediumInteger,
    TinyInteger,
    SmallInteger,
    Float,
    Double,
    Decimal,
    Boolean,
    Enum,
    Json,
    Jsonb,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Binary,
    Uuid,
    IpAddress,
    MacAddress,
}

impl ColumnType {
    /// Integer types that can carry an auto-increment key.
    pub fn is_serial(self) -> bool {
        matches!(
            self,
            ColumnType::BigInteger
                | ColumnType::Integer
                | ColumnType::MediumInteger
                | ColumnType::SmallInteger
                | ColumnType::TinyInteger
        )
    }
}

/// One column and its modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub kind: ColumnType,
    pub length: Option<u32>,
    pub total: Option<u32>,
    pub places: Option<u32>,
    pub allowed: Vec<String>,
    pub nullable: bool,
    pub default: Option<Value>,
    pub auto_increment: bool,
    pub unsigned: bool,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub virtual_as: Option<String>,
    pub stored_as: Option<String>,
    pub use_current: bool,
    pub primary: bool,
    pub unique: bool,
    pub index: bool,
}

impl ColumnDefinition {
    pub fn new(kind: ColumnType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            length: None,
            total: None,
            places: None,
            allowed: Vec::new(),
            nullable: false,
            default: None,
            auto_increment: false,
            unsigned: false,
            charset: None,
            collation: None,
            virtual_as: None,
            stored_as: None,
            use_current: false,
            primary: false,
            unique: false,
            index: false,
        }
    }

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    pub fn charset(&mut self, charset: &str) -> &mut Self {
        self.charset = Some(charset.to_string());
        self
    }

    pub fn collation(&mut self, collation: &str) -> &mut Self {
        self.collation = Some(collation.to_string());
        self
    }

    /// Generated column computed on read.
    pub fn virtual_as(&mut self, expression: &str) -> &mut Self {
        self.virtual_as = Some(expression.to_string());
        self
    }

    /// Generated column stored on write.
    pub fn stored_as(&mut self, expression: &str) -> &mut Self {
        self.stored_as = Some(expression.to_string());
        self
    }

    /// Timestamps default to the current time.
    pub fn use_current(&mut self) -> &mut Self {
        self.use_current = true;
        self
    }

    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    pub fn index(&mut self) -> &mut Self {
        self.index = true;
        self
    }
}

/// An index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCommand {
    pub index: String,
    pub columns: Vec<String>,
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub index: String,
    pub columns: Vec<String>,
    pub on: String,
    pub references: Vec<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

impl ForeignKey {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index: String::new(),
            columns: columns.into_iter().map(Into::into).collect(),
            on: String::new(),
            references: Vec::new(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn references<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn on(mut self, table: &str) -> Self {
        self.on = table.to_string();
        self
    }

    pub fn on_delete(mut self, action: &str) -> Self {
        self.on_delete = Some(action.to_string());
        self
    }

    pub fn on_update(mut self, action: &str) -> Self {
        self.on_update = Some(action.to_string());
        self
    }

    pub fn named(mut self, index: &str) -> Self {
        self.index = index.to_string();
        self
    }
}

/// A schema change applied to the blueprint's table.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create,
    Add,
    Drop,
    DropIfExists,
    DropColumn { columns: Vec<String> },
    RenameColumn { from: String, to: String },
    Rename { to: String },
    Primary(IndexCommand),
    Unique(IndexCommand),
    Index(IndexCommand),
    Foreign(ForeignKey),
    DropPrimary { index: String },
    DropUnique { index: String },
    DropIndex { index: String },
    DropForeign { index: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create => "create",
            Command::Add => "add",
            Command::Drop => "drop",
            Command::DropIfExists => "drop_if_exists",
            Command::DropColumn { .. } => "drop_column",
            Command::RenameColumn { .. } => "rename_column",
            Command::Rename { .. } => "rename",
            Command::Primary(_) => "primary",
            Command::Unique(_) => "unique",
            Command::Index(_) => "index",
            Command::Foreign(_) => "foreign",
            Command::DropPrimary { .. } => "drop_primary",
            Command::DropUnique { .. } => "drop_unique",
            Command::DropIndex { .. } => "drop_index",
            Command::DropForeign { .. } => "drop_foreign",
        }
    }
}

/// Columns and commands for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blueprint {
    table: String,
    prefix: String,
    temporary: bool,
    columns: Vec<ColumnDefinition>,
    commands: Vec<Command>,
}

impl Blueprint {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Blueprint whose generated index names carry `prefix`.
    pub fn with_prefix(table: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_creating(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::Create))
    }

    /// Every `Foreign` command, in declaration order.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.commands.iter().filter_map(|c| match c {
            Command::Foreign(fk) => Some(fk),
            _ => None,
        })
    }

    /// The first `Primary` command.
    pub fn primary_key(&self) -> Option<&IndexCommand> {
        self.commands.iter().find_map(|c| match c {
            Command::Primary(index) => Some(index),
            _ => None,
        })
    }

    // ==================== Commands ====================

    pub fn create(&mut self) -> &mut Self {
        self.commands.push(Command::Create);
        self
    }

    pub fn temporary(&mut self) -> &mut Self {
        self.temporary = true;
        self
    }

    pub fn drop(&mut self) -> &mut Self {
        self.commands.push(Command::Drop);
        self
    }

    pub fn drop_if_exists(&mut self) -> &mut Self {
        self.commands.push(Command::DropIfExists);
        self
    }

    pub fn drop_column<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.commands.push(Command::DropColumn { columns });
        self
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> &mut Self {
        self.commands.push(Command::RenameColumn {
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }

    pub fn rename(&mut self, to: &str) -> &mut Self {
        self.commands.push(Command::Rename { to: to.to_string() });
        self
    }

    pub fn primary<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self.index_command("primary", columns);
        self.commands.push(Command::Primary(index));
        self
    }

    pub fn unique<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self.index_command("unique", columns);
        self.commands.push(Command::Unique(index));
        self
    }

    pub fn index<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self.index_command("index", columns);
        self.commands.push(Command::Index(index));
        self
    }

    /// Add a foreign key; an unnamed key gets a generated index name.
    pub fn foreign(&mut self, mut key: ForeignKey) -> &mut Self {
        if key.index.is_empty() {
            key.index = self.create_index_name("foreign", &key.columns);
        }
        self.commands.push(Command::Foreign(key));
        self
    }

    pub fn drop_primary(&mut self, index: &str) -> &mut Self {
        self.commands.push(Command::DropPrimary {
            index: index.to_string(),
        });
        self
    }

    pub fn drop_unique(&mut self, index: &str) -> &mut Self {
        self.commands.push(Command::DropUnique {
            index: index.to_string(),
        });
        self
    }

    pub fn drop_index(&mut self, index: &str) -> &mut Self {
        self.commands.push(Command::DropIndex {
            index: index.to_string(),
        });
        self
    }

    pub fn drop_foreign(&mut self, index: &str) -> &mut Self {
        self.commands.push(Command::DropForeign {
            index: index.to_string(),
        });
        self
    }

    fn index_command<I, S>(&self, kind: &str, columns: I) -> IndexCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        IndexCommand {
            index: self.create_index_name(kind, &columns),
            columns,
        }
    }

    /// `<prefix><table>_<columns>_<kind>`, lowercased, with `-` and `.`
    /// turned into `_`.
    pub fn create_index_name(&self, kind: &str, columns: &[String]) -> String {
        let name = format!("{}{}_{}_{}", self.prefix, self.table, columns.join("_"), kind);
        name.to_lowercase().replace(['-', '.'], "_")
    }

    // ==================== Columns ====================

    pub fn add_column(&mut self, kind: ColumnType, name: &str) -> &mut ColumnDefinition {
        let last = self.columns.len();
        self.columns.push(ColumnDefinition::new(kind, name));
        &mut self.columns[last]
    }

    /// Auto-incrementing unsigned integer primary key.
    pub fn increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Integer, name).unsigned().auto_increment()
    }

    pub fn big_increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::BigInteger, name).unsigned().auto_increment()
    }

    pub fn char(&mut self, name: &str, length: u32) -> &mut ColumnDefinition {
        let column = self.add_column(ColumnType::Char, name);
        column.length = Some(length);
        column
    }

    pub fn string(&mut self, name: &str, length: u32) -> &mut ColumnDefinition {
        let column = self.add_column(ColumnType::String, name);
        column.length = Some(length);
        column
    }

    pub fn text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Text, name)
    }

    pub fn medium_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::MediumText, name)
    }

    pub fn long_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::LongText, name)
    }

    pub fn integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Integer, name)
    }

    pub fn big_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::BigInteger, name)
    }

    pub fn medium_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::MediumInteger, name)
    }

    pub fn tiny_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::TinyInteger, name)
    }

    pub fn small_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::SmallInteger, name)
    }

    pub fn float(&mut self, name: &str, total: u32, places: u32) -> &mut ColumnDefinition {
        let column = self.add_column(ColumnType::Float, name);
        column.total = Some(total);
        column.places = Some(places);
        column
    }

    pub fn double(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Double, name)
    }

    pub fn decimal(&mut self, name: &str, total: u32, places: u32) -> &mut ColumnDefinition {
        let column = self.add_column(ColumnType::Decimal, name);
        column.total = Some(total);
        column.places = Some(places);
        column
    }

    pub fn boolean(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Boolean, name)
    }

    pub fn enumeration<I, S>(&mut self, name: &str, allowed: I) -> &mut ColumnDefinition
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column = self.add_column(ColumnType::Enum, name);
        column.allowed = allowed.into_iter().map(Into::into).collect();
        column
    }

    pub fn json(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Json, name)
    }

    pub fn jsonb(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Jsonb, name)
    }

    pub fn date(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Date, name)
    }

    pub fn date_time(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::DateTime, name)
    }

    pub fn date_time_tz(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::DateTimeTz, name)
    }

    pub fn time(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Time, name)
    }

    pub fn time_tz(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::TimeTz, name)
    }

    pub fn timestamp(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Timestamp, name)
    }

    pub fn timestamp_tz(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::TimestampTz, name)
    }

    /// Nullable `created_at` and `updated_at`.
    pub fn timestamps(&mut self) -> &mut Self {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
        self
    }

    pub fn binary(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Binary, name)
    }

    pub fn uuid(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Uuid, name)
    }

    pub fn ip_address(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::IpAddress, name)
    }

    pub fn mac_address(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::MacAddress, name)
    }

    // ==================== Compilation ====================

    /// Commands to compile, with the implied ones filled in.
    ///
    /// Column-level `primary`/`unique`/`index` flags become index commands,
    /// and a blueprint that adds columns without creating the table gets a
    /// leading `add` command.
    pub fn commands_to_compile(&self) -> Vec<Command> {
        let mut commands = self.commands.clone();
        for column in &self.columns {
            let name = [column.name.clone()];
            if column.primary {
                commands.push(Command::Primary(self.index_command("primary", name.clone())));
            }
            if column.unique {
                commands.push(Command::Unique(self.index_command("unique", name.clone())));
            }
            if column.index {
                commands.push(Command::Index(self.index_command("index", name)));
            }
        }
        if !self.columns.is_empty() && !self.is_creating() {
            commands.insert(0, Command::Add);
        }
        commands
    }

    /// Compile every command in declaration order.
    pub fn to_sql(&self, grammar: &dyn SchemaGrammar) -> Vec<String> {
        let mut compiled = self.clone();
        compiled.commands = self.commands_to_compile();
        compiled
            .commands
            .iter()
            .flat_map(|command| grammar.compile(&compiled, command))
            .collect()
    }
}
