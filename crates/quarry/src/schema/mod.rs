//! Schema building: table blueprints and the DDL grammars that compile them.
//!
//! ```ignore
//! use quarry::schema::{Blueprint, SqliteSchemaGrammar};
//!
//! let mut table = Blueprint::new("users");
//! table.create();
//! table.increments("id");
//! table.string("email", 255).unique();
//! table.timestamps();
//!
//! for statement in table.to_sql(&SqliteSchemaGrammar::new()) {
//!     connection.statement(&statement, &[])?;
//! }
//! ```

mod blueprint;
mod grammar;
mod sqlite;

pub use blueprint::{Blueprint, ColumnDefinition, ColumnType, Command, ForeignKey, IndexCommand};
pub use grammar::SchemaGrammar;
pub use sqlite::SqliteSchemaGrammar;
