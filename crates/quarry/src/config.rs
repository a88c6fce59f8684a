//! Builder configuration loaded from TOML.
//!
//! ```toml
//! dialect = "sqlite"
//! table_prefix = "app_"
//! ```

use crate::error::{QueryError, QueryResult};
use crate::grammar::{GenericGrammar, Grammar, MySqlGrammar, PostgresGrammar, SqliteGrammar};
use crate::qb::Builder;
use crate::schema::{SchemaGrammar, SqliteSchemaGrammar};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    #[default]
    Generic,
    Mysql,
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub table_prefix: String,
}

impl QueryConfig {
    pub fn from_toml_str(raw: &str) -> QueryResult<Self> {
        toml::from_str(raw).map_err(|e| QueryError::Config(format!("failed to parse config: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            QueryError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|e| {
            QueryError::Config(format!("failed to parse config file {}: {e}", path.display()))
        })
    }

    /// The query grammar for the configured dialect.
    pub fn query_grammar(&self) -> Arc<dyn Grammar> {
        let prefix = self.table_prefix.clone();
        match self.dialect {
            Dialect::Generic => Arc::new(GenericGrammar::with_table_prefix(prefix)),
            Dialect::Mysql => Arc::new(MySqlGrammar::with_table_prefix(prefix)),
            Dialect::Postgres => Arc::new(PostgresGrammar::with_table_prefix(prefix)),
            Dialect::Sqlite => Arc::new(SqliteGrammar::with_table_prefix(prefix)),
        }
    }

    /// The schema grammar for the configured dialect, if there is one.
    pub fn schema_grammar(&self) -> Option<Arc<dyn SchemaGrammar>> {
        match self.dialect {
            Dialect::Sqlite => Some(Arc::new(SqliteSchemaGrammar::with_table_prefix(
                self.table_prefix.clone(),
            ))),
            _ => None,
        }
    }

    /// A connection-less builder compiling with this configuration.
    pub fn builder(&self) -> Builder {
        Builder::with_grammar(self.query_grammar())
    }
}
