//! # quarry
//!
//! A fluent SQL query and schema builder.
//!
//! ## Features
//!
//! - **Fluent builder**: chain `where_`, `join`, `order_by`, `union`, ... on a [`Builder`]
//! - **Positional bindings**: `to_sql()` emits `?` placeholders, `get_bindings()` the values in
//!   the same order
//! - **Dialects**: generic, MySQL, PostgreSQL and SQLite [`Grammar`]s
//! - **Schema**: table [`Blueprint`](schema::Blueprint)s compiled to DDL by a
//!   [`SchemaGrammar`](schema::SchemaGrammar)
//! - **Pluggable execution**: anything implementing [`Connection`]; enable the `postgres`
//!   feature for a ready-made `tokio-postgres` one
//!
//! ## Example
//!
//! ```ignore
//! use quarry::Builder;
//!
//! let mut q = Builder::new();
//! q.select(["id"]).where_in("id", [3]).where_eq("name", "x");
//!
//! assert_eq!(q.to_sql(), "select id where id in (?) and name = ?");
//! assert_eq!(q.get_bindings(), vec![3.into(), "x".into()]);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod grammar;
pub mod qb;
pub mod row;
pub mod schema;
pub mod value;

#[cfg(feature = "postgres")]
pub mod pg_client;

pub use client::Connection;
pub use config::{Dialect, QueryConfig};
pub use error::{BuildError, QueryError, QueryResult};
pub use grammar::{GenericGrammar, Grammar, MySqlGrammar, PostgresGrammar, SqliteGrammar};
pub use qb::{BindingKind, Bindings, Boolean, Builder, Direction, JoinClause, JoinType, Lock};
pub use row::Row;
pub use value::{Expression, Value, raw};

#[cfg(feature = "postgres")]
pub use pg_client::PgConnection;
