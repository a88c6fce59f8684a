//! Blocking PostgreSQL connection over `tokio-postgres`.
//!
//! ```ignore
//! use quarry::{Builder, PgConnection};
//! use std::sync::Arc;
//!
//! let conn = Arc::new(PgConnection::connect("postgres://localhost/app")?);
//! let mut q = Builder::with_connection(conn);
//! q.from("users").where_eq("active", true);
//! let rows = q.get()?;
//! ```

use crate::client::Connection;
use crate::error::{QueryError, QueryResult};
use crate::grammar::{Grammar, PostgresGrammar};
use crate::row::Row;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{Client, NoTls};

/// A [`Connection`] backed by one `tokio-postgres` client.
///
/// Calls block on a private current-thread runtime, which also drives the
/// connection task between calls.
///
/// # Panics
///
/// Every method panics when called from inside a tokio runtime, since the
/// runtime cannot block within another one. Use it from plain threads, or
/// move calls onto `tokio::task::spawn_blocking`.
pub struct PgConnection {
    client: Client,
    runtime: Runtime,
    table_prefix: String,
}

impl std::fmt::Debug for PgConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgConnection")
            .field("table_prefix", &self.table_prefix)
            .finish_non_exhaustive()
    }
}

impl PgConnection {
    /// Connect without TLS.
    pub fn connect(url: &str) -> QueryResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| QueryError::connection(format!("failed to start runtime: {e}")))?;
        let (client, connection) = runtime.block_on(tokio_postgres::connect(url, NoTls))?;
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "quarry.sql", error = %e, "postgres connection closed");
            }
        });
        Ok(Self {
            client,
            runtime,
            table_prefix: String::new(),
        })
    }

    /// Prefix every table name compiled for this connection.
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn execute(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64> {
        let sql = renumber_placeholders(sql);
        let params = params(bindings);
        Ok(self.runtime.block_on(self.client.execute(sql.as_str(), &params))?)
    }
}

impl Connection for PgConnection {
    fn select(&self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>> {
        let sql = renumber_placeholders(sql);
        let params = params(bindings);
        let rows = self.runtime.block_on(self.client.query(sql.as_str(), &params))?;
        rows.iter().map(decode_row).collect()
    }

    fn insert(&self, sql: &str, bindings: &[Value]) -> QueryResult<bool> {
        self.execute(sql, bindings)?;
        Ok(true)
    }

    fn update(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64> {
        self.execute(sql, bindings)
    }

    fn delete(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64> {
        self.execute(sql, bindings)
    }

    fn statement(&self, sql: &str, bindings: &[Value]) -> QueryResult<bool> {
        self.execute(sql, bindings)?;
        Ok(true)
    }

    fn query_grammar(&self) -> Arc<dyn Grammar> {
        Arc::new(PostgresGrammar::with_table_prefix(self.table_prefix.clone()))
    }
}

fn params(bindings: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    bindings.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// Rewrite `?` placeholders to `$1, $2, ...`, leaving quoted text alone.
pub fn renumber_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
                out.push(ch);
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '?' => {
                    n += 1;
                    out.push('$');
                    out.push_str(&n.to_string());
                }
                _ => out.push(ch),
            },
        }
    }
    out
}

fn decode_row(row: &tokio_postgres::Row) -> QueryResult<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let value = decode_value(row, idx, column.type_())
            .map_err(|e| QueryError::decode(name, e.to_string()))?;
        out.set(name, value);
    }
    Ok(out)
}

fn decode_value(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> Result<Value, tokio_postgres::Error> {
    let value: Value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.into(),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.into(),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.into(),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.into(),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.into(),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.into(),
        Type::JSON | Type::JSONB => row.try_get::<_, Option<serde_json::Value>>(idx)?.into(),
        Type::DATE => row.try_get::<_, Option<NaiveDate>>(idx)?.into(),
        Type::TIMESTAMP => row.try_get::<_, Option<NaiveDateTime>>(idx)?.into(),
        Type::TIMESTAMPTZ => row.try_get::<_, Option<DateTime<Utc>>>(idx)?.into(),
        Type::UUID => row.try_get::<_, Option<uuid::Uuid>>(idx)?.into(),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.into(),
        _ => row.try_get::<_, Option<String>>(idx)?.into(),
    };
    Ok(value)
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                _ => i.to_sql(ty, out),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            Value::Text(s) => s.as_str().to_sql(ty, out),
            Value::Json(j) => j.to_sql(ty, out),
            Value::Date(d) => d.to_sql(ty, out),
            Value::Timestamp(ts) => match *ty {
                Type::TIMESTAMPTZ => DateTime::<Utc>::from_naive_utc_and_offset(*ts, Utc).to_sql(ty, out),
                _ => ts.to_sql(ty, out),
            },
            Value::Uuid(u) => u.to_sql(ty, out),
            Value::Bytes(b) => b.as_slice().to_sql(ty, out),
            Value::Expression(e) => Err(format!("raw expression '{e}' cannot be bound").into()),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}
