//! Historizer storage backend
//!
//! Connection pool, bookkeeping schema and the per-node record tables. One
//! append-only table per historized node, its value column typed by the
//! node's declared kind; a single bookkeeping table maps node ids to their
//! kind and last-updated marker.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use rusqlite::types::{Value, ValueRef};
use tracing::info;

use crate::space::NodeIdentifier;
use crate::variant::{DataKind, DataVariant};
use crate::{Error, Result};

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled database connection
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Open a file-backed history store
///
/// # Errors
///
/// Returns an error if the database cannot be opened or initialized
pub fn init<P: AsRef<Path>>(path: P) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path);
    build_pool(manager, 4)
}

/// Open an in-memory history store (single shared connection)
///
/// # Errors
///
/// Returns an error if the database cannot be initialized
pub fn init_memory() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();
    build_pool(manager, 1)
}

fn build_pool(manager: SqliteConnectionManager, size: u32) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(size)
        .build(manager)
        .map_err(|e| Error::Database(e.to_string()))?;

    let conn = pool.get().map_err(|e| Error::Database(e.to_string()))?;
    init_schema(&conn)?;
    info!("history store initialized");
    Ok(pool)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- Bookkeeping: one row per historized node
        CREATE TABLE IF NOT EXISTS historized_nodes (
            node_id TEXT PRIMARY KEY NOT NULL,
            value_kind TEXT NOT NULL,
            last_updated TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// Quoted record-table name for a node
///
/// Derived from the canonical identifier rendering with everything outside
/// `[A-Za-z0-9_]` folded to `_`, so the identifier can never escape the
/// quoting.
#[must_use]
pub(crate) fn record_table(id: &NodeIdentifier) -> String {
    let sanitized: String = id
        .to_string()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("\"hist_{sanitized}\"")
}

/// SQLite column type for a value kind
///
/// UInteger is stored as decimal text: values above `i64::MAX` would lose
/// precision under INTEGER affinity.
#[must_use]
pub(crate) const fn column_type(kind: DataKind) -> &'static str {
    match kind {
        DataKind::Boolean | DataKind::Integer => "INTEGER",
        DataKind::Double => "REAL",
        DataKind::UInteger | DataKind::Text | DataKind::Timestamp => "TEXT",
        DataKind::Bytes => "BLOB",
    }
}

/// Fixed-width RFC 3339 UTC rendering; lexicographic order equals time order
#[must_use]
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("malformed stored timestamp {text:?}: {e}")))
}

/// Encode a variant into its value-column representation
pub(crate) fn encode_value(value: &DataVariant) -> Value {
    match value {
        DataVariant::Boolean(v) => Value::Integer(i64::from(*v)),
        DataVariant::UInteger(v) => Value::Text(v.to_string()),
        DataVariant::Integer(v) => Value::Integer(*v),
        DataVariant::Double(v) => Value::Real(*v),
        DataVariant::Text(v) => Value::Text(v.clone()),
        DataVariant::Bytes(v) => Value::Blob(v.clone()),
        DataVariant::Timestamp(v) => Value::Text(format_ts(*v)),
    }
}

/// Decode a value-column cell back into a variant of the declared kind
pub(crate) fn decode_value(kind: DataKind, cell: ValueRef<'_>) -> Result<DataVariant> {
    let unexpected = || Error::Internal(format!("stored value does not decode as {kind}"));
    match kind {
        DataKind::Boolean => match cell {
            ValueRef::Integer(v) => Ok(DataVariant::Boolean(v != 0)),
            _ => Err(unexpected()),
        },
        DataKind::UInteger => match cell {
            ValueRef::Text(v) => std::str::from_utf8(v)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(DataVariant::UInteger)
                .ok_or_else(unexpected),
            _ => Err(unexpected()),
        },
        DataKind::Integer => match cell {
            ValueRef::Integer(v) => Ok(DataVariant::Integer(v)),
            _ => Err(unexpected()),
        },
        DataKind::Double => match cell {
            ValueRef::Real(v) => Ok(DataVariant::Double(v)),
            ValueRef::Integer(v) => Ok(DataVariant::Double(v as f64)),
            _ => Err(unexpected()),
        },
        DataKind::Text => match cell {
            ValueRef::Text(v) => std::str::from_utf8(v)
                .map(|s| DataVariant::Text(s.to_owned()))
                .map_err(|_| unexpected()),
            _ => Err(unexpected()),
        },
        DataKind::Bytes => match cell {
            ValueRef::Blob(v) => Ok(DataVariant::Bytes(v.to_vec())),
            _ => Err(unexpected()),
        },
        DataKind::Timestamp => match cell {
            ValueRef::Text(v) => std::str::from_utf8(v)
                .map_err(|_| unexpected())
                .and_then(parse_ts)
                .map(DataVariant::Timestamp),
            _ => Err(unexpected()),
        },
    }
}
