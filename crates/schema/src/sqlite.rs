//! `SQLite` implementation of [`Connection`].
//!
//! This is a lightweight implementation for development use only.

#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::cast_possible_wrap)]

use std::sync::Arc;

use anyhow::{Context, Result};
use fromenv::FromEnv;
use futures::FutureExt;
use parking_lot::Mutex;
use rusqlite::params_from_iter;
use rusqlite::types::{Value as SqliteValue, ValueRef};
use subkit::Backend;
use tracing::instrument;

use crate::connection::{Connection, Field, FutureResult, Row, Value};

/// Options used to open a [`SqliteConnection`].
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// Database path or URI.
    #[env(from = "SQL_DATABASE", default = "file::memory:?cache=shared")]
    pub database: String,
}

#[allow(missing_docs)]
impl subkit::FromEnv for ConnectOptions {
    fn from_env() -> Result<Self> {
        Self::from_env().finalize().context("issue loading connection options")
    }
}

/// A single `SQLite` connection shared behind a mutex.
#[derive(Debug, Clone)]
pub struct SqliteConnection {
    // rusqlite::Connection isn't `Sync`
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl Backend for SqliteConnection {
    type ConnectOptions = ConnectOptions;

    #[instrument]
    async fn connect_with(options: Self::ConnectOptions) -> Result<Self> {
        tracing::debug!("initializing SQLite connection to: {}", options.database);
        let conn = rusqlite::Connection::open(&options.database)
            .context("failed to open SQLite database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl Connection for SqliteConnection {
    fn query(&self, query: String, params: Vec<Value>) -> FutureResult<Vec<Row>> {
        tracing::debug!("executing query: {}", query);
        let conn = Arc::clone(&self.conn);

        async move {
            let conn = conn.lock();
            let mut stmt = conn.prepare(&query).context("failed to prepare statement")?;
            let names: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();
            let params: Vec<_> = params.iter().map(to_sqlite).collect();

            let mut rows =
                stmt.query(params_from_iter(params.iter())).context("failed to execute query")?;
            let mut result = Vec::new();
            while let Some(row) = rows.next().context("failed to fetch row")? {
                let mut fields = Vec::with_capacity(names.len());
                for (i, name) in names.iter().enumerate() {
                    let value = row.get_ref(i).context("failed to get column value")?;
                    fields.push(Field {
                        name: name.clone(),
                        value: from_sqlite(value)?,
                    });
                }
                result.push(Row { fields });
            }

            Ok(result)
        }
        .boxed()
    }

    fn exec(&self, query: String, params: Vec<Value>) -> FutureResult<u64> {
        tracing::debug!("executing statement: {}", query);
        let conn = Arc::clone(&self.conn);

        async move {
            let conn = conn.lock();
            let mut stmt = conn.prepare(&query).context("failed to prepare statement")?;
            let params: Vec<_> = params.iter().map(to_sqlite).collect();
            let affected = stmt
                .execute(params_from_iter(params.iter()))
                .context("failed to execute statement")?;
            Ok(affected as u64)
        }
        .boxed()
    }
}

fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Bool(Some(b)) => SqliteValue::Integer(i64::from(*b)),
        Value::TinyInt(Some(i)) => SqliteValue::Integer(i64::from(*i)),
        Value::SmallInt(Some(i)) => SqliteValue::Integer(i64::from(*i)),
        Value::Int(Some(i)) => SqliteValue::Integer(i64::from(*i)),
        Value::BigInt(Some(i)) => SqliteValue::Integer(*i),
        Value::TinyUnsigned(Some(u)) => SqliteValue::Integer(i64::from(*u)),
        Value::SmallUnsigned(Some(u)) => SqliteValue::Integer(i64::from(*u)),
        Value::Unsigned(Some(u)) => SqliteValue::Integer(i64::from(*u)),
        Value::BigUnsigned(Some(u)) => SqliteValue::Integer(*u as i64),
        Value::Float(Some(f)) => SqliteValue::Real(f64::from(*f)),
        Value::Double(Some(f)) => SqliteValue::Real(*f),
        Value::String(Some(s)) => SqliteValue::Text(s.to_string()),
        Value::Char(Some(c)) => SqliteValue::Text(c.to_string()),
        Value::Bytes(Some(b)) => SqliteValue::Blob(b.to_vec()),
        Value::ChronoDate(Some(d)) => SqliteValue::Text(d.to_string()),
        Value::ChronoTime(Some(t)) => SqliteValue::Text(t.to_string()),
        Value::ChronoDateTime(Some(dt)) => SqliteValue::Text(dt.to_string()),
        Value::ChronoDateTimeUtc(Some(dt)) => SqliteValue::Text(dt.to_rfc3339()),
        Value::ChronoDateTimeLocal(Some(dt)) => SqliteValue::Text(dt.to_rfc3339()),
        Value::ChronoDateTimeWithTimeZone(Some(dt)) => SqliteValue::Text(dt.to_rfc3339()),
        // every `None` variant is NULL
        _ => SqliteValue::Null,
    }
}

fn from_sqlite(value: ValueRef) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::String(None),
        ValueRef::Integer(i) => Value::BigInt(Some(i)),
        ValueRef::Real(f) => Value::Double(Some(f)),
        ValueRef::Text(t) => {
            let text = std::str::from_utf8(t).context("invalid UTF-8 in text value")?;
            Value::from(text)
        }
        ValueRef::Blob(b) => Value::from(b.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sqlite_operations() {
        let conn = SqliteConnection::connect_with(ConnectOptions {
            database: ":memory:".to_string(),
        })
        .await
        .expect("connect");

        let affected = conn
            .exec(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)".to_string(),
                vec![],
            )
            .await
            .expect("create table");
        assert_eq!(affected, 0);

        for (name, age) in [("Alice", 30), ("Bob", 25)] {
            let affected = conn
                .exec(
                    "INSERT INTO users (name, age) VALUES (?, ?)".to_string(),
                    vec![Value::from(name), Value::Int(Some(age))],
                )
                .await
                .expect("insert");
            assert_eq!(affected, 1);
        }

        let rows = conn
            .query(
                "SELECT id, name, age FROM users WHERE age < ? ORDER BY name".to_string(),
                vec![Value::Int(Some(100))],
            )
            .await
            .expect("query");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields[1].name, "name");
        assert_eq!(rows[0].text("name").as_deref(), Some("Alice"));
        assert_eq!(rows[1].int("age"), Some(25));
    }

    #[tokio::test]
    async fn null_round_trip() {
        let conn = SqliteConnection::connect_with(ConnectOptions {
            database: ":memory:".to_string(),
        })
        .await
        .expect("connect");

        let rows = conn
            .query("SELECT ? AS missing".to_string(), vec![Value::String(None)])
            .await
            .expect("query");
        assert_eq!(rows[0].text("missing"), None);
    }
}
