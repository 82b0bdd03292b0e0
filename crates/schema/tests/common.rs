//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use subkit::Backend;
use subkit_schema::{
    ConnectOptions, Connection, Field, FutureResult, Row, SqliteConnection, Value,
};

/// Opens a private in-memory SQLite database holding a small schema.
pub async fn sqlite() -> Arc<SqliteConnection> {
    subkit::telemetry::init("subkit_schema=debug");
    let conn = SqliteConnection::connect_with(ConnectOptions {
        database: ":memory:".to_string(),
    })
    .await
    .expect("connect");

    for statement in [
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            name TEXT DEFAULT 'anonymous',
            role_id INTEGER
        )",
        "CREATE TABLE roles (id INTEGER PRIMARY KEY, code TEXT NOT NULL)",
        "CREATE UNIQUE INDEX users_email ON users (email)",
        "CREATE INDEX users_role_name ON users (role_id, name)",
    ] {
        conn.exec(statement.to_string(), vec![]).await.expect("create schema");
    }

    Arc::new(conn)
}

/// Builds a row from `(name, value)` pairs.
pub fn row(fields: &[(&str, Value)]) -> Row {
    Row {
        fields: fields
            .iter()
            .map(|(name, value)| Field {
                name: (*name).to_string(),
                value: value.clone(),
            })
            .collect(),
    }
}

/// A connection that records every query and answers with canned rows.
#[derive(Debug, Default)]
pub struct Recorder {
    rows: Vec<Row>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl Recorder {
    pub fn returning(rows: Vec<Row>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().clone()
    }
}

impl Connection for Recorder {
    fn query(&self, query: String, params: Vec<Value>) -> FutureResult<Vec<Row>> {
        self.calls.lock().push((query, params));
        let rows = self.rows.clone();
        async move { Ok(rows) }.boxed()
    }

    fn exec(&self, query: String, params: Vec<Value>) -> FutureResult<u64> {
        self.calls.lock().push((query, params));
        async move { Ok(0) }.boxed()
    }
}
