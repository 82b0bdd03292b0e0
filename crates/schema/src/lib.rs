//! # Schema introspection
//!
//! Describes a live database: its schemas, tables, columns and indexes.
//!
//! Queries run through the narrow [`Connection`] seam, so any SQL client can
//! back an introspector. [`SqliteConnection`] is provided for development and
//! tests. [`next_sort`] picks the value of a numeric sort column for a new
//! row over the same seam.
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use subkit::Backend;
//! use subkit_schema::{Connection, Driver, SqliteConnection, introspector};
//!
//! let conn: Arc<dyn Connection> = Arc::new(SqliteConnection::connect().await?);
//! let schema = introspector(Driver::Sqlite, conn);
//! let columns = schema.list_columns("main".to_string(), "users".to_string()).await?;
//! ```

#![forbid(unsafe_code)]

mod connection;
mod introspect;
mod sort;
mod sqlite;

pub use self::connection::{Connection, Field, FutureResult, Row, Value};
pub use self::introspect::{
    Column, Driver, Index, Introspect, Mysql, Postgres, Schema, Sqlite, Table, introspector,
};
pub use self::sort::{max_sort, next_sort};
pub use self::sqlite::{ConnectOptions, SqliteConnection};
