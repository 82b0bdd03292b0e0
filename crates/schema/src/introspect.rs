//! Schema introspection over a [`Connection`].

mod mysql;
mod postgres;
mod sqlite;

use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::bail;

pub use self::mysql::Mysql;
pub use self::postgres::Postgres;
pub use self::sqlite::Sqlite;
use crate::connection::{Connection, FutureResult};

/// A database (MySQL) or namespace (PostgreSQL, SQLite).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Schema name.
    pub name: String,
}

/// A base table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Table comment, when the backend stores one.
    pub comment: Option<String>,
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared type, e.g. `varchar`, `integer`, `TEXT`.
    pub data_type: String,
    /// Length or `precision,scale` of the type, when it has one.
    pub data_type_long: Option<String>,
    /// Whether the column accepts `NULL`.
    pub nullable: bool,
    /// Default value expression.
    pub default: Option<String>,
    /// Column comment.
    pub comment: Option<String>,
    /// Backend extras such as `auto_increment`.
    pub extra: Option<String>,
    /// 1-based position in the table.
    pub ordinal: i64,
}

/// One column of an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Indexed column.
    pub column: String,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
    /// 1-based position of the column within the index.
    pub seq_in_index: i64,
}

/// Database backends implement [`Introspect`] to describe their own schema.
pub trait Introspect: Debug + Send + Sync {
    /// Schemas visible to the connection.
    fn list_schemas(&self) -> FutureResult<Vec<Schema>>;

    /// Base tables in `schema`, ordered by name.
    fn list_tables(&self, schema: String) -> FutureResult<Vec<Table>>;

    /// Columns of `table`, in ordinal order.
    fn list_columns(&self, schema: String, table: String) -> FutureResult<Vec<Column>>;

    /// Index columns of `table`, ordered by index name then position.
    fn list_indexes(&self, schema: String, table: String) -> FutureResult<Vec<Index>>;
}

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// MySQL or MariaDB.
    Mysql,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

impl FromStr for Driver {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "postgres" | "postgresql" | "pgsql" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => bail!("unsupported database driver: {other}"),
        }
    }
}

/// Returns the introspector for `driver` running over `conn`.
#[must_use]
pub fn introspector(driver: Driver, conn: Arc<dyn Connection>) -> Box<dyn Introspect> {
    tracing::debug!(%driver, "creating schema introspector");
    match driver {
        Driver::Mysql => Box::new(Mysql::new(conn)),
        Driver::Postgres => Box::new(Postgres::new(conn)),
        Driver::Sqlite => Box::new(Sqlite::new(conn)),
    }
}

/// Treats `NULL` and empty text alike.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_names() {
        assert_eq!("MySQL".parse::<Driver>().unwrap(), Driver::Mysql);
        assert_eq!("postgresql".parse::<Driver>().unwrap(), Driver::Postgres);
        assert_eq!("sqlite3".parse::<Driver>().unwrap(), Driver::Sqlite);
        assert!("oracle".parse::<Driver>().is_err());
        assert_eq!(Driver::Postgres.to_string(), "postgres");
    }
}
