use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// SQL dialect used to quote identifiers and pick case-insensitive operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL: backtick quoting, `LIKE`.
    #[default]
    Mysql,
    /// PostgreSQL: double-quote quoting, `ILIKE`.
    Postgres,
}

impl Dialect {
    /// The driver tag (`mysql` or `postgres`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
        }
    }

    /// Quote a single identifier.
    #[must_use]
    pub fn quote(self, ident: &str) -> String {
        match self {
            Self::Mysql => format!("`{ident}`"),
            Self::Postgres => format!("\"{ident}\""),
        }
    }

    /// Quoted `table.column` reference. An empty table yields the bare column.
    #[must_use]
    pub fn column(self, table: &str, column: &str) -> String {
        if table.is_empty() {
            return self.quote(column);
        }
        format!("{}.{}", self.quote(table), self.quote(column))
    }

    /// Operator used for pattern lookups.
    #[must_use]
    pub const fn like(self) -> &'static str {
        match self {
            Self::Mysql => "LIKE",
            Self::Postgres => "ILIKE",
        }
    }
}

impl FromStr for Dialect {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::Mysql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(QueryError::UnknownDialect(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
