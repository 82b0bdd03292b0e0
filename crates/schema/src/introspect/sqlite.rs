use std::sync::Arc;

use futures::FutureExt;

use super::{Column, Index, Introspect, Schema, Table, non_empty};
use crate::connection::{Connection, FutureResult, Row, Value};

/// The only schema an SQLite connection reports.
const MAIN: &str = "main";

const TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
     ORDER BY name";

const COLUMNS: &str = "SELECT cid, name, type, \"notnull\", dflt_value, pk \
     FROM pragma_table_info(?) ORDER BY cid";

const INDEXES: &str = "SELECT il.name AS name, ii.name AS column_name, \
     il.\"unique\" AS is_unique, ii.seqno AS seqno \
     FROM pragma_index_list(?) AS il \
     JOIN pragma_index_info(il.name) AS ii \
     ORDER BY il.name, ii.seqno";

/// SQLite schema introspection over `sqlite_master` and the table-valued
/// `PRAGMA` functions.
///
/// SQLite has no schemas beyond `main`; the `schema` arguments are ignored.
#[derive(Debug, Clone)]
pub struct Sqlite {
    conn: Arc<dyn Connection>,
}

impl Sqlite {
    /// Creates an introspector running over `conn`.
    #[must_use]
    pub const fn new(conn: Arc<dyn Connection>) -> Self {
        Self { conn }
    }
}

impl Introspect for Sqlite {
    fn list_schemas(&self) -> FutureResult<Vec<Schema>> {
        async move {
            Ok(vec![Schema {
                name: MAIN.to_string(),
            }])
        }
        .boxed()
    }

    fn list_tables(&self, _schema: String) -> FutureResult<Vec<Table>> {
        let conn = Arc::clone(&self.conn);

        async move {
            let rows = conn.query(TABLES.to_string(), vec![]).await?;
            Ok(rows
                .iter()
                .filter_map(|r| r.text("name"))
                .map(|name| Table { name, comment: None })
                .collect())
        }
        .boxed()
    }

    fn list_columns(&self, _schema: String, table: String) -> FutureResult<Vec<Column>> {
        let conn = Arc::clone(&self.conn);

        async move {
            let rows = conn.query(COLUMNS.to_string(), vec![Value::from(table)]).await?;
            Ok(rows.iter().filter_map(column).collect())
        }
        .boxed()
    }

    fn list_indexes(&self, _schema: String, table: String) -> FutureResult<Vec<Index>> {
        let conn = Arc::clone(&self.conn);

        async move {
            let rows = conn.query(INDEXES.to_string(), vec![Value::from(table)]).await?;
            Ok(rows
                .iter()
                .filter_map(|row| {
                    Some(Index {
                        name: row.text("name")?,
                        column: row.text("column_name")?,
                        unique: row.flag("is_unique").unwrap_or_default(),
                        seq_in_index: row.int("seqno").unwrap_or_default() + 1,
                    })
                })
                .collect())
        }
        .boxed()
    }
}

fn column(row: &Row) -> Option<Column> {
    let primary = row.flag("pk").unwrap_or_default();
    Some(Column {
        name: row.text("name")?,
        data_type: row.text("type").unwrap_or_default(),
        data_type_long: None,
        nullable: !row.flag("notnull").unwrap_or_default(),
        default: non_empty(row.text("dflt_value")),
        comment: None,
        extra: primary.then(|| "primary_key".to_string()),
        ordinal: row.int("cid").unwrap_or_default() + 1,
    })
}
