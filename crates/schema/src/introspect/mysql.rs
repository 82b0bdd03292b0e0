use std::sync::Arc;

use futures::FutureExt;

use super::{Column, Index, Introspect, Schema, Table, non_empty};
use crate::connection::{Connection, FutureResult, Row, Value};

const SCHEMAS: &str = "SELECT SCHEMA_NAME AS name FROM INFORMATION_SCHEMA.SCHEMATA \
     ORDER BY SCHEMA_NAME";

const TABLES: &str = "SELECT TABLE_NAME AS name, TABLE_COMMENT AS comment \
     FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' \
     ORDER BY TABLE_NAME";

const COLUMNS: &str = "SELECT c.COLUMN_NAME AS name, c.DATA_TYPE AS data_type, \
     c.EXTRA AS extra, c.COLUMN_COMMENT AS comment, c.COLUMN_DEFAULT AS dflt, \
     c.IS_NULLABLE AS nullable, c.ORDINAL_POSITION AS ordinal, \
     CASE c.DATA_TYPE \
         WHEN 'longtext' THEN c.CHARACTER_MAXIMUM_LENGTH \
         WHEN 'varchar' THEN c.CHARACTER_MAXIMUM_LENGTH \
         WHEN 'double' THEN CONCAT_WS(',', c.NUMERIC_PRECISION, c.NUMERIC_SCALE) \
         WHEN 'decimal' THEN CONCAT_WS(',', c.NUMERIC_PRECISION, c.NUMERIC_SCALE) \
         WHEN 'int' THEN c.NUMERIC_PRECISION \
         WHEN 'bigint' THEN c.NUMERIC_PRECISION \
         ELSE '' END AS data_type_long \
     FROM INFORMATION_SCHEMA.COLUMNS c \
     WHERE c.TABLE_SCHEMA = ? AND c.TABLE_NAME = ? \
     ORDER BY c.ORDINAL_POSITION";

const INDEXES: &str = "SELECT INDEX_NAME AS name, COLUMN_NAME AS column_name, \
     NON_UNIQUE AS non_unique, SEQ_IN_INDEX AS seq_in_index \
     FROM INFORMATION_SCHEMA.STATISTICS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
     ORDER BY INDEX_NAME, SEQ_IN_INDEX";

/// MySQL schema introspection over `INFORMATION_SCHEMA`.
#[derive(Debug, Clone)]
pub struct Mysql {
    conn: Arc<dyn Connection>,
}

impl Mysql {
    /// Creates an introspector running over `conn`.
    #[must_use]
    pub const fn new(conn: Arc<dyn Connection>) -> Self {
        Self { conn }
    }
}

impl Introspect for Mysql {
    fn list_schemas(&self) -> FutureResult<Vec<Schema>> {
        let conn = Arc::clone(&self.conn);

        async move {
            let rows = conn.query(SCHEMAS.to_string(), vec![]).await?;
            Ok(rows.iter().filter_map(|r| r.text("name")).map(|name| Schema { name }).collect())
        }
        .boxed()
    }

    fn list_tables(&self, schema: String) -> FutureResult<Vec<Table>> {
        let conn = Arc::clone(&self.conn);

        async move {
            let rows = conn.query(TABLES.to_string(), vec![Value::from(schema)]).await?;
            Ok(rows
                .iter()
                .filter_map(|row| {
                    Some(Table {
                        name: row.text("name")?,
                        comment: non_empty(row.text("comment")),
                    })
                })
                .collect())
        }
        .boxed()
    }

    fn list_columns(&self, schema: String, table: String) -> FutureResult<Vec<Column>> {
        let conn = Arc::clone(&self.conn);

        async move {
            let params = vec![Value::from(schema), Value::from(table)];
            let rows = conn.query(COLUMNS.to_string(), params).await?;
            let mut columns = rows.iter().filter_map(column).collect::<Vec<_>>();
            columns.sort_by_key(|c| c.ordinal);
            Ok(columns)
        }
        .boxed()
    }

    fn list_indexes(&self, schema: String, table: String) -> FutureResult<Vec<Index>> {
        let conn = Arc::clone(&self.conn);

        async move {
            let params = vec![Value::from(schema), Value::from(table)];
            let rows = conn.query(INDEXES.to_string(), params).await?;
            Ok(rows
                .iter()
                .filter_map(|row| {
                    Some(Index {
                        name: row.text("name")?,
                        column: row.text("column_name")?,
                        unique: !row.flag("non_unique").unwrap_or(true),
                        seq_in_index: row.int("seq_in_index").unwrap_or(1),
                    })
                })
                .collect())
        }
        .boxed()
    }
}

fn column(row: &Row) -> Option<Column> {
    Some(Column {
        name: row.text("name")?,
        data_type: row.text("data_type").unwrap_or_default(),
        data_type_long: non_empty(row.text("data_type_long")),
        nullable: row.flag("nullable").unwrap_or(true),
        default: non_empty(row.text("dflt")),
        comment: non_empty(row.text("comment")),
        extra: non_empty(row.text("extra")),
        ordinal: row.int("ordinal").unwrap_or_default(),
    })
}
