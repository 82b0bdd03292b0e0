use std::sync::Arc;

use futures::FutureExt;

use super::{Column, Index, Introspect, Schema, Table, non_empty};
use crate::connection::{Connection, FutureResult, Row, Value};

const SCHEMAS: &str = "SELECT schema_name AS name FROM information_schema.schemata \
     WHERE schema_name NOT IN ('pg_catalog', 'information_schema') \
     AND schema_name NOT LIKE 'pg\\_toast%' AND schema_name NOT LIKE 'pg\\_temp%' \
     ORDER BY schema_name";

const TABLES: &str = "SELECT t.table_name AS name, \
     obj_description((quote_ident(t.table_schema) || '.' || quote_ident(t.table_name))::regclass, \
         'pg_class') AS comment \
     FROM information_schema.tables t \
     WHERE t.table_schema = $1 AND t.table_type = 'BASE TABLE' \
     ORDER BY t.table_name";

const COLUMNS: &str = "SELECT c.column_name AS name, c.data_type AS data_type, \
     c.column_default AS dflt, c.is_nullable AS nullable, \
     c.ordinal_position::bigint AS ordinal, \
     col_description((quote_ident(c.table_schema) || '.' || quote_ident(c.table_name))::regclass, \
         c.ordinal_position::int) AS comment, \
     CASE \
         WHEN c.character_maximum_length IS NOT NULL THEN c.character_maximum_length::text \
         WHEN c.numeric_precision IS NOT NULL \
             THEN concat_ws(',', c.numeric_precision, c.numeric_scale) \
         ELSE '' END AS data_type_long \
     FROM information_schema.columns c \
     WHERE c.table_schema = $1 AND c.table_name = $2 \
     ORDER BY c.ordinal_position";

const INDEXES: &str = "SELECT i.relname AS name, a.attname AS column_name, \
     ix.indisunique AS is_unique, k.ord AS seq_in_index \
     FROM pg_index ix \
     JOIN pg_class t ON t.oid = ix.indrelid \
     JOIN pg_class i ON i.oid = ix.indexrelid \
     JOIN pg_namespace n ON n.oid = t.relnamespace \
     CROSS JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord) \
     JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
     WHERE n.nspname = $1 AND t.relname = $2 \
     ORDER BY i.relname, k.ord";

/// PostgreSQL schema introspection over `information_schema` and the
/// `pg_index` catalog.
#[derive(Debug, Clone)]
pub struct Postgres {
    conn: Arc<dyn Connection>,
}

impl Postgres {
    /// Creates an introspector running over `conn`.
    #[must_use]
    pub const fn new(conn: Arc<dyn Connection>) -> Self {
        Self { conn }
    }
}

impl Introspect for Postgres {
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
                        unique: row.flag("is_unique").unwrap_or_default(),
                        seq_in_index: row.int("seq_in_index").unwrap_or(1),
                    })
                })
                .collect())
        }
        .boxed()
    }
}

fn column(row: &Row) -> Option<Column> {
    let default = non_empty(row.text("dflt"));
    // serial columns are backed by a sequence default
    let extra = default
        .as_deref()
        .filter(|d| d.starts_with("nextval("))
        .map(|_| "auto_increment".to_string());

    Some(Column {
        name: row.text("name")?,
        data_type: row.text("data_type").unwrap_or_default(),
        data_type_long: non_empty(row.text("data_type_long")),
        nullable: row.flag("nullable").unwrap_or(true),
        default,
        comment: non_empty(row.text("comment")),
        extra,
        ordinal: row.int("ordinal").unwrap_or_default(),
    })
}
