//! Integration tests for schema introspection.

#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use common::{Recorder, row, sqlite};
use subkit_schema::{Column, Connection, Driver, Index, Value, introspector};

#[tokio::test]
async fn sqlite_reports_main_only() {
    let schema = introspector(Driver::Sqlite, sqlite().await);
    let schemas = schema.list_schemas().await.unwrap();
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0].name, "main");
}

#[tokio::test]
async fn sqlite_tables_skip_internal() {
    let schema = introspector(Driver::Sqlite, sqlite().await);
    let names = schema
        .list_tables("main".to_string())
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect::<Vec<_>>();
    // AUTOINCREMENT creates sqlite_sequence
    assert_eq!(names, vec!["roles", "users"]);
}

#[tokio::test]
async fn sqlite_columns_in_ordinal_order() {
    let schema = introspector(Driver::Sqlite, sqlite().await);
    let columns = schema.list_columns("main".to_string(), "users".to_string()).await.unwrap();

    let names = columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["id", "email", "name", "role_id"]);
    assert_eq!(columns.iter().map(|c| c.ordinal).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

    assert_eq!(columns[0].extra.as_deref(), Some("primary_key"));
    assert!(!columns[1].nullable);
    assert_eq!(columns[1].data_type, "TEXT");
    assert!(columns[2].nullable);
    assert_eq!(columns[2].default.as_deref(), Some("'anonymous'"));
    assert_eq!(columns[3].default, None);
}

#[tokio::test]
async fn sqlite_indexes() {
    let schema = introspector(Driver::Sqlite, sqlite().await);
    let indexes = schema.list_indexes("main".to_string(), "users".to_string()).await.unwrap();

    assert_eq!(indexes, vec![
        Index {
            name: "users_email".to_string(),
            column: "email".to_string(),
            unique: true,
            seq_in_index: 1,
        },
        Index {
            name: "users_role_name".to_string(),
            column: "role_id".to_string(),
            unique: false,
            seq_in_index: 1,
        },
        Index {
            name: "users_role_name".to_string(),
            column: "name".to_string(),
            unique: false,
            seq_in_index: 2,
        },
    ]);
}

#[tokio::test]
async fn sqlite_unknown_table_is_empty() {
    let schema = introspector(Driver::Sqlite, sqlite().await);
    assert!(schema.list_columns("main".to_string(), "nope".to_string()).await.unwrap().is_empty());
}

#[tokio::test]
async fn mysql_binds_schema_and_table() {
    // rows arrive out of order, and with upper-cased labels in the first one
    let conn = Recorder::returning(vec![
        row(&[
            ("NAME", Value::from("name")),
            ("DATA_TYPE", Value::from("varchar")),
            ("EXTRA", Value::from("")),
            ("COMMENT", Value::from("display name")),
            ("DFLT", Value::String(None)),
            ("NULLABLE", Value::from("YES")),
            ("ORDINAL", Value::Unsigned(Some(2))),
            ("DATA_TYPE_LONG", Value::from("255")),
        ]),
        row(&[
            ("name", Value::from("id")),
            ("data_type", Value::from("bigint")),
            ("extra", Value::from("auto_increment")),
            ("comment", Value::from("")),
            ("dflt", Value::String(None)),
            ("nullable", Value::from("NO")),
            ("ordinal", Value::Unsigned(Some(1))),
            ("data_type_long", Value::from("19")),
        ]),
    ]);
    let schema = introspector(Driver::Mysql, Arc::clone(&conn) as Arc<dyn Connection>);

    let columns = schema.list_columns("app".to_string(), "users".to_string()).await.unwrap();

    let calls = conn.calls();
    assert!(calls[0].0.contains("INFORMATION_SCHEMA.COLUMNS"));
    assert_eq!(calls[0].1, vec![Value::from("app"), Value::from("users")]);

    assert_eq!(columns, vec![
        Column {
            name: "id".to_string(),
            data_type: "bigint".to_string(),
            data_type_long: Some("19".to_string()),
            nullable: false,
            default: None,
            comment: None,
            extra: Some("auto_increment".to_string()),
            ordinal: 1,
        },
        Column {
            name: "name".to_string(),
            data_type: "varchar".to_string(),
            data_type_long: Some("255".to_string()),
            nullable: true,
            default: None,
            comment: Some("display name".to_string()),
            extra: None,
            ordinal: 2,
        },
    ]);
}

#[tokio::test]
async fn mysql_indexes_invert_non_unique() {
    let conn = Recorder::returning(vec![row(&[
        ("name", Value::from("PRIMARY")),
        ("column_name", Value::from("id")),
        ("non_unique", Value::BigInt(Some(0))),
        ("seq_in_index", Value::Unsigned(Some(1))),
    ])]);
    let schema = introspector(Driver::Mysql, conn);

    let indexes = schema.list_indexes("app".to_string(), "users".to_string()).await.unwrap();
    assert_eq!(indexes.len(), 1);
    assert!(indexes[0].unique);
}

#[tokio::test]
async fn postgres_uses_numbered_placeholders() {
    let conn = Recorder::returning(vec![row(&[
        ("name", Value::from("id")),
        ("data_type", Value::from("integer")),
        ("dflt", Value::from("nextval('users_id_seq'::regclass)")),
        ("nullable", Value::from("NO")),
        ("ordinal", Value::BigInt(Some(1))),
        ("comment", Value::String(None)),
        ("data_type_long", Value::from("32,0")),
    ])]);
    let schema = introspector(Driver::Postgres, Arc::clone(&conn) as Arc<dyn Connection>);

    let columns = schema.list_columns("public".to_string(), "users".to_string()).await.unwrap();

    let calls = conn.calls();
    assert!(calls[0].0.contains("$1") && calls[0].0.contains("$2"));
    assert!(!calls[0].0.contains('?'));
    assert_eq!(columns[0].extra.as_deref(), Some("auto_increment"));
    assert!(!columns[0].nullable);
}

#[tokio::test]
async fn postgres_schemas_and_tables() {
    let conn = Recorder::returning(vec![row(&[
        ("name", Value::from("public")),
        ("comment", Value::String(None)),
    ])]);
    let schema = introspector(Driver::Postgres, Arc::clone(&conn) as Arc<dyn Connection>);

    let schemas = schema.list_schemas().await.unwrap();
    assert_eq!(schemas[0].name, "public");

    let tables = schema.list_tables("public".to_string()).await.unwrap();
    assert_eq!(tables[0].comment, None);
    assert_eq!(conn.calls()[1].1, vec![Value::from("public")]);
}
