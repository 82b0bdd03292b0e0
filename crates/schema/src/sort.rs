//! Sort positions for new rows, read through a [`Connection`].

use anyhow::Result;
use subkit_query::{Dialect, Query, SortSlots, calculate_sort, sort_slots};

use crate::connection::{Connection, Row};
use crate::introspect::Driver;

const fn dialect(driver: Driver) -> Dialect {
    match driver {
        Driver::Postgres => Dialect::Postgres,
        // SQLite accepts backtick quoting and `?` placeholders
        Driver::Mysql | Driver::Sqlite => Dialect::Mysql,
    }
}

async fn first_row(conn: &dyn Connection, query: Query) -> Result<Row> {
    let rows = conn.query(query.sql, query.values.0).await?;
    Ok(rows.into_iter().next().unwrap_or_default())
}

/// Largest value of `column` in `table`, 0 when the table is empty.
///
/// # Errors
///
/// Returns an error when the query fails.
pub async fn max_sort(
    conn: &dyn Connection, driver: Driver, table: &str, column: &str,
) -> Result<f64> {
    let row = first_row(conn, subkit_query::max_sort(dialect(driver), table, column)).await?;
    Ok(row.float("max_sort").unwrap_or_default())
}

/// Sort value for a new row of `table` asking for position `requested`.
///
/// See [`calculate_sort`] for how the position is chosen.
///
/// # Errors
///
/// Returns an error when the query fails.
pub async fn next_sort(
    conn: &dyn Connection, driver: Driver, table: &str, column: &str, requested: f64,
) -> Result<f64> {
    let row = first_row(conn, sort_slots(dialect(driver), table, column, requested)).await?;
    let slots = SortSlots {
        max: row.float("max_sort").unwrap_or_default(),
        taken: row.int("taken").unwrap_or_default() > 0,
        previous: row.float("previous_sort"),
    };

    let sort = calculate_sort(requested, &slots);
    tracing::debug!(table, requested, sort, "picked sort position");
    Ok(sort)
}
