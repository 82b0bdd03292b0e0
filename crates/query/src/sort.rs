//! Gap-based ordering values for tables with a numeric sort column.
//!
//! Rows are ordered by a floating-point column (conventionally `sort`). A new
//! row goes after the current maximum unless the caller asks for a position;
//! a requested position that is already taken is halved towards the row
//! below it, so no existing row has to be renumbered.

use sea_query::{Value, Values};

use crate::condition::numbered;
use crate::dialect::Dialect;
use crate::select::Query;

/// Column read by [`max_sort`] and [`sort_slots`] when none is given.
pub const SORT_COLUMN: &str = "sort";

/// The values around a requested position, as read by [`sort_slots`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SortSlots {
    /// Largest value in the table, 0 when it is empty.
    pub max: f64,
    /// Whether a row already holds the requested value.
    pub taken: bool,
    /// Largest value below the requested one.
    pub previous: Option<f64>,
}

/// `SELECT COALESCE(MAX(column), 0) AS max_sort FROM table`.
#[must_use]
pub fn max_sort(dialect: Dialect, table: &str, column: &str) -> Query {
    let sql = format!(
        "SELECT COALESCE(MAX({}), 0) AS max_sort FROM {}",
        dialect.quote(column),
        dialect.quote(table)
    );
    Query {
        sql,
        values: Values(Vec::new()),
    }
}

/// Reads the [`SortSlots`] around `requested` in one round trip.
///
/// The row carries `max_sort`, `taken` (a count) and `previous_sort`
/// (`NULL` when nothing sorts below `requested`).
#[must_use]
pub fn sort_slots(dialect: Dialect, table: &str, column: &str, requested: f64) -> Query {
    let column = dialect.quote(column);
    let table = dialect.quote(table);
    let sql = format!(
        "SELECT COALESCE((SELECT MAX({column}) FROM {table}), 0) AS max_sort, \
         (SELECT COUNT(*) FROM {table} WHERE {column} = ?) AS taken, \
         (SELECT MAX({column}) FROM {table} WHERE {column} < ?) AS previous_sort"
    );
    let sql = match dialect {
        Dialect::Mysql => sql,
        Dialect::Postgres => numbered(&sql),
    };
    Query {
        sql,
        values: Values(vec![Value::from(requested), Value::from(requested)]),
    }
}

/// Picks the sort value for a row asking for position `requested`.
///
/// - `requested <= 0` appends: the current maximum plus one.
/// - A free position is used as is.
/// - A taken position yields the midpoint between it and the value below it,
///   or half of it when nothing sorts lower.
#[must_use]
pub fn calculate_sort(requested: f64, slots: &SortSlots) -> f64 {
    if requested <= 0.0 {
        return slots.max + 1.0;
    }
    if !slots.taken {
        return requested;
    }
    slots.previous.map_or(requested / 2.0, |previous| (previous + requested) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_after_maximum() {
        let slots = SortSlots {
            max: 7.0,
            ..SortSlots::default()
        };
        assert!((calculate_sort(0.0, &slots) - 8.0).abs() < f64::EPSILON);
        assert!((calculate_sort(-3.0, &slots) - 8.0).abs() < f64::EPSILON);
        assert!((calculate_sort(0.0, &SortSlots::default()) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn free_position_is_kept() {
        let slots = SortSlots {
            max: 7.0,
            taken: false,
            previous: Some(2.0),
        };
        assert!((calculate_sort(3.0, &slots) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn taken_position_is_halved_downwards() {
        let between = SortSlots {
            max: 7.0,
            taken: true,
            previous: Some(2.0),
        };
        assert!((calculate_sort(3.0, &between) - 2.5).abs() < f64::EPSILON);

        let lowest = SortSlots {
            max: 7.0,
            taken: true,
            previous: None,
        };
        assert!((calculate_sort(1.0, &lowest) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn statements_follow_dialect() {
        let query = max_sort(Dialect::Mysql, "menus", SORT_COLUMN);
        assert_eq!(query.sql, "SELECT COALESCE(MAX(`sort`), 0) AS max_sort FROM `menus`");
        assert!(query.values.0.is_empty());

        let query = sort_slots(Dialect::Postgres, "menus", SORT_COLUMN, 3.0);
        assert!(query.sql.contains("\"sort\" = $1"), "{}", query.sql);
        assert!(query.sql.contains("\"sort\" < $2"), "{}", query.sql);
        assert!(!query.sql.contains('?'));
        assert_eq!(query.values.0, vec![Value::from(3.0_f64), Value::from(3.0_f64)]);

        let query = sort_slots(Dialect::Mysql, "menus", SORT_COLUMN, 3.0);
        assert_eq!(query.sql.matches('?').count(), 2);
    }
}
