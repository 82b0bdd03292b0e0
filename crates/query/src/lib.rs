//! Declarative query conditions for SQL.
//!
//! Filter structs are declared with the [`search!`] macro. Each field carries a
//! tag describing the predicate it feeds:
//!
//! ```text
//! type:<lookup>;column:<name>;table:<name>;on:<local>,<foreign>;join:<table>
//! ```
//!
//! Resolving a struct collects WHERE, ORDER and JOIN fragments into a
//! [`Condition`]; zero-valued fields contribute nothing, so a request struct
//! can be passed through unchanged and only the filters a caller filled in
//! apply.
//!
//! # Quick Start
//!
//! ```ignore
//! use subkit_query::{Dialect, SearchQuery, search, sort_column};
//!
//! search! {
//!     #[derive(Debug, Default, Deserialize)]
//!     pub struct RoleFilter {
//!         pub code: String => "type:exact;column:code;table:roles",
//!     }
//! }
//!
//! search! {
//!     #[derive(Debug, Default, Deserialize)]
//!     pub struct UserFilter {
//!         pub name: String => "type:icontains;column:name;table:users",
//!         pub min_age: i32 => "type:gte;column:age;table:users" as "minAge",
//!         pub ids: Vec<i64> => "type:in;column:id;table:users",
//!         pub deleted: Option<bool> => "type:isnull;column:deleted_at;table:users",
//!         pub created: String => "type:order;column:created_at;table:users",
//!         pub role: RoleFilter => "type:left;table:users;join:roles;on:id,role_id",
//!     }
//! }
//!
//! let column = sort_column::<UserFilter>("minAge").unwrap_or_default();
//! let query = SearchQuery::new(Dialect::Postgres, "users")
//!     .search(&filter)
//!     .sort_by(&column, true)
//!     .paginate(20, page)
//!     .build();
//! // query.sql: SELECT "users".* FROM "users" LEFT JOIN "roles" ON ... WHERE ...
//! ```
//!
//! ## Lookups
//!
//! | lookup | fragment |
//! |---|---|
//! | `exact`, `iexact` | `col = ?` |
//! | `contains`, `icontains` | `col LIKE ?` / `col ILIKE ?` bound to `%v%` |
//! | `startswith`, `istartswith` | bound to `v%` |
//! | `endswith`, `iendswith` | bound to `%v` |
//! | `gt`, `gte`, `lt`, `lte` | `col > ?` ... |
//! | `in` | `col IN (?, ?, ...)` |
//! | `isnull` | `col IS NULL` when the field is `Some` or a non-empty `Vec` |
//! | `order` | `col asc` / `col desc` |
//! | `left`, `inner` | join into a nested filter struct |
//!
//! ## Sort positions
//!
//! [`max_sort`], [`sort_slots`] and [`calculate_sort`] pick the value of a
//! numeric `sort` column for a new row without renumbering existing ones.

#![forbid(unsafe_code)]

mod condition;
mod dialect;
mod error;
mod resolve;
mod search;
mod select;
mod sort;
mod tag;

pub use condition::{Clause, Condition, JoinClause, JoinKind, OrderClause};
pub use dialect::Dialect;
pub use error::QueryError;
pub use resolve::{make_condition, resolve, sort_column};
// Re-exported so callers can build bind values without depending on SeaQuery.
pub use sea_query::{Value, Values};
pub use search::{FieldValue, Search, SearchField, ToFieldValue};
pub use select::{Query, SearchQuery, keyword};
pub use sort::{SORT_COLUMN, SortSlots, calculate_sort, max_sort, sort_slots};
pub use tag::{Lookup, SearchTag};
