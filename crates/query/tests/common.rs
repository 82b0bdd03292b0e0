//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use subkit_query::search;

// Filter structs shared across test files

search! {
    #[derive(Debug, Clone, Default)]
    pub struct RoleFilter {
        pub code: String => "type:exact;column:code;table:roles",
        pub order: String => "type:order;column:sort;table:roles",
    }
}

search! {
    #[derive(Debug, Clone, Default)]
    pub struct Paging {
        pub page_size: u64,
        pub page_index: i64,
    }
}

search! {
    #[derive(Debug, Clone, Default)]
    pub struct UserFilter {
        pub name: String => "type:contains;column:name;table:users",
        pub email: String => "type:iexact;column:email;table:users",
        pub min_age: i32 => "type:gte;column:age;table:users" as "minAge",
        pub max_age: i32 => "type:lt;column:age;table:users" as "maxAge",
        pub prefix: String => "type:startswith;column:login;table:users",
        pub suffix: String => "type:iendswith;column:login;table:users",
        pub ids: Vec<i64> => "type:in;column:id;table:users",
        pub deleted: Option<bool> => "type:isnull;column:deleted_at;table:users",
        pub created: String => "type:order;column:created_at;table:users" as "createdAt",
        pub role: RoleFilter => "type:left;table:users;join:roles;on:id,role_id",
        pub paging: Paging,
        pub internal: String => "-",
    }
}

/// Normalize SQL by collapsing whitespace.
fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize SQL for comparison by removing identifier quotes and normalizing whitespace.
/// Preserves quotes inside string literals.
fn canonicalize_sql(sql: &str) -> String {
    let mut cleaned = String::with_capacity(sql.len());
    let mut in_single_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_single_quote = !in_single_quote;
                cleaned.push(ch);
            }
            '"' | '`' if !in_single_quote => {
                // Strip identifier quoting so MySQL and PostgreSQL output compare alike.
            }
            _ => cleaned.push(ch),
        }
    }

    normalize_sql(&cleaned)
}

/// Assert that SQL contains all expected fragments in order.
///
/// Identifier quotes (both backticks and double quotes) are stripped and
/// whitespace normalized before fragments are searched for sequentially.
#[allow(clippy::missing_panics_doc)]
pub fn assert_sql_contains(actual: &str, fragments: &[&str]) {
    let actual_canonical = canonicalize_sql(actual);
    let mut search_start = 0usize;

    for fragment in fragments {
        let fragment_canonical = canonicalize_sql(fragment);
        if fragment_canonical.is_empty() {
            continue;
        }

        if let Some(pos) = actual_canonical[search_start..].find(&fragment_canonical) {
            search_start += pos + fragment_canonical.len();
        } else {
            panic!(
                "expected SQL fragment `{fragment_canonical}` not found in `{actual_canonical}`"
            );
        }
    }
}
