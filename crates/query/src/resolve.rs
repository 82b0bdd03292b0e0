use sea_query::Value;
use tracing::debug;

use crate::condition::{Condition, JoinClause, JoinKind};
use crate::dialect::Dialect;
use crate::search::{FieldValue, Search, SearchField};
use crate::tag::{Lookup, SearchTag};

/// Resolves a search struct into `condition`.
///
/// Fields are visited in declaration order. Untagged fields holding a nested
/// search struct are resolved into the same condition; zero-valued fields and
/// fields tagged `-` contribute nothing. Join tags open a nested condition
/// scoped to the joined table.
///
/// Resolution never fails. A tag that cannot be applied (unknown lookup,
/// missing column, or a value of the wrong shape) is skipped and reported at
/// debug level.
pub fn resolve<S: Search>(dialect: Dialect, filter: &S, condition: &mut Condition) {
    resolve_fields(dialect, filter.fields(), condition);
}

/// Resolves a search struct into a fresh [`Condition`].
#[must_use]
pub fn make_condition<S: Search>(dialect: Dialect, filter: &S) -> Condition {
    let mut condition = Condition::new();
    resolve(dialect, filter, &mut condition);
    condition
}

/// Looks up the column behind a sortable field.
///
/// `name` is matched against the JSON name of each tagged field (the field
/// name, or its `as "..."` override). The first match wins. Returns `None`
/// when no field matches or the matching tag names no column.
#[must_use]
pub fn sort_column<S: Search>(name: &str) -> Option<String> {
    S::tags()
        .iter()
        .find(|&&(json, tag)| json == name && tag.is_some_and(|t| t != "-"))
        .and_then(|&(_, tag)| tag)
        .map(|tag| SearchTag::parse(tag).column)
        .filter(|column| !column.is_empty())
}

fn resolve_fields(dialect: Dialect, fields: Vec<SearchField>, condition: &mut Condition) {
    for SearchField { name, tag, value } in fields {
        let Some(raw) = tag else {
            if let Some(nested) = value.into_nested() {
                resolve_fields(dialect, nested, condition);
            }
            continue;
        };

        if raw == "-" || value.is_zero() {
            continue;
        }

        let tag = SearchTag::parse(raw);
        let Some(lookup) = tag.lookup() else {
            debug!(field = name, kind = %tag.kind, "skipping field: unknown lookup");
            continue;
        };

        match lookup {
            Lookup::LeftJoin => join(dialect, name, JoinKind::Left, &tag, value, condition),
            Lookup::InnerJoin => join(dialect, name, JoinKind::Inner, &tag, value, condition),
            _ if tag.column.is_empty() => {
                debug!(field = name, "skipping field: tag names no column");
            }
            _ => predicate(dialect, name, lookup, &tag, &value, condition),
        }
    }
}

fn predicate(
    dialect: Dialect, name: &str, lookup: Lookup, tag: &SearchTag, value: &FieldValue,
    condition: &mut Condition,
) {
    let column = dialect.column(&tag.table, &tag.column);

    match lookup {
        Lookup::Exact | Lookup::IExact => compare(name, &column, "=", value, condition),
        Lookup::Gt => compare(name, &column, ">", value, condition),
        Lookup::Gte => compare(name, &column, ">=", value, condition),
        Lookup::Lt => compare(name, &column, "<", value, condition),
        Lookup::Lte => compare(name, &column, "<=", value, condition),
        Lookup::Contains | Lookup::IContains => {
            pattern(dialect, name, &column, value, condition, |v| format!("%{v}%"));
        }
        Lookup::StartsWith | Lookup::IStartsWith => {
            pattern(dialect, name, &column, value, condition, |v| format!("{v}%"));
        }
        Lookup::EndsWith | Lookup::IEndsWith => {
            pattern(dialect, name, &column, value, condition, |v| format!("%{v}"));
        }
        Lookup::In => {
            let values = value
                .as_list()
                .map(<[Value]>::to_vec)
                .or_else(|| value.to_value().map(|v| vec![v]));
            let Some(values) = values else {
                debug!(field = name, "skipping `in`: value is not a collection");
                return;
            };
            let placeholders = vec!["?"; values.len()].join(", ");
            condition.push_where(format!("{column} IN ({placeholders})"), values);
        }
        Lookup::IsNull => {
            if value.is_reference() {
                condition.push_where(format!("{column} IS NULL"), Vec::new());
            } else {
                debug!(field = name, "skipping `isnull`: value is not optional");
            }
        }
        Lookup::Order => {
            let direction = value.as_text().map(str::to_ascii_lowercase);
            match direction.as_deref() {
                Some("asc") => condition.push_order(column, false),
                Some("desc") => condition.push_order(column, true),
                _ => debug!(field = name, "skipping `order`: value is not asc or desc"),
            }
        }
        Lookup::LeftJoin | Lookup::InnerJoin => {}
    }
}

fn compare(name: &str, column: &str, op: &str, value: &FieldValue, condition: &mut Condition) {
    let Some(value) = value.to_value() else {
        debug!(field = name, op, "skipping comparison: value is not a scalar");
        return;
    };
    condition.push_where(format!("{column} {op} ?"), vec![value]);
}

fn pattern(
    dialect: Dialect, name: &str, column: &str, value: &FieldValue, condition: &mut Condition,
    wrap: impl Fn(&str) -> String,
) {
    let Some(text) = value.as_text() else {
        debug!(field = name, "skipping pattern lookup: value is not text");
        return;
    };
    condition.push_where(format!("{column} {} ?", dialect.like()), vec![Value::from(wrap(text))]);
}

fn join(
    dialect: Dialect, name: &str, kind: JoinKind, tag: &SearchTag, value: FieldValue,
    condition: &mut Condition,
) {
    let [local, foreign, ..] = tag.on.as_slice() else {
        debug!(field = name, "skipping join: `on` needs two columns");
        return;
    };
    if tag.join.is_empty() {
        debug!(field = name, "skipping join: tag names no joined table");
        return;
    }
    let Some(nested) = value.into_nested() else {
        debug!(field = name, "skipping join: value is not a search struct");
        return;
    };

    let sql = format!(
        "{} {} ON {} = {}",
        kind.keyword(),
        dialect.quote(&tag.join),
        dialect.column(&tag.join, local),
        dialect.column(&tag.table, foreign),
    );
    let scoped = condition.push_join(JoinClause {
        kind,
        table: tag.join.clone(),
        local: local.clone(),
        parent: tag.table.clone(),
        foreign: foreign.clone(),
        sql,
        condition: Condition::new(),
    });
    resolve_fields(dialect, nested, scoped);
}
