use std::fmt::Debug;

pub use sea_query::Value;
pub use subkit::FutureResult;

/// SQL providers implement [`Connection`] so schema queries can run against
/// any backend (MySQL, PostgreSQL, SQLite) through one seam.
///
/// Placeholders follow the backend's own syntax: `?` for MySQL and SQLite,
/// `$1`, `$2`, ... for PostgreSQL.
pub trait Connection: Debug + Send + Sync + 'static {
    /// Execute a query and return the resulting rows.
    fn query(&self, query: String, params: Vec<Value>) -> FutureResult<Vec<Row>>;

    /// Execute a statement that does not return rows, returning the number of
    /// rows affected.
    fn exec(&self, query: String, params: Vec<Value>) -> FutureResult<u64>;
}

/// A named column value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Column name as reported by the backend.
    pub name: String,
    /// Column value. SQL `NULL` is any variant holding `None`.
    pub value: Value,
}

/// One result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Fields in select-list order.
    pub fields: Vec<Field>,
}

impl Row {
    /// Value of the column called `name`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)).map(|f| &f.value)
    }

    /// Column `name` as text. Numbers are formatted; `NULL` is `None`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(Some(s)) => Some(s.to_string()),
            Value::Char(Some(c)) => Some(c.to_string()),
            Value::Bytes(Some(b)) => String::from_utf8(b.to_vec()).ok(),
            value => integer(value).map(|i| i.to_string()),
        }
    }

    /// Column `name` as an integer. Text holding a number is parsed.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        let value = self.get(name)?;
        integer(value).or_else(|| match value {
            Value::String(Some(s)) => s.trim().parse().ok(),
            Value::Bytes(Some(b)) => std::str::from_utf8(b).ok()?.trim().parse().ok(),
            _ => None,
        })
    }

    /// Column `name` as a float. Integers widen and numeric text is parsed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Float(Some(f)) => Some(f64::from(*f)),
            Value::Double(Some(f)) => Some(*f),
            Value::String(Some(s)) => s.trim().parse().ok(),
            Value::Bytes(Some(b)) => std::str::from_utf8(b).ok()?.trim().parse().ok(),
            value => integer(value).map(|i| i as f64),
        }
    }

    /// Column `name` as a flag: booleans, non-zero integers and `YES`/`true`
    /// style text are `true`.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Value::Bool(Some(b)) => Some(*b),
            Value::String(Some(s)) => {
                Some(matches!(s.to_ascii_lowercase().as_str(), "yes" | "y" | "true" | "t" | "1"))
            }
            value => integer(value).map(|i| i != 0),
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(Some(b)) => Some(i64::from(*b)),
        Value::TinyInt(Some(i)) => Some(i64::from(*i)),
        Value::SmallInt(Some(i)) => Some(i64::from(*i)),
        Value::Int(Some(i)) => Some(i64::from(*i)),
        Value::BigInt(Some(i)) => Some(*i),
        Value::TinyUnsigned(Some(u)) => Some(i64::from(*u)),
        Value::SmallUnsigned(Some(u)) => Some(i64::from(*u)),
        Value::Unsigned(Some(u)) => Some(i64::from(*u)),
        Value::BigUnsigned(Some(u)) => Some(*u as i64),
        _ => None,
    }
}
