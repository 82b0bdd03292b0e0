//! Parsing of `search` tags.
//!
//! A tag is a `;`-separated list of `key:value` segments:
//!
//! ```text
//! type:<lookup>;column:<name>;table:<name>;on:<local>,<foreign>;join:<table>
//! ```
//!
//! Parsing never fails. Unknown keys are ignored and segments without a value
//! are dropped, so a malformed tag simply yields an incomplete [`SearchTag`].

/// Predicate selected by the `type` key of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// `column = value`
    Exact,
    /// `column = value`, case-insensitive by collation.
    IExact,
    /// `column LIKE %value%`
    Contains,
    /// `column ILIKE %value%` on PostgreSQL.
    IContains,
    /// `column > value`
    Gt,
    /// `column >= value`
    Gte,
    /// `column < value`
    Lt,
    /// `column <= value`
    Lte,
    /// `column LIKE value%`
    StartsWith,
    /// `column ILIKE value%` on PostgreSQL.
    IStartsWith,
    /// `column LIKE %value`
    EndsWith,
    /// `column ILIKE %value` on PostgreSQL.
    IEndsWith,
    /// `column IN (values)`
    In,
    /// `column IS NULL`
    IsNull,
    /// `ORDER BY column asc|desc`
    Order,
    /// `LEFT JOIN` into a nested search struct.
    LeftJoin,
    /// `INNER JOIN` into a nested search struct.
    InnerJoin,
}

impl Lookup {
    /// Parse the value of a `type` segment. Unknown lookups yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let lookup = match value {
            "exact" => Self::Exact,
            "iexact" => Self::IExact,
            "contains" => Self::Contains,
            "icontains" => Self::IContains,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "startswith" => Self::StartsWith,
            "istartswith" => Self::IStartsWith,
            "endswith" => Self::EndsWith,
            "iendswith" => Self::IEndsWith,
            "in" => Self::In,
            "isnull" => Self::IsNull,
            "order" => Self::Order,
            "left" => Self::LeftJoin,
            "inner" => Self::InnerJoin,
            _ => return None,
        };
        Some(lookup)
    }
}

/// A parsed `search` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTag {
    /// Raw `type` value.
    pub kind: String,
    /// Column the predicate applies to.
    pub column: String,
    /// Table qualifying the column (the parent table for joins).
    pub table: String,
    /// Join columns: `on[0]` on the joined table, `on[1]` on the parent table.
    pub on: Vec<String>,
    /// Table being joined.
    pub join: String,
}

impl SearchTag {
    /// Parse a raw tag string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut tag = Self::default();

        for segment in raw.split(';') {
            let mut parts = segment.splitn(2, ':');
            let key = parts.next().unwrap_or_default().trim();
            let Some(value) = parts.next().map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };

            match key {
                "type" => tag.kind = value.to_string(),
                "column" => tag.column = value.to_string(),
                "table" => tag.table = value.to_string(),
                // `on:a,b` and the older `on:a:b` spelling are both accepted
                "on" => {
                    tag.on = value
                        .split([',', ':'])
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(ToString::to_string)
                        .collect();
                }
                "join" => tag.join = value.to_string(),
                _ => {}
            }
        }

        tag
    }

    /// The lookup named by the `type` key, if recognised.
    #[must_use]
    pub fn lookup(&self) -> Option<Lookup> {
        Lookup::parse(&self.kind)
    }
}
