use sea_query::{
    Alias, ColumnRef, IntoIden, MysqlQueryBuilder, Order, PostgresQueryBuilder, Value, Values,
};

use crate::condition::Condition;
use crate::dialect::Dialect;
use crate::resolve::resolve;
use crate::search::Search;

/// A rendered statement with its bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// SQL text with dialect placeholders (`?` for MySQL, `$n` for PostgreSQL).
    pub sql: String,
    /// Values bound to the placeholders, in order.
    pub values: Values,
}

/// Builder for SELECT statements filtered by search structs.
///
/// ```ignore
/// let query = SearchQuery::new(Dialect::Postgres, "users")
///     .search(&filter)
///     .paginate(20, 3)
///     .sort_by("created_at", true)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct SearchQuery {
    dialect: Dialect,
    table: String,
    columns: Vec<String>,
    condition: Condition,
    limit: Option<u64>,
    offset: Option<u64>,
    order: Vec<(ColumnRef, Order)>,
}

impl SearchQuery {
    /// Creates a builder selecting every column of `table`.
    #[must_use]
    pub fn new(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            table: table.into(),
            columns: Vec::new(),
            condition: Condition::new(),
            limit: None,
            offset: None,
            order: Vec::new(),
        }
    }

    /// Restricts the projection to the given columns of the main table.
    #[must_use]
    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Resolves a search struct into the builder's condition.
    #[must_use]
    pub fn search<S: Search>(mut self, filter: &S) -> Self {
        resolve(self.dialect, filter, &mut self.condition);
        self
    }

    /// Replaces the condition with one resolved elsewhere.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Adds a keyword match across `columns`. An empty key is ignored.
    #[must_use]
    pub fn keyword(mut self, columns: &[&str], key: &str) -> Self {
        if let Some((sql, values)) = keyword(self.dialect, &self.table, columns, key) {
            self.condition.push_where(sql, values);
        }
        self
    }

    /// Sets the maximum number of rows to return.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Selects page `index` (1-based) of `size` rows.
    ///
    /// Indexes below 1 select the first page.
    #[must_use]
    pub fn paginate(mut self, size: u64, index: i64) -> Self {
        let page = u64::try_from(index.saturating_sub(1)).unwrap_or_default();
        self.offset = Some(page.saturating_mul(size));
        self.limit = Some(size);
        self
    }

    /// Adds an ORDER BY on `column`, which may be `table.column`.
    ///
    /// An empty column is ignored, so the result of
    /// [`sort_column`](crate::sort_column) can be passed through unchanged.
    #[must_use]
    pub fn sort_by(mut self, column: &str, descending: bool) -> Self {
        if column.is_empty() {
            return self;
        }
        let column = match column.split_once('.') {
            Some((table, column)) => table_column(table, column),
            None => table_column(&self.table, column),
        };
        let order = if descending { Order::Desc } else { Order::Asc };
        self.order.push((column, order));
        self
    }

    /// Builds the SELECT statement for the builder's dialect.
    #[must_use]
    pub fn build(self) -> Query {
        let mut statement = sea_query::Query::select();

        if self.columns.is_empty() {
            statement.column(ColumnRef::TableAsterisk(Alias::new(&self.table).into_iden()));
        } else {
            for column in &self.columns {
                statement.column(table_column(&self.table, column));
            }
        }

        statement.from(Alias::new(&self.table));
        self.condition.apply(self.dialect, &mut statement);

        for (column, order) in self.order {
            statement.order_by(column, order);
        }

        if let Some(limit) = self.limit {
            statement.limit(limit);
        }

        if let Some(offset) = self.offset {
            statement.offset(offset);
        }

        let (sql, values) = match self.dialect {
            Dialect::Mysql => statement.build(MysqlQueryBuilder),
            Dialect::Postgres => statement.build(PostgresQueryBuilder),
        };

        tracing::debug!(
            table = %self.table,
            dialect = %self.dialect,
            sql = %sql,
            param_count = values.0.len(),
            "SearchQuery generated SQL"
        );

        Query { sql, values }
    }
}

/// Builds a keyword match over a table.
///
/// MySQL concatenates `columns` and matches `%key%` with `LIKE`; PostgreSQL
/// casts the whole row to text and matches `key` as a regular expression.
/// Returns `None` for an empty key, or for MySQL when no columns are given.
#[must_use]
pub fn keyword(
    dialect: Dialect, table: &str, columns: &[&str], key: &str,
) -> Option<(String, Vec<Value>)> {
    if key.is_empty() {
        return None;
    }

    match dialect {
        Dialect::Mysql => {
            if columns.is_empty() {
                tracing::debug!(table, "keyword search skipped: no columns");
                return None;
            }
            let columns =
                columns.iter().map(|c| dialect.column(table, c)).collect::<Vec<_>>().join(", ");
            Some((format!("concat({columns}) LIKE ?"), vec![Value::from(format!("%{key}%"))]))
        }
        Dialect::Postgres => Some((
            format!("CAST({} AS text) ~ ?", dialect.quote(table)),
            vec![Value::from(key.to_string())],
        )),
    }
}

pub fn table_column(table: &str, column: &str) -> ColumnRef {
    if table.is_empty() {
        return ColumnRef::Column(Alias::new(column).into_iden());
    }
    ColumnRef::TableColumn(Alias::new(table).into_iden(), Alias::new(column).into_iden())
}
