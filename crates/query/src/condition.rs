use std::fmt;

use sea_query::{Alias, Expr, ExprTrait, JoinType, Order, SelectStatement, SimpleExpr, Value};

use crate::dialect::Dialect;
use crate::select::table_column;

/// A WHERE (or OR) fragment with its bind values.
///
/// Fragments use `?` placeholders; they are renumbered for the target dialect
/// when the final statement is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// SQL fragment, e.g. `"users"."name" ILIKE ?`.
    pub sql: String,
    /// Values bound to the fragment's placeholders, in order.
    pub values: Vec<Value>,
}

impl Clause {
    fn into_expr(self, dialect: Dialect) -> SimpleExpr {
        match dialect {
            Dialect::Mysql => Expr::cust_with_values(self.sql, self.values),
            // SeaQuery's postgres backend only binds `$n` markers in custom expressions
            Dialect::Postgres => Expr::cust_with_values(numbered(&self.sql), self.values),
        }
    }
}

/// Rewrites `?` placeholders outside quoted text as `$1`, `$2`, ...
pub(crate) fn numbered(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut quote = None;
    let mut n = 0;

    for ch in sql.chars() {
        match (quote, ch) {
            (None, '\'' | '"' | '`') => {
                quote = Some(ch);
                out.push(ch);
            }
            (Some(open), _) if open == ch => {
                quote = None;
                out.push(ch);
            }
            (None, '?') => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            _ => out.push(ch),
        }
    }

    out
}

/// An ORDER BY fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    /// Quoted column reference.
    pub column: String,
    /// Sort direction.
    pub descending: bool,
}

impl fmt::Display for OrderClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.descending { "desc" } else { "asc" };
        write!(f, "{} {dir}", self.column)
    }
}

/// Join types produced by `left` and `inner` tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `LEFT JOIN`
    Left,
    /// `INNER JOIN`
    Inner,
}

impl JoinKind {
    /// SQL keyword for the join.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Left => "LEFT JOIN",
            Self::Inner => "INNER JOIN",
        }
    }

    const fn into_join_type(self) -> JoinType {
        match self {
            Self::Left => JoinType::LeftJoin,
            Self::Inner => JoinType::InnerJoin,
        }
    }
}

/// A join and the conditions collected from its nested search struct.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Join type.
    pub kind: JoinKind,
    /// Table being joined.
    pub table: String,
    /// Column on the joined table.
    pub local: String,
    /// Parent table.
    pub parent: String,
    /// Column on the parent table.
    pub foreign: String,
    /// Rendered join, e.g. `LEFT JOIN "roles" ON "roles"."id" = "users"."role_id"`.
    pub sql: String,
    /// Conditions scoped to this join.
    pub condition: Condition,
}

/// Accumulates WHERE, OR, ORDER and JOIN fragments during resolution.
///
/// A condition is built fresh for each query, filled by one resolution pass,
/// and consumed once by [`Condition::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    wheres: Vec<Clause>,
    ors: Vec<Clause>,
    orders: Vec<OrderClause>,
    joins: Vec<JoinClause>,
}

impl Condition {
    /// Creates an empty condition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an AND-ed fragment.
    pub fn push_where(&mut self, sql: impl Into<String>, values: Vec<Value>) {
        self.wheres.push(Clause { sql: sql.into(), values });
    }

    /// Adds an OR-ed fragment.
    pub fn push_or(&mut self, sql: impl Into<String>, values: Vec<Value>) {
        self.ors.push(Clause { sql: sql.into(), values });
    }

    /// Adds an ORDER BY column.
    pub fn push_order(&mut self, column: impl Into<String>, descending: bool) {
        self.orders.push(OrderClause {
            column: column.into(),
            descending,
        });
    }

    /// Opens a nested condition scoped to a join and returns it.
    pub fn push_join(&mut self, join: JoinClause) -> &mut Self {
        self.joins.push(join);
        let last = self.joins.len() - 1;
        &mut self.joins[last].condition
    }

    /// AND-ed fragments.
    #[must_use]
    pub fn wheres(&self) -> &[Clause] {
        &self.wheres
    }

    /// OR-ed fragments.
    #[must_use]
    pub fn ors(&self) -> &[Clause] {
        &self.ors
    }

    /// ORDER BY fragments.
    #[must_use]
    pub fn orders(&self) -> &[OrderClause] {
        &self.orders
    }

    /// Joins, in the order they were encountered.
    #[must_use]
    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    /// Whether nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wheres.is_empty()
            && self.ors.is_empty()
            && self.orders.is_empty()
            && self.joins.is_empty()
    }

    /// Applies the collected fragments to a SELECT statement.
    ///
    /// Joins are applied first, each followed by its own WHERE, OR and ORDER
    /// fragments (and any joins nested inside it), then the top-level WHERE,
    /// OR and ORDER fragments. The resulting clause order does not depend on
    /// field order in the search struct.
    pub fn apply(self, dialect: Dialect, statement: &mut SelectStatement) {
        let mut filter = None;
        self.apply_into(dialect, statement, &mut filter);
        if let Some(filter) = filter {
            statement.and_where(filter);
        }
    }

    fn apply_into(
        self, dialect: Dialect, statement: &mut SelectStatement, filter: &mut Option<SimpleExpr>,
    ) {
        for join in self.joins {
            let on = Expr::col(table_column(&join.table, &join.local))
                .equals(table_column(&join.parent, &join.foreign));
            statement.join(join.kind.into_join_type(), Alias::new(&join.table), on);
            join.condition.apply_into(dialect, statement, filter);
        }

        for clause in self.wheres {
            let expr = clause.into_expr(dialect);
            *filter = Some(match filter.take() {
                Some(current) => current.and(expr),
                None => expr,
            });
        }

        for clause in self.ors {
            let expr = clause.into_expr(dialect);
            *filter = Some(match filter.take() {
                Some(current) => current.or(expr),
                None => expr,
            });
        }

        for order in self.orders {
            let direction = if order.descending { Order::Desc } else { Order::Asc };
            statement.order_by_expr(Expr::cust(order.column), direction);
        }
    }
}
