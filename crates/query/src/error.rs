use thiserror::Error;

/// Errors surfaced by the query crate.
///
/// Resolution itself never fails: unusable tags are skipped. Only caller-side
/// faults, such as naming a dialect the resolver does not know, are reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The driver tag is neither `mysql` nor `postgres`.
    #[error("unknown SQL dialect: {0}")]
    UnknownDialect(String),
}
