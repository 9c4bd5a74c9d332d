use crate::Kind;
use thiserror::Error;

/// Typed failures produced while composing or running a query.
///
/// Every function in the workspace returns [`crate::Result`], an `anyhow` result. The variants
/// below travel inside it and can be recovered with `error.downcast_ref::<QueryError>()`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The operation is not part of the capability set of the declared shape.
    #[error("`{operation}` expects {expected} but the expression is {found}")]
    TypeMismatch {
        operation: &'static str,
        expected: Kind,
        found: Kind,
    },
    /// Template folding exceeded the nesting guard.
    #[error("expression nesting exceeds the limit of {limit} levels")]
    ExpressionTooDeep { limit: usize },
    /// The consumer of a changefeed did not keep up with the server.
    #[error("changefeed queue overflowed its limit of {limit} pending changes")]
    QueueOverflow { limit: usize },
    /// The server rejected or failed the submitted tree.
    #[error("query failed on the server: {0}")]
    RemoteQuery(String),
    /// Primary key collision while inserting with `Conflict::Error`.
    #[error("primary key conflict: {0}")]
    Conflict(String),
    /// Connection level failure.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl QueryError {
    pub fn type_mismatch(operation: &'static str, expected: Kind, found: Kind) -> Self {
        QueryError::TypeMismatch {
            operation,
            expected,
            found,
        }
    }
}
