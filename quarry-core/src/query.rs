use crate::{Term, Value, truncate_long};
use std::fmt::{self, Display};

/// Options scoped to one submission.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Database used by tables referenced without one, overrides the connection default.
    pub db: Option<String>,
}

/// A finished expression tree ready to be handed to an [`Executor`](crate::Executor).
#[derive(Debug, Clone)]
pub struct Query {
    pub term: Term,
    pub options: RunOptions,
}

impl Query {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            options: Default::default(),
        }
    }

    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.options.db = Some(db.into());
        self
    }
}

impl From<Term> for Query {
    fn from(value: Term) -> Self {
        Query::new(value)
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let printed = self.term.to_string();
        write!(f, "{}", truncate_long!(printed))
    }
}

/// Item produced by [`Executor::run`](crate::Executor::run).
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// The whole result of a query evaluating to a single value.
    Atom(Value),
    /// One element of a sequence or of a changefeed.
    Element(Value),
}

impl QueryResult {
    pub fn into_value(self) -> Value {
        match self {
            QueryResult::Atom(v) | QueryResult::Element(v) => v,
        }
    }
}
