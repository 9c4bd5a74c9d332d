use crate::{AsValue, Executor, Expr, Result, Shape, Surface, Term};
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::Deref,
};

/// A single logical value, runnable.
///
/// Dereferences to the [`Expr`] proxy so that the whole capability set of `S` stays available
/// while chaining.
pub struct Datum<S> {
    expr: Expr<S>,
}

impl<S: Shape> Datum<S> {
    pub fn from_term(term: Term) -> Self {
        Self {
            expr: Expr::from_term(term),
        }
    }

    pub fn into_term(self) -> Term {
        self.expr.into_term()
    }

    pub fn into_expr(self) -> Expr<S> {
        self.expr
    }

    /// Submit the tree and decode the settled result.
    pub async fn run<E: Executor>(&self, executor: &mut E) -> Result<S::Output> {
        let value = executor.execute(self.query()).await?;
        S::Output::try_from_value(value)
    }
}

impl<S: Shape> Surface for Datum<S> {
    type Item = S;
    fn term(&self) -> &Term {
        self.expr.term()
    }
}

impl<S> Clone for Datum<S> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
        }
    }
}

impl<S> Deref for Datum<S> {
    type Target = Expr<S>;
    fn deref(&self) -> &Self::Target {
        &self.expr
    }
}

impl<S: Shape> From<Expr<S>> for Datum<S> {
    fn from(value: Expr<S>) -> Self {
        Self { expr: value }
    }
}

impl<S> Debug for Datum<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.expr, f)
    }
}

impl<S> Display for Datum<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.expr, f)
    }
}
