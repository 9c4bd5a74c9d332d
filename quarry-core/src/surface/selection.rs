use super::{collect_as, fetch_as, impl_surface_conversions};
use crate::{
    Array, AsValue, Cursor, Executor, Expr, Finite, Foldable, Mutable, Nullable, Result, Sequence,
    Shape, Stream, Surface, Template, Term,
};
use std::{
    fmt::{self, Debug, Display, Formatter},
    marker::PhantomData,
    ops::Deref,
};

/// A finite sequence of documents still bound to their table, writable.
pub struct Selection<S> {
    term: Term,
    shape: PhantomData<fn() -> S>,
}

impl<S: Shape> Selection<S> {
    pub fn from_term(term: Term) -> Self {
        Self {
            term,
            shape: PhantomData,
        }
    }

    pub fn into_term(self) -> Term {
        self.term
    }

    /// Forget the table binding.
    pub fn into_stream(self) -> Stream<S> {
        Stream::from_term(self.term)
    }

    pub async fn run<E: Executor>(&self, executor: &mut E) -> Result<Vec<S::Output>> {
        collect_as(executor, self.query()).await
    }

    pub fn fetch<'e, E: Executor>(&self, executor: &'e mut E) -> Cursor<'e, S::Output> {
        fetch_as(executor, self.query())
    }
}

impl<S: Shape> Surface for Selection<S> {
    type Item = S;
    fn term(&self) -> &Term {
        &self.term
    }
}

impl<S: Shape> Sequence for Selection<S> {
    type Narrowed = Selection<S>;
    type Mapped<U: Shape> = Stream<U>;

    fn narrowed(&self, term: Term) -> Self::Narrowed {
        Selection::from_term(term)
    }

    fn mapped<U: Shape>(&self, term: Term) -> Self::Mapped<U> {
        Stream::from_term(term)
    }
}

impl<S: Shape> Finite for Selection<S> {}

impl<S: Shape> Mutable for Selection<S> {}

impl_surface_conversions!(Selection => Array<S>);

impl<S> Clone for Selection<S> {
    fn clone(&self) -> Self {
        Self {
            term: self.term.clone(),
            shape: PhantomData,
        }
    }
}

impl<S> Debug for Selection<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selection").field(&self.term).finish()
    }
}

impl<S> Display for Selection<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.term, f)
    }
}

/// A single document looked up by primary key, writable.
///
/// Evaluates to null when no document has the key.
pub struct SingleSelection<S> {
    expr: Expr<S>,
}

impl<S: Shape> SingleSelection<S> {
    pub fn from_term(term: Term) -> Self {
        Self {
            expr: Expr::from_term(term),
        }
    }

    pub fn into_term(self) -> Term {
        self.expr.into_term()
    }

    /// The document, `None` when it does not exist.
    pub async fn run<E: Executor>(&self, executor: &mut E) -> Result<Option<S::Output>> {
        let value = executor.execute(self.query()).await?;
        Option::<S::Output>::try_from_value(value)
    }
}

impl<S: Shape> Surface for SingleSelection<S> {
    type Item = S;
    fn term(&self) -> &Term {
        self.expr.term()
    }
}

impl<S: Shape> Mutable for SingleSelection<S> {}

impl<S> Deref for SingleSelection<S> {
    type Target = Expr<S>;
    fn deref(&self) -> &Self::Target {
        &self.expr
    }
}

impl<S: Shape> Foldable for SingleSelection<S> {
    type Shape = Nullable<S>;
    fn fold(self) -> Result<Term> {
        Ok(self.into_term())
    }
}

impl<S: Shape> From<SingleSelection<S>> for Template {
    fn from(value: SingleSelection<S>) -> Self {
        Template::Proxy(value.into_term())
    }
}

impl<S> Clone for SingleSelection<S> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
        }
    }
}

impl<S> Debug for SingleSelection<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SingleSelection").field(&self.expr).finish()
    }
}
