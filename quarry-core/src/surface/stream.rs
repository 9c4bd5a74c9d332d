use super::{collect_as, fetch_as, impl_surface_conversions};
use crate::{
    Array, Cursor, Executor, Expr, Finite, Result, Sequence, Shape, Surface, Term,
};
use std::{
    fmt::{self, Debug, Display, Formatter},
    marker::PhantomData,
};

/// Finite ordered sequence, one-shot when fetched.
pub struct Stream<S> {
    term: Term,
    shape: PhantomData<fn() -> S>,
}

impl<S: Shape> Stream<S> {
    pub fn from_term(term: Term) -> Self {
        Self {
            term,
            shape: PhantomData,
        }
    }

    pub fn into_term(self) -> Term {
        self.term
    }

    /// The sequence as an array proxy.
    pub fn as_array(&self) -> Expr<Array<S>> {
        Expr::from_term(self.term.clone())
    }

    /// Submit the tree and collect every element.
    pub async fn run<E: Executor>(&self, executor: &mut E) -> Result<Vec<S::Output>> {
        collect_as(executor, self.query()).await
    }

    /// Submit the tree and pull the elements lazily.
    pub fn fetch<'e, E: Executor>(&self, executor: &'e mut E) -> Cursor<'e, S::Output> {
        fetch_as(executor, self.query())
    }
}

impl<S: Shape> Surface for Stream<S> {
    type Item = S;
    fn term(&self) -> &Term {
        &self.term
    }
}

impl<S: Shape> Sequence for Stream<S> {
    type Narrowed = Stream<S>;
    type Mapped<U: Shape> = Stream<U>;

    fn narrowed(&self, term: Term) -> Self::Narrowed {
        Stream::from_term(term)
    }

    fn mapped<U: Shape>(&self, term: Term) -> Self::Mapped<U> {
        Stream::from_term(term)
    }
}

impl<S: Shape> Finite for Stream<S> {}

impl_surface_conversions!(Stream => Array<S>);

impl<S> Clone for Stream<S> {
    fn clone(&self) -> Self {
        Self {
            term: self.term.clone(),
            shape: PhantomData,
        }
    }
}

impl<S> Debug for Stream<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Stream").field(&self.term).finish()
    }
}

impl<S> Display for Stream<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.term, f)
    }
}
