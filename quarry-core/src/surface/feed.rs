use super::fetch_as;
use crate::{Cursor, Executor, Sequence, Shape, Surface, Term};
use std::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
};

/// Live, logically unbounded sequence of changes.
///
/// Only the operations of [`Sequence`] apply. Elements are delivered in the order the server
/// emits them, the subscription is released when the cursor is closed or dropped.
pub struct Feed<S> {
    term: Term,
    shape: PhantomData<fn() -> S>,
}

impl<S: Shape> Feed<S> {
    pub fn from_term(term: Term) -> Self {
        Self {
            term,
            shape: PhantomData,
        }
    }

    pub fn into_term(self) -> Term {
        self.term
    }

    /// Open the subscription.
    ///
    /// The cursor never ends on its own unless the server stops the feed, in which case the
    /// last item is the error that stopped it.
    pub fn subscribe<'e, E: Executor>(&self, executor: &'e mut E) -> Cursor<'e, S::Output> {
        log::debug!("Subscribing to {}", self.term);
        fetch_as(executor, self.query())
    }
}

impl<S: Shape> Surface for Feed<S> {
    type Item = S;
    fn term(&self) -> &Term {
        &self.term
    }
}

impl<S: Shape> Sequence for Feed<S> {
    type Narrowed = Feed<S>;
    type Mapped<U: Shape> = Feed<U>;

    fn narrowed(&self, term: Term) -> Self::Narrowed {
        Feed::from_term(term)
    }

    fn mapped<U: Shape>(&self, term: Term) -> Self::Mapped<U> {
        Feed::from_term(term)
    }
}

impl<S> Clone for Feed<S> {
    fn clone(&self) -> Self {
        Self {
            term: self.term.clone(),
            shape: PhantomData,
        }
    }
}

impl<S> Debug for Feed<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Feed").field(&self.term).finish()
    }
}
