mod database;
mod datum;
mod feed;
mod finite;
mod group;
mod join;
mod mutable;
mod selection;
mod sequence;
mod stream;
mod table;

pub use database::*;
pub use datum::*;
pub use feed::*;
pub use finite::*;
pub use mutable::*;
pub use selection::*;
pub use sequence::*;
pub use stream::*;
pub use table::*;

use crate::{
    AsValue, Cursor, Executor, Kind, Query, Result, Shape, Term, TermType,
    stream::{StreamExt, TryStreamExt},
};

/// Anything that wraps a finished or partial expression tree.
pub trait Surface {
    /// Shape of the value, or of each element for sequences.
    type Item: Shape;

    fn term(&self) -> &Term;

    /// The tree ready to be submitted.
    fn query(&self) -> Query {
        Query::new(self.term().clone())
    }

    /// New node with this surface as the first argument, keeping its kind.
    #[doc(hidden)]
    fn wrap_term(&self, term_type: TermType, args: impl IntoIterator<Item = Term>) -> Term {
        let kind = self.term().kind.clone();
        self.wrap_term_kind(term_type, args, kind)
    }

    #[doc(hidden)]
    fn wrap_term_kind(
        &self,
        term_type: TermType,
        args: impl IntoIterator<Item = Term>,
        kind: Kind,
    ) -> Term {
        let mut all = vec![self.term().clone()];
        all.extend(args);
        Term::new(term_type, all, kind)
    }
}

/// Submit the query and decode each element lazily.
pub(crate) fn fetch_as<'e, T, E>(executor: &'e mut E, query: Query) -> Cursor<'e, T>
where
    T: AsValue + Send + 'e,
    E: Executor,
{
    Cursor::new(
        executor
            .fetch(query)
            .map(|v| v.and_then(T::try_from_value)),
    )
}

/// Submit the query and decode every element.
pub(crate) async fn collect_as<T, E>(executor: &mut E, query: Query) -> Result<Vec<T>>
where
    T: AsValue + Send,
    E: Executor,
{
    let values: Vec<_> = executor.fetch(query).try_collect().await?;
    values.into_iter().map(T::try_from_value).collect()
}

macro_rules! impl_surface_conversions {
    ($surface:ident => $shape:ty) => {
        impl<S: $crate::Shape> $crate::Foldable for $surface<S> {
            type Shape = $shape;
            fn fold(self) -> $crate::Result<$crate::Term> {
                Ok(self.term.clone())
            }
        }
        impl<S: $crate::Shape> $crate::Foldable for &$surface<S> {
            type Shape = $shape;
            fn fold(self) -> $crate::Result<$crate::Term> {
                Ok(self.term.clone())
            }
        }
        impl<S: $crate::Shape> From<$surface<S>> for $crate::Template {
            fn from(value: $surface<S>) -> Self {
                $crate::Template::Proxy(value.term)
            }
        }
        impl<S: $crate::Shape> From<&$surface<S>> for $crate::Template {
            fn from(value: &$surface<S>) -> Self {
                $crate::Template::Proxy(value.term.clone())
            }
        }
        impl<S: $crate::Shape> $crate::IntoExpr<$shape> for $surface<S> {
            fn into_expr(self) -> $crate::Expr<$shape> {
                $crate::Expr::from_term(self.term)
            }
        }
        impl<S: $crate::Shape> $crate::IntoExpr<$shape> for &$surface<S> {
            fn into_expr(self) -> $crate::Expr<$shape> {
                $crate::Expr::from_term(self.term.clone())
            }
        }
    };
}
pub(crate) use impl_surface_conversions;
