use super::{group::group_term, join::join_term};
use crate::{
    Any, Array, Bool, Datum, Document, Expr, Foldable, IntoExpr, JoinKind, Kind,
    Nullable, Number, Numeric, QueryError, Result, Sequence, Shape, Stream, Term, TermType, Value,
    func1, func2,
};

/// Sort key of [`Finite::order_by`].
#[derive(Debug, Clone)]
pub enum Order {
    Asc(Term),
    Desc(Term),
}

impl Order {
    /// Ascending on the value computed from each element.
    pub fn asc_by<S: Shape, R: Foldable>(f: impl FnOnce(Expr<S>) -> R) -> Result<Order> {
        Ok(Order::Asc(func1(f)?.0))
    }

    /// Descending on the value computed from each element.
    pub fn desc_by<S: Shape, R: Foldable>(f: impl FnOnce(Expr<S>) -> R) -> Result<Order> {
        Ok(Order::Desc(func1(f)?.0))
    }

    fn into_term(self) -> Term {
        match self {
            Order::Asc(v) => Term::new(TermType::Asc, vec![v], Kind::Any),
            Order::Desc(v) => Term::new(TermType::Desc, vec![v], Kind::Any),
        }
    }
}

/// Ascending on a field.
pub fn asc(field: &str) -> Order {
    Order::Asc(Term::datum(field))
}

/// Descending on a field.
pub fn desc(field: &str) -> Order {
    Order::Desc(Term::datum(field))
}

impl From<&str> for Order {
    fn from(value: &str) -> Self {
        asc(value)
    }
}

/// Operations that need the whole sequence: ordering, slicing, aggregation, joins and grouping.
///
/// Live feeds do not implement it, an unbounded sequence can be neither sorted nor counted.
pub trait Finite: Sequence {
    /// Sort by the keys in order, ties are broken by the following keys.
    fn order_by(&self, keys: impl IntoIterator<Item = impl Into<Order>>) -> Self::Narrowed {
        let keys = keys.into_iter().map(|v| v.into().into_term());
        self.narrowed(self.wrap_term(TermType::OrderBy, keys))
    }

    fn limit(&self, count: usize) -> Self::Narrowed {
        self.narrowed(self.wrap_term(TermType::Limit, [Term::datum(count)]))
    }

    fn skip(&self, count: usize) -> Self::Narrowed {
        self.narrowed(self.wrap_term(TermType::Skip, [Term::datum(count)]))
    }

    /// Elements in `[start, end)`.
    fn slice(&self, start: usize, end: usize) -> Self::Narrowed {
        self.narrowed(self.wrap_term(
            TermType::Slice,
            [Term::datum(start), Term::datum(end)],
        ))
    }

    /// Element at `index`, negative indexes count from the end.
    fn nth(&self, index: i64) -> Datum<Self::Item> {
        Datum::from_term(self.wrap_term_kind(
            TermType::Nth,
            [Term::datum(index)],
            <Self::Item as Shape>::kind(),
        ))
    }

    fn count(&self) -> Datum<Number> {
        Datum::from_term(self.wrap_term_kind(TermType::Count, [], Kind::Number))
    }

    fn is_empty(&self) -> Datum<Bool> {
        Datum::from_term(self.wrap_term_kind(TermType::IsEmpty, [], Kind::Bool))
    }

    fn contains(&self, value: impl IntoExpr<Self::Item>) -> Datum<Bool> {
        Datum::from_term(self.wrap_term_kind(
            TermType::Contains,
            [value.into_expr().into_term()],
            Kind::Bool,
        ))
    }

    /// Unique elements, ascending.
    fn distinct(&self) -> Stream<Self::Item> {
        Stream::from_term(self.wrap_term(TermType::Distinct, []))
    }

    /// Elements of both sequences, this one first.
    fn union<O: Finite<Item = Self::Item>>(&self, other: &O) -> Stream<Self::Item> {
        Stream::from_term(self.wrap_term(TermType::Union, [other.term().clone()]))
    }

    /// Fold the elements pairwise, an empty sequence is an error on the server.
    fn reduce<R: Foldable<Shape = Self::Item>>(
        &self,
        f: impl FnOnce(Expr<Self::Item>, Expr<Self::Item>) -> R,
    ) -> Result<Datum<Self::Item>> {
        let (func, _) = func2(f)?;
        Ok(Datum::from_term(self.wrap_term_kind(
            TermType::Reduce,
            [func],
            <Self::Item as Shape>::kind(),
        )))
    }

    /// The whole sequence as a single array value.
    fn coerce_to_array(&self) -> Datum<Array<Self::Item>> {
        Datum::from_term(self.wrap_term_kind(
            TermType::CoerceToArray,
            [],
            <Array<Self::Item> as Shape>::kind(),
        ))
    }

    fn sum(&self) -> Datum<Number>
    where
        Self::Item: Numeric,
    {
        Datum::from_term(self.wrap_term_kind(TermType::Sum, [], Kind::Number))
    }

    /// Arithmetic mean, null when the sequence is empty.
    fn avg(&self) -> Datum<Nullable<Number>>
    where
        Self::Item: Numeric,
    {
        Datum::from_term(self.wrap_term_kind(
            TermType::Avg,
            [],
            <Nullable<Number> as Shape>::kind(),
        ))
    }

    /// Smallest element of a numeric sequence, use [`Finite::min_by`] for documents.
    ///
    /// ```compile_fail
    /// use quarry_core::{Document, Finite, Sequence, Str, table};
    /// let names = table::<Document>("users")
    ///     .map(|v| v.field::<Str>("name"))
    ///     .unwrap();
    /// names.min();
    /// ```
    fn min(&self) -> Datum<Self::Item>
    where
        Self::Item: Numeric,
    {
        Datum::from_term(self.wrap_term_kind(
            TermType::Min,
            [],
            <Self::Item as Shape>::kind(),
        ))
    }

    fn max(&self) -> Datum<Self::Item>
    where
        Self::Item: Numeric,
    {
        Datum::from_term(self.wrap_term_kind(
            TermType::Max,
            [],
            <Self::Item as Shape>::kind(),
        ))
    }

    /// Sum of a field of every element, the field must be numeric.
    fn sum_by(&self, field: &str) -> Result<Datum<Number>> {
        self.check_field("sum", field, Kind::Number)?;
        Ok(Datum::from_term(self.wrap_term_kind(
            TermType::Sum,
            [Term::datum(field)],
            Kind::Number,
        )))
    }

    /// Mean of a field of every element, the field must be numeric.
    fn avg_by(&self, field: &str) -> Result<Datum<Nullable<Number>>> {
        self.check_field("avg", field, Kind::Number)?;
        Ok(Datum::from_term(self.wrap_term_kind(
            TermType::Avg,
            [Term::datum(field)],
            <Nullable<Number> as Shape>::kind(),
        )))
    }

    /// Element with the smallest value of a field.
    fn min_by(&self, field: &str) -> Result<Datum<Self::Item>> {
        self.check_field("min", field, Kind::Any)?;
        Ok(Datum::from_term(self.wrap_term_kind(
            TermType::Min,
            [Term::datum(field)],
            <Self::Item as Shape>::kind(),
        )))
    }

    /// Element with the largest value of a field.
    fn max_by(&self, field: &str) -> Result<Datum<Self::Item>> {
        self.check_field("max", field, Kind::Any)?;
        Ok(Datum::from_term(self.wrap_term_kind(
            TermType::Max,
            [Term::datum(field)],
            <Self::Item as Shape>::kind(),
        )))
    }

    /// Fails when elements are not objects or when `field` cannot be of kind `expected`.
    #[doc(hidden)]
    fn check_field(&self, operation: &'static str, field: &str, expected: Kind) -> Result<()> {
        let element = <Self::Item as Shape>::kind();
        let Some(found) = element.field() else {
            return Err(QueryError::type_mismatch(
                operation,
                Kind::Object(Box::new(expected)),
                element,
            )
            .into());
        };
        if !found.conforms_to(&expected) {
            log::debug!("Field `{field}` of {element} is not {expected}");
            return Err(QueryError::type_mismatch(operation, expected, found).into());
        }
        Ok(())
    }

    /// Pair each element with every element of `right`, no predicate.
    fn cross_join<J: JoinSource, M: Foldable>(
        &self,
        right: J,
        mapper: impl FnOnce(Expr<Self::Item>, Expr<J::Item>) -> M,
    ) -> Result<Stream<M::Shape>> {
        join_term(
            JoinKind::Cross,
            self.term(),
            right.into_source(),
            None::<fn(Expr<Self::Item>, Expr<J::Item>) -> Expr<Bool>>,
            mapper,
        )
        .map(Stream::from_term)
    }

    /// Pairs for which the predicate holds.
    fn inner_join<J: JoinSource, P: Foldable<Shape = Bool>, M: Foldable>(
        &self,
        right: J,
        predicate: impl FnOnce(Expr<Self::Item>, Expr<J::Item>) -> P,
        mapper: impl FnOnce(Expr<Self::Item>, Expr<J::Item>) -> M,
    ) -> Result<Stream<M::Shape>> {
        join_term(
            JoinKind::Inner,
            self.term(),
            right.into_source(),
            Some(predicate),
            mapper,
        )
        .map(Stream::from_term)
    }

    /// Matching pairs, plus every unmatched left element paired with null.
    fn left_join<J: JoinSource, P: Foldable<Shape = Bool>, M: Foldable>(
        &self,
        right: J,
        predicate: impl FnOnce(Expr<Self::Item>, Expr<J::Item>) -> P,
        mapper: impl FnOnce(Expr<Self::Item>, Expr<Nullable<J::Item>>) -> M,
    ) -> Result<Stream<M::Shape>> {
        join_term(
            JoinKind::Left,
            self.term(),
            right.into_source(),
            Some(predicate),
            mapper,
        )
        .map(Stream::from_term)
    }

    /// Only the unmatched left elements, paired with null.
    fn left_excl_join<J: JoinSource, P: Foldable<Shape = Bool>, M: Foldable>(
        &self,
        right: J,
        predicate: impl FnOnce(Expr<Self::Item>, Expr<J::Item>) -> P,
        mapper: impl FnOnce(Expr<Self::Item>, Expr<Nullable<J::Item>>) -> M,
    ) -> Result<Stream<M::Shape>> {
        join_term(
            JoinKind::LeftExcl,
            self.term(),
            right.into_source(),
            Some(predicate),
            mapper,
        )
        .map(Stream::from_term)
    }

    /// Matching pairs, plus every unmatched right element paired with null.
    fn right_join<J: JoinSource, P: Foldable<Shape = Bool>, M: Foldable>(
        &self,
        right: J,
        predicate: impl FnOnce(Expr<Self::Item>, Expr<J::Item>) -> P,
        mapper: impl FnOnce(Expr<Nullable<Self::Item>>, Expr<J::Item>) -> M,
    ) -> Result<Stream<M::Shape>> {
        join_term(
            JoinKind::Right,
            self.term(),
            right.into_source(),
            Some(predicate),
            mapper,
        )
        .map(Stream::from_term)
    }

    /// Only the unmatched right elements, paired with null.
    fn right_excl_join<J: JoinSource, P: Foldable<Shape = Bool>, M: Foldable>(
        &self,
        right: J,
        predicate: impl FnOnce(Expr<Self::Item>, Expr<J::Item>) -> P,
        mapper: impl FnOnce(Expr<Nullable<Self::Item>>, Expr<J::Item>) -> M,
    ) -> Result<Stream<M::Shape>> {
        join_term(
            JoinKind::RightExcl,
            self.term(),
            right.into_source(),
            Some(predicate),
            mapper,
        )
        .map(Stream::from_term)
    }

    /// Matching pairs, plus the unmatched elements of both sides paired with null.
    fn full_outer_join<J: JoinSource, P: Foldable<Shape = Bool>, M: Foldable>(
        &self,
        right: J,
        predicate: impl FnOnce(Expr<Self::Item>, Expr<J::Item>) -> P,
        mapper: impl FnOnce(Expr<Nullable<Self::Item>>, Expr<Nullable<J::Item>>) -> M,
    ) -> Result<Stream<M::Shape>> {
        join_term(
            JoinKind::FullOuter,
            self.term(),
            right.into_source(),
            Some(predicate),
            mapper,
        )
        .map(Stream::from_term)
    }

    /// Only the unmatched elements of both sides, paired with null.
    fn full_excl_join<J: JoinSource, P: Foldable<Shape = Bool>, M: Foldable>(
        &self,
        right: J,
        predicate: impl FnOnce(Expr<Self::Item>, Expr<J::Item>) -> P,
        mapper: impl FnOnce(Expr<Nullable<Self::Item>>, Expr<Nullable<J::Item>>) -> M,
    ) -> Result<Stream<M::Shape>> {
        join_term(
            JoinKind::FullExcl,
            self.term(),
            right.into_source(),
            Some(predicate),
            mapper,
        )
        .map(Stream::from_term)
    }

    /// Partition by the value of `field`, the mapper runs once per distinct key with the
    /// members of the group and the key.
    fn group<K: Shape, M: Foldable>(
        &self,
        field: &str,
        mapper: impl FnOnce(Stream<Self::Item>, Expr<K>) -> M,
    ) -> Result<Stream<M::Shape>> {
        group_term(self.term(), vec![field.to_string()], mapper).map(Stream::from_term)
    }

    /// Partition by several fields, the key is an object with the fields in order.
    fn group_by<M: Foldable>(
        &self,
        fields: &[&str],
        mapper: impl FnOnce(Stream<Self::Item>, Expr<Document>) -> M,
    ) -> Result<Stream<M::Shape>> {
        group_term(
            self.term(),
            fields.iter().map(|v| v.to_string()).collect(),
            mapper,
        )
        .map(Stream::from_term)
    }
}

/// Right side of a join.
pub trait JoinSource {
    type Item: Shape;
    fn into_source(self) -> Term;
}

impl<T: Finite> JoinSource for &T {
    type Item = T::Item;
    fn into_source(self) -> Term {
        self.term().clone()
    }
}

impl<S: Shape> JoinSource for Expr<Array<S>> {
    type Item = S;
    fn into_source(self) -> Term {
        self.into_term()
    }
}

impl<S: Shape> JoinSource for Datum<Array<S>> {
    type Item = S;
    fn into_source(self) -> Term {
        self.into_term()
    }
}

/// Eagerly supplied documents.
impl JoinSource for Vec<Value> {
    type Item = Any;
    fn into_source(self) -> Term {
        Term::datum(Value::Array(self))
    }
}
