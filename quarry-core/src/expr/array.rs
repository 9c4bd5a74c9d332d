use crate::{
    Array, Bool, Expr, Foldable, IntoExpr, Kind, Number, Numeric, Result, Shape, Term,
    TermType, func1, func2,
};

impl<T: Shape> Expr<Array<T>> {
    /// Element at `index`, negative indexes count from the end.
    pub fn nth(&self, index: impl IntoExpr<Number>) -> Expr<T> {
        self.wrap(TermType::Nth, [index.into_expr().into_term()])
    }

    pub fn contains(&self, value: impl IntoExpr<T>) -> Expr<Bool> {
        self.wrap(TermType::Contains, [value.into_expr().into_term()])
    }

    /// Elements in `[start, end)`.
    pub fn slice(
        &self,
        start: impl IntoExpr<Number>,
        end: impl IntoExpr<Number>,
    ) -> Expr<Array<T>> {
        self.wrap(
            TermType::Slice,
            [start.into_expr().into_term(), end.into_expr().into_term()],
        )
    }

    pub fn count(&self) -> Expr<Number> {
        self.wrap(TermType::Count, [])
    }

    pub fn is_empty(&self) -> Expr<Bool> {
        self.wrap(TermType::IsEmpty, [])
    }

    pub fn append(&self, value: impl IntoExpr<T>) -> Expr<Array<T>> {
        self.wrap(TermType::Append, [value.into_expr().into_term()])
    }

    pub fn union(&self, other: impl IntoExpr<Array<T>>) -> Expr<Array<T>> {
        self.wrap(TermType::Union, [other.into_expr().into_term()])
    }

    /// Unique elements in ascending order.
    pub fn distinct(&self) -> Expr<Array<T>> {
        self.wrap(TermType::Distinct, [])
    }

    pub fn map<R: Foldable>(&self, f: impl FnOnce(Expr<T>) -> R) -> Result<Expr<Array<R::Shape>>> {
        let (func, kind) = func1(f)?;
        Ok(self.wrap_kind(TermType::Map, [func], Kind::Array(Box::new(kind))))
    }

    pub fn filter<R: Foldable<Shape = Bool>>(
        &self,
        f: impl FnOnce(Expr<T>) -> R,
    ) -> Result<Expr<Array<T>>> {
        let (func, _) = func1(f)?;
        Ok(self.wrap(TermType::Filter, [func]))
    }

    /// Fold the elements pairwise, an empty array is an error on the server.
    pub fn reduce<R: Foldable<Shape = T>>(
        &self,
        f: impl FnOnce(Expr<T>, Expr<T>) -> R,
    ) -> Result<Expr<T>> {
        let (func, _) = func2(f)?;
        Ok(self.wrap(TermType::Reduce, [func]))
    }

    /// Elements that have all the fields.
    pub fn has_fields(&self, fields: &[&str]) -> Expr<Array<T>> {
        self.wrap(TermType::HasFields, fields.iter().map(|v| Term::datum(*v)))
    }
}

impl<T: Numeric> Expr<Array<T>> {
    /// Smallest element, only numeric arrays have it.
    ///
    /// ```compile_fail
    /// use quarry_core::{Array, Expr, Str, var};
    /// let words: Expr<Array<Str>> = var("w");
    /// words.min();
    /// ```
    pub fn min(&self) -> Expr<T> {
        self.wrap(TermType::Min, [])
    }

    /// Largest element, only numeric arrays have it.
    ///
    /// ```compile_fail
    /// use quarry_core::{Array, Date, Expr, var};
    /// let days: Expr<Array<Date>> = var("d");
    /// days.max();
    /// ```
    pub fn max(&self) -> Expr<T> {
        self.wrap(TermType::Max, [])
    }
}

impl Expr<Array<Number>> {
    pub fn sum(&self) -> Expr<Number> {
        self.wrap(TermType::Sum, [])
    }

    /// Arithmetic mean, null for an empty array.
    pub fn avg(&self) -> Expr<crate::Nullable<Number>> {
        self.wrap(TermType::Avg, [])
    }
}
