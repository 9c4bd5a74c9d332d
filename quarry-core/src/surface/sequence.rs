use crate::{
    Bool, Document, Expr, Foldable, Kind, Listed, Result, Shape, Surface, Template, Term,
    TermType, func1,
};

/// Operations valid on every sequence, finite or live.
///
/// Element-preserving operations return [`Sequence::Narrowed`], which keeps the table binding of
/// a selection. Operations reshaping the elements return [`Sequence::Mapped`], which drops it.
pub trait Sequence: Surface + Sized {
    /// Surface produced by operations that only drop or reorder elements.
    type Narrowed: Sequence<Item = Self::Item>;
    /// Surface produced by operations that change the elements.
    type Mapped<U: Shape>: Sequence<Item = U>;

    fn narrowed(&self, term: Term) -> Self::Narrowed;
    fn mapped<U: Shape>(&self, term: Term) -> Self::Mapped<U>;

    /// Elements for which the predicate holds.
    fn filter<R: Foldable<Shape = Bool>>(
        &self,
        predicate: impl FnOnce(Expr<Self::Item>) -> R,
    ) -> Result<Self::Narrowed> {
        let (func, _) = func1(predicate)?;
        Ok(self.narrowed(self.wrap_term(TermType::Filter, [func])))
    }

    /// Elements whose fields equal every field of `example`.
    fn filter_by(&self, example: impl Into<Template>) -> Result<Self::Narrowed> {
        let example = example.into().fold()?;
        Ok(self.narrowed(self.wrap_term(TermType::Filter, [example])))
    }

    fn map<R: Foldable>(
        &self,
        mapper: impl FnOnce(Expr<Self::Item>) -> R,
    ) -> Result<Self::Mapped<R::Shape>> {
        let (func, kind) = func1(mapper)?;
        Ok(self.mapped(self.wrap_term_kind(TermType::Map, [func], Kind::Array(Box::new(kind)))))
    }

    /// Map every element to a sequence and flatten the results.
    fn concat_map<R>(
        &self,
        mapper: impl FnOnce(Expr<Self::Item>) -> R,
    ) -> Result<Self::Mapped<<R::Shape as Listed>::Element>>
    where
        R: Foldable,
        R::Shape: Listed,
    {
        let (func, kind) = func1(mapper)?;
        let kind = Kind::Array(Box::new(kind.element().unwrap_or(Kind::Any)));
        Ok(self.mapped(self.wrap_term_kind(TermType::ConcatMap, [func], kind)))
    }

    /// Keep only the listed fields of every element.
    fn pluck(&self, fields: &[&str]) -> Self::Mapped<Self::Item> {
        self.mapped(self.wrap_term(TermType::Pluck, fields.iter().map(|v| Term::datum(*v))))
    }

    /// Drop the listed fields from every element.
    fn without(&self, fields: &[&str]) -> Self::Mapped<Self::Item> {
        self.mapped(self.wrap_term(TermType::Without, fields.iter().map(|v| Term::datum(*v))))
    }

    /// Merge `other` on top of every element.
    fn merge(&self, other: impl Into<Template>) -> Result<Self::Mapped<Document>> {
        let other = other.into().fold()?;
        Ok(self.mapped(self.wrap_term(TermType::Merge, [other])))
    }

    /// Merge the object computed from each element on top of it.
    fn merge_with<R: Foldable>(
        &self,
        f: impl FnOnce(Expr<Self::Item>) -> R,
    ) -> Result<Self::Mapped<Document>> {
        let (func, _) = func1(f)?;
        Ok(self.mapped(self.wrap_term(TermType::Merge, [func])))
    }

    /// Elements having every listed field, with a non null value.
    fn has_fields(&self, fields: &[&str]) -> Self::Narrowed {
        self.narrowed(self.wrap_term(TermType::HasFields, fields.iter().map(|v| Term::datum(*v))))
    }

    /// Elements having every listed field, plucked to those fields.
    fn with_fields(&self, fields: &[&str]) -> Self::Mapped<Self::Item> {
        self.mapped(self.wrap_term(TermType::WithFields, fields.iter().map(|v| Term::datum(*v))))
    }
}
