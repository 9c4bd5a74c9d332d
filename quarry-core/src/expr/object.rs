use crate::{
    Any, Array, Bool, Expr, IntoExpr, Kind, Object, Result, Shape, Str, Template, Term, TermType,
};

impl<T: Shape> Expr<Object<T>> {
    /// Field `key`, a missing field is an error on the server unless defaulted.
    pub fn get(&self, key: &str) -> Expr<T> {
        self.wrap(TermType::GetField, [Term::datum(key)])
    }

    /// Field `key` declaring its shape.
    pub fn field<S: Shape>(&self, key: &str) -> Expr<S> {
        self.wrap(TermType::GetField, [Term::datum(key)])
    }

    pub fn has_fields(&self, fields: &[&str]) -> Expr<Bool> {
        self.wrap(TermType::HasFields, fields.iter().map(|v| Term::datum(*v)))
    }

    pub fn keys(&self) -> Expr<Array<Str>> {
        self.wrap(TermType::Keys, [])
    }

    pub fn values(&self) -> Expr<Array<T>> {
        self.wrap(TermType::Values, [])
    }

    /// Only the listed fields.
    pub fn pluck(&self, fields: &[&str]) -> Expr<Object<T>> {
        self.wrap(TermType::Pluck, fields.iter().map(|v| Term::datum(*v)))
    }

    /// Every field but the listed ones.
    pub fn without(&self, fields: &[&str]) -> Expr<Object<T>> {
        self.wrap(TermType::Without, fields.iter().map(|v| Term::datum(*v)))
    }

    /// Recursively merge `other` on top of this object.
    pub fn merge(&self, other: impl Into<Template>) -> Result<Expr<Object<Any>>> {
        let other = other.into().fold()?;
        Ok(self.wrap_kind(
            TermType::Merge,
            [other],
            Kind::Object(Box::new(Kind::Any)),
        ))
    }

    /// Same as [`Expr::merge`] when the other object has the same field shape.
    pub fn merge_with(&self, other: impl IntoExpr<Object<T>>) -> Expr<Object<T>> {
        self.wrap(TermType::Merge, [other.into_expr().into_term()])
    }
}
