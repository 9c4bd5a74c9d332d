use crate::{Any, Array, Expr, IntoExpr, Nullable, Number, Object, Str, Term, TermType, Value};

impl Expr<Str> {
    /// Split on whitespace.
    pub fn split(&self) -> Expr<Array<Str>> {
        self.wrap(TermType::Split, [])
    }

    /// Split on `separator`, at most `max_splits` times when given.
    pub fn split_by(&self, separator: &str, max_splits: Option<usize>) -> Expr<Array<Str>> {
        let mut args = vec![Term::datum(separator)];
        if let Some(max) = max_splits {
            args.push(Term::datum(max));
        }
        self.wrap(TermType::Split, args)
    }

    pub fn upcase(&self) -> Expr<Str> {
        self.wrap(TermType::Upcase, [])
    }

    pub fn downcase(&self) -> Expr<Str> {
        self.wrap(TermType::Downcase, [])
    }

    /// Number of characters.
    pub fn count(&self) -> Expr<Number> {
        self.wrap(TermType::Count, [])
    }

    pub fn concat(&self, other: impl IntoExpr<Str>) -> Expr<Str> {
        self.wrap(TermType::Add, [other.into_expr().into_term()])
    }

    /// Match against a regular expression.
    ///
    /// Evaluates to null when nothing matches, else to an object with `str`, `start`, `end`
    /// and `groups`.
    pub fn match_(&self, pattern: impl IntoExpr<Str>) -> Expr<Nullable<Object<Any>>> {
        self.wrap(TermType::Match, [pattern.into_expr().into_term()])
    }

    /// Whether the regular expression matches anywhere.
    pub fn matches(&self, pattern: impl IntoExpr<Str>) -> Expr<crate::Bool> {
        self.match_(pattern)
            .wrap(TermType::Ne, [Term::datum(Value::Null)])
    }
}
