use crate::{Any, Bool, Expr, IntoExpr, Nullable, Object, Shape, Term, TermType, Value};

impl<T: Shape> Expr<Nullable<T>> {
    pub fn is_null(&self) -> Expr<Bool> {
        self.wrap(TermType::Eq, [Term::datum(Value::Null)])
    }

    /// Replace null with `fallback`, the result is no longer nullable.
    pub fn default(&self, fallback: impl IntoExpr<T>) -> Expr<T> {
        let fallback = fallback.into_expr().into_term();
        match null_safe_source(self.term()) {
            Some(source) => Expr::from_term(Term::new(
                TermType::Default,
                vec![source.clone(), fallback],
                T::kind(),
            )),
            None => self.wrap(TermType::Default, [fallback]),
        }
    }

    /// Treat the value as present, a null will surface as an error on the server.
    pub fn assume(self) -> Expr<T> {
        Expr::from_term(self.into_term())
    }
}

impl<T: Shape> Expr<Nullable<Object<T>>> {
    /// Field of the object, null when the object is null or lacks the field.
    pub fn get(&self, key: &str) -> Expr<Nullable<T>> {
        null_safe_field(self.term(), key)
    }

    /// Field of the object declaring its shape, null when the object is null or lacks the field.
    pub fn field<S: Shape>(&self, key: &str) -> Expr<Nullable<S>> {
        null_safe_field(self.term(), key)
    }
}

impl Expr<Nullable<Any>> {
    pub fn get(&self, key: &str) -> Expr<Nullable<Any>> {
        null_safe_field(self.term(), key)
    }
}

/// `[DEFAULT,[[GET_FIELD,[object,key]],null]]`, the server raises on a field of null.
fn null_safe_field<S: Shape>(object: &Term, key: &str) -> Expr<Nullable<S>> {
    let kind = <Nullable<S> as Shape>::kind();
    let field = Term::new(
        TermType::GetField,
        vec![object.clone(), Term::datum(key)],
        kind.clone(),
    );
    Expr::from_term(Term::new(
        TermType::Default,
        vec![field, Term::datum(Value::Null)],
        kind,
    ))
}

/// The field read of a term built by [`null_safe_field`].
fn null_safe_source(term: &Term) -> Option<&Term> {
    match (&term.term_type, term.args.as_slice()) {
        (TermType::Default, [source, fallback])
            if source.term_type == TermType::GetField
                && fallback.as_datum() == Some(&Value::Null) =>
        {
            Some(source)
        }
        _ => None,
    }
}
