use crate::{
    Any, Bool, Date, Datum, Expr, Foldable, IntoExpr, Kind, Number, Parameter, Result, Shape,
    Term, TermType, Value, fresh_variable_name,
};

/// Build a one parameter function by calling `f` with a fresh variable.
///
/// Returns the `FUNC` node and the kind of its body.
pub fn func1<A: Parameter, R: Foldable>(f: impl FnOnce(A) -> R) -> Result<(Term, Kind)> {
    let name = fresh_variable_name();
    let param = A::parameter(Term::var(name.clone(), A::kind()));
    let body = f(param).fold()?;
    let kind = body.kind.clone();
    Ok((Term::func(vec![name], body), kind))
}

/// Build a two parameter function, used by reductions and joins.
pub fn func2<A: Parameter, B: Parameter, R: Foldable>(
    f: impl FnOnce(A, B) -> R,
) -> Result<(Term, Kind)> {
    let (left, right) = (fresh_variable_name(), fresh_variable_name());
    let a = A::parameter(Term::var(left.clone(), A::kind()));
    let b = B::parameter(Term::var(right.clone(), B::kind()));
    let body = f(a, b).fold()?;
    let kind = body.kind.clone();
    Ok((Term::func(vec![left, right], body), kind))
}

/// Lift a literal, a template, or a proxy into a runnable value.
pub fn expr<F: Foldable>(value: F) -> Result<Datum<F::Shape>> {
    Ok(Datum::from_term(value.fold()?))
}

/// Free variable of shape `S`.
///
/// Only meaningful inside a function body, building one by hand is mostly useful to inspect trees.
pub fn var<S: Shape>(name: impl Into<String>) -> Expr<S> {
    Expr::from_term(Term::var(name, S::kind()))
}

/// Bind `value` to a fresh variable and call `f` with it.
///
/// The value is computed once on the server and then referenced by name inside the body.
pub fn bind<S: Shape, R: Foldable>(
    value: impl IntoExpr<S>,
    f: impl FnOnce(Expr<S>) -> R,
) -> Result<Datum<R::Shape>> {
    value.into_expr().do_(f).map(Datum::from)
}

/// Server side conditional, `then` when the condition is truthy else `otherwise`.
pub fn branch<S: Shape>(
    condition: impl IntoExpr<Bool>,
    then: impl IntoExpr<S>,
    otherwise: impl IntoExpr<S>,
) -> Datum<S> {
    Datum::from_term(Term::new(
        TermType::Branch,
        vec![
            condition.into_expr().into_term(),
            then.into_expr().into_term(),
            otherwise.into_expr().into_term(),
        ],
        S::kind(),
    ))
}

/// The server time when the query starts running.
pub fn now() -> Datum<Date> {
    Datum::from_term(Term::new(TermType::Now, Vec::new(), Kind::Date))
}

/// Date from seconds since the unix epoch.
pub fn epoch_time(seconds: impl IntoExpr<Number>) -> Datum<Date> {
    Datum::from_term(Term::new(
        TermType::EpochTime,
        vec![seconds.into_expr().into_term()],
        Kind::Date,
    ))
}

/// Literal null, usable wherever an unknown shape is accepted.
pub fn null() -> Expr<Any> {
    Expr::from_term(Term::datum(Value::Null))
}
