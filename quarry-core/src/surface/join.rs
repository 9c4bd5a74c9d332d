use crate::{Expr, Foldable, JoinKind, Kind, Parameter, Result, Shape, Term, TermType, func2};

/// Build a `JOIN` node.
///
/// Arguments are `[left, right, predicate, mapper]`, cross joins have no predicate. The mapper
/// parameters are declared nullable on the sides that may be absent for `kind`, the predicate
/// only ever sees matched elements.
pub(crate) fn join_term<L, R, A, B, P, M>(
    kind: JoinKind,
    left: &Term,
    right: Term,
    predicate: Option<impl FnOnce(Expr<L>, Expr<R>) -> P>,
    mapper: impl FnOnce(A, B) -> M,
) -> Result<Term>
where
    L: Shape,
    R: Shape,
    A: Parameter,
    B: Parameter,
    P: Foldable,
    M: Foldable,
{
    let mut args = vec![left.clone(), right];
    if let Some(predicate) = predicate {
        let (func, _) = func2(predicate)?;
        args.push(func);
    }
    let (func, element) = func2(mapper)?;
    args.push(func);
    log::trace!("Built a {kind} join producing {element}");
    Ok(Term::new(
        TermType::Join(kind),
        args,
        Kind::Array(Box::new(element)),
    ))
}
