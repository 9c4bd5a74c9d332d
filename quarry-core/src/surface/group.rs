use crate::{Expr, Foldable, Kind, QueryError, Result, Shape, Stream, Term, TermType, func2};

/// Build a `GROUP` node with arguments `[source, mapper]`.
///
/// A single field key is declared with shape `K`, it must agree with the field kind of the
/// elements. Several fields give an object key.
pub(crate) fn group_term<S, K, M>(
    source: &Term,
    fields: Vec<String>,
    mapper: impl FnOnce(Stream<S>, Expr<K>) -> M,
) -> Result<Term>
where
    S: Shape,
    K: Shape,
    M: Foldable,
{
    let element = S::kind();
    let Some(field) = element.field() else {
        return Err(QueryError::type_mismatch(
            "group",
            Kind::Object(Box::new(Kind::Any)),
            element,
        )
        .into());
    };
    let key = if fields.len() == 1 {
        field
    } else {
        Kind::Object(Box::new(field))
    };
    if !key.conforms_to(&K::kind()) {
        return Err(QueryError::type_mismatch("group", K::kind(), key).into());
    }
    let (func, element) = func2(mapper)?;
    Ok(Term::new(
        TermType::Group(fields),
        vec![source.clone(), func],
        Kind::Array(Box::new(element)),
    ))
}
