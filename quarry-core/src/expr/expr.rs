use crate::{
    Any, Array, Bool, Comparable, Date, Datum, Kind, Nullable, Number, Object, QueryError, Result,
    Shape, Str, Stream, Template, Term, TermType, Value,
};
use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Display, Formatter},
    marker::PhantomData,
};
use time::OffsetDateTime;

/// Lazy placeholder for the value a term evaluates to.
///
/// The operations available depend on the declared shape `S`: `Expr<Number>` has arithmetic,
/// `Expr<Array<Number>>` has `sum`, `Expr<Array<Str>>` does not. Every operation builds a new
/// node wrapping the previous one, nothing is ever evaluated on the client.
pub struct Expr<S> {
    term: Term,
    shape: PhantomData<fn() -> S>,
}

impl<S> Clone for Expr<S> {
    fn clone(&self) -> Self {
        Self {
            term: self.term.clone(),
            shape: PhantomData,
        }
    }
}

impl<S: Shape> Expr<S> {
    /// Wrap a term, the caller vouches for its shape.
    pub fn from_term(term: Term) -> Self {
        Self {
            term,
            shape: PhantomData,
        }
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn into_term(self) -> Term {
        self.term
    }

    /// New node with this expression as the first argument.
    pub(crate) fn wrap<T: Shape>(
        &self,
        term_type: TermType,
        args: impl IntoIterator<Item = Term>,
    ) -> Expr<T> {
        let mut all = vec![self.term.clone()];
        all.extend(args);
        Expr::from_term(Term::new(term_type, all, T::kind()))
    }

    pub(crate) fn wrap_kind<T: Shape>(
        &self,
        term_type: TermType,
        args: impl IntoIterator<Item = Term>,
        kind: Kind,
    ) -> Expr<T> {
        let mut all = vec![self.term.clone()];
        all.extend(args);
        Expr::from_term(Term::new(term_type, all, kind))
    }

    pub fn eq(&self, other: impl IntoExpr<S>) -> Expr<Bool> {
        self.wrap(TermType::Eq, [other.into_expr().term])
    }

    pub fn ne(&self, other: impl IntoExpr<S>) -> Expr<Bool> {
        self.wrap(TermType::Ne, [other.into_expr().term])
    }

    /// Call `f` with this value bound to its parameter.
    pub fn do_<R: Foldable>(&self, f: impl FnOnce(Expr<S>) -> R) -> Result<Expr<R::Shape>> {
        let (func, _) = crate::func1(f)?;
        Ok(Expr::from_term(Term::new(
            TermType::FuncCall,
            vec![func, self.term.clone()],
            <R::Shape as Shape>::kind(),
        )))
    }

    /// Forget the declared shape.
    pub fn any(self) -> Expr<Any> {
        Expr::from_term(self.term)
    }

    /// Declare that the value may be null.
    pub fn nullable(self) -> Expr<Nullable<S>> {
        Expr::from_term(self.term)
    }

    /// Turn the proxy into a runnable surface.
    pub fn datum(self) -> Datum<S> {
        Datum::from(self)
    }
}

impl<S: Comparable> Expr<S> {
    pub fn lt(&self, other: impl IntoExpr<S>) -> Expr<Bool> {
        self.wrap(TermType::Lt, [other.into_expr().term])
    }
    pub fn le(&self, other: impl IntoExpr<S>) -> Expr<Bool> {
        self.wrap(TermType::Le, [other.into_expr().term])
    }
    pub fn gt(&self, other: impl IntoExpr<S>) -> Expr<Bool> {
        self.wrap(TermType::Gt, [other.into_expr().term])
    }
    pub fn ge(&self, other: impl IntoExpr<S>) -> Expr<Bool> {
        self.wrap(TermType::Ge, [other.into_expr().term])
    }
}

macro_rules! impl_default {
    ($($shape:ty),+ $(,)?) => {
        $(
            impl Expr<$shape> {
                /// Value used when this one is null or does not exist.
                pub fn default(&self, fallback: impl IntoExpr<$shape>) -> Expr<$shape> {
                    self.wrap(TermType::Default, [fallback.into_expr().term])
                }
            }
        )+
    };
}
impl_default!(Bool, Number, Str, Date, Any);

impl<T: Shape> Expr<Array<T>> {
    /// Value used when this one is null or does not exist.
    pub fn default(&self, fallback: impl IntoExpr<Array<T>>) -> Expr<Array<T>> {
        self.wrap(TermType::Default, [fallback.into_expr().term])
    }
}

impl<T: Shape> Expr<Object<T>> {
    /// Value used when this one is null or does not exist.
    pub fn default(&self, fallback: impl IntoExpr<Object<T>>) -> Expr<Object<T>> {
        self.wrap(TermType::Default, [fallback.into_expr().term])
    }
}

impl Expr<Any> {
    /// Field of an object of unknown shape, declaring the shape of the field.
    pub fn field<S: Shape>(&self, key: &str) -> Expr<S> {
        self.wrap(TermType::GetField, [Term::datum(key)])
    }

    pub fn get(&self, key: &str) -> Expr<Any> {
        self.field(key)
    }

    pub fn has_fields(&self, fields: &[&str]) -> Expr<Bool> {
        self.wrap(TermType::HasFields, fields.iter().map(|v| Term::datum(*v)))
    }

    /// Declare the shape of this value, the declared shape must agree with what the tree says.
    pub fn cast<S: Shape>(self) -> Result<Expr<S>> {
        let expected = S::kind();
        if !self.term.kind.conforms_to(&expected) {
            return Err(QueryError::type_mismatch("cast", expected, self.term.kind.clone()).into());
        }
        Ok(Expr::from_term(self.term))
    }
}

impl<S> Debug for Expr<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.term, f)
    }
}

impl<S> Display for Expr<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.term, f)
    }
}

/// Conversion of a literal or a proxy into an expression of shape `S`.
pub trait IntoExpr<S: Shape> {
    fn into_expr(self) -> Expr<S>;
}

impl<S: Shape> IntoExpr<S> for Expr<S> {
    fn into_expr(self) -> Expr<S> {
        self
    }
}

impl<S: Shape> IntoExpr<S> for &Expr<S> {
    fn into_expr(self) -> Expr<S> {
        self.clone()
    }
}

impl<S: Shape> IntoExpr<S> for Datum<S> {
    fn into_expr(self) -> Expr<S> {
        Expr::from_term(self.into_term())
    }
}

macro_rules! impl_into_expr {
    ($shape:ty => $($source:ty),+ $(,)?) => {
        $(
            impl IntoExpr<$shape> for $source {
                fn into_expr(self) -> Expr<$shape> {
                    Expr::from_term(Term::datum(self))
                }
            }
        )+
    };
}
impl_into_expr!(Number => f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_into_expr!(Str => &str, String);
impl_into_expr!(Bool => bool);
impl_into_expr!(Date => OffsetDateTime);
impl_into_expr!(Any => Value, f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, &str, String, bool, OffsetDateTime);

impl<T: Shape, V: IntoExpr<T>> IntoExpr<Array<T>> for Vec<V> {
    fn into_expr(self) -> Expr<Array<T>> {
        Expr::from_term(Term::make_array(
            self.into_iter().map(|v| v.into_expr().term).collect(),
        ))
    }
}

impl<T: Shape, V: IntoExpr<T>> IntoExpr<Object<T>> for BTreeMap<String, V> {
    fn into_expr(self) -> Expr<Object<T>> {
        Expr::from_term(Term::make_object(
            self.into_iter()
                .map(|(k, v)| (k, v.into_expr().term))
                .collect(),
        ))
    }
}

/// Value returned by a callback, folded into the body of a function.
pub trait Foldable {
    /// Shape of the folded expression.
    type Shape: Shape;
    fn fold(self) -> Result<Term>;
}

impl<S: Shape> Foldable for Expr<S> {
    type Shape = S;
    fn fold(self) -> Result<Term> {
        Ok(self.term)
    }
}

impl<S: Shape> Foldable for Datum<S> {
    type Shape = S;
    fn fold(self) -> Result<Term> {
        Ok(self.into_term())
    }
}

impl Foldable for Template {
    type Shape = Any;
    fn fold(self) -> Result<Term> {
        Template::fold(self)
    }
}

impl<T: Foldable> Foldable for Vec<T> {
    type Shape = Array<T::Shape>;
    fn fold(self) -> Result<Term> {
        Ok(Term::make_array(
            self.into_iter()
                .map(Foldable::fold)
                .collect::<Result<Vec<_>>>()?,
        ))
    }
}

macro_rules! impl_foldable {
    ($shape:ty => $($source:ty),+ $(,)?) => {
        $(
            impl Foldable for $source {
                type Shape = $shape;
                fn fold(self) -> Result<Term> {
                    Ok(Term::datum(self))
                }
            }
        )+
    };
}
impl_foldable!(Number => f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_foldable!(Str => &str, String);
impl_foldable!(Bool => bool);
impl_foldable!(Date => OffsetDateTime);
impl_foldable!(Any => Value);

/// Placeholder handed to a callback for one function parameter.
pub trait Parameter {
    fn parameter(term: Term) -> Self;
    fn kind() -> Kind;
}

impl<S: Shape> Parameter for Expr<S> {
    fn parameter(term: Term) -> Self {
        Expr::from_term(term)
    }
    fn kind() -> Kind {
        S::kind()
    }
}

impl<S: Shape> Parameter for Stream<S> {
    fn parameter(term: Term) -> Self {
        Stream::from_term(term)
    }
    fn kind() -> Kind {
        Kind::Array(Box::new(S::kind()))
    }
}
