use crate::{
    AsValue, DbChangeResult, IndexChangeResult, TableChangeResult, Value, ValueChange, WriteResult,
};
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    marker::PhantomData,
};
use time::OffsetDateTime;

/// Runtime descriptor of the shape an expression evaluates to.
///
/// Every [`Term`](crate::Term) records the kind inferred when it was built, this is what allows
/// dynamic paths (`Expr<Any>::cast`, field aggregates) to reject invalid compositions before
/// anything reaches the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Any,
    Null,
    Bool,
    Number,
    String,
    Date,
    Array(Box<Kind>),
    Object(Box<Kind>),
    Nullable(Box<Kind>),
    Function,
    Database,
}

impl Kind {
    /// Whether a value of kind `self` can be used where `expected` is declared.
    pub fn conforms_to(&self, expected: &Kind) -> bool {
        match (self, expected) {
            (Kind::Any, _) | (_, Kind::Any) => true,
            (Kind::Null, Kind::Nullable(..)) => true,
            (Kind::Nullable(l), Kind::Nullable(r)) => l.conforms_to(r),
            (Kind::Nullable(l), r) => l.conforms_to(r),
            (l, Kind::Nullable(r)) => l.conforms_to(r),
            (Kind::Array(l), Kind::Array(r)) => l.conforms_to(r),
            (Kind::Object(l), Kind::Object(r)) => l.conforms_to(r),
            (l, r) => l == r,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.conforms_to(&Kind::Number) && !matches!(self, Kind::Null)
    }

    /// Kind of the elements when this is a sequence.
    pub fn element(&self) -> Option<Kind> {
        match self {
            Kind::Any => Some(Kind::Any),
            Kind::Array(v) => Some(*v.clone()),
            Kind::Nullable(v) => v.element(),
            _ => None,
        }
    }

    /// Kind of a field when this is an object.
    pub fn field(&self) -> Option<Kind> {
        match self {
            Kind::Any => Some(Kind::Any),
            Kind::Object(v) => Some(*v.clone()),
            Kind::Nullable(v) => v.field().map(|v| Kind::Nullable(Box::new(v))),
            _ => None,
        }
    }

    /// Common kind of a set of kinds, `Any` when they disagree.
    pub fn unify(kinds: impl IntoIterator<Item = Kind>) -> Kind {
        let mut result: Option<Kind> = None;
        for kind in kinds {
            result = Some(match result {
                None => kind,
                Some(current) if current == kind => current,
                Some(Kind::Null) => Kind::Nullable(Box::new(kind)),
                Some(Kind::Nullable(current)) if kind == Kind::Null || *current == kind => {
                    Kind::Nullable(current)
                }
                Some(current) if kind == Kind::Null => Kind::Nullable(Box::new(current)),
                Some(..) => return Kind::Any,
            });
        }
        result.unwrap_or(Kind::Any)
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Any => f.write_str("any"),
            Kind::Null => f.write_str("null"),
            Kind::Bool => f.write_str("boolean"),
            Kind::Number => f.write_str("number"),
            Kind::String => f.write_str("string"),
            Kind::Date => f.write_str("date"),
            Kind::Array(v) => write!(f, "array<{v}>"),
            Kind::Object(v) => write!(f, "object<{v}>"),
            Kind::Nullable(v) => write!(f, "nullable<{v}>"),
            Kind::Function => f.write_str("function"),
            Kind::Database => f.write_str("database"),
        }
    }
}

/// Declared shape of an expression.
///
/// Shapes are never instantiated, they only select the capability set of
/// [`Expr`](crate::Expr) and the Rust type results decode into.
pub trait Shape: Send + Sync + 'static {
    /// Type a settled result of this shape decodes into.
    type Output: AsValue + Send + 'static;
    fn kind() -> Kind;
}

/// Shapes accepted by ordering comparisons.
pub trait Comparable: Shape {}

/// Shapes accepted by numeric aggregates.
pub trait Numeric: Shape {}

/// Shapes that are arrays, used to recover the element shape.
pub trait Listed: Shape {
    type Element: Shape;
}

pub struct Bool;
pub struct Number;
pub struct Str;
pub struct Date;
/// Value of unknown shape.
pub struct Any;
pub struct Array<T>(PhantomData<fn() -> T>);
pub struct Object<T>(PhantomData<fn() -> T>);
/// Value that may be absent, used on the optional side of joins.
pub struct Nullable<T>(PhantomData<fn() -> T>);
/// Change event emitted by a feed over documents of shape `T`.
pub struct Change<T>(PhantomData<fn() -> T>);
pub struct Written;
pub struct DbChanged;
pub struct TableChanged;
pub struct IndexChanged;

/// A schemaless document.
pub type Document = Object<Any>;

macro_rules! impl_shape {
    ($shape:ty, $output:ty, $kind:expr) => {
        impl Shape for $shape {
            type Output = $output;
            fn kind() -> Kind {
                $kind
            }
        }
    };
}
impl_shape!(Bool, bool, Kind::Bool);
impl_shape!(Number, f64, Kind::Number);
impl_shape!(Str, String, Kind::String);
impl_shape!(Date, OffsetDateTime, Kind::Date);
impl_shape!(Any, Value, Kind::Any);
impl_shape!(Written, WriteResult, Kind::Object(Box::new(Kind::Any)));
impl_shape!(DbChanged, DbChangeResult, Kind::Object(Box::new(Kind::Any)));
impl_shape!(TableChanged, TableChangeResult, Kind::Object(Box::new(Kind::Any)));
impl_shape!(IndexChanged, IndexChangeResult, Kind::Object(Box::new(Kind::Any)));

impl<T: Shape> Shape for Array<T> {
    type Output = Vec<T::Output>;
    fn kind() -> Kind {
        Kind::Array(Box::new(T::kind()))
    }
}

impl<T: Shape> Shape for Object<T> {
    type Output = BTreeMap<String, T::Output>;
    fn kind() -> Kind {
        Kind::Object(Box::new(T::kind()))
    }
}

impl<T: Shape> Shape for Nullable<T> {
    type Output = Option<T::Output>;
    fn kind() -> Kind {
        match T::kind() {
            v @ Kind::Nullable(..) => v,
            v => Kind::Nullable(Box::new(v)),
        }
    }
}

impl<T: Shape> Shape for Change<T> {
    type Output = ValueChange<T::Output>;
    fn kind() -> Kind {
        Kind::Object(Box::new(Kind::Any))
    }
}

impl Comparable for Number {}
impl Comparable for Str {}
impl Comparable for Date {}
impl Comparable for Any {}

impl Numeric for Number {}

impl<T: Shape> Listed for Array<T> {
    type Element = T;
}
