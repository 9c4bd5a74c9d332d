use crate::{AsValue, Datum, Expr, Kind, QueryError, Result, Shape, Term, TermType, Value};
use std::collections::{BTreeMap, HashMap};
use time::OffsetDateTime;

/// Nesting guard of [`Template::fold`].
pub const MAX_TEMPLATE_DEPTH: usize = 256;

/// A caller built value mixing literals and proxies at any depth.
///
/// Usually produced by the `shape!` macro or by the `From` conversions:
/// ```rust,ignore
/// shape!({ "name": user.get("name"), "tags": ["a", "b"], "score": 1 })
/// ```
#[derive(Debug, Clone)]
pub enum Template {
    Literal(Value),
    Array(Vec<Template>),
    Object(BTreeMap<String, Template>),
    Proxy(Term),
    /// A field that is not there. It is dropped from objects, inside arrays it becomes null.
    Absent,
}

impl Template {
    /// Compile the template into a single expression node.
    ///
    /// A proxy is used as is. Arrays and objects with no proxy anywhere below them become one
    /// literal node, the others become `MAKE_ARRAY`/`MAKE_OBJECT` nodes over the folded children
    /// preserving indexes and keys.
    pub fn fold(self) -> Result<Term> {
        self.fold_at(0).map(|(term, _)| term)
    }

    fn fold_at(self, depth: usize) -> Result<(Term, bool)> {
        if depth > MAX_TEMPLATE_DEPTH {
            return Err(QueryError::ExpressionTooDeep {
                limit: MAX_TEMPLATE_DEPTH,
            }
            .into());
        }
        match self {
            Template::Proxy(term) => Ok((term, true)),
            Template::Absent => Ok((Term::datum(Value::Null), false)),
            Template::Literal(value) => {
                if depth + value.depth() > MAX_TEMPLATE_DEPTH {
                    return Err(QueryError::ExpressionTooDeep {
                        limit: MAX_TEMPLATE_DEPTH,
                    }
                    .into());
                }
                Ok((Term::datum(value), false))
            }
            Template::Array(items) => {
                let mut terms = Vec::with_capacity(items.len());
                let mut proxied = false;
                for item in items {
                    let (term, has_proxy) = item.fold_at(depth + 1)?;
                    proxied |= has_proxy;
                    terms.push(term);
                }
                if !proxied {
                    return Ok((Term::make_array(terms), false));
                }
                let kind = Kind::Array(Box::new(Kind::unify(terms.iter().map(|v| v.kind.clone()))));
                Ok((Term::new(TermType::MakeArray, terms, kind), true))
            }
            Template::Object(fields) => {
                let mut keys = Vec::with_capacity(fields.len());
                let mut terms = Vec::with_capacity(fields.len());
                let mut proxied = false;
                for (key, field) in fields {
                    if matches!(field, Template::Absent) {
                        continue;
                    }
                    let (term, has_proxy) = field.fold_at(depth + 1)?;
                    proxied |= has_proxy;
                    keys.push(key);
                    terms.push(term);
                }
                if !proxied {
                    return Ok((Term::make_object(keys.into_iter().zip(terms).collect()), false));
                }
                let kind =
                    Kind::Object(Box::new(Kind::unify(terms.iter().map(|v| v.kind.clone()))));
                Ok((Term::new(TermType::MakeObject(keys), terms, kind), true))
            }
        }
    }

    /// Whether a proxy appears anywhere in the template.
    pub fn contains_proxy(&self) -> bool {
        match self {
            Template::Proxy(..) => true,
            Template::Array(v) => v.iter().any(Template::contains_proxy),
            Template::Object(v) => v.values().any(Template::contains_proxy),
            Template::Literal(..) | Template::Absent => false,
        }
    }
}

impl From<Value> for Template {
    fn from(value: Value) -> Self {
        Template::Literal(value)
    }
}

impl From<&str> for Template {
    fn from(value: &str) -> Self {
        Template::Literal(value.into())
    }
}

macro_rules! impl_template_from_literal {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for Template {
                fn from(value: $source) -> Self {
                    Template::Literal(value.as_value())
                }
            }
        )+
    };
}
impl_template_from_literal!(
    bool,
    f32,
    f64,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    String,
    OffsetDateTime,
);

impl<S: Shape> From<Expr<S>> for Template {
    fn from(value: Expr<S>) -> Self {
        Template::Proxy(value.into_term())
    }
}

impl<S: Shape> From<&Expr<S>> for Template {
    fn from(value: &Expr<S>) -> Self {
        Template::Proxy(value.term().clone())
    }
}

impl<S: Shape> From<Datum<S>> for Template {
    fn from(value: Datum<S>) -> Self {
        Template::Proxy(value.into_term())
    }
}

impl<T: Into<Template>> From<Option<T>> for Template {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Template::Absent)
    }
}

impl<T: Into<Template>> From<Vec<T>> for Template {
    fn from(value: Vec<T>) -> Self {
        Template::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Template>> From<BTreeMap<String, T>> for Template {
    fn from(value: BTreeMap<String, T>) -> Self {
        Template::Object(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Template>> From<HashMap<String, T>> for Template {
    fn from(value: HashMap<String, T>) -> Self {
        Template::Object(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}
