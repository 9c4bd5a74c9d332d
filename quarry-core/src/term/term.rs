use crate::{GenericTermWriter, Kind, Options, TermType, TermWriter, Value};
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::Deref,
    sync::Arc,
};

/// Immutable node of an expression tree.
#[derive(Debug)]
pub struct TermNode {
    pub term_type: TermType,
    pub args: Vec<Term>,
    pub options: Options,
    /// Shape inferred when the node was built.
    pub kind: Kind,
}

/// Shared handle to an immutable [`TermNode`].
///
/// Composition only ever wraps terms, so a sub-tree can be referenced by any number of parents.
/// Equality is identity: two handles are equal when they point to the same node.
#[derive(Clone)]
pub struct Term(Arc<TermNode>);

impl Term {
    pub fn new(term_type: TermType, args: Vec<Term>, kind: Kind) -> Self {
        Self::with_options(term_type, args, Options::new(), kind)
    }

    pub fn with_options(term_type: TermType, args: Vec<Term>, options: Options, kind: Kind) -> Self {
        Term(Arc::new(TermNode {
            term_type,
            args,
            options,
            kind,
        }))
    }

    pub fn datum(value: impl Into<Value>) -> Self {
        let value = value.into();
        let kind = value.kind();
        Term::new(TermType::Datum(value), Vec::new(), kind)
    }

    pub fn var(name: impl Into<String>, kind: Kind) -> Self {
        Term::new(TermType::Var(name.into()), Vec::new(), kind)
    }

    pub fn func(params: Vec<String>, body: Term) -> Self {
        Term::new(TermType::Func(params), vec![body], Kind::Function)
    }

    /// Array construction, collapsed into a literal when every element is a literal.
    pub fn make_array(items: Vec<Term>) -> Self {
        if items.iter().all(|v| v.as_datum().is_some()) {
            return Term::datum(Value::Array(
                items
                    .iter()
                    .filter_map(|v| v.as_datum().cloned())
                    .collect(),
            ));
        }
        let kind = Kind::Array(Box::new(Kind::unify(items.iter().map(|v| v.kind.clone()))));
        Term::new(TermType::MakeArray, items, kind)
    }

    /// Object construction, collapsed into a literal when every field is a literal.
    pub fn make_object(fields: Vec<(String, Term)>) -> Self {
        if fields.iter().all(|(_, v)| v.as_datum().is_some()) {
            return Term::datum(Value::Object(
                fields
                    .into_iter()
                    .filter_map(|(k, v)| v.as_datum().cloned().map(|v| (k, v)))
                    .collect(),
            ));
        }
        let kind = Kind::Object(Box::new(Kind::unify(
            fields.iter().map(|(_, v)| v.kind.clone()),
        )));
        let (keys, values) = fields.into_iter().unzip();
        Term::new(TermType::MakeObject(keys), values, kind)
    }

    pub fn as_datum(&self) -> Option<&Value> {
        match &self.term_type {
            TermType::Datum(v) => Some(v),
            _ => None,
        }
    }

    /// Whether both handles reference the same node.
    pub fn same(&self, other: &Term) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of handles currently sharing this node.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Nesting depth of the tree rooted at this node.
    pub fn depth(&self) -> usize {
        1 + self.args.iter().map(Term::depth).max().unwrap_or(0)
    }
}

impl Deref for Term {
    type Target = TermNode;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Term {}

impl Debug for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(128);
        GenericTermWriter.write_query(&mut out, self);
        f.write_str(&out)
    }
}
