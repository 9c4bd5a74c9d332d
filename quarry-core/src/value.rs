use crate::{GenericTermWriter, Kind, TermWriter};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
};
use time::OffsetDateTime;

/// A decoded document datum.
///
/// Values carry a total order (see [`Value::cmp`]) used by the server for sorting, grouping,
/// `distinct` and primary keys: `Null < Boolean < Number < String < Time < Array < Object`.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Time(OffsetDateTime),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(..) => "BOOL",
            Value::Number(..) => "NUMBER",
            Value::String(..) => "STRING",
            Value::Time(..) => "PTYPE<TIME>",
            Value::Array(..) => "ARRAY",
            Value::Object(..) => "OBJECT",
        }
    }

    /// Shape of this value, element kinds are unified when homogeneous.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Boolean(..) => Kind::Bool,
            Value::Number(..) => Kind::Number,
            Value::String(..) => Kind::String,
            Value::Time(..) => Kind::Date,
            Value::Array(v) => Kind::Array(Box::new(Kind::unify(v.iter().map(Value::kind)))),
            Value::Object(v) => Kind::Object(Box::new(Kind::unify(v.values().map(Value::kind)))),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `false` and `null` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Field lookup, `None` for missing fields and for non-objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|v| v.get(key))
    }

    /// Nesting depth, scalars have depth 0.
    pub fn depth(&self) -> usize {
        match self {
            Value::Array(v) => 1 + v.iter().map(Value::depth).max().unwrap_or(0),
            Value::Object(v) => 1 + v.values().map(Value::depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(..) => 1,
            Value::Number(..) => 2,
            Value::String(..) => 3,
            Value::Time(..) => 4,
            Value::Array(..) => 5,
            Value::Object(..) => 6,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(l), Value::Boolean(r)) => l.cmp(r),
            (Value::Number(l), Value::Number(r)) => {
                l.partial_cmp(r).unwrap_or_else(|| l.total_cmp(r))
            }
            (Value::String(l), Value::String(r)) => l.cmp(r),
            (Value::Time(l), Value::Time(r)) => l.cmp(r),
            (Value::Array(l), Value::Array(r)) => l.cmp(r),
            (Value::Object(l), Value::Object(r)) => l.iter().cmp(r.iter()),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        GenericTermWriter.write_value(&mut out, self);
        f.write_str(&out)
    }
}
