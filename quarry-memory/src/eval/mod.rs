mod catalog;
mod scalar;
mod sequence;

pub(crate) use catalog::bound_table;

use crate::server::Catalog;
use quarry_core::{Term, TermType, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use time::OffsetDateTime;

/// Failure while evaluating a tree on the server.
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum EvalError {
    /// Missing field or out of range lookup, caught by `DEFAULT`.
    #[error("{0}")]
    NonExistence(String),
    #[error("{0}")]
    Runtime(String),
}

pub(crate) type EvalResult<T> = std::result::Result<T, EvalError>;

macro_rules! runtime_error {
    ($($arg:tt)*) => {
        $crate::eval::EvalError::Runtime(format!($($arg)*))
    };
}
pub(crate) use runtime_error;

/// Result of a query, sequences are streamed element by element.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Evaluated {
    Atom(Value),
    Sequence(Vec<Value>),
}

/// Tree walking interpreter over the catalog.
pub(crate) struct Evaluator<'c> {
    pub(crate) catalog: &'c mut Catalog,
    pub(crate) default_db: &'c str,
    /// Time of `NOW`, fixed for the whole query.
    pub(crate) now: OffsetDateTime,
    frames: Vec<(String, Value)>,
    /// Node evaluating to a given value instead of its own result.
    substitution: Option<(Term, Value)>,
}

impl<'c> Evaluator<'c> {
    pub(crate) fn new(catalog: &'c mut Catalog, default_db: &'c str) -> Self {
        Self {
            catalog,
            default_db,
            now: OffsetDateTime::now_utc(),
            frames: Vec::new(),
            substitution: None,
        }
    }

    pub(crate) fn with_substitution(mut self, term: Term, value: Value) -> Self {
        self.substitution = Some((term, value));
        self
    }

    /// Evaluate a whole query.
    pub(crate) fn run(&mut self, term: &Term) -> EvalResult<Evaluated> {
        let value = self.eval(term)?;
        Ok(match value {
            Value::Array(v) if is_sequence(term) => Evaluated::Sequence(v),
            v => Evaluated::Atom(v),
        })
    }

    pub(crate) fn eval(&mut self, term: &Term) -> EvalResult<Value> {
        if let Some((node, value)) = &self.substitution
            && node.same(term)
        {
            return Ok(value.clone());
        }
        match &term.term_type {
            TermType::Datum(v) => Ok(v.clone()),
            TermType::MakeArray => term
                .args
                .iter()
                .map(|v| self.eval(v))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Array),
            TermType::MakeObject(keys) => {
                let mut object = BTreeMap::new();
                for (key, value) in keys.iter().zip(&term.args) {
                    object.insert(key.clone(), self.eval(value)?);
                }
                Ok(Value::Object(object))
            }
            TermType::Var(name) => self.lookup(name),
            TermType::Func(..) => Err(runtime_error!(
                "Cannot evaluate a FUNC outside of a function call"
            )),
            TermType::FuncCall => {
                let func = arg(term, 0)?;
                let values = term.args[1..]
                    .iter()
                    .map(|v| self.eval(v))
                    .collect::<EvalResult<Vec<_>>>()?;
                self.call(func, values)
            }
            TermType::GetField => {
                let value = self.eval_arg(term, 0)?;
                let key = expect_string(self.eval_arg(term, 1)?, "GET_FIELD")?;
                get_field(value, &key)
            }
            TermType::Default => match self.eval_arg(term, 0) {
                Ok(Value::Null) | Err(EvalError::NonExistence(..)) => self.eval_arg(term, 1),
                result => result,
            },
            TermType::Branch => {
                if self.eval_arg(term, 0)?.is_truthy() {
                    self.eval_arg(term, 1)
                } else {
                    self.eval_arg(term, 2)
                }
            }
            TermType::Eq | TermType::Ne | TermType::Lt | TermType::Le | TermType::Gt | TermType::Ge => {
                let left = self.eval_arg(term, 0)?;
                let right = self.eval_arg(term, 1)?;
                Ok(Value::Boolean(match term.term_type {
                    TermType::Eq => left == right,
                    TermType::Ne => left != right,
                    TermType::Lt => left < right,
                    TermType::Le => left <= right,
                    TermType::Gt => left > right,
                    _ => left >= right,
                }))
            }
            TermType::And => {
                for v in &term.args {
                    if !self.eval(v)?.is_truthy() {
                        return Ok(Value::Boolean(false));
                    }
                }
                Ok(Value::Boolean(true))
            }
            TermType::Or => {
                for v in &term.args {
                    if self.eval(v)?.is_truthy() {
                        return Ok(Value::Boolean(true));
                    }
                }
                Ok(Value::Boolean(false))
            }
            TermType::Not => Ok(Value::Boolean(!self.eval_arg(term, 0)?.is_truthy())),
            TermType::Add
            | TermType::Sub
            | TermType::Mul
            | TermType::Div
            | TermType::Mod
            | TermType::BitAnd
            | TermType::BitOr
            | TermType::BitXor
            | TermType::BitSal
            | TermType::BitSar => {
                let left = self.eval_arg(term, 0)?;
                let right = self.eval_arg(term, 1)?;
                scalar::binary(&term.term_type, left, right)
            }
            TermType::BitNot | TermType::Round | TermType::Ceil | TermType::Floor => {
                let value = self.eval_arg(term, 0)?;
                scalar::unary(&term.term_type, value)
            }
            TermType::Split => {
                let value = expect_string(self.eval_arg(term, 0)?, "SPLIT")?;
                let separator = match term.args.get(1) {
                    Some(v) => match self.eval(v)? {
                        Value::Null => None,
                        v => Some(expect_string(v, "SPLIT")?),
                    },
                    None => None,
                };
                let max = match term.args.get(2) {
                    Some(v) => Some(expect_index(&self.eval(v)?, "SPLIT")?),
                    None => None,
                };
                Ok(scalar::split(&value, separator.as_deref(), max))
            }
            TermType::Upcase => Ok(Value::String(
                expect_string(self.eval_arg(term, 0)?, "UPCASE")?.to_uppercase(),
            )),
            TermType::Downcase => Ok(Value::String(
                expect_string(self.eval_arg(term, 0)?, "DOWNCASE")?.to_lowercase(),
            )),
            TermType::Match => {
                let value = expect_string(self.eval_arg(term, 0)?, "MATCH")?;
                let pattern = expect_string(self.eval_arg(term, 1)?, "MATCH")?;
                scalar::regex_match(&value, &pattern)
            }
            TermType::Now => Ok(Value::Time(self.now)),
            TermType::EpochTime => {
                let seconds = expect_number(&self.eval_arg(term, 0)?, "EPOCH_TIME")?;
                scalar::epoch_time(seconds).map(Value::Time)
            }
            TermType::ToEpochTime => {
                let time = expect_time(&self.eval_arg(term, 0)?, "TO_EPOCH_TIME")?;
                Ok(Value::Number(scalar::to_epoch_time(&time)))
            }
            TermType::InTimezone => {
                let time = expect_time(&self.eval_arg(term, 0)?, "IN_TIMEZONE")?;
                let offset = expect_string(self.eval_arg(term, 1)?, "IN_TIMEZONE")?;
                scalar::in_timezone(time, &offset).map(Value::Time)
            }
            TermType::Timezone => {
                let time = expect_time(&self.eval_arg(term, 0)?, "TIMEZONE")?;
                Ok(Value::String(quarry_core::format_offset(time.offset())))
            }
            TermType::During => {
                let time = expect_time(&self.eval_arg(term, 0)?, "DURING")?;
                let start = expect_time(&self.eval_arg(term, 1)?, "DURING")?;
                let end = expect_time(&self.eval_arg(term, 2)?, "DURING")?;
                let left_open = option_str(term, "left_bound") == Some("open");
                let right_closed = option_str(term, "right_bound") == Some("closed");
                let after = if left_open { time > start } else { time >= start };
                let before = if right_closed { time <= end } else { time < end };
                Ok(Value::Boolean(after && before))
            }
            TermType::TimeField(field) => {
                let time = expect_time(&self.eval_arg(term, 0)?, term.term_type.name())?;
                Ok(scalar::time_field(*field, time))
            }
            TermType::Count => match self.eval_arg(term, 0)? {
                Value::String(v) => Ok(Value::Number(v.chars().count() as f64)),
                Value::Array(v) => Ok(Value::Number(v.len() as f64)),
                v => Err(runtime_error!(
                    "Cannot convert {} to SEQUENCE",
                    v.type_name()
                )),
            },
            TermType::Nth
            | TermType::HasFields
            | TermType::WithFields
            | TermType::Pluck
            | TermType::Without
            | TermType::Merge
            | TermType::Keys
            | TermType::Values
            | TermType::Filter
            | TermType::Map
            | TermType::ConcatMap
            | TermType::OrderBy
            | TermType::Asc
            | TermType::Desc
            | TermType::Limit
            | TermType::Skip
            | TermType::Slice
            | TermType::Distinct
            | TermType::Union
            | TermType::IsEmpty
            | TermType::Contains
            | TermType::Append
            | TermType::Reduce
            | TermType::CoerceToArray
            | TermType::Sum
            | TermType::Avg
            | TermType::Min
            | TermType::Max
            | TermType::Join(..)
            | TermType::Group(..) => self.eval_sequence(term),
            TermType::Db => Err(runtime_error!(
                "A database is not a value, select one of its tables"
            )),
            TermType::Changes => Err(runtime_error!(
                "A changefeed can only be consumed through a subscription"
            )),
            TermType::Table
            | TermType::Get
            | TermType::GetAll
            | TermType::Between
            | TermType::DbCreate
            | TermType::DbDrop
            | TermType::DbList
            | TermType::TableCreate
            | TermType::TableDrop
            | TermType::TableList
            | TermType::IndexCreate
            | TermType::IndexDrop
            | TermType::IndexList
            | TermType::IndexRename
            | TermType::Insert
            | TermType::Update
            | TermType::Replace
            | TermType::Delete => self.eval_catalog(term),
        }
    }

    pub(crate) fn eval_arg(&mut self, term: &Term, index: usize) -> EvalResult<Value> {
        let arg = arg(term, index)?;
        self.eval(arg)
    }

    /// Apply a function to the arguments, a non function term is a constant function.
    pub(crate) fn call(&mut self, func: &Term, args: Vec<Value>) -> EvalResult<Value> {
        let TermType::Func(params) = &func.term_type else {
            return self.eval(func);
        };
        if params.len() != args.len() {
            return Err(runtime_error!(
                "Expected function with {} arguments but found function with {} arguments",
                args.len(),
                params.len()
            ));
        }
        let body = arg(func, 0)?;
        let depth = self.frames.len();
        self.frames.extend(params.iter().cloned().zip(args));
        let result = self.eval(body);
        self.frames.truncate(depth);
        result
    }

    /// Evaluate a predicate, missing fields count as false.
    pub(crate) fn test(&mut self, func: &Term, args: Vec<Value>) -> EvalResult<bool> {
        match self.call(func, args) {
            Ok(v) => Ok(v.is_truthy()),
            Err(EvalError::NonExistence(..)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn lookup(&self, name: &str) -> EvalResult<Value> {
        self.frames
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| runtime_error!("Variable `{name}` is not bound"))
    }
}

/// Whether the query streams its elements rather than returning one value.
pub(crate) fn is_sequence(term: &Term) -> bool {
    match term.term_type {
        TermType::Table
        | TermType::GetAll
        | TermType::Between
        | TermType::Join(..)
        | TermType::Group(..) => true,
        TermType::Filter
        | TermType::Map
        | TermType::ConcatMap
        | TermType::OrderBy
        | TermType::Limit
        | TermType::Skip
        | TermType::Slice
        | TermType::Distinct
        | TermType::Union
        | TermType::Pluck
        | TermType::Without
        | TermType::Merge
        | TermType::HasFields
        | TermType::WithFields => term.args.first().is_some_and(is_sequence),
        _ => false,
    }
}

pub(crate) fn arg(term: &Term, index: usize) -> EvalResult<&Term> {
    term.args.get(index).ok_or_else(|| {
        runtime_error!(
            "Expected at least {} arguments to {} but found {}",
            index + 1,
            term.term_type,
            term.args.len()
        )
    })
}

pub(crate) fn option_str<'t>(term: &'t Term, key: &str) -> Option<&'t str> {
    term.options.get(key).and_then(Value::as_str)
}

fn type_error(expected: &str, found: &Value, operation: &str) -> EvalError {
    runtime_error!(
        "Expected type {expected} but found {} in {operation}",
        found.type_name()
    )
}

pub(crate) fn expect_number(value: &Value, operation: &str) -> EvalResult<f64> {
    value
        .as_number()
        .ok_or_else(|| type_error("NUMBER", value, operation))
}

/// Non negative integral number.
pub(crate) fn expect_index(value: &Value, operation: &str) -> EvalResult<usize> {
    let number = expect_number(value, operation)?;
    if number < 0.0 || number.fract() != 0.0 {
        return Err(runtime_error!(
            "Expected a non negative integer in {operation} but found {number}"
        ));
    }
    Ok(number as usize)
}

pub(crate) fn expect_integer(value: &Value, operation: &str) -> EvalResult<i64> {
    let number = expect_number(value, operation)?;
    if number.fract() != 0.0 || number.abs() > 9_007_199_254_740_992.0 {
        return Err(runtime_error!(
            "Number not an integer in {operation}: {number}"
        ));
    }
    Ok(number as i64)
}

pub(crate) fn expect_string(value: Value, operation: &str) -> EvalResult<String> {
    match value {
        Value::String(v) => Ok(v),
        v => Err(type_error("STRING", &v, operation)),
    }
}

pub(crate) fn expect_time(value: &Value, operation: &str) -> EvalResult<OffsetDateTime> {
    match value {
        Value::Time(v) => Ok(*v),
        v => Err(type_error("PTYPE<TIME>", v, operation)),
    }
}

pub(crate) fn expect_array(value: Value, operation: &str) -> EvalResult<Vec<Value>> {
    match value {
        Value::Array(v) => Ok(v),
        v => Err(type_error("SEQUENCE", &v, operation)),
    }
}

pub(crate) fn expect_object(value: Value, operation: &str) -> EvalResult<BTreeMap<String, Value>> {
    match value {
        Value::Object(v) => Ok(v),
        v => Err(type_error("OBJECT", &v, operation)),
    }
}

/// Field of an object, or the field of every element of an array that has it.
pub(crate) fn get_field(value: Value, key: &str) -> EvalResult<Value> {
    match value {
        Value::Object(mut v) => v
            .remove(key)
            .ok_or_else(|| EvalError::NonExistence(format!("No attribute `{key}` in object"))),
        Value::Array(v) => Ok(Value::Array(
            v.into_iter()
                .filter_map(|v| match v {
                    Value::Object(mut v) => v.remove(key),
                    _ => None,
                })
                .collect(),
        )),
        Value::Null => Err(EvalError::NonExistence(format!(
            "Cannot get the field `{key}` of null"
        ))),
        v => Err(type_error("OBJECT", &v, "GET_FIELD")),
    }
}
