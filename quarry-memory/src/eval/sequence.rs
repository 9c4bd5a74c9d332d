use super::{
    EvalError, EvalResult, Evaluator, arg, expect_array, expect_index, expect_integer,
    expect_number, expect_object, expect_string, runtime_error,
};
use quarry_core::{JoinKind, Term, TermType, Value};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

impl Evaluator<'_> {
    pub(super) fn eval_sequence(&mut self, term: &Term) -> EvalResult<Value> {
        let operation = term.term_type.name();
        match &term.term_type {
            TermType::Nth => {
                let items = self.sequence_arg(term, 0)?;
                let index = expect_integer(&self.eval_arg(term, 1)?, operation)?;
                let position = if index < 0 {
                    items.len() as i64 + index
                } else {
                    index
                };
                usize::try_from(position)
                    .ok()
                    .and_then(|i| items.into_iter().nth(i))
                    .ok_or_else(|| EvalError::NonExistence(format!("Index out of bounds: {index}")))
            }
            TermType::HasFields => {
                let fields = self.strings_from(term, 1)?;
                match self.eval_arg(term, 0)? {
                    Value::Array(items) => Ok(Value::Array(
                        items
                            .into_iter()
                            .filter(|v| has_fields(v, &fields))
                            .collect(),
                    )),
                    v => Ok(Value::Boolean(has_fields(&v, &fields))),
                }
            }
            TermType::WithFields => {
                let fields = self.strings_from(term, 1)?;
                let items = self.sequence_arg(term, 0)?;
                Ok(Value::Array(
                    items
                        .into_iter()
                        .filter(|v| has_fields(v, &fields))
                        .map(|v| pluck(v, &fields))
                        .collect(),
                ))
            }
            TermType::Pluck | TermType::Without => {
                let fields = self.strings_from(term, 1)?;
                let project = |v: Value| {
                    if term.term_type == TermType::Pluck {
                        pluck(v, &fields)
                    } else {
                        without(v, &fields)
                    }
                };
                match self.eval_arg(term, 0)? {
                    Value::Array(items) => Ok(Value::Array(items.into_iter().map(project).collect())),
                    v @ Value::Object(..) => Ok(project(v)),
                    v => Err(runtime_error!(
                        "Cannot perform {operation} on a non-object non-sequence {}",
                        v.type_name()
                    )),
                }
            }
            TermType::Merge => {
                let other = arg(term, 1)?;
                match self.eval_arg(term, 0)? {
                    Value::Array(items) => items
                        .into_iter()
                        .map(|v| -> EvalResult<Value> {
                            let patch = self.patch(other, &v)?;
                            Ok(merge(v, patch))
                        })
                        .collect::<EvalResult<Vec<_>>>()
                        .map(Value::Array),
                    v => {
                        let patch = self.patch(other, &v)?;
                        Ok(merge(v, patch))
                    }
                }
            }
            TermType::Keys => {
                let object = expect_object(self.eval_arg(term, 0)?, operation)?;
                Ok(Value::Array(object.into_keys().map(Value::String).collect()))
            }
            TermType::Values => {
                let object = expect_object(self.eval_arg(term, 0)?, operation)?;
                Ok(Value::Array(object.into_values().collect()))
            }
            TermType::Filter => {
                let items = self.sequence_arg(term, 0)?;
                let predicate = arg(term, 1)?;
                let mut result = Vec::new();
                if let TermType::Func(..) = predicate.term_type {
                    for item in items {
                        if self.test(predicate, vec![item.clone()])? {
                            result.push(item);
                        }
                    }
                } else {
                    let example = self.eval(predicate)?;
                    result.extend(items.into_iter().filter(|v| matches_example(v, &example)));
                }
                Ok(Value::Array(result))
            }
            TermType::Map => {
                let items = self.sequence_arg(term, 0)?;
                let mapper = arg(term, 1)?;
                items
                    .into_iter()
                    .map(|v| self.call(mapper, vec![v]))
                    .collect::<EvalResult<Vec<_>>>()
                    .map(Value::Array)
            }
            TermType::ConcatMap => {
                let items = self.sequence_arg(term, 0)?;
                let mapper = arg(term, 1)?;
                let mut result = Vec::new();
                for item in items {
                    let mapped = self.call(mapper, vec![item])?;
                    result.extend(expect_array(mapped, operation)?);
                }
                Ok(Value::Array(result))
            }
            TermType::OrderBy => self.order_by(term),
            TermType::Asc | TermType::Desc => Err(runtime_error!(
                "{operation} may only be used as an argument to ORDER_BY"
            )),
            TermType::Limit => {
                let items = self.sequence_arg(term, 0)?;
                let count = expect_index(&self.eval_arg(term, 1)?, operation)?;
                Ok(Value::Array(items.into_iter().take(count).collect()))
            }
            TermType::Skip => {
                let items = self.sequence_arg(term, 0)?;
                let count = expect_index(&self.eval_arg(term, 1)?, operation)?;
                Ok(Value::Array(items.into_iter().skip(count).collect()))
            }
            TermType::Slice => {
                let items = self.sequence_arg(term, 0)?;
                let len = items.len() as i64;
                let position = |v: i64| (if v < 0 { len + v } else { v }).clamp(0, len) as usize;
                let start = position(expect_integer(&self.eval_arg(term, 1)?, operation)?);
                let end = position(expect_integer(&self.eval_arg(term, 2)?, operation)?);
                Ok(Value::Array(
                    items
                        .into_iter()
                        .skip(start)
                        .take(end.saturating_sub(start))
                        .collect(),
                ))
            }
            TermType::Distinct => {
                let items = self.sequence_arg(term, 0)?;
                let unique: BTreeSet<Value> = items.into_iter().collect();
                Ok(Value::Array(unique.into_iter().collect()))
            }
            TermType::Union => {
                let mut result = Vec::new();
                for i in 0..term.args.len() {
                    result.extend(self.sequence_arg(term, i)?);
                }
                Ok(Value::Array(result))
            }
            TermType::IsEmpty => Ok(Value::Boolean(self.sequence_arg(term, 0)?.is_empty())),
            TermType::Contains => {
                let items = self.sequence_arg(term, 0)?;
                let needle = arg(term, 1)?;
                if let TermType::Func(..) = needle.term_type {
                    for item in items {
                        if self.test(needle, vec![item])? {
                            return Ok(Value::Boolean(true));
                        }
                    }
                    return Ok(Value::Boolean(false));
                }
                let needle = self.eval(needle)?;
                Ok(Value::Boolean(items.contains(&needle)))
            }
            TermType::Append => {
                let mut items = self.sequence_arg(term, 0)?;
                items.push(self.eval_arg(term, 1)?);
                Ok(Value::Array(items))
            }
            TermType::Reduce => {
                let items = self.sequence_arg(term, 0)?;
                let reducer = arg(term, 1)?;
                let mut items = items.into_iter();
                let Some(mut accumulator) = items.next() else {
                    return Err(runtime_error!("Cannot reduce over an empty stream"));
                };
                for item in items {
                    accumulator = self.call(reducer, vec![accumulator, item])?;
                }
                Ok(accumulator)
            }
            TermType::CoerceToArray => self.sequence_arg(term, 0).map(Value::Array),
            TermType::Sum | TermType::Avg | TermType::Min | TermType::Max => self.aggregate(term),
            TermType::Join(kind) => self.join(*kind, term),
            TermType::Group(fields) => self.group(fields, term),
            _ => Err(runtime_error!("{operation} is not a sequence operation")),
        }
    }

    /// Argument evaluating to an array or to a table.
    pub(super) fn sequence_arg(&mut self, term: &Term, index: usize) -> EvalResult<Vec<Value>> {
        match self.eval_arg(term, index)? {
            Value::Array(v) => Ok(v),
            v => Err(runtime_error!(
                "Cannot convert {} to SEQUENCE in {}",
                v.type_name(),
                term.term_type
            )),
        }
    }

    fn strings_from(&mut self, term: &Term, start: usize) -> EvalResult<Vec<String>> {
        term.args
            .iter()
            .skip(start)
            .map(|v| expect_string(self.eval(v)?, term.term_type.name()))
            .collect()
    }

    fn patch(&mut self, other: &Term, value: &Value) -> EvalResult<Value> {
        if let TermType::Func(..) = other.term_type {
            self.call(other, vec![value.clone()])
        } else {
            self.eval(other)
        }
    }

    fn order_by(&mut self, term: &Term) -> EvalResult<Value> {
        let items = self.sequence_arg(term, 0)?;
        let mut orders = Vec::new();
        for order in term.args.iter().skip(1) {
            match order.term_type {
                TermType::Asc => orders.push((false, arg(order, 0)?)),
                TermType::Desc => orders.push((true, arg(order, 0)?)),
                _ => orders.push((false, order)),
            }
        }
        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            let mut keys = Vec::with_capacity(orders.len());
            for (_, key) in &orders {
                keys.push(self.sort_key(key, &item)?);
            }
            keyed.push((keys, item));
        }
        let descending: Vec<bool> = orders.iter().map(|(v, _)| *v).collect();
        keyed.sort_by(|(a, _), (b, _)| {
            a.iter()
                .zip(b)
                .zip(&descending)
                .map(|((a, b), descending)| {
                    if *descending { b.cmp(a) } else { a.cmp(b) }
                })
                .find(|v| *v != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(Value::Array(keyed.into_iter().map(|(_, v)| v).collect()))
    }

    /// A field name or a function of the element, missing values sort first.
    fn sort_key(&mut self, key: &Term, item: &Value) -> EvalResult<Value> {
        match &key.term_type {
            TermType::Datum(Value::String(field)) => Ok(item.get(field).cloned().unwrap_or_default()),
            _ => match self.call(key, vec![item.clone()]) {
                Err(EvalError::NonExistence(..)) => Ok(Value::Null),
                result => result,
            },
        }
    }

    fn aggregate(&mut self, term: &Term) -> EvalResult<Value> {
        let operation = term.term_type.name();
        let items = self.sequence_arg(term, 0)?;
        let field = match term.args.get(1) {
            Some(v) => Some(expect_string(self.eval(v)?, operation)?),
            None => None,
        };
        // Elements paired with the value being aggregated, elements missing the field are skipped
        let values: Vec<(Value, Value)> = match &field {
            Some(field) => items
                .into_iter()
                .filter_map(|v| v.get(field).cloned().map(|key| (key, v)))
                .collect(),
            None => items.into_iter().map(|v| (v.clone(), v)).collect(),
        };
        match term.term_type {
            TermType::Sum | TermType::Avg => {
                let mut sum = 0.0;
                for (value, _) in &values {
                    sum += expect_number(value, operation)?;
                }
                if term.term_type == TermType::Sum {
                    Ok(Value::Number(sum))
                } else if values.is_empty() {
                    Ok(Value::Null)
                } else {
                    Ok(Value::Number(sum / values.len() as f64))
                }
            }
            _ => {
                let min = term.term_type == TermType::Min;
                let found = if min {
                    values.into_iter().min_by(|(a, _), (b, _)| a.cmp(b))
                } else {
                    values.into_iter().max_by(|(a, _), (b, _)| a.cmp(b))
                };
                found.map(|(_, v)| v).ok_or_else(|| {
                    runtime_error!(
                        "Cannot take the {} of an empty stream",
                        operation.to_lowercase()
                    )
                })
            }
        }
    }

    fn join(&mut self, kind: JoinKind, term: &Term) -> EvalResult<Value> {
        let left = self.sequence_arg(term, 0)?;
        let right = self.sequence_arg(term, 1)?;
        let (predicate, mapper) = match (kind, term.args.get(2..).unwrap_or_default()) {
            (JoinKind::Cross, [mapper]) => (None, mapper),
            (_, [predicate, mapper]) => (Some(predicate), mapper),
            _ => {
                return Err(runtime_error!(
                    "Malformed {kind} join with {} arguments",
                    term.args.len()
                ));
            }
        };
        let mut matches = vec![vec![false; right.len()]; left.len()];
        for (i, l) in left.iter().enumerate() {
            for (j, r) in right.iter().enumerate() {
                matches[i][j] = match predicate {
                    Some(predicate) => self.test(predicate, vec![l.clone(), r.clone()])?,
                    None => true,
                };
            }
        }
        let matched_left: Vec<bool> = matches.iter().map(|v| v.iter().any(|v| *v)).collect();
        let matched_right: Vec<bool> = (0..right.len())
            .map(|j| matches.iter().any(|v| v[j]))
            .collect();
        let mut output = Vec::new();
        if matches!(kind, JoinKind::Right | JoinKind::RightExcl) {
            for (j, r) in right.iter().enumerate() {
                if kind.keeps_matched() {
                    for (i, l) in left.iter().enumerate() {
                        if matches[i][j] {
                            output.push(self.call(mapper, vec![l.clone(), r.clone()])?);
                        }
                    }
                }
                if !matched_right[j] {
                    output.push(self.call(mapper, vec![Value::Null, r.clone()])?);
                }
            }
        } else {
            for (i, l) in left.iter().enumerate() {
                if kind.keeps_matched() {
                    for (j, r) in right.iter().enumerate() {
                        if matches[i][j] {
                            output.push(self.call(mapper, vec![l.clone(), r.clone()])?);
                        }
                    }
                }
                if !matched_left[i] && kind.keeps_unmatched_left() {
                    output.push(self.call(mapper, vec![l.clone(), Value::Null])?);
                }
            }
            if kind.keeps_unmatched_right() {
                for (j, r) in right.iter().enumerate() {
                    if !matched_right[j] {
                        output.push(self.call(mapper, vec![Value::Null, r.clone()])?);
                    }
                }
            }
        }
        log::trace!(
            "{kind} join of {} and {} elements produced {}",
            left.len(),
            right.len(),
            output.len()
        );
        Ok(Value::Array(output))
    }

    /// Partition in first seen key order and map every group.
    fn group(&mut self, fields: &[String], term: &Term) -> EvalResult<Value> {
        let items = self.sequence_arg(term, 0)?;
        let mapper = arg(term, 1)?;
        let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
        let mut positions: BTreeMap<Value, usize> = BTreeMap::new();
        for item in items {
            let key = match fields {
                [field] => item.get(field).cloned().unwrap_or_default(),
                _ => Value::Object(
                    fields
                        .iter()
                        .map(|v| (v.clone(), item.get(v).cloned().unwrap_or_default()))
                        .collect(),
                ),
            };
            match positions.get(&key) {
                Some(&i) => groups[i].1.push(item),
                None => {
                    positions.insert(key.clone(), groups.len());
                    groups.push((key, vec![item]));
                }
            }
        }
        groups
            .into_iter()
            .map(|(key, members)| self.call(mapper, vec![Value::Array(members), key]))
            .collect::<EvalResult<Vec<_>>>()
            .map(Value::Array)
    }
}

/// Every field is present and not null.
pub(crate) fn has_fields(value: &Value, fields: &[String]) -> bool {
    fields
        .iter()
        .all(|v| value.get(v).is_some_and(|v| !v.is_null()))
}

fn pluck(value: Value, fields: &[String]) -> Value {
    match value {
        Value::Object(v) => Value::Object(
            v.into_iter()
                .filter(|(k, _)| fields.contains(k))
                .collect(),
        ),
        v => v,
    }
}

fn without(value: Value, fields: &[String]) -> Value {
    match value {
        Value::Object(v) => Value::Object(
            v.into_iter()
                .filter(|(k, _)| !fields.contains(k))
                .collect(),
        ),
        v => v,
    }
}

/// Recursive merge, nested objects are merged and anything else is replaced.
pub(crate) fn merge(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (key, value) in patch {
                let merged = match base.remove(&key) {
                    Some(current) => merge(current, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}

/// Whether every field of `example` is found with the same value in `value`.
pub(crate) fn matches_example(value: &Value, example: &Value) -> bool {
    match (value, example) {
        (Value::Object(value), Value::Object(example)) => example.iter().all(|(k, example)| {
            value
                .get(k)
                .is_some_and(|value| matches_example(value, example))
        }),
        (value, example) => value == example,
    }
}
