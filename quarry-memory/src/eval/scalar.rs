use super::{EvalResult, expect_integer, expect_number, runtime_error};
use quarry_core::{TermType, TimeField, Value, parse_offset};
use regex::Regex;
use std::collections::BTreeMap;
use time::{Duration, OffsetDateTime, Time};

fn number(value: f64) -> EvalResult<Value> {
    if !value.is_finite() {
        return Err(runtime_error!("Number not representable: {value}"));
    }
    Ok(Value::Number(value))
}

fn shift(time: OffsetDateTime, seconds: f64) -> EvalResult<OffsetDateTime> {
    if !seconds.is_finite() || seconds.abs() >= 1e15 {
        return Err(runtime_error!("Cannot shift a time by {seconds} seconds"));
    }
    let whole = seconds.trunc();
    let nanos = ((seconds - whole) * 1e9).round() as i32;
    time.checked_add(Duration::new(whole as i64, nanos))
        .ok_or_else(|| runtime_error!("Time out of range after adding {seconds} seconds"))
}

pub(super) fn binary(term_type: &TermType, left: Value, right: Value) -> EvalResult<Value> {
    let operation = term_type.name();
    match (term_type, left, right) {
        (TermType::Add, Value::Number(l), Value::Number(r)) => number(l + r),
        (TermType::Add, Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
        (TermType::Add, Value::Array(mut l), Value::Array(r)) => {
            l.extend(r);
            Ok(Value::Array(l))
        }
        (TermType::Add, Value::Time(l), Value::Number(r)) => shift(l, r).map(Value::Time),
        (TermType::Sub, Value::Number(l), Value::Number(r)) => number(l - r),
        (TermType::Sub, Value::Time(l), Value::Number(r)) => shift(l, -r).map(Value::Time),
        (TermType::Sub, Value::Time(l), Value::Time(r)) => number((l - r).as_seconds_f64()),
        (TermType::Mul, Value::Number(l), Value::Number(r)) => number(l * r),
        (TermType::Div, Value::Number(..), Value::Number(r)) if r == 0.0 => {
            Err(runtime_error!("Cannot divide by zero"))
        }
        (TermType::Div, Value::Number(l), Value::Number(r)) => number(l / r),
        (TermType::Mod, l, r) => {
            let (l, r) = (expect_integer(&l, operation)?, expect_integer(&r, operation)?);
            if r == 0 {
                return Err(runtime_error!("Cannot take a number modulo 0"));
            }
            number((l % r) as f64)
        }
        (
            TermType::BitAnd
            | TermType::BitOr
            | TermType::BitXor
            | TermType::BitSal
            | TermType::BitSar,
            l,
            r,
        ) => {
            let (l, r) = (expect_integer(&l, operation)?, expect_integer(&r, operation)?);
            let result = match term_type {
                TermType::BitAnd => Some(l & r),
                TermType::BitOr => Some(l | r),
                TermType::BitXor => Some(l ^ r),
                TermType::BitSal => u32::try_from(r).ok().and_then(|r| l.checked_shl(r)),
                _ => u32::try_from(r).ok().and_then(|r| l.checked_shr(r)),
            };
            let result =
                result.ok_or_else(|| runtime_error!("Invalid shift of {l} by {r} bits"))?;
            number(result as f64)
        }
        (_, l, r) => Err(runtime_error!(
            "Cannot apply {operation} to {} and {}",
            l.type_name(),
            r.type_name()
        )),
    }
}

pub(super) fn unary(term_type: &TermType, value: Value) -> EvalResult<Value> {
    let operation = term_type.name();
    match term_type {
        TermType::BitNot => number(!expect_integer(&value, operation)? as f64),
        TermType::Round => number(expect_number(&value, operation)?.round()),
        TermType::Ceil => number(expect_number(&value, operation)?.ceil()),
        TermType::Floor => number(expect_number(&value, operation)?.floor()),
        _ => Err(runtime_error!("{operation} is not a unary operation")),
    }
}

/// Split on `separator`, or on runs of whitespace, at most `max` times.
pub(super) fn split(value: &str, separator: Option<&str>, max: Option<usize>) -> Value {
    let parts: Vec<String> = match separator {
        None => {
            let mut parts = Vec::new();
            let mut rest = value.trim_start();
            while !rest.is_empty() {
                if max == Some(parts.len()) {
                    parts.push(rest.to_string());
                    break;
                }
                match rest.find(char::is_whitespace) {
                    Some(i) => {
                        parts.push(rest[..i].to_string());
                        rest = rest[i..].trim_start();
                    }
                    None => {
                        parts.push(rest.to_string());
                        break;
                    }
                }
            }
            parts
        }
        Some("") => {
            let mut parts: Vec<String> = value.chars().map(String::from).collect();
            if let Some(max) = max
                && parts.len() > max + 1
            {
                let rest = parts.split_off(max).concat();
                parts.push(rest);
            }
            parts
        }
        Some(separator) => match max {
            Some(max) => value.splitn(max + 1, separator).map(String::from).collect(),
            None => value.split(separator).map(String::from).collect(),
        },
    };
    Value::Array(parts.into_iter().map(Value::String).collect())
}

fn span(value: &str, text: &str, start: usize, end: usize) -> Value {
    let start_chars = value[..start].chars().count();
    let end_chars = start_chars + value[start..end].chars().count();
    Value::Object(BTreeMap::from([
        ("str".to_string(), Value::String(text.to_string())),
        ("start".to_string(), Value::Number(start_chars as f64)),
        ("end".to_string(), Value::Number(end_chars as f64)),
    ]))
}

/// First match of `pattern`, offsets are counted in characters.
pub(super) fn regex_match(value: &str, pattern: &str) -> EvalResult<Value> {
    let regex = Regex::new(pattern)
        .map_err(|e| runtime_error!("Error in regexp `{pattern}`: {e}"))?;
    let Some(captures) = regex.captures(value) else {
        return Ok(Value::Null);
    };
    let mut result = match captures.get(0) {
        Some(m) => match span(value, m.as_str(), m.start(), m.end()) {
            Value::Object(v) => v,
            _ => BTreeMap::new(),
        },
        None => return Ok(Value::Null),
    };
    let groups = captures
        .iter()
        .skip(1)
        .map(|group| match group {
            Some(m) => span(value, m.as_str(), m.start(), m.end()),
            None => Value::Null,
        })
        .collect();
    result.insert("groups".to_string(), Value::Array(groups));
    Ok(Value::Object(result))
}

pub(super) fn epoch_time(seconds: f64) -> EvalResult<OffsetDateTime> {
    if !seconds.is_finite() {
        return Err(runtime_error!("Invalid epoch time {seconds}"));
    }
    OffsetDateTime::from_unix_timestamp_nanos((seconds * 1e9).round() as i128)
        .map_err(|e| runtime_error!("Invalid epoch time {seconds}: {e}"))
}

pub(super) fn to_epoch_time(time: &OffsetDateTime) -> f64 {
    time.unix_timestamp_nanos() as f64 / 1e9
}

pub(super) fn in_timezone(time: OffsetDateTime, offset: &str) -> EvalResult<OffsetDateTime> {
    let offset = parse_offset(offset).map_err(|e| runtime_error!("{e:#}"))?;
    time.checked_to_offset(offset)
        .ok_or_else(|| runtime_error!("Time out of range in the timezone {offset}"))
}

pub(super) fn time_field(field: TimeField, time: OffsetDateTime) -> Value {
    let seconds = time.second() as f64 + time.nanosecond() as f64 / 1e9;
    Value::Number(match field {
        TimeField::Year => time.year() as f64,
        TimeField::Month => u8::from(time.month()) as f64,
        TimeField::Day => time.day() as f64,
        TimeField::DayOfWeek => time.weekday().number_from_monday() as f64,
        TimeField::DayOfYear => time.ordinal() as f64,
        TimeField::Hours => time.hour() as f64,
        TimeField::Minutes => time.minute() as f64,
        TimeField::Seconds => seconds,
        TimeField::TimeOfDay => {
            time.hour() as f64 * 3600.0 + time.minute() as f64 * 60.0 + seconds
        }
        TimeField::Date => return Value::Time(time.replace_time(Time::MIDNIGHT)),
    })
}
