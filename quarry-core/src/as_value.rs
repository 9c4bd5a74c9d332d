use crate::{Error, Result, Value, truncate_long};
use std::{
    any,
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use time::OffsetDateTime;
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`] used for literals
/// inside expression trees and for decoding server responses.
///
/// # Error semantics
/// - Numbers decode into integer types only when they are integral and in range, the error
///   message includes both the offending value and the target type.
/// - `Option<T>` decodes `null` as `None`, everything else is delegated to `T`.
///
/// # Examples
/// ```rust
/// use quarry_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert_eq!(v, Value::Number(42.0));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// Convert this value into its owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

fn mismatch<T>(value: &Value) -> Error {
    let printed = value.to_string();
    Error::msg(format!(
        "Cannot convert {} `{}` to {}",
        value.type_name(),
        truncate_long!(printed),
        any::type_name::<T>(),
    ))
}

impl AsValue for Value {
    fn as_value(self) -> Value {
        self
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl AsValue for bool {
    fn as_value(self) -> Value {
        Value::Boolean(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for f64 {
    fn as_value(self) -> Value {
        Value::Number(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Number(v) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for f32 {
    fn as_value(self) -> Value {
        Value::Number(self as f64)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Number(v) => Ok(v as f32),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

macro_rules! impl_as_value_integer {
    ($($source:ty),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_value(self) -> Value {
                    Value::Number(self as f64)
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    let Value::Number(v) = value else {
                        return Err(mismatch::<Self>(&value));
                    };
                    if v.fract() != 0.0 {
                        return Err(Error::msg(format!(
                            "Value {v} is not an integer and cannot be converted to {}",
                            any::type_name::<Self>(),
                        )));
                    }
                    if v < <$source>::MIN as f64 || v > <$source>::MAX as f64 {
                        return Err(Error::msg(format!(
                            "Value {v} is out of range for {}",
                            any::type_name::<Self>(),
                        )));
                    }
                    Ok(v as $source)
                }
            }
        )+
    };
}
impl_as_value_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl AsValue for String {
    fn as_value(self) -> Value {
        Value::String(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Cow<'static, str> {
    fn as_value(self) -> Value {
        Value::String(self.into_owned())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Cow::Owned)
    }
}

impl AsValue for Arc<str> {
    fn as_value(self) -> Value {
        Value::String(self.as_ref().into())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
}

impl AsValue for OffsetDateTime {
    fn as_value(self) -> Value {
        Value::Time(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(v) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Uuid {
    fn as_value(self) -> Value {
        Value::String(self.to_string())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(ref v) => Uuid::parse_str(v).map_err(|e| {
                Error::new(e).context(format!("Cannot parse `{}` as a uuid", truncate_long!(v)))
            }),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from_value(v).map(Some),
        }
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_value(self) -> Value {
        Value::Array(self.into_iter().map(AsValue::as_value).collect())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(v) => v.into_iter().map(T::try_from_value).collect(),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for BTreeMap<String, T> {
    fn as_value(self) -> Value {
        Value::Object(self.into_iter().map(|(k, v)| (k, v.as_value())).collect())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(v) => v
                .into_iter()
                .map(|(k, v)| Ok((k, T::try_from_value(v)?)))
                .collect(),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for HashMap<String, T> {
    fn as_value(self) -> Value {
        Value::Object(self.into_iter().map(|(k, v)| (k, v.as_value())).collect())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(v) => v
                .into_iter()
                .map(|(k, v)| Ok((k, T::try_from_value(v)?)))
                .collect(),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

macro_rules! impl_from_as_value {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    value.as_value()
                }
            }
        )+
    };
}
impl_from_as_value!(
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
    Uuid,
);

impl<T: AsValue> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        value.as_value()
    }
}

impl<T: AsValue> From<BTreeMap<String, T>> for Value {
    fn from(value: BTreeMap<String, T>) -> Self {
        value.as_value()
    }
}

impl<T: AsValue> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.as_value()
    }
}
