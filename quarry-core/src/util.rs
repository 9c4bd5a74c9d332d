use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use time::UtcOffset;

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut first = true;
    for v in values {
        if !first {
            out.push_str(separator);
        }
        first = false;
        f(out, v);
    }
}

/// Returns a process-wide unique variable name for function parameters.
pub fn fresh_variable_name() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("_{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Offset formatted as `+HH:MM`.
pub fn format_offset(offset: UtcOffset) -> String {
    let (hours, minutes, _) = offset.as_hms();
    let sign = if offset.is_negative() { '-' } else { '+' };
    format!("{sign}{:02}:{:02}", hours.abs(), minutes.abs())
}

/// Parse an offset written as `+HH:MM`, `-HH:MM` or `Z`.
pub fn parse_offset(value: &str) -> Result<UtcOffset> {
    if value == "Z" {
        return Ok(UtcOffset::UTC);
    }
    let invalid = || Error::msg(format!("Invalid timezone `{value}`, expected `+HH:MM`"));
    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i8 = hours.parse().map_err(|_| invalid())?;
    let minutes: i8 = minutes.parse().map_err(|_| invalid())?;
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).map_err(|_| invalid())
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$query
                .char_indices()
                .nth(497)
                .map(|(i, _)| i)
                .unwrap_or($query.len())]
                .trim_end(),
            if $query.chars().count() > 497 {
                "..."
            } else {
                ""
            },
        )
    };
}
