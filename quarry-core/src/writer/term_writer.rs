use crate::{Options, Term, TermType, Value, format_offset, separated_by, writer::Context};
use std::collections::BTreeMap;
use time::OffsetDateTime;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Printer converting expression trees into their compact text form.
///
/// A node is written as `[TYPE,[args...]]` followed by `,{options}` when the node carries any.
/// Literals are written as JSON, except arrays which are wrapped in `[DATUM,...]` to tell them
/// apart from nodes. Drivers can override single methods to adapt the dialect.
pub trait TermWriter {
    fn as_dyn(&self) -> &dyn TermWriter;

    /// Render a whole tree with a fresh context.
    fn write_query(&self, out: &mut String, term: &Term) {
        let mut context = Context::default();
        self.write_term(&mut context, out, term);
    }

    /// Render a literal with a fresh context.
    fn write_value(&self, out: &mut String, value: &Value) {
        self.write_datum(&mut Context::default(), out, value);
    }

    fn write_term(&self, context: &mut Context, out: &mut String, term: &Term) {
        match &term.term_type {
            TermType::Datum(v) => self.write_datum(context, out, v),
            TermType::MakeObject(keys) => self.write_make_object(context, out, keys, &term.args),
            TermType::Var(name) => {
                out.push_str("[VAR,");
                let name = context.resolve(name).to_string();
                self.write_value_string(context, out, &name);
                out.push(']');
            }
            TermType::Func(params) => self.write_func(context, out, params, &term.args),
            TermType::Join(kind) => {
                out.push_str("[JOIN,");
                self.write_value_string(context, out, &kind.to_string());
                out.push(',');
                self.write_args(context, out, &term.args);
                self.write_options(context, out, &term.options);
                out.push(']');
            }
            TermType::Group(fields) => {
                out.push_str("[GROUP,[");
                separated_by(
                    out,
                    fields,
                    |out, v| self.write_value_string(context, out, v),
                    ",",
                );
                out.push_str("],");
                self.write_args(context, out, &term.args);
                self.write_options(context, out, &term.options);
                out.push(']');
            }
            term_type => {
                out.push('[');
                out.push_str(term_type.name());
                out.push(',');
                self.write_args(context, out, &term.args);
                self.write_options(context, out, &term.options);
                out.push(']');
            }
        }
    }

    fn write_args(&self, context: &mut Context, out: &mut String, args: &[Term]) {
        out.push('[');
        separated_by(out, args, |out, v| self.write_term(context, out, v), ",");
        out.push(']');
    }

    fn write_options(&self, context: &mut Context, out: &mut String, options: &Options) {
        if !context.write_options || options.is_empty() {
            return;
        }
        out.push(',');
        self.write_value_object(context, out, options);
    }

    fn write_make_object(
        &self,
        context: &mut Context,
        out: &mut String,
        keys: &[String],
        args: &[Term],
    ) {
        out.push_str("[MAKE_OBJECT,{");
        separated_by(
            out,
            keys.iter().zip(args),
            |out, (k, v)| {
                self.write_value_string(context, out, k);
                out.push(':');
                self.write_term(context, out, v);
            },
            ",",
        );
        out.push_str("}]");
    }

    fn write_func(&self, context: &mut Context, out: &mut String, params: &[String], args: &[Term]) {
        out.push_str("[FUNC,[");
        let names: Vec<String> = params
            .iter()
            .map(|v| context.declare(v).to_string())
            .collect();
        separated_by(
            out,
            &names,
            |out, v| self.write_value_string(context, out, v),
            ",",
        );
        out.push_str("],");
        match args.first() {
            Some(body) => self.write_term(context, out, body),
            None => self.write_value_null(context, out),
        }
        out.push(']');
    }

    /// Render a literal, arrays are wrapped to distinguish them from nodes.
    fn write_datum(&self, context: &mut Context, out: &mut String, value: &Value) {
        if let Value::Array(..) = value {
            out.push_str("[DATUM,");
            self.write_value_json(context, out, value);
            out.push(']');
        } else {
            self.write_value_json(context, out, value);
        }
    }

    fn write_value_json(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            Value::Null => self.write_value_null(context, out),
            Value::Boolean(v) => self.write_value_bool(context, out, *v),
            Value::Number(v) => self.write_value_number(context, out, *v),
            Value::String(v) => self.write_value_string(context, out, v),
            Value::Time(v) => self.write_value_time(context, out, v),
            Value::Array(v) => {
                out.push('[');
                separated_by(
                    out,
                    v,
                    |out, v| self.write_value_json(context, out, v),
                    ",",
                );
                out.push(']');
            }
            Value::Object(v) => self.write_value_object(context, out, v),
        }
    }

    fn write_value_null(&self, _context: &mut Context, out: &mut String) {
        out.push_str("null");
    }

    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize]);
    }

    /// Integral numbers in the exactly representable range are written without fraction.
    fn write_value_number(&self, _context: &mut Context, out: &mut String, value: f64) {
        const EXACT: f64 = 9_007_199_254_740_992.0;
        if value.fract() == 0.0 && value.abs() <= EXACT {
            write_integer!(out, value as i64);
        } else {
            let mut buffer = ryu::Buffer::new();
            out.push_str(buffer.format(value));
        }
    }

    /// Render and escape a JSON string literal.
    fn write_value_string(&self, _context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        let mut position = 0;
        for (i, c) in value.char_indices() {
            let escaped = match c {
                '"' => "\\\"",
                '\\' => "\\\\",
                '\n' => "\\n",
                '\r' => "\\r",
                '\t' => "\\t",
                c if (c as u32) < 0x20 => {
                    out.push_str(&value[position..i]);
                    out.push_str("\\u00");
                    out.push(char::from_digit(c as u32 >> 4, 16).unwrap_or('0'));
                    out.push(char::from_digit(c as u32 & 0xF, 16).unwrap_or('0'));
                    position = i + 1;
                    continue;
                }
                _ => continue,
            };
            out.push_str(&value[position..i]);
            out.push_str(escaped);
            position = i + 1;
        }
        out.push_str(&value[position..]);
        out.push('"');
    }

    /// Times are written as a pseudo type object carrying the epoch seconds and the offset.
    fn write_value_time(&self, context: &mut Context, out: &mut String, value: &OffsetDateTime) {
        out.push_str("{\"$reql_type$\":\"TIME\",\"epoch_time\":");
        let seconds = value.unix_timestamp_nanos() as f64 / 1_000_000_000.0;
        self.write_value_number(context, out, seconds);
        out.push_str(",\"timezone\":");
        self.write_value_string(context, out, &format_offset(value.offset()));
        out.push('}');
    }

    fn write_value_object(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &BTreeMap<String, Value>,
    ) {
        out.push('{');
        separated_by(
            out,
            value,
            |out, (k, v)| {
                self.write_value_string(context, out, k);
                out.push(':');
                self.write_value_json(context, out, v);
            },
            ",",
        );
        out.push('}');
    }
}

/// Writer with no dialect overrides.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericTermWriter;

impl TermWriter for GenericTermWriter {
    fn as_dyn(&self) -> &dyn TermWriter {
        self
    }
}
