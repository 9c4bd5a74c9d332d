use quarry_core::{TermWriter, writer::Context};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Writer used for the query logs of the memory server, times are printed as RFC 3339 text.
#[derive(Default, Debug, Clone, Copy)]
pub struct MemoryTermWriter {}

impl TermWriter for MemoryTermWriter {
    fn as_dyn(&self) -> &dyn TermWriter {
        self
    }

    fn write_value_time(&self, context: &mut Context, out: &mut String, value: &OffsetDateTime) {
        match value.format(&Rfc3339) {
            Ok(v) => self.write_value_string(context, out, &v),
            Err(..) => {
                out.push_str("{\"$reql_type$\":\"TIME\",\"epoch_time\":");
                let seconds = value.unix_timestamp_nanos() as f64 / 1_000_000_000.0;
                self.write_value_number(context, out, seconds);
                out.push('}');
            }
        }
    }
}
