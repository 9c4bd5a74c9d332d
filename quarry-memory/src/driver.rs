use crate::{MemoryConnection, MemoryTermWriter};
use quarry_core::Driver;

#[derive(Default, Debug, Clone, Copy)]
pub struct MemoryDriver {}

impl MemoryDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for MemoryDriver {
    type Connection = MemoryConnection;
    type TermWriter = MemoryTermWriter;

    const NAME: &'static str = "memory";

    fn term_writer(&self) -> MemoryTermWriter {
        MemoryTermWriter {}
    }
}
