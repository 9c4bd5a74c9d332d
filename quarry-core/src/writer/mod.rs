mod context;
mod term_writer;

pub use context::*;
pub use term_writer::*;
