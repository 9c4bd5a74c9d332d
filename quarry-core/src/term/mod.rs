mod options;
mod term;
mod term_type;

pub use options::*;
pub use term::*;
pub use term_type::*;
