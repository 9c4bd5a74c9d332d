mod connection;
mod driver;
mod eval;
mod feed;
mod server;
mod term_writer;

pub use connection::*;
pub use driver::*;
pub use server::*;
pub use term_writer::*;
