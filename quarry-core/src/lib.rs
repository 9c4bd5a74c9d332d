mod as_value;
mod connection;
mod cursor;
mod driver;
mod error;
mod executor;
mod expr;
mod query;
mod result;
mod shape;
mod surface;
mod template;
mod term;
mod util;
mod value;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use connection::*;
pub use cursor::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use expr::*;
pub use query::*;
pub use result::*;
pub use shape::*;
pub use surface::*;
pub use template::*;
pub use term::*;
pub use util::*;
pub use value::*;
pub use writer::{GenericTermWriter, TermWriter};
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
