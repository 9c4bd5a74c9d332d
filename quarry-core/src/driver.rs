use crate::{Connection, Result, TermWriter};
use std::{borrow::Cow, future::Future};

pub trait Driver {
    type Connection: Connection;
    type TermWriter: TermWriter;

    const NAME: &'static str;

    fn term_writer(&self) -> Self::TermWriter;

    /// Open a connection of this driver.
    fn connect(&self, url: Cow<'static, str>) -> impl Future<Output = Result<impl Connection>> {
        Self::Connection::connect(url)
    }
}
