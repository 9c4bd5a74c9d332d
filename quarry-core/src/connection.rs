use crate::{Executor, Result};
use std::{borrow::Cow, future::Future};

pub trait Connection: Executor {
    /// Open a connection to the server at the given URL.
    fn connect(url: Cow<'static, str>) -> impl Future<Output = Result<impl Connection>>;

    /// Close the connection, any open cursor is terminated.
    fn disconnect(self) -> impl Future<Output = Result<()>> {
        async { Ok(()) }
    }
}
