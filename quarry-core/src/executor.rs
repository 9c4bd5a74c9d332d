use crate::{
    Driver, Error, Query, QueryResult, Result, Value,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// General method to submit any query, the server answers with either one atom or a sequence
    /// of elements.
    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Submit the query and return its elements one at a time.
    ///
    /// An atom that is an array is unpacked, any other atom is yielded as the only element.
    fn fetch(&mut self, query: Query) -> impl Stream<Item = Result<Value>> + Send {
        self.run(query)
            .map_ok(|v| match v {
                QueryResult::Atom(Value::Array(v)) => {
                    futures::stream::iter(v.into_iter().map(Ok::<_, Error>)).left_stream()
                }
                v => futures::stream::once(async move { Ok::<_, Error>(v.into_value()) }).right_stream(),
            })
            .try_flatten()
    }

    /// Submit the query and return its single settled result.
    ///
    /// A sequence is collected into an array.
    fn execute(&mut self, query: Query) -> impl Future<Output = Result<Value>> + Send {
        async move {
            let mut stream = std::pin::pin!(self.run(query));
            let mut elements = Vec::new();
            while let Some(v) = stream.next().await {
                match v? {
                    QueryResult::Atom(v) => return Ok(v),
                    QueryResult::Element(v) => elements.push(v),
                }
            }
            Ok(Value::Array(elements))
        }
    }
}
