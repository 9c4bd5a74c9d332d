use crate::{
    MemoryDriver, MemoryServer,
    eval::Evaluated,
    feed::{changefeed, changes_node},
    server::DEFAULT_DATABASE,
};
use async_stream::stream;
use quarry_core::{
    Connection, Context, DEFAULT_CHANGEFEED_QUEUE_SIZE, Driver, Error, Executor, Query,
    QueryResult, Result, TermWriter,
    future::Either,
    stream::Stream,
    truncate_long,
};
use std::{borrow::Cow, sync::Arc};
use url::Url;
use urlencoding::decode;

/// Connection to an in-process server.
///
/// URL format: `memory://host[/database][?changefeed_queue_size=N]`. Connections naming the same
/// host share the same catalog.
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    server: Arc<MemoryServer>,
    default_db: String,
    changefeed_queue_size: usize,
}

impl MemoryConnection {
    pub fn server(&self) -> &Arc<MemoryServer> {
        &self.server
    }

    /// Database of tables referenced without one.
    pub fn default_db(&self) -> &str {
        &self.default_db
    }

    pub fn changefeed_queue_size(&self) -> usize {
        self.changefeed_queue_size
    }
}

impl Executor for MemoryConnection {
    type Driver = MemoryDriver;

    fn driver(&self) -> &Self::Driver {
        &MemoryDriver {}
    }

    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send {
        let mut printed = String::new();
        self.driver()
            .term_writer()
            .write_query(&mut printed, &query.term);
        log::debug!("Running: {}", truncate_long!(printed));
        let server = self.server.clone();
        let db = query.options.db.unwrap_or_else(|| self.default_db.clone());
        if changes_node(&query.term).is_some() {
            return Either::Left(changefeed(
                server,
                db,
                query.term,
                self.changefeed_queue_size,
            ));
        }
        Either::Right(stream! {
            match server.execute(&query.term, &db) {
                Ok(Evaluated::Atom(v)) => yield Ok(QueryResult::Atom(v)),
                Ok(Evaluated::Sequence(v)) => {
                    for v in v {
                        yield Ok(QueryResult::Element(v));
                    }
                }
                Err(e) => {
                    let error = e.context(format!(
                        "While running the query:\n{}",
                        truncate_long!(printed)
                    ));
                    log::error!("{:#}", error);
                    yield Err(error);
                }
            }
        })
    }
}

impl Connection for MemoryConnection {
    #[allow(refining_impl_trait)]
    async fn connect(url: Cow<'static, str>) -> Result<MemoryConnection> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let url = decode(&url).with_context(context)?;
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Memory connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let url = Url::parse(&url).with_context(context)?;
        let host = url.host_str().unwrap_or_default();
        let default_db = match url.path().trim_matches('/') {
            "" => DEFAULT_DATABASE.to_string(),
            v => v.to_string(),
        };
        let mut changefeed_queue_size = DEFAULT_CHANGEFEED_QUEUE_SIZE;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "changefeed_queue_size" => {
                    changefeed_queue_size = value
                        .parse()
                        .with_context(|| format!("Invalid changefeed_queue_size `{value}`"))
                        .with_context(context)?;
                }
                _ => log::warn!("Unknown connection parameter `{key}` ignored"),
            }
        }
        let server = MemoryServer::shared(host)?;
        log::debug!("Connected to `{}` using database `{default_db}`", server.host());
        Ok(MemoryConnection {
            server,
            default_db,
            changefeed_queue_size,
        })
    }
}
