use crate::{
    eval::{EvalError, Evaluated, Evaluator},
    feed::Subscription,
};
use quarry_core::{Error, QueryError, Result, Term, Value};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, LazyLock, Mutex, MutexGuard, Weak},
};

/// Database every server starts with.
pub const DEFAULT_DATABASE: &str = "test";
/// Primary key of tables created without one.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

static SERVERS: LazyLock<Mutex<HashMap<String, Arc<MemoryServer>>>> =
    LazyLock::new(Default::default);

/// How a secondary index computes the key of a document, kept across renames.
#[derive(Debug, Clone)]
pub(crate) enum Index {
    Field(String),
    Function(Term),
}

#[derive(Debug)]
pub(crate) struct TableData {
    pub(crate) primary_key: String,
    /// Documents by primary key.
    pub(crate) rows: BTreeMap<Value, Value>,
    pub(crate) indexes: BTreeMap<String, Index>,
    pub(crate) subscribers: Vec<Weak<Subscription>>,
}

impl TableData {
    pub(crate) fn new(primary_key: String) -> Self {
        Self {
            primary_key,
            rows: Default::default(),
            indexes: Default::default(),
            subscribers: Default::default(),
        }
    }

    /// Live subscriptions, dropped ones are forgotten.
    pub(crate) fn subscribers(&mut self) -> Vec<Arc<Subscription>> {
        self.subscribers.retain(|v| v.strong_count() > 0);
        self.subscribers.iter().filter_map(Weak::upgrade).collect()
    }

    /// Stop every subscription, the table is going away.
    pub(crate) fn close(&mut self, reason: &str) {
        for subscription in self.subscribers() {
            subscription.close(reason.to_string());
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct DatabaseData {
    pub(crate) tables: BTreeMap<String, TableData>,
}

#[derive(Debug)]
pub(crate) struct Catalog {
    pub(crate) databases: BTreeMap<String, DatabaseData>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            databases: BTreeMap::from([(DEFAULT_DATABASE.to_string(), DatabaseData::default())]),
        }
    }
}

/// In-process server, shared by every connection to the same host.
#[derive(Debug)]
pub struct MemoryServer {
    host: String,
    catalog: Mutex<Catalog>,
}

impl MemoryServer {
    /// The server of `host`, started on first use.
    pub fn shared(host: &str) -> Result<Arc<MemoryServer>> {
        let mut servers = SERVERS
            .lock()
            .map_err(|_| Error::msg("The registry of memory servers is poisoned"))?;
        let server = servers.entry(host.to_string()).or_insert_with(|| {
            log::debug!("Starting the memory server `{host}`");
            Arc::new(MemoryServer {
                host: host.to_string(),
                catalog: Default::default(),
            })
        });
        Ok(server.clone())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Drop every database and start over with an empty default database.
    pub fn reset(&self) -> Result<()> {
        let mut catalog = self.catalog()?;
        for database in catalog.databases.values_mut() {
            for table in database.tables.values_mut() {
                table.close("The server was reset");
            }
        }
        *catalog = Catalog::default();
        Ok(())
    }

    pub(crate) fn catalog(&self) -> Result<MutexGuard<'_, Catalog>> {
        self.catalog.lock().map_err(|_| {
            let error = Error::msg(format!("The catalog of `{}` is poisoned", self.host));
            log::error!("{:#}", error);
            error
        })
    }

    /// Evaluate a whole query against the catalog.
    pub(crate) fn execute(&self, term: &Term, db: &str) -> Result<Evaluated> {
        let mut catalog = self.catalog()?;
        Evaluator::new(&mut catalog, db).run(term).map_err(remote_error)
    }
}

pub(crate) fn remote_error(error: EvalError) -> Error {
    QueryError::RemoteQuery(error.to_string()).into()
}
