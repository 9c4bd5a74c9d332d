use crate::{
    eval::{Evaluator, bound_table},
    server::{MemoryServer, remote_error},
};
use async_stream::try_stream;
use quarry_core::{
    AsValue, Error, QueryError, QueryResult, Result, Term, TermType, Value, ValueChange,
    stream::Stream,
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::Notify;

#[derive(Debug)]
enum Stop {
    Overflow,
    Closed(String),
}

#[derive(Debug, Default)]
struct FeedState {
    /// Changes not yet pulled, with the primary key they refer to.
    pending: VecDeque<(Value, ValueChange<Value>)>,
    stop: Option<Stop>,
    /// The stop error was delivered.
    done: bool,
}

/// Buffer between the writers of a table and one open changefeed.
///
/// Tables only keep a weak reference, dropping the feed stream unsubscribes.
#[derive(Debug)]
pub(crate) struct Subscription {
    /// Selection the feed was opened on.
    pub(crate) source: Term,
    limit: usize,
    squash: bool,
    state: Mutex<FeedState>,
    notify: Notify,
}

impl Subscription {
    fn new(source: Term, limit: usize, squash: bool) -> Self {
        Self {
            source,
            limit,
            squash,
            state: Default::default(),
            notify: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, key: Value, change: ValueChange<Value>) {
        let mut state = self.state();
        if state.stop.is_some() {
            return;
        }
        if self.squash
            && let Some(i) = state.pending.iter().position(|(k, _)| *k == key)
        {
            let (_, previous) = &mut state.pending[i];
            previous.new_val = change.new_val;
            if previous.old_val == previous.new_val {
                state.pending.remove(i);
            }
            return;
        }
        if state.pending.len() >= self.limit {
            log::warn!(
                "Changefeed on {} overflowed its queue of {} changes",
                self.source,
                self.limit
            );
            state.stop = Some(Stop::Overflow);
        } else {
            state.pending.push_back((key, change));
        }
        drop(state);
        self.notify.notify_one();
    }

    /// Stop the feed once the buffered changes are consumed.
    pub(crate) fn close(&self, reason: String) {
        let mut state = self.state();
        if state.stop.is_none() {
            log::debug!("Closing changefeed on {}: {reason}", self.source);
            state.stop = Some(Stop::Closed(reason));
        }
        drop(state);
        self.notify.notify_one();
    }

    /// Next change, then the error that stopped the feed, then `None`.
    async fn next(&self) -> Option<Result<ValueChange<Value>>> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state();
                if let Some((_, change)) = state.pending.pop_front() {
                    return Some(Ok(change));
                }
                if state.done {
                    return None;
                }
                if let Some(stop) = state.stop.take() {
                    state.done = true;
                    let error: Error = match stop {
                        Stop::Overflow => QueryError::QueueOverflow { limit: self.limit }.into(),
                        Stop::Closed(reason) => QueryError::RemoteQuery(reason).into(),
                    };
                    return Some(Err(error));
                }
            }
            notified.await;
        }
    }
}

/// The `CHANGES` node a feed query is built on, when the query is a feed.
pub(crate) fn changes_node(term: &Term) -> Option<&Term> {
    let mut current = term;
    loop {
        match current.term_type {
            TermType::Changes => return Some(current),
            TermType::Filter
            | TermType::Map
            | TermType::ConcatMap
            | TermType::Pluck
            | TermType::Without
            | TermType::Merge
            | TermType::HasFields
            | TermType::WithFields => current = current.args.first()?,
            _ => return None,
        }
    }
}

/// Register the subscription, returning it with the initial values when requested.
fn subscribe(
    server: &MemoryServer,
    db: &str,
    term: &Term,
    default_limit: usize,
) -> Result<(Arc<Subscription>, Vec<Value>)> {
    let changes = changes_node(term)
        .ok_or_else(|| Error::msg(format!("Expected a changefeed, found {}", term.term_type)))?;
    let source = changes
        .args
        .first()
        .ok_or_else(|| Error::msg("CHANGES requires a selection"))?;
    let option = |key: &str| changes.options.get(key);
    let squash = option("squash").is_some_and(Value::is_truthy);
    let include_initial = option("include_initial").is_some_and(Value::is_truthy);
    let limit = option("changefeed_queue_size")
        .and_then(Value::as_number)
        .map(|v| v as usize)
        .unwrap_or(default_limit)
        .max(1);
    let mut catalog = server.catalog()?;
    let mut evaluator = Evaluator::new(&mut catalog, db);
    let (db, name) = bound_table(source)
        .and_then(|table| evaluator.table_name(table))
        .map_err(remote_error)?;
    let initial = if include_initial {
        match evaluator.eval(source).map_err(remote_error)? {
            Value::Array(v) => v,
            Value::Null => Vec::new(),
            v => vec![v],
        }
    } else {
        Vec::new()
    };
    let subscription = Arc::new(Subscription::new(source.clone(), limit, squash));
    evaluator
        .table_mut(&db, &name)
        .map_err(remote_error)?
        .subscribers
        .push(Arc::downgrade(&subscription));
    log::debug!("Subscribed to `{db}.{name}` with a queue of {limit} changes");
    Ok((subscription, initial))
}

/// Apply the operations chained after `CHANGES` to one event.
fn project(server: &MemoryServer, db: &str, term: &Term, event: Value) -> Result<Vec<Value>> {
    let Some(changes) = changes_node(term) else {
        return Ok(vec![event]);
    };
    let mut catalog = server.catalog()?;
    let value = Evaluator::new(&mut catalog, db)
        .with_substitution(changes.clone(), Value::Array(vec![event]))
        .eval(term)
        .map_err(remote_error)?;
    Ok(match value {
        Value::Array(v) => v,
        v => vec![v],
    })
}

/// Stream of a changefeed query, registered before the first poll.
pub(crate) fn changefeed(
    server: Arc<MemoryServer>,
    db: String,
    term: Term,
    default_limit: usize,
) -> impl Stream<Item = Result<QueryResult>> + Send {
    let registered = subscribe(&server, &db, &term, default_limit).inspect_err(|e| {
        log::error!("{:#}", e);
    });
    try_stream! {
        let (subscription, initial) = registered?;
        for document in initial {
            let event = ValueChange {
                old_val: None,
                new_val: Some(document),
                error: None,
            };
            for value in project(&server, &db, &term, event.as_value())? {
                yield QueryResult::Element(value);
            }
        }
        while let Some(change) = subscription.next().await {
            for value in project(&server, &db, &term, change?.as_value())? {
                yield QueryResult::Element(value);
            }
        }
    }
}
