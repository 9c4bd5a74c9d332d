use crate::{fresh_table, silent_logs};
use futures::{StreamExt, TryStreamExt};
use quarry::{
    ChangesOptions, Document, Executor, Expr, Mutable, QueryError, Sequence, Str, Value, db,
    shape,
};
use std::{collections::BTreeMap, sync::LazyLock};
use tokio::sync::Mutex;

fn field(document: &Option<BTreeMap<String, Value>>, key: &str) -> Value {
    document
        .as_ref()
        .and_then(|v| v.get(key))
        .cloned()
        .unwrap_or_default()
}

/// Feeds are read on `reader` while `writer` produces the changes.
pub async fn feeds<A: Executor, B: Executor>(reader: &mut A, writer: &mut B) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    let events = fresh_table(writer, "events").await;
    events
        .insert(shape!({ id: 1, kind: "seed" }))
        .unwrap()
        .run(writer)
        .await
        .unwrap();

    // Whole table, with the current documents first
    {
        let feed = events.changes_with_options(ChangesOptions {
            include_initial: true,
            ..Default::default()
        });
        let mut cursor = feed.subscribe(reader);
        events
            .insert(shape!({ id: 2, kind: "click" }))
            .unwrap()
            .run(writer)
            .await
            .unwrap();
        events
            .get(1)
            .update(shape!({ kind: "seen" }))
            .unwrap()
            .run(writer)
            .await
            .unwrap();
        events.get(2).delete().run(writer).await.unwrap();

        let initial = cursor
            .next_item()
            .await
            .expect("The feed ended early")
            .expect("Could not decode the initial value");
        assert!(initial.is_insert());
        assert_eq!(field(&initial.new_val, "kind"), Value::from("seed"));
        let inserted = cursor.next_item().await.unwrap().unwrap();
        assert!(inserted.is_insert());
        assert_eq!(field(&inserted.new_val, "id"), Value::Number(2.0));
        let updated = cursor.next_item().await.unwrap().unwrap();
        assert_eq!(field(&updated.old_val, "kind"), Value::from("seed"));
        assert_eq!(field(&updated.new_val, "kind"), Value::from("seen"));
        let deleted = cursor.next_item().await.unwrap().unwrap();
        assert!(deleted.is_delete());
        assert_eq!(field(&deleted.old_val, "id"), Value::Number(2.0));
        cursor.close();
        assert!(cursor.is_closed());
        assert!(cursor.next_item().await.is_none());
    }

    // Selection, only the changes touching it are delivered
    {
        let feed = events
            .filter(|v: Expr<Document>| v.field::<Str>("kind").eq("click"))
            .unwrap()
            .changes();
        let mut cursor = feed.subscribe(reader);
        for (id, kind) in [(3, "view"), (4, "click")] {
            events
                .insert(shape!({ id: id, kind: kind }))
                .unwrap()
                .run(writer)
                .await
                .unwrap();
        }
        events
            .get(4)
            .update(shape!({ kind: "view" }))
            .unwrap()
            .run(writer)
            .await
            .unwrap();
        let inserted = cursor.next_item().await.unwrap().unwrap();
        assert_eq!(field(&inserted.new_val, "id"), Value::Number(4.0));
        let left = cursor.next_item().await.unwrap().unwrap();
        assert!(left.is_delete(), "Leaving the selection looks like a deletion");
        assert_eq!(field(&left.old_val, "id"), Value::Number(4.0));
    }

    // Operations chained after the feed run on every change
    {
        let feed = events
            .changes()
            .map(|v| v.new_val().get("id"))
            .expect("Could not map the feed");
        let mut cursor = feed.subscribe(reader);
        events
            .insert(shape!({ id: 5, kind: "click" }))
            .unwrap()
            .run(writer)
            .await
            .unwrap();
        let id = cursor.next_item().await.unwrap().unwrap();
        assert_eq!(id, Some(Value::Number(5.0)));
    }

    // Squashed changes of the same document are coalesced
    {
        let feed = events.changes_with_options(ChangesOptions {
            squash: true,
            ..Default::default()
        });
        let mut cursor = feed.subscribe(reader);
        events
            .insert(shape!({ id: 6, kind: "first" }))
            .unwrap()
            .run(writer)
            .await
            .unwrap();
        for kind in ["second", "final"] {
            events
                .get(6)
                .update(shape!({ kind: kind }))
                .unwrap()
                .run(writer)
                .await
                .unwrap();
        }
        events
            .insert(shape!({ id: 7, kind: "other" }))
            .unwrap()
            .run(writer)
            .await
            .unwrap();
        let squashed = cursor.next_item().await.unwrap().unwrap();
        assert!(squashed.is_insert());
        assert_eq!(field(&squashed.new_val, "kind"), Value::from("final"));
        let next = cursor.next_item().await.unwrap().unwrap();
        assert_eq!(field(&next.new_val, "id"), Value::Number(7.0));
    }

    // Dropping the table stops its feeds
    {
        let doomed = fresh_table(writer, "doomed").await;
        let feed = doomed.changes();
        let mut cursor = feed.subscribe(reader);
        db("test").table_drop("doomed").run(writer).await.unwrap();
        let error = cursor
            .next_item()
            .await
            .expect("The feed reports why it stopped")
            .expect_err("The table was dropped");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::RemoteQuery(..))
        ));
        assert!(cursor.next_item().await.is_none());
    }
}

/// A consumer falling behind receives the buffered changes, then an overflow error.
pub async fn feeds_overflow<A: Executor, B: Executor>(reader: &mut A, writer: &mut B) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    let burst = fresh_table(writer, "burst").await;
    let feed = burst.changes_with_options(ChangesOptions {
        changefeed_queue_size: Some(2),
        ..Default::default()
    });
    let mut cursor = feed.subscribe(reader);
    silent_logs! {
        burst
            .insert(shape!([{ id: 1 }, { id: 2 }, { id: 3 }]))
            .unwrap()
            .run(writer)
            .await
            .unwrap();
    }
    let buffered: Vec<_> = (&mut cursor)
        .take(2)
        .try_collect()
        .await
        .expect("The buffered changes are delivered before the error");
    let ids: Vec<_> = buffered.iter().map(|v| field(&v.new_val, "id")).collect();
    assert_eq!(ids, [Value::Number(1.0), Value::Number(2.0)]);
    let error = cursor
        .next_item()
        .await
        .expect("The overflow is reported")
        .expect_err("The queue overflowed");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::QueueOverflow { limit: 2 })
    ));
    assert!(cursor.next_item().await.is_none());
}
