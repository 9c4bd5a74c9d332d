use crate::fresh_table;
use quarry::{
    Conflict, Document, Executor, Expr, Finite, InsertOptions, Mutable, Number, QueryError,
    Sequence, UpdateOptions, Value, null, shape,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn writes<E: Executor>(executor: &mut E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    let items = fresh_table(executor, "items").await;

    // Insert
    let result = items
        .insert(shape!([
            { id: 1, name: "hammer", stock: 10 },
            { id: 2, name: "saw", stock: 3 },
            { id: 3, name: "drill", stock: 0 },
        ]))
        .expect("Could not build the insert")
        .run(executor)
        .await
        .expect("Could not insert the items");
    assert_eq!(result.inserted, 3);
    assert_eq!(result.errors, 0);
    assert!(result.generated_keys.is_empty());
    assert_eq!(items.count().run(executor).await.unwrap(), 3.0);

    // Generated keys
    let result = items
        .insert(shape!({ name: "glue", stock: 7 }))
        .unwrap()
        .run(executor)
        .await
        .expect("Could not insert without a key");
    assert_eq!(result.inserted, 1);
    assert_eq!(result.generated_keys.len(), 1);
    let key = result.generated_keys[0].clone();
    let glue = items
        .get(key.as_str())
        .run(executor)
        .await
        .unwrap()
        .expect("The generated key must find the document");
    assert_eq!(glue.get("name"), Some(&Value::from("glue")));

    // Duplicate keys
    let result = items
        .insert(shape!({ id: 1, name: "mallet" }))
        .unwrap()
        .run(executor)
        .await
        .expect("A collision is reported in the result");
    assert_eq!(result.inserted, 0);
    assert_eq!(result.errors, 1);
    assert!(
        result
            .first_error
            .as_deref()
            .is_some_and(|v| v.contains("Duplicate primary key")),
        "Unexpected first error {:?}",
        result.first_error
    );
    let error = result.check().expect_err("Collisions fail the check");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::Conflict(..))
    ));
    let hammer = items.get(1).run(executor).await.unwrap().unwrap();
    assert_eq!(hammer.get("name"), Some(&Value::from("hammer")));

    // Conflict policies
    let result = items
        .insert_with_options(
            shape!({ id: 1, name: "mallet" }),
            InsertOptions {
                conflict: Conflict::Update,
                return_changes: true,
            },
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.replaced, 1);
    assert_eq!(result.changes.len(), 1);
    let change = &result.changes[0];
    assert_eq!(
        change.old_val.as_ref().and_then(|v| v.get("name")),
        Some(&Value::from("hammer"))
    );
    assert_eq!(
        change.new_val.as_ref().and_then(|v| v.get("stock")),
        Some(&Value::Number(10.0)),
        "Update keeps the fields not in the new document"
    );
    let result = items
        .insert_with_options(
            shape!({ id: 1, name: "mallet" }),
            InsertOptions {
                conflict: Conflict::Replace,
                ..Default::default()
            },
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.replaced, 1);
    let mallet = items.get(1).run(executor).await.unwrap().unwrap();
    assert_eq!(mallet.get("stock"), None, "Replace drops the old fields");
    let result = items
        .insert_with_options(
            shape!({ id: 1, name: "mallet" }),
            InsertOptions {
                conflict: Conflict::Replace,
                ..Default::default()
            },
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.unchanged, 1);
    assert_eq!(result.affected(), 0);

    // Invalid documents
    let result = items
        .insert(shape!([{ id: 10 }, 5, { id: [1, 2] }]))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.inserted, 1);
    assert_eq!(result.errors, 2);
    assert!(matches!(
        result.check().unwrap_err().downcast_ref::<QueryError>(),
        Some(QueryError::RemoteQuery(..))
    ));
    items.get(10).delete().run(executor).await.unwrap();

    // Update
    let result = items
        .filter(|v: Expr<Document>| v.field::<Number>("stock").lt(5))
        .unwrap()
        .update(shape!({ reorder: true }))
        .unwrap()
        .run(executor)
        .await
        .expect("Could not update the selection");
    assert_eq!(result.replaced, 2);
    let result = items
        .get(2)
        .update(shape!({ reorder: true }))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.unchanged, 1);
    let result = items
        .get(404)
        .update(shape!({ reorder: true }))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.skipped, 1);
    assert_eq!(items.get(404).run(executor).await.unwrap(), None);

    // Update computed from each document
    let result = items
        .get(2)
        .update_by(|v| shape!({ stock: &v.field::<Number>("stock") + 5 }))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.replaced, 1);
    let saw = items.get(2).run(executor).await.unwrap().unwrap();
    assert_eq!(saw.get("stock"), Some(&Value::Number(8.0)));
    assert_eq!(saw.get("reorder"), Some(&Value::Boolean(true)));

    // Replace
    let result = items
        .get(3)
        .replace(shape!({ id: 3, name: "drill", stock: 2 }))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.replaced, 1);
    let drill = items.get(3).run(executor).await.unwrap().unwrap();
    assert_eq!(drill.get("reorder"), None);
    let result = items
        .get(3)
        .replace(shape!({ id: 30, name: "drill" }))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.errors, 1);
    assert!(
        result
            .first_error
            .as_deref()
            .is_some_and(|v| v.contains("cannot be changed"))
    );
    let result = items
        .get(4)
        .replace(shape!({ id: 4, name: "tape" }))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.inserted, 1, "Replacing a missing document inserts it");

    // Replace computed from each document, null deletes
    let result = items
        .get(4)
        .replace_by(|_| null())
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.deleted, 1);
    let result = items
        .replace_by(|v| v.without(&["reorder"]))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.replaced, 1);
    assert_eq!(result.unchanged, 3);

    // Delete
    let result = items
        .between_with_options(2, 3, Default::default())
        .delete_with_options(UpdateOptions {
            return_changes: true,
        })
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.deleted, 1);
    assert_eq!(result.changes.len(), 1);
    assert!(result.changes[0].is_delete());
    let result = items.get(2).delete().run(executor).await.unwrap();
    assert_eq!(result.skipped, 1);
    let result = items.delete().run(executor).await.unwrap();
    assert_eq!(result.deleted, 3);
    assert!(items.is_empty().run(executor).await.unwrap());
}
