use crate::{fresh_table, silent_logs};
use quarry::{
    Document, Executor, Finite, QueryError, TableCreateOptions, Value, db, db_create, db_drop,
    db_list, shape, table,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn admin<E: Executor>(executor: &mut E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Databases
    if db_list()
        .run(executor)
        .await
        .unwrap()
        .iter()
        .any(|v| v == "bank")
    {
        db_drop("bank").run(executor).await.unwrap();
    }
    let created = db_create("bank")
        .run(executor)
        .await
        .expect("Could not create the database");
    assert_eq!(created.dbs_created, 1);
    let databases = db_list().run(executor).await.unwrap();
    assert!(databases.contains(&"bank".to_string()));
    assert!(databases.contains(&"test".to_string()));
    silent_logs! {
        let error = db_create("bank")
            .run(executor)
            .await
            .expect_err("The database already exists");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::RemoteQuery(..))
        ));
        assert!(format!("{error:#}").contains("already exists"));
    }

    // Tables
    let bank = db("bank");
    let created = bank
        .table_create_with_options(
            "accounts",
            TableCreateOptions {
                primary_key: Some("email".into()),
            },
        )
        .run(executor)
        .await
        .expect("Could not create the table");
    assert_eq!(created.tables_created, 1);
    bank.table_create("ledger").run(executor).await.unwrap();
    assert_eq!(
        bank.table_list().run(executor).await.unwrap(),
        ["accounts", "ledger"]
    );
    silent_logs! {
        bank.table_create("ledger")
            .run(executor)
            .await
            .expect_err("The table already exists");
        db("nowhere")
            .table_create("ledger")
            .run(executor)
            .await
            .expect_err("The database does not exist");
        bank.document_table("missing")
            .run(executor)
            .await
            .expect_err("The table does not exist");
    }

    // Custom primary key
    let accounts = bank.document_table("accounts");
    let result = accounts
        .insert(shape!([
            { email: "ann@example.com", owner: "ann", balance: 10 },
            { owner: "nobody", balance: 0 },
        ]))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(result.inserted, 2);
    assert_eq!(result.generated_keys.len(), 1);
    let ann = accounts
        .get("ann@example.com")
        .run(executor)
        .await
        .unwrap()
        .expect("The account is found by its email");
    assert_eq!(ann.get("owner"), Some(&Value::from("ann")));
    let generated = accounts
        .get(result.generated_keys[0].as_str())
        .run(executor)
        .await
        .unwrap()
        .expect("The generated key is stored in the primary key field");
    assert_eq!(
        generated.get("email"),
        Some(&Value::from(result.generated_keys[0].as_str()))
    );

    // Indexes
    let created = accounts.index_create("owner").run(executor).await.unwrap();
    assert_eq!(created.created, 1);
    let renamed = accounts
        .index_rename("owner", "holder")
        .run(executor)
        .await
        .unwrap();
    assert_eq!(renamed.renamed, 1);
    assert_eq!(accounts.index_list().run(executor).await.unwrap(), ["holder"]);
    let found = accounts
        .get_all_by("holder", ["ann"])
        .run(executor)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    silent_logs! {
        accounts
            .index_create("holder")
            .run(executor)
            .await
            .expect_err("The index already exists");
        accounts
            .index_rename("owner", "keeper")
            .run(executor)
            .await
            .expect_err("The index was renamed");
        accounts
            .get_all_by("owner", ["ann"])
            .run(executor)
            .await
            .expect_err("The index was renamed");
    }
    let dropped = accounts.index_drop("holder").run(executor).await.unwrap();
    assert_eq!(dropped.dropped, 1);
    assert!(accounts.index_list().run(executor).await.unwrap().is_empty());
    silent_logs! {
        accounts
            .index_drop("holder")
            .run(executor)
            .await
            .expect_err("The index was dropped");
    }

    // Tables without a database use the one of the connection
    let defaults = fresh_table(executor, "defaults").await;
    table::<Document>("defaults")
        .insert(shape!({ id: "x" }))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(defaults.count().run(executor).await.unwrap(), 1.0);

    // Drop
    let dropped = bank.table_drop("ledger").run(executor).await.unwrap();
    assert_eq!(dropped.tables_dropped, 1);
    let dropped = db_drop("bank").run(executor).await.unwrap();
    assert_eq!(dropped.dbs_dropped, 1);
    assert_eq!(dropped.tables_dropped, 1);
    assert!(!db_list().run(executor).await.unwrap().contains(&"bank".to_string()));
    silent_logs! {
        db_drop("bank")
            .run(executor)
            .await
            .expect_err("The database was dropped");
        accounts
            .count()
            .run(executor)
            .await
            .expect_err("The table was dropped with its database");
    }
}
