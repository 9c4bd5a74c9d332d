#[cfg(test)]
mod tests {
    use quarry_core::{
        AsValue, Connection, DEFAULT_CHANGEFEED_QUEUE_SIZE, Document, Driver, Executor, Finite,
        Surface, TermWriter, WriteResult, db, db_create, db_list, table,
    };
    use quarry_memory::{MemoryConnection, MemoryDriver, MemoryServer};
    use quarry_tests::{execute_tests, init_logs, silent_logs};
    use std::{collections::BTreeMap, sync::Arc};
    use time::macros::datetime;

    #[tokio::test]
    async fn memory() {
        init_logs();
        const URL: &str = "memory://suite/test";
        let driver = MemoryDriver::new();
        let connection = driver
            .connect(URL.into())
            .await
            .expect("Could not connect to the memory server");
        execute_tests(connection, URL).await;
    }

    #[tokio::test]
    async fn shared_by_host() {
        init_logs();
        let first = MemoryConnection::connect("memory://shared".into())
            .await
            .expect("Could not connect");
        let second =
            MemoryConnection::connect("memory://shared/other?changefeed_queue_size=8".into())
                .await
                .expect("Could not connect");
        let third = MemoryConnection::connect("memory://elsewhere".into())
            .await
            .expect("Could not connect");
        assert!(Arc::ptr_eq(first.server(), second.server()));
        assert!(!Arc::ptr_eq(first.server(), third.server()));
        assert_eq!(first.server().host(), "shared");
        assert_eq!(first.default_db(), "test");
        assert_eq!(second.default_db(), "other");
        assert_eq!(first.changefeed_queue_size(), DEFAULT_CHANGEFEED_QUEUE_SIZE);
        assert_eq!(second.changefeed_queue_size(), 8);
        assert_eq!(MemoryDriver::NAME, "memory");
    }

    #[tokio::test]
    async fn reset() {
        init_logs();
        let mut connection = MemoryConnection::connect("memory://reset".into())
            .await
            .expect("Could not connect");
        db_create("scratch")
            .run(&mut connection)
            .await
            .expect("Could not create the database");
        connection.server().reset().expect("Could not reset");
        let databases = db_list()
            .run(&mut connection)
            .await
            .expect("Could not list the databases");
        assert_eq!(databases, ["test"]);
        let shared = MemoryServer::shared("reset").expect("Could not find the server");
        assert!(Arc::ptr_eq(&shared, connection.server()));
    }

    #[tokio::test]
    async fn run_in_db() {
        init_logs();
        let mut connection = MemoryConnection::connect("memory://run_in_db".into())
            .await
            .expect("Could not connect");
        db_create("scratch")
            .run(&mut connection)
            .await
            .expect("Could not create the database");
        db("scratch")
            .table_create("items")
            .run(&mut connection)
            .await
            .expect("Could not create the table");
        let item = BTreeMap::from([("name".to_string(), "hammer")]);
        let insert = table::<Document>("items")
            .insert(item)
            .expect("Could not build the insert");
        let written = connection
            .execute(insert.query().with_db("scratch"))
            .await
            .expect("Could not insert in the scratch database");
        let written = WriteResult::try_from_value(written).expect("Could not decode the result");
        assert_eq!(written.inserted, 1);
        let count = db("scratch")
            .document_table("items")
            .count()
            .run(&mut connection)
            .await
            .expect("Could not count the items");
        assert_eq!(count, 1.0);
        silent_logs! {
            assert!(
                table::<Document>("items")
                    .count()
                    .run(&mut connection)
                    .await
                    .is_err()
            );
        }
    }

    #[tokio::test]
    async fn wrong_url() {
        init_logs();
        silent_logs! {
            assert!(
                MemoryConnection::connect("sqlite://some_value".into())
                    .await
                    .is_err()
            );
            assert!(
                MemoryConnection::connect("memory://host?changefeed_queue_size=many".into())
                    .await
                    .is_err()
            );
        }
    }

    #[test]
    fn term_writer() {
        let writer = MemoryDriver::new().term_writer();
        let mut out = String::new();
        writer.write_value(&mut out, &datetime!(2024-01-01 0:00 UTC).as_value());
        assert_eq!(out, r#""2024-01-01T00:00:00Z""#);
        let mut out = String::new();
        writer.write_query(&mut out, table::<Document>("users").term());
        assert_eq!(out, r#"[TABLE,["users"]]"#);
    }
}
