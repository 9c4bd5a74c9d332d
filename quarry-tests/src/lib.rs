mod admin;
#[cfg(not(feature = "disable-changefeeds"))]
mod feeds;
mod groups;
mod joins;
mod operations;
mod shapes;
mod writes;

use crate::{
    admin::admin,
    groups::groups,
    joins::joins,
    operations::{operations, sequences},
    shapes::shapes,
    writes::writes,
};
#[cfg(not(feature = "disable-changefeeds"))]
use feeds::{feeds, feeds_overflow};
use log::LevelFilter;
use quarry::{Connection, Document, Executor, Table, db};
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run the whole suite, `url` must open another connection to the same server.
pub async fn execute_tests<C: Connection>(mut connection: C, url: &str) {
    operations(&mut connection).await;
    sequences(&mut connection).await;
    shapes(&mut connection).await;
    writes(&mut connection).await;
    joins(&mut connection).await;
    groups(&mut connection).await;
    admin(&mut connection).await;
    #[cfg(not(feature = "disable-changefeeds"))]
    {
        let mut writer = C::connect(url.to_string().into())
            .await
            .expect("Could not open the writer connection");
        feeds(&mut connection, &mut writer).await;
        feeds_overflow(&mut connection, &mut writer).await;
    }
    #[cfg(feature = "disable-changefeeds")]
    let _ = url;
}

/// Drop the table when it exists and create it empty in the `test` database.
pub async fn fresh_table<E: Executor>(executor: &mut E, name: &str) -> Table<Document> {
    let test = db("test");
    let tables = test
        .table_list()
        .run(executor)
        .await
        .expect("Could not list the tables");
    if tables.iter().any(|v| v == name) {
        test.table_drop(name)
            .run(executor)
            .await
            .expect("Could not drop the table");
    }
    let created = test
        .table_create(name)
        .run(executor)
        .await
        .expect("Could not create the table");
    assert_eq!(created.tables_created, 1);
    test.document_table(name)
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
