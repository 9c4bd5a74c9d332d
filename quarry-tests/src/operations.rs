use crate::fresh_table;
use quarry::{
    Bound, Executor, Finite, Number, QueryError, RangeOptions, Sequence, Str, Value, asc, branch,
    desc, epoch_time, expr, shape,
};
use std::{collections::BTreeMap, sync::LazyLock};
use time::macros::datetime;
use tokio::sync::Mutex;

fn ids(rows: &[BTreeMap<String, Value>]) -> Vec<f64> {
    rows.iter()
        .filter_map(|v| v.get("id").and_then(Value::as_number))
        .collect()
}

pub async fn operations<E: Executor>(executor: &mut E) {
    // Arithmetic
    let seven = expr(7_i32).expect("Could not lift a number").into_expr();
    let value = ((&seven + 5) * 2)
        .datum()
        .run(executor)
        .await
        .expect("Could not evaluate the arithmetic");
    assert_eq!(value, 24.0);
    assert_eq!((&seven % 4).datum().run(executor).await.unwrap(), 3.0);
    assert_eq!((&seven & 3).datum().run(executor).await.unwrap(), 3.0);
    assert_eq!((&seven << 2).datum().run(executor).await.unwrap(), 28.0);
    assert_eq!(seven.bit_not().datum().run(executor).await.unwrap(), -8.0);
    let half = expr(2.5_f64).unwrap().into_expr();
    assert_eq!(half.round().datum().run(executor).await.unwrap(), 3.0);
    assert_eq!(half.floor().datum().run(executor).await.unwrap(), 2.0);
    assert_eq!(half.ceil().datum().run(executor).await.unwrap(), 3.0);

    // Division by zero fails on the server
    let error = (&seven / 0)
        .datum()
        .run(executor)
        .await
        .expect_err("Division by zero must fail");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::RemoteQuery(..))
    ));

    // Comparisons and booleans
    assert!(seven.gt(3).datum().run(executor).await.unwrap());
    assert!(!seven.le(3).datum().run(executor).await.unwrap());
    assert!(
        seven
            .lt(3)
            .or(seven.eq(7))
            .datum()
            .run(executor)
            .await
            .unwrap()
    );
    assert!(
        !seven
            .ne(7)
            .and(true)
            .datum()
            .run(executor)
            .await
            .unwrap()
    );
    let size = branch::<Str>(seven.gt(3), "big", "small")
        .run(executor)
        .await
        .expect("Could not evaluate the branch");
    assert_eq!(size, "big");

    // Strings
    let hello = expr("Hello World").unwrap().into_expr();
    assert_eq!(hello.upcase().datum().run(executor).await.unwrap(), "HELLO WORLD");
    assert_eq!(hello.downcase().datum().run(executor).await.unwrap(), "hello world");
    assert_eq!(
        hello.split().datum().run(executor).await.unwrap(),
        vec!["Hello".to_string(), "World".to_string()]
    );
    assert_eq!((&hello + "!").datum().run(executor).await.unwrap(), "Hello World!");
    let csv = expr("a,b,c").unwrap().into_expr();
    assert_eq!(
        csv.split_by(",", Some(1)).datum().run(executor).await.unwrap(),
        vec!["a".to_string(), "b,c".to_string()]
    );
    let accented = expr("héllo").unwrap().into_expr();
    assert_eq!(accented.count().datum().run(executor).await.unwrap(), 5.0);

    #[cfg(not(feature = "disable-regex"))]
    {
        let code = expr("order-1234").unwrap().into_expr();
        let found = code
            .match_("([a-z]+)-(\\d+)")
            .datum()
            .run(executor)
            .await
            .expect("Could not match the regex")
            .expect("The regex should match");
        assert_eq!(found["str"], Value::from("order-1234"));
        assert_eq!(found["start"], Value::Number(0.0));
        assert_eq!(found["end"], Value::Number(10.0));
        let groups = found["groups"].as_array().expect("Groups must be an array");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].get("str"), Some(&Value::from("1234")));
        assert!(code.matches("^ord").datum().run(executor).await.unwrap());
        assert!(!code.matches("^x").datum().run(executor).await.unwrap());
        let missing = code.match_("z+").datum().run(executor).await.unwrap();
        assert_eq!(missing, None);
    }

    // Defaults catch missing fields
    let object = expr(shape!({ a: 1 })).unwrap();
    let value = object
        .get("b")
        .default(5)
        .datum()
        .run(executor)
        .await
        .expect("Could not evaluate the default");
    assert_eq!(value, Value::Number(5.0));
    let error = object.get("b").datum().run(executor).await;
    assert!(error.is_err(), "A missing field is an error without default");

    // Dates
    let epoch = epoch_time(0).into_expr();
    assert_eq!(epoch.year().datum().run(executor).await.unwrap(), 1970.0);
    assert_eq!(epoch.day_of_week().datum().run(executor).await.unwrap(), 4.0);
    let later = &epoch + 3600;
    assert_eq!(
        later.clone().datum().run(executor).await.unwrap(),
        datetime!(1970-01-01 01:00 UTC)
    );
    let leap = expr(datetime!(2024-02-29 12:30 UTC)).unwrap().into_expr();
    assert_eq!(leap.day().datum().run(executor).await.unwrap(), 29.0);
    assert_eq!(leap.minutes().datum().run(executor).await.unwrap(), 30.0);
    assert_eq!(later.to_epoch_time().datum().run(executor).await.unwrap(), 3600.0);
    assert_eq!(later.diff(&epoch).datum().run(executor).await.unwrap(), 3600.0);
    let shifted = later.in_timezone("+02:00");
    assert_eq!(shifted.hours().datum().run(executor).await.unwrap(), 3.0);
    assert_eq!(shifted.timezone().datum().run(executor).await.unwrap(), "+02:00");
    assert!(
        later
            .during(&epoch, &epoch + 7200)
            .datum()
            .run(executor)
            .await
            .unwrap()
    );
    assert!(
        !(&epoch + 7200)
            .during(&epoch, &epoch + 7200)
            .datum()
            .run(executor)
            .await
            .unwrap()
    );
}

pub async fn sequences<E: Executor>(executor: &mut E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    let people = fresh_table(executor, "people").await;
    let written = people
        .insert(shape!([
            { id: 1, name: "alice", age: 30, city: "rome" },
            { id: 2, name: "bob", age: 25, city: "paris" },
            { id: 3, name: "carol", age: 35, city: "rome" },
            { id: 4, name: "dave", age: 25 },
        ]))
        .expect("Could not build the insert")
        .run(executor)
        .await
        .expect("Could not insert the people");
    assert_eq!(written.inserted, 4);

    // Filter
    let rows = people
        .filter(|v| v.get("age").ge(30))
        .expect("Could not build the filter")
        .order_by(["id"])
        .run(executor)
        .await
        .expect("Could not filter");
    assert_eq!(ids(&rows), [1.0, 3.0]);
    let rows = people
        .filter(|v| v.get("city").eq("rome"))
        .unwrap()
        .run(executor)
        .await
        .expect("A missing field must not fail the filter");
    assert_eq!(ids(&rows), [1.0, 3.0]);
    let rows = people
        .filter_by(shape!({ age: 25 }))
        .unwrap()
        .run(executor)
        .await
        .expect("Could not filter by example");
    assert_eq!(ids(&rows), [2.0, 4.0]);

    // Order, map and slicing
    let names = people
        .order_by([desc("age"), asc("name")])
        .map(|v| v.get("name"))
        .unwrap()
        .run(executor)
        .await
        .expect("Could not order");
    assert_eq!(
        names,
        ["carol", "alice", "bob", "dave"].map(Value::from).to_vec()
    );
    let rows = people
        .order_by(["id"])
        .skip(1)
        .limit(2)
        .run(executor)
        .await
        .unwrap();
    assert_eq!(ids(&rows), [2.0, 3.0]);
    let rows = people.order_by(["id"]).slice(1, 3).run(executor).await.unwrap();
    assert_eq!(ids(&rows), [2.0, 3.0]);
    let last = people.order_by(["id"]).nth(-1).run(executor).await.unwrap();
    assert_eq!(last["name"], Value::from("dave"));

    // Aggregates
    assert_eq!(people.count().run(executor).await.unwrap(), 4.0);
    assert_eq!(people.sum_by("age").unwrap().run(executor).await.unwrap(), 115.0);
    assert_eq!(
        people.avg_by("age").unwrap().run(executor).await.unwrap(),
        Some(28.75)
    );
    let youngest = people.min_by("age").unwrap().run(executor).await.unwrap();
    assert_eq!(youngest["age"], Value::Number(25.0));
    let oldest = people.max_by("age").unwrap().run(executor).await.unwrap();
    assert_eq!(oldest["name"], Value::from("carol"));
    let ages = people.map(|v| v.field::<Number>("age")).unwrap();
    assert_eq!(ages.sum().run(executor).await.unwrap(), 115.0);
    assert_eq!(
        ages.reduce(|a, b| a + b).unwrap().run(executor).await.unwrap(),
        115.0
    );
    assert_eq!(
        ages.distinct().run(executor).await.unwrap(),
        vec![25.0, 30.0, 35.0]
    );
    let nobody = people.filter(|v| v.get("age").gt(100)).unwrap();
    assert!(nobody.is_empty().run(executor).await.unwrap());
    assert_eq!(nobody.sum_by("age").unwrap().run(executor).await.unwrap(), 0.0);
    assert_eq!(nobody.avg_by("age").unwrap().run(executor).await.unwrap(), None);
    assert!(
        nobody
            .map(|v| v.field::<Number>("age"))
            .unwrap()
            .reduce(|a, b| a + b)
            .unwrap()
            .run(executor)
            .await
            .is_err(),
        "Reducing an empty sequence must fail"
    );

    // Membership and combination
    let names = people.map(|v| v.get("name")).unwrap();
    assert!(names.contains("bob").run(executor).await.unwrap());
    assert!(!names.contains("zoe").run(executor).await.unwrap());
    let both = people
        .get_all([1, 2])
        .union(&people.get_all([4]))
        .run(executor)
        .await
        .unwrap();
    assert_eq!(ids(&both), [1.0, 2.0, 4.0]);
    let doubled = people
        .concat_map(|v| vec![v.get("id"), v.get("id")])
        .unwrap()
        .count()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(doubled, 8.0);
    let array = people.order_by(["id"]).coerce_to_array().run(executor).await.unwrap();
    assert_eq!(array.len(), 4);

    // Projections
    let plucked = people.pluck(&["name"]).run(executor).await.unwrap();
    assert!(plucked.iter().all(|v| v.len() == 1 && v.contains_key("name")));
    let without = people.without(&["age", "city"]).run(executor).await.unwrap();
    assert!(without.iter().all(|v| v.len() == 2));
    let merged = people
        .merge(shape!({ active: true }))
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert!(merged.iter().all(|v| v["active"] == Value::Boolean(true)));
    let with_city = people.has_fields(&["city"]).run(executor).await.unwrap();
    assert_eq!(with_city.len(), 3);
    let cities = people.with_fields(&["id", "city"]).run(executor).await.unwrap();
    assert!(cities.iter().all(|v| v.len() == 2));
    let alice = people
        .get(1)
        .pluck(&["name"])
        .datum()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(alice, BTreeMap::from([("name".to_string(), Value::from("alice"))]));
    let missing = people.get(404).run(executor).await.unwrap();
    assert!(missing.is_none());

    // Ranges and secondary indexes
    let rows = people.between(2, 4).run(executor).await.unwrap();
    assert_eq!(ids(&rows), [2.0, 3.0]);
    let rows = people
        .between_with_options(
            2,
            4,
            RangeOptions {
                right_bound: Bound::Closed,
                ..Default::default()
            },
        )
        .run(executor)
        .await
        .unwrap();
    assert_eq!(ids(&rows), [2.0, 3.0, 4.0]);
    let created = people.index_create("city").run(executor).await.unwrap();
    assert_eq!(created.created, 1);
    let rows = people.get_all_by("city", ["rome"]).run(executor).await.unwrap();
    assert_eq!(ids(&rows), [1.0, 3.0]);
    people
        .index_create_by("decade", |v| (v.field::<Number>("age") / 10).floor())
        .unwrap()
        .run(executor)
        .await
        .expect("Could not create the computed index");
    let rows = people.get_all_by("decade", [2]).run(executor).await.unwrap();
    assert_eq!(ids(&rows), [2.0, 4.0]);
    let rows = people
        .between_with_options(
            3,
            4,
            RangeOptions {
                index: Some("decade".into()),
                ..Default::default()
            },
        )
        .run(executor)
        .await
        .unwrap();
    assert_eq!(ids(&rows), [1.0, 3.0]);
    let rows = people.get_all_by("nothing", [1]).run(executor).await;
    assert!(rows.is_err(), "An unknown index must fail");
}
