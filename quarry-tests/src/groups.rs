use crate::fresh_table;
use quarry::{Executor, Expr, Finite, Number, QueryError, Sequence, Str, Value, desc, shape};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn groups<E: Executor>(executor: &mut E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    let sales = fresh_table(executor, "sales").await;
    sales
        .insert(shape!([
            { id: 1, region: "north", product: "a", amount: 10 },
            { id: 2, region: "south", product: "a", amount: 5 },
            { id: 3, region: "north", product: "b", amount: 7 },
            { id: 4, region: "north", product: "a", amount: 1 },
            { id: 5, product: "b", amount: 2 },
        ]))
        .unwrap()
        .run(executor)
        .await
        .expect("Could not insert the sales");

    // One field, groups in the order their key first appears
    let totals = sales
        .group("region", |members, region: Expr<Str>| {
            shape!({
                region: region,
                count: members.count(),
                total: members.sum_by("amount").expect("Amounts are numbers"),
            })
        })
        .expect("Could not build the group")
        .run(executor)
        .await
        .expect("Could not run the group");
    assert_eq!(totals.len(), 3);
    let summary: Vec<_> = totals
        .iter()
        .map(|v| {
            (
                v.get("region").cloned().unwrap_or_default(),
                v.get("count").and_then(Value::as_number),
                v.get("total").and_then(Value::as_number),
            )
        })
        .collect();
    assert_eq!(
        summary,
        [
            (Value::from("north"), Some(3.0), Some(18.0)),
            (Value::from("south"), Some(1.0), Some(5.0)),
            (Value::Null, Some(1.0), Some(2.0)),
        ]
    );

    // The grouped stream keeps every sequence operation
    let largest = sales
        .group("product", |members, product: Expr<Str>| {
            shape!({ product: product, best: members.max_by("amount").expect("Valid field") })
        })
        .unwrap()
        .order_by([desc("product")])
        .run(executor)
        .await
        .unwrap();
    assert_eq!(largest.len(), 2);
    assert_eq!(largest[0].get("product"), Some(&Value::from("b")));
    assert_eq!(
        largest[0].get("best").and_then(|v| v.get("id")),
        Some(&Value::Number(3.0))
    );
    assert_eq!(
        largest[1].get("best").and_then(|v| v.get("id")),
        Some(&Value::Number(1.0))
    );

    // Several fields, the key is an object
    let pairs = sales
        .filter(|v| v.has_fields(&["region"]))
        .unwrap()
        .group_by(&["region", "product"], |members, key| {
            shape!({ key: key, ids: members.map(|v| v.get("id")).expect("Valid map") })
        })
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(pairs.len(), 3);
    let keys: Vec<_> = pairs
        .iter()
        .map(|v| {
            let key = v.get("key").expect("Every group has a key");
            (
                key.get("region").and_then(Value::as_str).map(str::to_string),
                key.get("product").and_then(Value::as_str).map(str::to_string),
            )
        })
        .collect();
    assert_eq!(
        keys,
        [
            (Some("north".to_string()), Some("a".to_string())),
            (Some("south".to_string()), Some("a".to_string())),
            (Some("north".to_string()), Some("b".to_string())),
        ]
    );
    assert_eq!(
        pairs[0].get("ids"),
        Some(&Value::Array(vec![1.into(), 4.into()]))
    );

    // Only documents can be grouped
    let amounts = sales.map(|v| v.field::<Number>("amount")).unwrap();
    let error = amounts
        .group("region", |members, _: Expr<Str>| members.count())
        .expect_err("Numbers have no fields");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::TypeMismatch { .. })
    ));
    let empty = sales
        .filter(|v| v.field::<Number>("amount").gt(100))
        .unwrap()
        .group("region", |members, _: Expr<Str>| members.count())
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert!(empty.is_empty());
}
