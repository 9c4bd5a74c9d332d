use crate::fresh_table;
use quarry::{Executor, Finite, Mutable, Value, desc, shape};
use std::{collections::BTreeMap, sync::LazyLock};
use tokio::sync::Mutex;

/// The `user` and `item` fields of every joined row, `-` for the missing side.
fn pairs(rows: Vec<Value>) -> Vec<(String, String)> {
    let field = |row: &Value, key: &str| {
        row.get(key)
            .and_then(Value::as_str)
            .unwrap_or("-")
            .to_string()
    };
    rows.iter()
        .map(|v| (field(v, "user"), field(v, "item")))
        .collect()
}

fn pair(user: &str, item: &str) -> (String, String) {
    (user.to_string(), item.to_string())
}

fn coupon(user: i32, item: &str) -> Value {
    Value::Object(BTreeMap::from([
        ("user".to_string(), user.into()),
        ("item".to_string(), item.into()),
    ]))
}

pub async fn joins<E: Executor>(executor: &mut E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    let users = fresh_table(executor, "users").await;
    let orders = fresh_table(executor, "orders").await;
    users
        .insert(shape!([
            { id: 1, name: "ann" },
            { id: 2, name: "ben" },
            { id: 3, name: "cid" },
        ]))
        .unwrap()
        .run(executor)
        .await
        .expect("Could not insert the users");
    orders
        .insert(shape!([
            { id: 10, user: 1, item: "pen" },
            { id: 11, user: 1, item: "ink" },
            { id: 12, user: 2, item: "cup" },
            { id: 13, user: 9, item: "hat" },
        ]))
        .unwrap()
        .run(executor)
        .await
        .expect("Could not insert the orders");

    // Inner
    let rows = users
        .inner_join(
            &orders,
            |u, o| u.get("id").eq(o.get("user")),
            |u, o| shape!({ user: u.get("name"), item: o.get("item") }),
        )
        .expect("Could not build the inner join")
        .run(executor)
        .await
        .expect("Could not run the inner join");
    assert_eq!(
        pairs(rows),
        [pair("ann", "pen"), pair("ann", "ink"), pair("ben", "cup")]
    );

    // Left
    let rows = users
        .left_join(
            &orders,
            |u, o| u.get("id").eq(o.get("user")),
            |u, o| shape!({ user: u.get("name"), item: o.get("item").default("-") }),
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(
        pairs(rows),
        [
            pair("ann", "pen"),
            pair("ann", "ink"),
            pair("ben", "cup"),
            pair("cid", "-"),
        ]
    );
    let rows = users
        .left_join(
            &orders,
            |u, o| u.get("id").eq(o.get("user")),
            |u, o| shape!({ user: u.get("name"), item: o.get("item") }),
        )
        .expect("Could not build the left join reading the missing side")
        .run(executor)
        .await
        .expect("A field of the missing side must read as null");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2].get("item"), Some(&Value::from("cup")));
    assert_eq!(rows[3].get("user"), Some(&Value::from("cid")));
    assert_eq!(rows[3].get("item"), Some(&Value::Null));
    let rows = users
        .left_excl_join(
            &orders,
            |u, o| u.get("id").eq(o.get("user")),
            |u, o| shape!({ user: u.get("name"), missing: o.is_null() }),
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("user"), Some(&Value::from("cid")));
    assert_eq!(rows[0].get("missing"), Some(&Value::Boolean(true)));

    // Right
    let rows = users
        .right_join(
            &orders,
            |u, o| u.get("id").eq(o.get("user")),
            |u, o| shape!({ user: u.get("name").default("-"), item: o.get("item") }),
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(
        pairs(rows),
        [
            pair("ann", "pen"),
            pair("ann", "ink"),
            pair("ben", "cup"),
            pair("-", "hat"),
        ]
    );
    let rows = users
        .right_excl_join(
            &orders,
            |u, o| u.get("id").eq(o.get("user")),
            |u, o| shape!({ user: u.get("name").default("-"), item: o.get("item") }),
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(pairs(rows), [pair("-", "hat")]);

    // Full
    let rows = users
        .full_outer_join(
            &orders,
            |u, o| u.get("id").eq(o.get("user")),
            |u, o| {
                shape!({
                    user: u.get("name").default("-"),
                    item: o.get("item").default("-"),
                })
            },
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(
        pairs(rows),
        [
            pair("ann", "pen"),
            pair("ann", "ink"),
            pair("ben", "cup"),
            pair("cid", "-"),
            pair("-", "hat"),
        ]
    );
    let rows = users
        .full_excl_join(
            &orders,
            |u, o| u.get("id").eq(o.get("user")),
            |u, o| {
                shape!({
                    user: u.get("name").default("-"),
                    item: o.get("item").default("-"),
                })
            },
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(pairs(rows), [pair("cid", "-"), pair("-", "hat")]);

    // Cross
    let rows = users
        .cross_join(&orders, |u, o| {
            shape!({ user: u.get("name"), item: o.get("item") })
        })
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(rows.len(), 12);
    assert_eq!(rows[0].get("user"), Some(&Value::from("ann")));
    assert_eq!(rows[11].get("item"), Some(&Value::from("hat")));

    // Narrowed left side, eager right side
    let coupons = vec![coupon(2, "free shipping"), coupon(3, "ten percent")];
    let rows = users
        .order_by([desc("id")])
        .limit(2)
        .inner_join(
            coupons,
            |u, c| u.get("id").eq(c.get("user")),
            |u, c| shape!({ user: u.get("name"), item: c.get("item") }),
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(
        pairs(rows),
        [pair("cid", "ten percent"), pair("ben", "free shipping")]
    );

    // Joining with an empty side
    let deleted = orders.delete().run(executor).await.unwrap();
    assert_eq!(deleted.deleted, 4);
    let rows = users
        .inner_join(
            &orders,
            |u, o| u.get("id").eq(o.get("user")),
            |u, _| u,
        )
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert!(rows.is_empty());
}
