use crate::fresh_table;
use quarry::{
    Document, Executor, Expr, Finite, MAX_TEMPLATE_DEPTH, Number, QueryError, Sequence, Template,
    Value, bind, expr, null, shape,
};
use std::{collections::BTreeMap, sync::LazyLock};
use tokio::sync::Mutex;

pub async fn shapes<E: Executor>(executor: &mut E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    let books = fresh_table(executor, "books").await;
    books
        .insert(shape!([
            { id: 1, title: "Dune", author: "Herbert", year: 1965 },
            { id: 2, title: "Solaris", author: "Lem", year: 1961 },
        ]))
        .unwrap()
        .run(executor)
        .await
        .expect("Could not insert the books");

    // Templates mixing proxies and literals at any depth
    let cards = books
        .order_by(["id"])
        .map(|v| {
            shape!({
                label: v.get("title"),
                details: { by: v.get("author"), tags: ["book", v.get("year")] },
                copies: 1,
                missing: null,
            })
        })
        .expect("Could not build the template")
        .run(executor)
        .await
        .expect("Could not evaluate the template");
    assert_eq!(cards.len(), 2);
    let first = &cards[0];
    assert_eq!(first.get("label"), Some(&Value::from("Dune")));
    assert_eq!(first.get("copies"), Some(&Value::Number(1.0)));
    assert_eq!(first.get("missing"), Some(&Value::Null));
    let details = first.get("details").expect("Missing details");
    assert_eq!(details.get("by"), Some(&Value::from("Herbert")));
    assert_eq!(
        details.get("tags"),
        Some(&Value::Array(vec!["book".into(), 1965.into()]))
    );

    // A template without proxies is a single literal
    let literal = expr(shape!({ a: [1, 2, { b: "c" }] }))
        .expect("Could not fold the literal")
        .run(executor)
        .await
        .expect("Could not evaluate the literal");
    assert_eq!(
        literal.get("a").and_then(Value::as_array).map(Vec::len),
        Some(3)
    );

    // Too deep
    let mut deep = Template::from(1);
    for _ in 0..=MAX_TEMPLATE_DEPTH {
        deep = Template::Array(vec![deep]);
    }
    let error = expr(deep).expect_err("Folding must stop at the nesting limit");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::ExpressionTooDeep { .. })
    ));

    // Objects
    let object = expr(shape!({ b: 2, a: 1 }))
        .unwrap()
        .into_expr()
        .cast::<Document>()
        .expect("An object literal is a document");
    assert_eq!(
        object.keys().datum().run(executor).await.unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
    assert_eq!(
        object.values().datum().run(executor).await.unwrap(),
        vec![Value::Number(1.0), Value::Number(2.0)]
    );
    let merged = object
        .merge(shape!({ c: { d: true } }))
        .unwrap()
        .datum()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(merged.len(), 3);
    assert!(object.has_fields(&["a", "b"]).datum().run(executor).await.unwrap());
    assert!(!object.has_fields(&["z"]).datum().run(executor).await.unwrap());
    let plucked = object.without(&["a"]).datum().run(executor).await.unwrap();
    assert_eq!(plucked, BTreeMap::from([("b".to_string(), Value::Number(2.0))]));

    // Arrays
    let numbers = expr(vec![3, 1, 2, 3]).unwrap().into_expr();
    assert_eq!(numbers.count().datum().run(executor).await.unwrap(), 4.0);
    assert_eq!(numbers.nth(-1).datum().run(executor).await.unwrap(), 3.0);
    assert!(numbers.contains(2).datum().run(executor).await.unwrap());
    assert_eq!(
        numbers.slice(1, 3).datum().run(executor).await.unwrap(),
        vec![1.0, 2.0]
    );
    assert_eq!(
        numbers.append(9).distinct().datum().run(executor).await.unwrap(),
        vec![1.0, 2.0, 3.0, 9.0]
    );
    assert_eq!(numbers.sum().datum().run(executor).await.unwrap(), 9.0);
    assert_eq!(numbers.avg().datum().run(executor).await.unwrap(), Some(2.25));
    assert_eq!(numbers.min().datum().run(executor).await.unwrap(), 1.0);
    assert_eq!(numbers.max().datum().run(executor).await.unwrap(), 3.0);
    let doubled = numbers
        .map(|v: Expr<Number>| &v * 2)
        .unwrap()
        .filter(|v| v.gt(4))
        .unwrap()
        .datum()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(doubled, vec![6.0, 6.0]);
    let error = numbers.nth(10).datum().run(executor).await;
    assert!(error.is_err(), "Out of range must fail");
    assert_eq!(
        numbers.nth(10).default(0).datum().run(executor).await.unwrap(),
        0.0
    );

    // Bindings
    let twenty = bind(10, |v: Expr<Number>| &v * 2)
        .unwrap()
        .run(executor)
        .await
        .unwrap();
    assert_eq!(twenty, 20.0);

    // Declared shapes are checked before anything is sent
    let error = expr("text")
        .unwrap()
        .into_expr()
        .any()
        .cast::<Number>()
        .expect_err("A string is not a number");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::TypeMismatch { .. })
    ));
    let years = books.map(|v| v.field::<Number>("year")).unwrap();
    let error = years.sum_by("price").expect_err("Numbers have no fields");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::TypeMismatch { .. })
    ));
    let nothing = null().datum().run(executor).await.unwrap();
    assert_eq!(nothing, Value::Null);
}
