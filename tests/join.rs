#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry::{
        Any, Document, Expr, Finite, JoinKind, Number, QueryError, Sequence, Table, Value, shape,
        table,
    };

    fn compact(text: &str) -> String {
        text.lines().map(str::trim).collect()
    }

    fn tables() -> (Table<Document>, Table<Document>) {
        (table("users"), table("orders"))
    }

    #[test]
    fn join_inner() {
        let (users, orders) = tables();
        let joined = users
            .inner_join(
                &orders,
                |u, o| u.get("id").eq(o.get("user")),
                |u, o| shape!({ user: u.get("name"), item: o.get("item") }),
            )
            .expect("Could not build the join");
        assert_eq!(
            joined.to_string(),
            compact(indoc! {r#"
                [JOIN,"inner",[
                    [TABLE,["users"]],
                    [TABLE,["orders"]],
                    [FUNC,["v1","v2"],[EQ,[[GET_FIELD,[[VAR,"v1"],"id"]],[GET_FIELD,[[VAR,"v2"],"user"]]]]],
                    [FUNC,["v3","v4"],[MAKE_OBJECT,{
                        "item":[GET_FIELD,[[VAR,"v4"],"item"]],
                        "user":[GET_FIELD,[[VAR,"v3"],"name"]]
                    }]]
                ]]
            "#})
        );
    }

    #[test]
    fn join_left() {
        let (users, orders) = tables();
        let joined = users
            .left_join(
                &orders,
                |u, o| u.get("id").eq(o.get("user")),
                |u, o| shape!({ user: u.get("name"), item: o.get("item").default("-") }),
            )
            .unwrap();
        assert_eq!(
            joined.to_string(),
            compact(indoc! {r#"
                [JOIN,"left",[
                    [TABLE,["users"]],
                    [TABLE,["orders"]],
                    [FUNC,["v1","v2"],[EQ,[[GET_FIELD,[[VAR,"v1"],"id"]],[GET_FIELD,[[VAR,"v2"],"user"]]]]],
                    [FUNC,["v3","v4"],[MAKE_OBJECT,{
                        "item":[DEFAULT,[[GET_FIELD,[[VAR,"v4"],"item"]],"-"]],
                        "user":[GET_FIELD,[[VAR,"v3"],"name"]]
                    }]]
                ]]
            "#})
        );
        let bare = users
            .left_join(
                &orders,
                |u, o| u.get("id").eq(o.get("user")),
                |_, o| o.get("item"),
            )
            .unwrap();
        assert!(
            bare.to_string()
                .ends_with(r#"[FUNC,["v3","v4"],[DEFAULT,[[GET_FIELD,[[VAR,"v4"],"item"]],null]]]]]"#)
        );
        let missing = users
            .right_excl_join(
                &orders,
                |u, o| u.get("id").eq(o.get("user")),
                |u, _| u.is_null(),
            )
            .unwrap();
        assert!(missing.to_string().starts_with(r#"[JOIN,"right_excl",["#));
        assert!(
            missing
                .to_string()
                .ends_with(r#"[FUNC,["v3","v4"],[EQ,[[VAR,"v3"],null]]]]]"#)
        );
    }

    #[test]
    fn join_cross() {
        let (users, _) = tables();
        let joined = users
            .cross_join(vec![Value::from(1), Value::from(2)], |u, n| {
                shape!({ user: u.get("name"), n: n })
            })
            .unwrap();
        assert_eq!(
            joined.to_string(),
            compact(indoc! {r#"
                [JOIN,"cross",[
                    [TABLE,["users"]],
                    [DATUM,[1,2]],
                    [FUNC,["v1","v2"],[MAKE_OBJECT,{"n":[VAR,"v2"],"user":[GET_FIELD,[[VAR,"v1"],"name"]]}]]
                ]]
            "#})
        );
        let kinds: Vec<_> = [
            JoinKind::Cross,
            JoinKind::Inner,
            JoinKind::Left,
            JoinKind::LeftExcl,
            JoinKind::Right,
            JoinKind::RightExcl,
            JoinKind::FullOuter,
            JoinKind::FullExcl,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(
            kinds,
            [
                "cross",
                "inner",
                "left",
                "left_excl",
                "right",
                "right_excl",
                "full_outer",
                "full_excl",
            ]
        );
    }

    #[test]
    fn group() {
        let (_, orders) = tables();
        let grouped = orders
            .group("user", |members, user: Expr<Any>| {
                shape!({ user: user, count: members.count() })
            })
            .unwrap();
        assert_eq!(
            grouped.to_string(),
            compact(indoc! {r#"
                [GROUP,["user"],[
                    [TABLE,["orders"]],
                    [FUNC,["v1","v2"],[MAKE_OBJECT,{"count":[COUNT,[[VAR,"v1"]]],"user":[VAR,"v2"]}]]
                ]]
            "#})
        );
        let grouped = orders
            .group_by(&["user", "item"], |members, key| {
                shape!({ key: key, count: members.count() })
            })
            .unwrap();
        assert!(grouped.to_string().starts_with(r#"[GROUP,["user","item"],["#));

        let totals = orders.map(|v| v.field::<Number>("total")).unwrap();
        let error = totals
            .group("user", |members, _: Expr<Any>| members.count())
            .expect_err("Numbers cannot be grouped by field");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::TypeMismatch {
                operation: "group",
                ..
            })
        ));
    }
}
