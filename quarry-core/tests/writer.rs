#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{
        Array, AsValue, Bool, ChangesOptions, Conflict, Document, Expr, Finite, GenericTermWriter,
        InsertOptions, Mutable, Number, Order, Sequence, Str, Surface, TermWriter, UpdateOptions,
        Value, asc, db, desc, table, var, writer::Context,
    };
    use std::collections::BTreeMap;
    use time::{OffsetDateTime, macros::datetime};

    /// Dialect writing times as server side conversions.
    struct Writer;
    impl TermWriter for Writer {
        fn as_dyn(&self) -> &dyn TermWriter {
            self
        }

        fn write_value_time(
            &self,
            context: &mut Context,
            out: &mut String,
            value: &OffsetDateTime,
        ) {
            out.push_str("[EPOCH_TIME,[");
            self.write_value_number(context, out, value.unix_timestamp() as f64);
            out.push_str("]]");
        }
    }

    const WRITER: Writer = Writer {};

    fn compact(text: &str) -> String {
        text.lines().map(str::trim).collect()
    }

    #[test]
    fn literals() {
        let mut out = String::new();
        GenericTermWriter.write_value(&mut out, &Value::Null);
        assert_eq!(out, "null");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-2.0).to_string(), "-2");
        assert_eq!(Value::Number(0.1).to_string(), "0.1");
        assert_eq!(Value::Number(1e20).to_string(), "1e20");
        assert_eq!(
            Value::from("a\"b\\c\n\t").to_string(),
            r#""a\"b\\c\n\t""#
        );
        assert_eq!(Value::from("\u{1}é").to_string(), r#""\u0001é""#);
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[DATUM,[1,2]]");
        assert_eq!(
            Value::Array(vec![Value::Array(vec![1.into()]), "x".into()]).to_string(),
            r#"[DATUM,[[1],"x"]]"#
        );
        let object = Value::Object(BTreeMap::from([
            ("b".to_string(), Value::Array(vec![true.into()])),
            ("a".to_string(), Value::Null),
        ]));
        assert_eq!(object.to_string(), r#"{"a":null,"b":[true]}"#);
    }

    #[test]
    fn times() {
        let moment = datetime!(1970-01-01 0:00:01.5 UTC);
        assert_eq!(
            moment.as_value().to_string(),
            r#"{"$reql_type$":"TIME","epoch_time":1.5,"timezone":"+00:00"}"#
        );
        let moment = datetime!(2024-01-01 0:00 +02:00);
        assert_eq!(
            moment.as_value().to_string(),
            r#"{"$reql_type$":"TIME","epoch_time":1704060000,"timezone":"+02:00"}"#
        );
        let moment = datetime!(2024-01-01 0:00 -05:30);
        assert_eq!(
            moment.as_value().to_string(),
            r#"{"$reql_type$":"TIME","epoch_time":1704087000,"timezone":"-05:30"}"#
        );

        let mut out = String::new();
        WRITER.write_value(&mut out, &moment.as_value());
        assert_eq!(out, "[EPOCH_TIME,[1704087000]]");
        let mut out = String::new();
        let object = Value::Object(BTreeMap::from([("at".to_string(), moment.as_value())]));
        WRITER.write_value(&mut out, &object);
        assert_eq!(out, r#"{"at":[EPOCH_TIME,[1704087000]]}"#);
    }

    #[test]
    fn tables() {
        let users = table::<Document>("users");
        assert_eq!(users.to_string(), r#"[TABLE,["users"]]"#);
        let scoped = db("app").document_table("users");
        assert_eq!(scoped.to_string(), r#"[TABLE,[[DB,["app"]],"users"]]"#);
        assert_eq!(
            scoped.get(1).term().to_string(),
            r#"[GET,[[TABLE,[[DB,["app"]],"users"]],1]]"#
        );
        assert_eq!(
            users.get_all(["a", "b"]).to_string(),
            r#"[GET_ALL,[[TABLE,["users"]],"a","b"]]"#
        );
    }

    #[test]
    fn functions() {
        let users = table::<Document>("users");
        let adults = users
            .filter(|v| v.field::<Number>("age").gt(18))
            .expect("Could not build the filter");
        assert_eq!(
            adults.to_string(),
            r#"[FILTER,[[TABLE,["users"]],[FUNC,["v1"],[GT,[[GET_FIELD,[[VAR,"v1"],"age"]],18]]]]]"#
        );
        let again = users
            .filter(|v| v.field::<Number>("age").gt(18))
            .unwrap();
        assert_eq!(adults.to_string(), again.to_string());
        assert!(!adults.term().same(again.term()));

        let total = users
            .map(|v| v.field::<Number>("age"))
            .unwrap()
            .reduce(|a, b| &a + b)
            .unwrap();
        assert_eq!(
            total.to_string(),
            compact(indoc! {r#"
                [REDUCE,[
                    [MAP,[[TABLE,["users"]],[FUNC,["v1"],[GET_FIELD,[[VAR,"v1"],"age"]]]]],
                    [FUNC,["v2","v3"],[ADD,[[VAR,"v2"],[VAR,"v3"]]]]
                ]]
            "#})
        );
    }

    #[test]
    fn operators() {
        let x = var::<Number>("x");
        assert_eq!(
            ((&x + 5) * 2).to_string(),
            r#"[MUL,[[ADD,[[VAR,"x"],5]],2]]"#
        );
        assert_eq!(
            x.gt(3).and(x.lt(10)).to_string(),
            r#"[AND,[[GT,[[VAR,"x"],3]],[LT,[[VAR,"x"],10]]]]"#
        );
        let numbers = var::<Array<Number>>("n");
        assert_eq!(numbers.min().to_string(), r#"[MIN,[[VAR,"n"]]]"#);
        assert_eq!(numbers.max().to_string(), r#"[MAX,[[VAR,"n"]]]"#);
        let ages = table::<Document>("users")
            .map(|v| v.field::<Number>("age"))
            .unwrap();
        assert_eq!(
            ages.max().to_string(),
            r#"[MAX,[[MAP,[[TABLE,["users"]],[FUNC,["v1"],[GET_FIELD,[[VAR,"v1"],"age"]]]]]]]"#
        );
        let ok = var::<Bool>("ok");
        assert_eq!((!&ok).to_string(), r#"[NOT,[[VAR,"ok"]]]"#);
        let name: Expr<Str> = var("name");
        assert_eq!(
            name.upcase().concat("!").to_string(),
            r#"[ADD,[[UPCASE,[[VAR,"name"]]],"!"]]"#
        );
    }

    #[test]
    fn ordering() {
        let users = table::<Document>("users");
        let page = users.order_by([desc("age"), asc("name")]).skip(20).limit(10);
        assert_eq!(
            page.to_string(),
            compact(indoc! {r#"
                [LIMIT,[[SKIP,[
                    [ORDER_BY,[[TABLE,["users"]],[DESC,["age"]],[ASC,["name"]]]]
                ,20]],10]]
            "#})
        );
        let by_score = users.order_by([
            Order::desc_by(|v: Expr<Document>| v.field::<Number>("score")).unwrap(),
        ]);
        assert_eq!(
            by_score.to_string(),
            r#"[ORDER_BY,[[TABLE,["users"]],[DESC,[[FUNC,["v1"],[GET_FIELD,[[VAR,"v1"],"score"]]]]]]]"#
        );
    }

    #[test]
    fn options() {
        let users = table::<Document>("users");
        let ann = BTreeMap::from([("name".to_string(), "ann")]);
        let insert = users.insert(ann.clone()).unwrap();
        assert_eq!(
            insert.to_string(),
            r#"[INSERT,[[TABLE,["users"]],{"name":"ann"}],{"conflict":"error"}]"#
        );
        let upsert = users
            .insert_with_options(
                ann,
                InsertOptions {
                    conflict: Conflict::Update,
                    return_changes: true,
                },
            )
            .unwrap();
        assert_eq!(
            upsert.to_string(),
            r#"[INSERT,[[TABLE,["users"]],{"name":"ann"}],{"conflict":"update","return_changes":true}]"#
        );

        let deleted = users.get(1).delete();
        assert_eq!(
            deleted.to_string(),
            r#"[DELETE,[[GET,[[TABLE,["users"]],1]]]]"#
        );
        let deleted = users.get(1).delete_with_options(UpdateOptions {
            return_changes: true,
        });
        assert_eq!(
            deleted.to_string(),
            r#"[DELETE,[[GET,[[TABLE,["users"]],1]]],{"return_changes":true}]"#
        );

        let feed = users.changes();
        assert_eq!(
            feed.term().to_string(),
            r#"[CHANGES,[[TABLE,["users"]]],{"include_initial":false,"squash":false}]"#
        );
        let feed = users.changes_with_options(ChangesOptions {
            changefeed_queue_size: Some(8),
            ..Default::default()
        });
        let mut out = String::new();
        GenericTermWriter.write_term(&mut Context::new(false), &mut out, feed.term());
        assert_eq!(out, r#"[CHANGES,[[TABLE,["users"]]]]"#);
        let mut out = String::new();
        GenericTermWriter.write_query(&mut out, feed.term());
        assert_eq!(
            out,
            r#"[CHANGES,[[TABLE,["users"]]],{"changefeed_queue_size":8,"include_initial":false,"squash":false}]"#
        );
    }
}
