#[cfg(test)]
mod tests {
    use quarry::{
        Document, MAX_TEMPLATE_DEPTH, Number, QueryError, Sequence, Str, Template, Value, expr,
        shape, table, var,
    };
    use time::macros::datetime;

    #[test]
    fn shape_literal() {
        let template = shape!({
            name: "ann",
            "created at": datetime!(2020-01-01 0:00 UTC),
            tags: ["a", "b"],
            deleted: null,
            score: 1.5,
        });
        assert!(!template.contains_proxy());
        let folded = template.fold().expect("Could not fold the template");
        assert!(folded.as_datum().is_some());
        assert_eq!(
            folded.to_string(),
            concat!(
                r#"{"created at":{"$reql_type$":"TIME","epoch_time":1577836800,"timezone":"+00:00"},"#,
                r#""deleted":null,"name":"ann","score":1.5,"tags":["a","b"]}"#,
            )
        );
        let folded = shape!([1, [2, 3], {}]).fold().unwrap();
        assert_eq!(folded.to_string(), "[DATUM,[1,[2,3],{}]]");
    }

    #[test]
    fn shape_proxies() {
        let user = var::<Document>("u");
        let template = shape!({
            name: user.get("name"),
            tags: ["a", 1],
            meta: { score: 1 },
            missing: None::<i32>,
        });
        assert!(template.contains_proxy());
        assert_eq!(
            expr(template).unwrap().to_string(),
            r#"[MAKE_OBJECT,{"meta":{"score":1},"name":[GET_FIELD,[[VAR,"u"],"name"]],"tags":[DATUM,["a",1]]}]"#
        );
        let template = shape!([user.get("id"), 2, null, None::<i32>]);
        assert_eq!(
            template.fold().unwrap().to_string(),
            r#"[MAKE_ARRAY,[[GET_FIELD,[[VAR,"u"],"id"]],2,null,null]]"#
        );
        let template = shape!({ outer: { inner: user.get("x") } });
        assert_eq!(
            template.fold().unwrap().to_string(),
            r#"[MAKE_OBJECT,{"outer":[MAKE_OBJECT,{"inner":[GET_FIELD,[[VAR,"u"],"x"]]}]}]"#
        );
    }

    #[test]
    fn shape_sharing() {
        let user = var::<Document>("u");
        let name = user.get("name");
        let folded = shape!({ first: &name, second: &name }).fold().unwrap();
        assert_eq!(folded.args.len(), 2);
        assert!(folded.args[0].same(&folded.args[1]));
        assert!(folded.args[0].same(name.term()));
        assert!(name.term().holders() >= 3);
    }

    #[test]
    fn shape_in_functions() {
        let users = table::<Document>("users");
        let mapped = users
            .map(|v| {
                shape!({
                    name: v.get("name"),
                    adult: v.field::<Number>("age").ge(18),
                })
            })
            .expect("Could not build the map");
        assert_eq!(
            mapped.to_string(),
            concat!(
                r#"[MAP,[[TABLE,["users"]],[FUNC,["v1"],[MAKE_OBJECT,{"#,
                r#""adult":[GE,[[GET_FIELD,[[VAR,"v1"],"age"]],18]],"#,
                r#""name":[GET_FIELD,[[VAR,"v1"],"name"]]}]]]]"#,
            )
        );
    }

    #[test]
    fn shape_depth() {
        let mut template = Template::from(1);
        for _ in 0..MAX_TEMPLATE_DEPTH {
            template = Template::Array(vec![template]);
        }
        assert!(template.clone().fold().is_ok());
        let error = Template::Array(vec![template])
            .fold()
            .expect_err("The template is one level too deep");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::ExpressionTooDeep {
                limit: MAX_TEMPLATE_DEPTH
            })
        ));

        let mut value = Value::Null;
        for _ in 0..=MAX_TEMPLATE_DEPTH {
            value = Value::Array(vec![value]);
        }
        assert!(Template::from(value).fold().is_err());
    }

    #[test]
    fn cast() {
        let text = expr("text").unwrap().into_expr().any();
        let error = text
            .clone()
            .cast::<Number>()
            .expect_err("A string is not a number");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::TypeMismatch {
                operation: "cast",
                ..
            })
        ));
        assert!(text.cast::<Str>().is_ok());
        assert!(var::<Document>("u").get("age").cast::<Number>().is_ok());
    }
}
