#[cfg(test)]
mod tests {
    use quarry_core::{AsValue, Kind, QueryError, Value, WriteResult};
    use std::collections::{BTreeMap, HashMap};
    use time::macros::datetime;
    use uuid::Uuid;

    #[test]
    fn value_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::default(), Value::Null);
        assert_ne!(Value::Number(0.0), Value::Null);
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::from("").is_truthy());
    }

    #[test]
    fn value_integers() {
        let val = 42_i32.as_value();
        assert_eq!(val, Value::Number(42.0));
        assert_eq!(i32::try_from_value(val.clone()).unwrap(), 42);
        assert_eq!(u8::try_from_value(val.clone()).unwrap(), 42);
        assert_eq!(i64::try_from_value(val).unwrap(), 42);
        assert!(u8::try_from_value(Value::Number(256.0)).is_err());
        assert!(u32::try_from_value(Value::Number(-1.0)).is_err());
        let error = i32::try_from_value(Value::Number(1.5)).unwrap_err();
        assert!(format!("{error}").contains("not an integer"));
        assert!(i32::try_from_value(Value::from("42")).is_err());
        assert_eq!(f64::try_from_value(Value::Number(1.5)).unwrap(), 1.5);
        assert_eq!(f32::try_from_value(Value::Number(0.25)).unwrap(), 0.25);
    }

    #[test]
    fn value_text() {
        let val = String::from("hello").as_value();
        assert_eq!(val, Value::String("hello".into()));
        assert_eq!(Value::from("hello"), val);
        assert_eq!(String::try_from_value(val).unwrap(), "hello");
        let error = String::try_from_value(Value::Boolean(true)).unwrap_err();
        assert!(format!("{error}").contains("Cannot convert BOOL `true`"));
        let id = Uuid::from_u128(0x6ba7b810_9dad_11d1_80b4_00c04fd430c8);
        let val = id.as_value();
        assert_eq!(
            val,
            Value::from("6ba7b810-9dad-11d1-80b4-00c04fd430c8")
        );
        assert_eq!(Uuid::try_from_value(val).unwrap(), id);
        assert!(Uuid::try_from_value(Value::from("not a uuid")).is_err());
    }

    #[test]
    fn value_time() {
        let moment = datetime!(2024-02-29 12:30:15 +02:00);
        let val = moment.as_value();
        assert_eq!(val.type_name(), "PTYPE<TIME>");
        assert_eq!(val.kind(), Kind::Date);
        assert_eq!(time::OffsetDateTime::try_from_value(val).unwrap(), moment);
        assert!(time::OffsetDateTime::try_from_value(Value::Number(0.0)).is_err());
    }

    #[test]
    fn value_collections() {
        let val: Value = vec![1, 2, 3].into();
        assert_eq!(
            val,
            Value::Array(vec![1.into(), 2.into(), 3.into()])
        );
        assert_eq!(val.kind(), Kind::Array(Box::new(Kind::Number)));
        assert_eq!(Vec::<u16>::try_from_value(val).unwrap(), [1, 2, 3]);

        let val: Value = BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]).into();
        assert_eq!(val.get("a"), Some(&Value::Number(1.0)));
        assert_eq!(val.get("c"), None);
        assert_eq!(Value::Number(1.0).get("a"), None);
        let decoded = HashMap::<String, i32>::try_from_value(val).unwrap();
        assert_eq!(decoded.get("b"), Some(&2));

        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::try_from_value(5.into()).unwrap(), Some(5));
        assert_eq!(Value::from(None::<i32>), Value::Null);

        let mixed = Value::Array(vec![1.into(), "a".into()]);
        assert_eq!(mixed.kind(), Kind::Array(Box::new(Kind::Any)));
        let optional = Value::Array(vec![1.into(), Value::Null]);
        assert_eq!(
            optional.kind(),
            Kind::Array(Box::new(Kind::Nullable(Box::new(Kind::Number))))
        );
        assert_eq!(Value::Null.depth(), 0);
        assert_eq!(Value::Array(vec![Value::Array(vec![])]).depth(), 2);
    }

    #[test]
    fn value_order() {
        let mut values = vec![
            Value::Object(BTreeMap::new()),
            Value::Array(vec![]),
            datetime!(2020-01-01 0:00 UTC).as_value(),
            Value::from("b"),
            Value::from("a"),
            Value::Number(10.0),
            Value::Number(-1.5),
            Value::Boolean(true),
            Value::Boolean(false),
            Value::Null,
        ];
        values.sort();
        let names: Vec<_> = values.iter().map(Value::type_name).collect();
        assert_eq!(
            names,
            [
                "NULL",
                "BOOL",
                "BOOL",
                "NUMBER",
                "NUMBER",
                "STRING",
                "STRING",
                "PTYPE<TIME>",
                "ARRAY",
                "OBJECT",
            ]
        );
        assert_eq!(values[1], Value::Boolean(false));
        assert_eq!(values[3], Value::Number(-1.5));
        assert_eq!(values[5], Value::from("a"));
        assert!(Value::Array(vec![1.into()]) < Value::Array(vec![1.into(), 0.into()]));
        assert!(Value::Array(vec![2.into()]) > Value::Array(vec![1.into(), 5.into()]));
        assert_eq!(Value::Number(2.0), Value::from(2_u64));
    }

    #[test]
    fn kind_conformance() {
        assert!(Kind::Number.conforms_to(&Kind::Any));
        assert!(Kind::Any.conforms_to(&Kind::String));
        assert!(Kind::Null.conforms_to(&Kind::Nullable(Box::new(Kind::Number))));
        assert!(!Kind::Null.conforms_to(&Kind::Number));
        assert!(!Kind::String.conforms_to(&Kind::Number));
        assert!(
            Kind::Array(Box::new(Kind::Number))
                .conforms_to(&Kind::Array(Box::new(Kind::Any)))
        );
        assert!(
            !Kind::Array(Box::new(Kind::String))
                .conforms_to(&Kind::Array(Box::new(Kind::Number)))
        );
        assert!(Kind::Number.is_numeric());
        assert!(Kind::Any.is_numeric());
        assert!(!Kind::Null.is_numeric());
        assert_eq!(
            Kind::Object(Box::new(Kind::Any)).field(),
            Some(Kind::Any)
        );
        assert_eq!(Kind::Number.field(), None);
        assert_eq!(Kind::unify([]), Kind::Any);
        assert_eq!(
            Kind::unify([Kind::Null, Kind::String, Kind::Null]),
            Kind::Nullable(Box::new(Kind::String))
        );
        assert_eq!(
            format!("{}", Kind::Array(Box::new(Kind::Nullable(Box::new(Kind::Date))))),
            "array<nullable<date>>"
        );
    }

    #[test]
    fn write_result() {
        let value = Value::Object(BTreeMap::from([
            ("inserted".to_string(), 2.into()),
            ("errors".to_string(), 1.into()),
            (
                "first_error".to_string(),
                "Duplicate primary key `id`".into(),
            ),
            (
                "generated_keys".to_string(),
                vec!["a".to_string()].into(),
            ),
        ]));
        let result = WriteResult::try_from_value(value).expect("Could not decode the result");
        assert_eq!(result.inserted, 2);
        assert_eq!(result.replaced, 0);
        assert_eq!(result.generated_keys, ["a"]);
        assert_eq!(result.affected(), 2);
        let encoded = result.clone().as_value();
        assert_eq!(encoded.get("deleted"), Some(&Value::Number(0.0)));
        assert_eq!(encoded.get("warnings"), None);
        let error = result.check().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::Conflict(..))
        ));

        let failed = WriteResult {
            errors: 3,
            ..Default::default()
        };
        let error = failed.check().unwrap_err();
        assert_eq!(
            error.downcast_ref::<QueryError>(),
            Some(&QueryError::RemoteQuery(
                "3 documents failed to write".into()
            ))
        );
        assert!(WriteResult::default().check().is_ok());
        assert!(WriteResult::try_from_value(Value::Number(1.0)).is_err());
        let error = WriteResult::try_from_value(Value::Object(BTreeMap::from([(
            "inserted".to_string(),
            "many".into(),
        )])))
        .unwrap_err();
        assert!(format!("{error:#}").contains("In field `inserted`"));
    }
}
