use sqlup::{UpsertOpts, Value};

#[test]
fn partial_config_section_keeps_defaults() -> serde_json::Result<()> {
    let opts: UpsertOpts = serde_json::from_str(r#"{ "max_attempts": 4 }"#)?;

    assert_eq!(
        opts,
        UpsertOpts {
            max_attempts: 4,
            ..UpsertOpts::default()
        }
    );

    let opts: UpsertOpts = serde_json::from_str("{}")?;
    assert_eq!(opts, UpsertOpts::default());
    Ok(())
}

#[test]
fn values_read_from_plain_json_scalars() -> serde_json::Result<()> {
    let values: Vec<Value> = serde_json::from_str(r#"[null, true, 3, 1.5, "x"]"#)?;

    assert_eq!(
        values,
        [
            Value::Null,
            Value::Bool(true),
            Value::I64(3),
            Value::F64(1.5),
            Value::from("x"),
        ]
    );
    Ok(())
}
