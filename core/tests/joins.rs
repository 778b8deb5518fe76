//! Left-join semantics and the integrate stage.

use ventas_core::{
    config::{self, EtlConfig},
    engine::EtlEngine,
    error::EtlError,
    io::csv_file,
    rng::StageSlot,
    schema::{DataType, Field, Schema},
    table::{Table, Value},
};

fn left_table() -> Table {
    let mut t = Table::new(
        "transactions",
        Schema::new(vec![
            Field::new("transaction_id", DataType::Int),
            Field::new("customer_id", DataType::Int),
        ]),
    );
    t.push_row(vec![Value::Int(1), Value::Int(10)]);
    t.push_row(vec![Value::Int(2), Value::Int(11)]);
    t.push_row(vec![Value::Int(3), Value::Int(12)]);
    t
}

fn right_table(rows: &[(i64, &str)]) -> Table {
    let mut t = Table::new(
        "customer_country",
        Schema::new(vec![
            Field::new("customer_id", DataType::Int),
            Field::new("country", DataType::Str),
        ]),
    );
    for (id, country) in rows {
        t.push_row(vec![Value::Int(*id), Value::Str(country.to_string())]);
    }
    t
}

#[test]
fn left_join_preserves_left_row_count() {
    let left = left_table();
    let right = right_table(&[(10, "Chile"), (11, "Perú"), (12, "Brasil")]);
    let joined = left.left_join(&right, "customer_id").expect("join");
    assert_eq!(joined.len(), left.len());
    let country = joined.column_index("country").expect("country column");
    assert_eq!(joined.value(0, country), &Value::Str("Chile".into()));
}

#[test]
fn unmatched_left_rows_null_fill() {
    let left = left_table();
    let right = right_table(&[(10, "Chile")]);
    let joined = left.left_join(&right, "customer_id").expect("join");
    assert_eq!(joined.len(), 3, "left rows must never be lost");
    let country = joined.column_index("country").expect("country column");
    assert!(joined.value(1, country).is_null());
    assert!(joined.value(2, country).is_null());
}

#[test]
fn duplicate_right_keys_multiply_matching_rows() {
    let left = left_table();
    let right = right_table(&[(10, "Chile"), (10, "Uruguay"), (11, "Perú")]);
    let joined = left.left_join(&right, "customer_id").expect("join");
    // Row for customer 10 doubles; 11 and 12 stay single.
    assert_eq!(joined.len(), 4);
}

#[test]
fn missing_key_column_fails_fast() {
    let left = left_table();
    let mut right = Table::new(
        "customer_country",
        Schema::new(vec![Field::new("country", DataType::Str)]),
    );
    right.push_row(vec![Value::Str("Chile".into())]);
    let err = left.left_join(&right, "customer_id").unwrap_err();
    match err {
        EtlError::SchemaMismatch { table, column } => {
            assert_eq!(table, "customer_country");
            assert_eq!(column, "customer_id");
        }
        other => panic!("expected SchemaMismatch, got {other}"),
    }
}

#[test]
fn integrate_stage_joins_customer_attributes_onto_every_transaction() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = EtlConfig {
        workdir: dir.path().to_path_buf(),
        customer_count: 40,
        transaction_count: 300,
        ..EtlConfig::default()
    };
    let engine = EtlEngine::build(config.clone());
    engine.run_stage(StageSlot::Generate).expect("generate");
    let report = engine.run_stage(StageSlot::Integrate).expect("integrate");
    assert_eq!(report.rows_out, 300);

    let integrated =
        csv_file::read_table(&config.path(config::INTEGRATED_CSV), "integrated").expect("read");
    assert_eq!(integrated.len(), 300, "left join must preserve row count");
    let age = integrated.column_index("age").expect("age joined on");
    assert!(
        integrated.column(age).all(|v| !v.is_null()),
        "every transaction has a known customer, so no null ages"
    );
}
