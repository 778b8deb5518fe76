//! Wrangle-stage tests: dedup, coercion, derived columns.

use std::path::Path;
use ventas_core::{
    config::{self, EtlConfig},
    engine::EtlEngine,
    io::csv_file,
    rng::StageSlot,
    schema::{DataType, Field, Schema},
    table::{Table, Value},
};

fn clean_fixture() -> Table {
    let mut t = Table::new(
        "clean",
        Schema::new(vec![
            Field::new("transaction_id", DataType::Int),
            Field::new("customer_id", DataType::Int),
            Field::new("quantity", DataType::Float),
            Field::new("unit_price", DataType::Float),
            Field::new("total", DataType::Float),
            Field::new("age", DataType::Int),
            Field::new("country", DataType::Str),
            Field::new("payment_method", DataType::Str),
        ]),
    );
    let rows: Vec<(i64, i64, f64, f64, f64, i64, &str, &str)> = vec![
        (1, 10, 2.0, 100.0, 200.0, 30, "Chile", "CrÃ©dito"),
        (1, 10, 2.0, 100.0, 200.0, 30, "Chile", "CrÃ©dito"), // duplicate id
        (2, 11, 3.7, 110.0, 330.5, 31, "Perú", "Credito"),
        (3, 12, 0.0, 120.0, 240.0, 61, "Brasil", "Débito"),
        (4, 13, 4.0, 50_000.0, 150_000.0, 100, "Chile", "Efectivo"),
        (5, 14, 2.0, 75_500.5, 151_001.0, 101, "Perú", "Transferencia"),
        (6, 15, 8.0, 100.0, 800.0, 17, "Brasil", "Débito"),
    ];
    for (tid, cid, qty, price, total, age, country, payment) in rows {
        t.push_row(vec![
            Value::Int(tid),
            Value::Int(cid),
            Value::Float(qty),
            Value::Float(price),
            Value::Float(total),
            Value::Int(age),
            Value::Str(country.to_string()),
            Value::Str(payment.to_string()),
        ]);
    }
    t
}

fn run_wrangle(dir: &Path, input: &Table) -> Table {
    csv_file::write_table(&dir.join(config::CLEAN_CSV), input).expect("write input");
    let config = EtlConfig {
        workdir: dir.to_path_buf(),
        ..EtlConfig::default()
    };
    let engine = EtlEngine::build(config);
    engine.run_stage(StageSlot::Wrangle).expect("wrangle run");
    csv_file::read_table(&dir.join(config::TRANSFORMED_CSV), "transformado").expect("read output")
}

fn cell<'t>(table: &'t Table, row: usize, column: &str) -> &'t Value {
    table.value(row, table.column_index(column).expect("column exists"))
}

#[test]
fn duplicate_transaction_ids_keep_the_first_occurrence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = run_wrangle(dir.path(), &clean_fixture());
    assert_eq!(out.len(), 6, "one duplicate row must be dropped");
    let key = out.column_index("transaction_id").expect("transaction_id");
    let mut ids: Vec<i64> = out.column(key).filter_map(Value::as_i64).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), out.len(), "transaction_id must be unique");
}

#[test]
fn numeric_columns_coerce_to_integers_by_truncation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = run_wrangle(dir.path(), &clean_fixture());
    // 3.7 truncates to 3, 330.5 to 330 — never rounds.
    assert_eq!(cell(&out, 1, "quantity"), &Value::Int(3));
    assert_eq!(cell(&out, 1, "total"), &Value::Int(330));
    assert_eq!(cell(&out, 4, "unit_price"), &Value::Int(75_500));
}

#[test]
fn avg_price_per_unit_divides_total_by_quantity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = run_wrangle(dir.path(), &clean_fixture());
    assert_eq!(cell(&out, 0, "avg_price_per_unit").as_f64(), Some(100.0));
    // 330 / 3 after truncation.
    assert_eq!(cell(&out, 1, "avg_price_per_unit").as_f64(), Some(110.0));
}

#[test]
fn zero_quantity_yields_null_not_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = run_wrangle(dir.path(), &clean_fixture());
    assert!(
        cell(&out, 2, "avg_price_per_unit").is_null(),
        "division by a zero quantity must produce the undefined marker"
    );
}

#[test]
fn high_value_is_strictly_greater_than_the_threshold() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = run_wrangle(dir.path(), &clean_fixture());
    // Exactly 150000 is not high value; 151001 is.
    assert_eq!(cell(&out, 3, "high_value_tx"), &Value::Bool(false));
    assert_eq!(cell(&out, 4, "high_value_tx"), &Value::Bool(true));
    assert_eq!(cell(&out, 0, "high_value_tx"), &Value::Bool(false));
}

#[test]
fn payment_method_spellings_collapse_to_the_canonical_form() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = run_wrangle(dir.path(), &clean_fixture());
    assert_eq!(cell(&out, 0, "payment_method"), &Value::Str("Crédito".into()));
    assert_eq!(cell(&out, 1, "payment_method"), &Value::Str("Crédito".into()));
    // Other methods pass through unchanged.
    assert_eq!(cell(&out, 2, "payment_method"), &Value::Str("Débito".into()));
}

#[test]
fn ages_bucket_into_ordinal_groups() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = run_wrangle(dir.path(), &clean_fixture());
    // Bin edges are half-open on the left: (17,30], (30,45], (45,60], (60,100].
    assert_eq!(cell(&out, 0, "age_group"), &Value::Str("18-30".into()));
    assert_eq!(cell(&out, 1, "age_group"), &Value::Str("31-45".into()));
    assert_eq!(cell(&out, 2, "age_group"), &Value::Str("60+".into()));
    assert_eq!(cell(&out, 3, "age_group"), &Value::Str("60+".into()));
    // 101 and 17 fall outside every bin.
    assert!(cell(&out, 4, "age_group").is_null());
    assert!(cell(&out, 5, "age_group").is_null());
}
