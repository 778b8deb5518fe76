//! Full-pipeline scenario tests at the canonical scale.

use std::path::Path;
use ventas_core::{
    config::{self, EtlConfig},
    engine::EtlEngine,
    error::EtlError,
    generate_stage::CUSTOMER_ID_BASE,
    io::{csv_file, html, xlsx},
    rng::{StageRng, StageSlot},
    schema::{DataType, Field, Schema},
    table::{Table, Value},
};

/// Deterministic stand-ins for the partner files: a few customers are
/// missing from each source, and some credit rows carry the
/// mis-decoded spelling.
fn write_externals(config: &EtlConfig) {
    let mut rng = StageRng::new(config.seed, 0xE7).with_name("externals");
    let countries_pool = ["Argentina", "Brasil", "Chile", "Colombia", "México"];
    let payments_pool = ["Crédito", "Débito", "Efectivo", "Transferencia"];

    let mut countries = Table::new(
        "customer_country",
        Schema::new(vec![
            Field::new("customer_id", DataType::Int),
            Field::new("country", DataType::Str),
        ]),
    );
    let mut payments = Table::new(
        "customer_payment_method",
        Schema::new(vec![
            Field::new("customer_id", DataType::Int),
            Field::new("payment_method", DataType::Str),
        ]),
    );
    for i in 0..config.customer_count as i64 {
        let id = CUSTOMER_ID_BASE + i;
        if !rng.chance(0.05) {
            let c = countries_pool[rng.next_u64_below(5) as usize];
            countries.push_row(vec![Value::Int(id), Value::Str(c.to_string())]);
        }
        if !rng.chance(0.05) {
            let mut p = payments_pool[rng.next_u64_below(4) as usize];
            if p == "Crédito" && rng.chance(0.5) {
                p = "CrÃ©dito";
            }
            payments.push_row(vec![Value::Int(id), Value::Str(p.to_string())]);
        }
    }
    xlsx::write_table(&config.path(config::COUNTRY_XLSX), &countries).expect("write xlsx");
    html::write_table(&config.path(config::PAYMENT_HTML), &payments).expect("write html");
}

fn canonical_config(dir: &Path) -> EtlConfig {
    EtlConfig {
        workdir: dir.to_path_buf(),
        ..EtlConfig::default()
    }
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn full_run_produces_every_artifact_with_derived_columns() {
    init_logs();
    let dir = tempfile::tempdir().expect("tempdir");
    let config = canonical_config(dir.path());
    write_externals(&config);

    let engine = EtlEngine::build(config.clone());
    let reports = engine.run_all().expect("full pipeline run");
    assert_eq!(reports.len(), 6);

    for artifact in [
        config::CUSTOMERS_NPY,
        config::TRANSACTIONS_NPY,
        config::INTEGRATED_CSV,
        config::CONSOLIDATED_CSV,
        config::CLEAN_CSV,
        config::TRANSFORMED_CSV,
        config::FINAL_CSV,
        config::FINAL_XLSX,
        config::COUNTRY_SUMMARY_CSV,
        config::COUNTRY_PAYMENT_CSV,
    ] {
        assert!(config.path(artifact).exists(), "missing artifact {artifact}");
    }

    let final_table =
        csv_file::read_table(&config.path(config::FINAL_CSV), "final").expect("read final");
    assert!(!final_table.is_empty(), "final export must not be empty");
    assert!(final_table.len() <= 5000, "dedup can only shrink the table");
    for column in [
        "transaction_id",
        "customer_id",
        "quantity",
        "unit_price",
        "total",
        "age",
        "tenure_months",
        "country",
        "payment_method",
        "avg_price_per_unit",
        "high_value_tx",
        "age_group",
    ] {
        assert!(
            final_table.column_index(column).is_some(),
            "final table lacks column {column}"
        );
    }
}

#[test]
fn stage_row_counts_hold_at_the_canonical_scale() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = canonical_config(dir.path());
    write_externals(&config);

    let engine = EtlEngine::build(config.clone());
    let reports = engine.run_all().expect("full pipeline run");
    let by_name: std::collections::HashMap<&str, usize> = reports
        .iter()
        .map(|(name, report)| (*name, report.rows_out))
        .collect();

    assert_eq!(by_name["generate"], 5000);
    assert_eq!(by_name["integrate"], 5000, "left join preserves rows");
    assert_eq!(by_name["consolidate"], 5000, "unique external keys add no rows");
    assert_eq!(by_name["clean"], 5000);
    assert_eq!(by_name["wrangle"], 5000, "generated ids carry no duplicates");
    assert_eq!(by_name["report"], 5000);
}

#[test]
fn cleaning_leaves_no_nulls_in_configured_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = canonical_config(dir.path());
    write_externals(&config);
    EtlEngine::build(config.clone()).run_all().expect("run");

    let table = csv_file::read_table(&config.path(config::CLEAN_CSV), "clean").expect("read");
    for column in ["country", "payment_method", "age", "quantity", "unit_price", "total"] {
        let col = table.column_index(column).expect("column exists");
        assert!(
            table.column(col).all(|v| !v.is_null()),
            "column {column} still holds nulls after cleaning"
        );
    }
    // The gaps in the external sources actually exercised the sentinel.
    let country = table.column_index("country").expect("country");
    assert!(
        table
            .column(country)
            .any(|v| v.as_str() == Some("Desconocido")),
        "expected at least one sentinel-filled country"
    );
}

#[test]
fn wrangling_canonicalizes_every_credit_spelling() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = canonical_config(dir.path());
    write_externals(&config);
    EtlEngine::build(config.clone()).run_all().expect("run");

    let table = csv_file::read_table(&config.path(config::TRANSFORMED_CSV), "transformado")
        .expect("read");
    let payment = table.column_index("payment_method").expect("payment_method");
    assert!(
        table
            .column(payment)
            .all(|v| v.as_str() != Some("CrÃ©dito") && v.as_str() != Some("Credito")),
        "mis-decoded credit spellings must not survive wrangling"
    );
    assert!(
        table.column(payment).any(|v| v.as_str() == Some("Crédito")),
        "the fixtures guarantee at least one canonical credit row"
    );
}

#[test]
fn rerunning_a_single_stage_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = canonical_config(dir.path());
    write_externals(&config);
    let engine = EtlEngine::build(config.clone());
    engine.run_all().expect("first run");

    let first = std::fs::read(config.path(config::CLEAN_CSV)).expect("read first");
    engine.run_stage(StageSlot::Clean).expect("re-run clean");
    let second = std::fs::read(config.path(config::CLEAN_CSV)).expect("read second");
    assert_eq!(first, second, "re-running a stage on unchanged inputs must be a no-op");
}

#[test]
fn missing_upstream_files_name_the_stage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = canonical_config(dir.path());
    let engine = EtlEngine::build(config);

    let err = engine.run_stage(StageSlot::Integrate).unwrap_err();
    match err {
        EtlError::InputNotFound { stage, path } => {
            assert_eq!(stage, "integrate");
            assert!(path.ends_with(config::CUSTOMERS_NPY));
        }
        other => panic!("expected InputNotFound, got {other}"),
    }
}
