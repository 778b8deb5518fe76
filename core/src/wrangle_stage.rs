//! Stage 5: wrangling — dedup, type coercion, derived columns.

use crate::{
    config::{self, EtlConfig},
    error::EtlResult,
    io::{self, csv_file},
    rng::StageRng,
    schema::{DataType, Field},
    stage::{resolve_column, PipelineStage, StageReport},
    table::{Table, Value},
    types::TransactionId,
};
use std::collections::HashSet;

const DEDUP_KEY: &str = "transaction_id";
const PAYMENT_COLUMN: &str = "payment_method";
const PAYMENT_CANONICAL: &str = "Crédito";
/// "Crédito" after a UTF-8/Latin-1 mis-decode, plus the accent-less
/// spelling. Both collapse to the canonical form; everything else
/// passes through unchanged.
const PAYMENT_VARIANTS: [&str; 2] = ["CrÃ©dito", "Credito"];

pub struct WrangleStage;

impl PipelineStage for WrangleStage {
    fn name(&self) -> &'static str {
        "wrangle"
    }

    fn run(&self, config: &EtlConfig, _rng: &mut StageRng) -> EtlResult<StageReport> {
        let input = config.path(config::CLEAN_CSV);
        io::require_input(self.name(), &input)?;
        let mut table = csv_file::read_table(&input, "clean")?;
        let cfg = &config.wrangling;

        // 1. Dedup by transaction_id, first occurrence wins. The key
        //    column is mandatory here — without it there is no row
        //    identity to deduplicate on.
        let key = table.require_column(DEDUP_KEY)?;
        let before = table.len();
        let mut seen: HashSet<Option<TransactionId>> = HashSet::new();
        table.retain_rows(|row| seen.insert(row[key].as_i64()));
        if table.len() < before {
            log::debug!("wrangle: dropped {} duplicate rows", before - table.len());
        }

        // 2. Integer coercion — truncates the fractional values the
        //    clean stage's median fill and capping introduced.
        for column in &cfg.int_columns {
            let Some(col) = resolve_column(&table, column, cfg.missing_policy)? else {
                continue;
            };
            for row in 0..table.len() {
                if let Some(i) = table.value(row, col).as_i64() {
                    table.set(row, col, Value::Int(i));
                }
            }
            table.set_dtype(col, DataType::Int);
        }

        // 3. avg_price_per_unit. A zero quantity yields Null — never a
        //    division error.
        let total_col = table.require_column("total")?;
        let quantity_col = table.require_column("quantity")?;
        let avg: Vec<Value> = table
            .rows()
            .iter()
            .map(|row| {
                match (row[total_col].as_f64(), row[quantity_col].as_f64()) {
                    (Some(total), Some(quantity)) if quantity != 0.0 => {
                        Value::Float(total / quantity)
                    }
                    _ => Value::Null,
                }
            })
            .collect();
        table.add_column(Field::new("avg_price_per_unit", DataType::Float), avg);

        // 4. high_value_tx: strictly greater than the threshold.
        let threshold = cfg.high_value_threshold as f64;
        let high_value: Vec<Value> = table
            .rows()
            .iter()
            .map(|row| match row[total_col].as_f64() {
                Some(total) => Value::Bool(total > threshold),
                None => Value::Null,
            })
            .collect();
        table.add_column(Field::new("high_value_tx", DataType::Bool), high_value);

        // 5. Canonicalize the payment method spelling.
        if let Some(col) = table.column_index(PAYMENT_COLUMN) {
            for row in 0..table.len() {
                let is_variant = table
                    .value(row, col)
                    .as_str()
                    .is_some_and(|s| PAYMENT_VARIANTS.contains(&s));
                if is_variant {
                    table.set(row, col, Value::Str(PAYMENT_CANONICAL.to_string()));
                }
            }
        }

        // 6. Bucket age into ordinal ranges. Ages outside the binned
        //    span map to Null.
        assert_eq!(
            cfg.age_bin_edges.len(),
            cfg.age_bin_labels.len() + 1,
            "age bins need one more edge than labels"
        );
        if let Some(age_col) = resolve_column(&table, "age", cfg.missing_policy)? {
            let groups: Vec<Value> = table
                .rows()
                .iter()
                .map(|row| match row[age_col].as_f64() {
                    Some(age) => bucket(age, &cfg.age_bin_edges, &cfg.age_bin_labels),
                    None => Value::Null,
                })
                .collect();
            table.add_column(Field::new("age_group", DataType::Str), groups);
        }

        let out = config.path(config::TRANSFORMED_CSV);
        csv_file::write_table(&out, &table)?;
        Ok(StageReport::new(table.len(), vec![out]))
    }
}

/// Place a value into half-open bins (edge[i], edge[i+1]].
fn bucket(value: f64, edges: &[f64], labels: &[String]) -> Value {
    for (i, label) in labels.iter().enumerate() {
        if value > edges[i] && value <= edges[i + 1] {
            return Value::Str(label.clone());
        }
    }
    Value::Null
}
