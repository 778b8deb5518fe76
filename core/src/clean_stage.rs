//! Stage 4: cleaning — null fill and outlier capping.
//!
//! Categorical nulls become the sentinel; numeric nulls become the
//! column's own median, computed over the non-null values at fill
//! time. Capping then clamps each configured column to its IQR fence,
//! one column at a time in configured order, each from its own
//! pre-capping quantiles.

use crate::{
    config::{self, EtlConfig},
    error::EtlResult,
    io::{self, csv_file},
    rng::StageRng,
    schema::DataType,
    stage::{resolve_column, PipelineStage, StageReport},
    table::{Table, Value},
};

pub struct CleanStage;

impl PipelineStage for CleanStage {
    fn name(&self) -> &'static str {
        "clean"
    }

    fn run(&self, config: &EtlConfig, _rng: &mut StageRng) -> EtlResult<StageReport> {
        let input = config.path(config::CONSOLIDATED_CSV);
        io::require_input(self.name(), &input)?;
        let mut table = csv_file::read_table(&input, "consolidated")?;
        let cfg = &config.cleaning;

        // Categorical nulls -> sentinel.
        for column in &cfg.categorical {
            let Some(col) = resolve_column(&table, column, cfg.missing_policy)? else {
                continue;
            };
            let mut filled = 0usize;
            for row in 0..table.len() {
                if table.value(row, col).is_null() {
                    table.set(row, col, Value::Str(cfg.sentinel.clone()));
                    filled += 1;
                }
            }
            if filled > 0 {
                log::debug!("clean: {filled} nulls in '{column}' -> \"{}\"", cfg.sentinel);
            }
            table.set_dtype(col, DataType::Str);
        }

        // Numeric nulls -> the column's median at fill time.
        for column in &cfg.numeric {
            let Some(col) = resolve_column(&table, column, cfg.missing_policy)? else {
                continue;
            };
            let mut values: Vec<f64> = table.column(col).filter_map(Value::as_f64).collect();
            if values.is_empty() {
                continue;
            }
            values.sort_by(f64::total_cmp);
            let median = quantile(&values, 0.5);
            // A whole-valued median keeps an Int column Int; otherwise
            // the fill upcasts the column to Float.
            let dtype = table.schema().fields()[col].dtype;
            let fill = if median.fract() == 0.0 && dtype == DataType::Int {
                Value::Int(median as i64)
            } else {
                Value::Float(median)
            };
            for row in 0..table.len() {
                if table.value(row, col).is_null() {
                    table.set(row, col, fill.clone());
                }
            }
            if matches!(fill, Value::Float(_)) {
                table.set_dtype(col, DataType::Float);
            }
        }

        // IQR capping, in configured column order. Bounds for each
        // column come from its own pre-capping distribution; capping
        // total does NOT re-derive it from quantity × unit_price, so a
        // capped total no longer equals the product of its factors.
        for column in &cfg.capped {
            let Some(col) = resolve_column(&table, column, cfg.missing_policy)? else {
                continue;
            };
            cap_outliers_iqr(&mut table, col, cfg.iqr_multiplier);
        }

        let out = config.path(config::CLEAN_CSV);
        csv_file::write_table(&out, &table)?;
        Ok(StageReport::new(table.len(), vec![out]))
    }
}

/// Clamp a numeric column to [Q1 - k·IQR, Q3 + k·IQR]. The column
/// upcasts to Float: clamping against fractional fences leaves
/// fractional cells behind, and the wrangle stage truncates them back.
fn cap_outliers_iqr(table: &mut Table, col: usize, k: f64) {
    let mut values: Vec<f64> = table.column(col).filter_map(Value::as_f64).collect();
    if values.is_empty() {
        return;
    }
    values.sort_by(f64::total_cmp);
    let q1 = quantile(&values, 0.25);
    let q3 = quantile(&values, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - k * iqr;
    let upper = q3 + k * iqr;
    for row in 0..table.len() {
        if let Some(v) = table.value(row, col).as_f64() {
            table.set(row, col, Value::Float(v.clamp(lower, upper)));
        }
    }
    table.set_dtype(col, DataType::Float);
}

/// Linearly interpolated quantile over pre-sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
