//! Stage 6: aggregate reports and exports.
//!
//! Grouping and pivot keys are emitted in sorted order — a stable,
//! documented choice. The melt of the pivot is column-major: every
//! country for the first payment method, then the next. Null group
//! keys are dropped (they cannot occur after cleaning).

use crate::{
    config::{self, EtlConfig},
    error::EtlResult,
    io::{self, csv_file, xlsx},
    rng::StageRng,
    schema::{DataType, Field, Schema},
    stage::{PipelineStage, StageReport},
    table::{Table, Value},
};
use std::collections::{BTreeMap, BTreeSet};

pub struct ReportStage;

impl PipelineStage for ReportStage {
    fn name(&self) -> &'static str {
        "report"
    }

    fn run(&self, config: &EtlConfig, _rng: &mut StageRng) -> EtlResult<StageReport> {
        let input = config.path(config::TRANSFORMED_CSV);
        io::require_input(self.name(), &input)?;
        let table = csv_file::read_table(&input, "transformado")?;

        // The report keys are mandatory — there is nothing to report
        // without them.
        let country_col = table.require_column("country")?;
        let payment_col = table.require_column("payment_method")?;
        let total_col = table.require_column("total")?;

        let summary = country_summary(&table, country_col, total_col);
        let pivot = pivot_country_payment(&table, country_col, payment_col, total_col);
        let long_form = melt(&pivot, "ventas_totales");

        let final_csv = config.path(config::FINAL_CSV);
        let final_xlsx = config.path(config::FINAL_XLSX);
        let summary_csv = config.path(config::COUNTRY_SUMMARY_CSV);
        let long_csv = config.path(config::COUNTRY_PAYMENT_CSV);
        csv_file::write_table(&final_csv, &table)?;
        xlsx::write_table(&final_xlsx, &table)?;
        csv_file::write_table(&summary_csv, &summary)?;
        csv_file::write_table(&long_csv, &long_form)?;

        log::debug!(
            "report: {} countries, {} country/payment pairs",
            summary.len(),
            long_form.len()
        );
        Ok(StageReport::new(
            table.len(),
            vec![final_csv, final_xlsx, summary_csv, long_csv],
        ))
    }
}

/// One row per distinct country: sum, mean, and count of totals.
fn country_summary(table: &Table, country_col: usize, total_col: usize) -> Table {
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for row in table.rows() {
        let Some(country) = row[country_col].as_str() else {
            continue;
        };
        let total = row[total_col].as_f64().unwrap_or(0.0);
        let entry = groups.entry(country.to_string()).or_insert((0.0, 0));
        entry.0 += total;
        entry.1 += 1;
    }

    let mut out = Table::new(
        "resumen_pais",
        Schema::new(vec![
            Field::new("country", DataType::Str),
            Field::new("ventas_totales", DataType::Int),
            Field::new("ticket_promedio", DataType::Float),
            Field::new("transacciones", DataType::Int),
        ]),
    );
    for (country, (sum, count)) in groups {
        out.push_row(vec![
            Value::Str(country),
            numeric(sum),
            Value::Float(sum / count as f64),
            Value::Int(count as i64),
        ]);
    }
    out
}

/// Cross-tabulation: countries as rows, payment methods as columns,
/// sum of totals as cells, absent combinations filled with 0.
fn pivot_country_payment(
    table: &Table,
    country_col: usize,
    payment_col: usize,
    total_col: usize,
) -> Table {
    let mut cells: BTreeMap<(String, String), f64> = BTreeMap::new();
    let mut countries: BTreeSet<String> = BTreeSet::new();
    let mut payments: BTreeSet<String> = BTreeSet::new();
    for row in table.rows() {
        let (Some(country), Some(payment)) =
            (row[country_col].as_str(), row[payment_col].as_str())
        else {
            continue;
        };
        let total = row[total_col].as_f64().unwrap_or(0.0);
        countries.insert(country.to_string());
        payments.insert(payment.to_string());
        *cells
            .entry((country.to_string(), payment.to_string()))
            .or_insert(0.0) += total;
    }

    let mut fields = vec![Field::new("country", DataType::Str)];
    fields.extend(payments.iter().map(|p| Field::new(p.clone(), DataType::Int)));
    let mut out = Table::new("pivot_pais_pago", Schema::new(fields));
    for country in &countries {
        let mut row = vec![Value::Str(country.clone())];
        for payment in &payments {
            let cell = cells
                .get(&(country.clone(), payment.clone()))
                .copied()
                .unwrap_or(0.0);
            row.push(numeric(cell));
        }
        out.push_row(row);
    }
    out
}

/// Reshape the pivot back to long form: one row per (country,
/// payment_method) pair. Column-major over the pivot, so the output
/// groups by payment method first.
fn melt(pivot: &Table, value_name: &str) -> Table {
    let mut out = Table::new(
        "ventas_por_pais_y_pago",
        Schema::new(vec![
            Field::new("country", DataType::Str),
            Field::new("payment_method", DataType::Str),
            Field::new(value_name, DataType::Int),
        ]),
    );
    for (col, field) in pivot.schema().fields().iter().enumerate().skip(1) {
        for row in pivot.rows() {
            out.push_row(vec![
                row[0].clone(),
                Value::Str(field.name.clone()),
                row[col].clone(),
            ]);
        }
    }
    out
}

/// Sums of integer columns stay integers; anything fractional stays a
/// float.
fn numeric(x: f64) -> Value {
    if x.fract() == 0.0 {
        Value::Int(x as i64)
    } else {
        Value::Float(x)
    }
}
