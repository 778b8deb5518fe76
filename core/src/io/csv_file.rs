//! CSV persistence.
//!
//! Reading runs per-cell type inference (empty → Null, then Int,
//! Float, Bool, Str); writing renders cells through Value's Display,
//! so Null round-trips as the empty string.

use crate::{
    error::EtlResult,
    table::{Table, Value},
};
use std::path::Path;

pub fn read_table(path: &Path, name: &str) -> EtlResult<Table> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Value::infer).collect());
    }
    Ok(Table::from_inferred(name, headers, rows))
}

pub fn write_table(path: &Path, table: &Table) -> EtlResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.schema().names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
