//! Spreadsheet I/O: first-worksheet reads, whole-table writes.

use crate::{
    error::{EtlError, EtlResult},
    table::{Table, Value},
};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Read the first worksheet into a table. The first row supplies the
/// column names. Integral floats are narrowed to Int — spreadsheet
/// numbers all arrive as floats.
pub fn read_first_sheet(path: &Path, name: &str) -> EtlResult<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EtlError::Other(anyhow::anyhow!("{} has no worksheets", path.display())))??;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .map(|r| r.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<Value>> = rows_iter
        .map(|r| r.iter().map(convert_cell).collect())
        .collect();
    Ok(Table::from_inferred(name, headers, rows))
}

fn convert_cell(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) if f.fract() == 0.0 => Value::Int(*f as i64),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::Str(s.trim().to_string()),
        Data::Empty => Value::Null,
        other => Value::Str(other.to_string()),
    }
}

pub fn write_table(path: &Path, table: &Table) -> EtlResult<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in table.schema().names().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }
    for (r, row) in table.rows().iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let (r, c) = ((r + 1) as u32, c as u16);
            match value {
                Value::Int(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                Value::Float(f) => {
                    sheet.write_number(r, c, *f)?;
                }
                Value::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                Value::Str(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Value::Null => {}
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}
