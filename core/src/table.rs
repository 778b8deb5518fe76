//! In-memory tabular data.
//!
//! A Table is an ordered collection of uniformly-shaped rows under a
//! Schema. Tables are passed by value between stages and persisted to
//! disk between them — no table survives in memory across a stage
//! boundary.

use crate::{
    error::{EtlError, EtlResult},
    schema::{DataType, Field, Schema},
};
use std::collections::HashMap;
use std::fmt;

/// A single cell. Null models a missing value; it is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view. Int widens; Bool and Str do not coerce.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view. Float truncates toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Infer a typed value from untyped text (CSV and HTML cells).
    /// Empty text is Null; otherwise Int, Float, Bool, then Str.
    pub fn infer(text: &str) -> Value {
        if text.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = text.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
        match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Str(text.to_string()),
        }
    }
}

/// CSV cell encoding. Null is the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Null => Ok(()),
        }
    }
}

/// A named table: schema plus rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        }
    }

    /// Build a table from untyped headers and rows, inferring each
    /// column's dtype as the widest type its non-null cells needed.
    /// Ragged rows are padded with Null (or truncated) to the header
    /// width — HTML tables are not always rectangular.
    pub fn from_inferred(
        name: impl Into<String>,
        headers: Vec<String>,
        mut rows: Vec<Vec<Value>>,
    ) -> Table {
        let width = headers.len();
        for row in &mut rows {
            row.resize(width, Value::Null);
        }
        let fields = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| Field::new(h, infer_dtype(rows.iter().map(|r| &r[i]))))
            .collect();
        let mut table = Table::new(name, Schema::new(fields));
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row. The row must match the schema width.
    pub fn push_row(&mut self, row: Vec<Value>) {
        assert_eq!(
            row.len(),
            self.schema.len(),
            "row width {} does not match schema width {} for table '{}'",
            row.len(),
            self.schema.len(),
            self.name
        );
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.index_of(name)
    }

    /// Column lookup that fails with SchemaMismatch. Join keys and other
    /// mandatory columns go through here.
    pub fn require_column(&self, name: &str) -> EtlResult<usize> {
        self.column_index(name).ok_or_else(|| EtlError::SchemaMismatch {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    pub fn value(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Value) {
        self.rows[row][col] = value;
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |r| &r[col])
    }

    /// Append a derived column. Values must cover every row.
    pub fn add_column(&mut self, field: Field, values: Vec<Value>) {
        assert_eq!(
            values.len(),
            self.rows.len(),
            "column '{}' has {} values for {} rows",
            field.name,
            values.len(),
            self.rows.len()
        );
        self.schema.push(field);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    pub fn set_dtype(&mut self, col: usize, dtype: DataType) {
        self.schema.set_dtype(col, dtype);
    }

    /// Keep only the rows the predicate accepts, preserving order.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Left join on an integer key column: every row of self appears at
    /// least once; unmatched right columns are null-filled. A key
    /// duplicated on the right multiplies the matching left row, exactly
    /// like a relational left join. Colliding non-key right column names
    /// get a `_y` suffix.
    pub fn left_join(&self, right: &Table, key: &str) -> EtlResult<Table> {
        let left_key = self.require_column(key)?;
        let right_key = right.require_column(key)?;

        // Right rows by key, preserving right row order per key.
        let mut by_key: HashMap<i64, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            if let Some(k) = row[right_key].as_i64() {
                by_key.entry(k).or_default().push(i);
            }
        }

        let mut fields: Vec<Field> = self.schema.fields().to_vec();
        let mut right_cols: Vec<usize> = Vec::new();
        for (i, field) in right.schema.fields().iter().enumerate() {
            if i == right_key {
                continue;
            }
            right_cols.push(i);
            let name = if self.schema.index_of(&field.name).is_some() {
                format!("{}_y", field.name)
            } else {
                field.name.clone()
            };
            fields.push(Field::new(name, field.dtype));
        }

        let mut out = Table::new(self.name.clone(), Schema::new(fields));
        for row in &self.rows {
            let matches = row[left_key]
                .as_i64()
                .and_then(|k| by_key.get(&k))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if matches.is_empty() {
                let mut joined = row.clone();
                joined.extend(right_cols.iter().map(|_| Value::Null));
                out.push_row(joined);
            } else {
                for &m in matches {
                    let mut joined = row.clone();
                    joined.extend(right_cols.iter().map(|&c| right.rows[m][c].clone()));
                    out.push_row(joined);
                }
            }
        }
        Ok(out)
    }
}

/// Widest dtype the non-null cells need. Int widens to Float when the
/// two mix; any other mix degrades to Str. An all-null column is Str.
fn infer_dtype<'a>(cells: impl Iterator<Item = &'a Value>) -> DataType {
    let mut dtype: Option<DataType> = None;
    for cell in cells {
        let kind = match cell {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Bool(_) => DataType::Bool,
            Value::Str(_) => DataType::Str,
            Value::Null => continue,
        };
        dtype = Some(match dtype {
            None => kind,
            Some(d) if d == kind => d,
            Some(DataType::Int) if kind == DataType::Float => DataType::Float,
            Some(DataType::Float) if kind == DataType::Int => DataType::Float,
            Some(_) => DataType::Str,
        });
    }
    dtype.unwrap_or(DataType::Str)
}
