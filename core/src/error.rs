use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook read error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("Workbook write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stage '{stage}' requires input file {path}")]
    InputNotFound { stage: &'static str, path: PathBuf },

    #[error("Column '{column}' missing from {table}")]
    SchemaMismatch { table: String, column: String },

    #[error("Malformed .npy file {path}: {reason}")]
    Npy { path: PathBuf, reason: String },

    #[error("No <table> element found in {path}")]
    NoHtmlTable { path: PathBuf },

    #[error("Stage '{name}' not found")]
    StageNotFound { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EtlResult<T> = Result<T, EtlError>;
