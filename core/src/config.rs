//! Run configuration.
//!
//! Defaults carry the canonical run parameters; a JSON file can override
//! them. Artifact file names are static configuration and are not
//! user-settable.

use crate::error::EtlResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Stage 1 outputs.
pub const CUSTOMERS_NPY: &str = "customers.npy";
pub const TRANSACTIONS_NPY: &str = "transactions.npy";
// Stage 2 output.
pub const INTEGRATED_CSV: &str = "dataset_preliminar_integrado.csv";
// External collaborators consumed (not produced) by stage 3.
pub const COUNTRY_XLSX: &str = "customers_country_latam.xlsx";
pub const PAYMENT_HTML: &str = "customer_payment_method.html";
// Stage 3-6 outputs.
pub const CONSOLIDATED_CSV: &str = "dataset_consolidado.csv";
pub const CLEAN_CSV: &str = "dataset_limpio.csv";
pub const TRANSFORMED_CSV: &str = "dataset_transformado.csv";
pub const FINAL_CSV: &str = "dataset_final.csv";
pub const FINAL_XLSX: &str = "dataset_final.xlsx";
pub const COUNTRY_SUMMARY_CSV: &str = "resumen_pais.csv";
pub const COUNTRY_PAYMENT_CSV: &str = "ventas_por_pais_y_pago.csv";

/// What a stage does when a configured column is absent from its input.
/// Join keys are always mandatory regardless of this policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingColumnPolicy {
    Skip,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Categorical columns whose nulls become the sentinel.
    pub categorical: Vec<String>,
    /// Numeric columns whose nulls become the column median.
    pub numeric: Vec<String>,
    /// Columns capped by the IQR rule, processed in this order.
    pub capped: Vec<String>,
    pub sentinel: String,
    pub iqr_multiplier: f64,
    pub missing_policy: MissingColumnPolicy,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            categorical: vec!["country".into(), "payment_method".into()],
            numeric: vec![
                "age".into(),
                "tenure_months".into(),
                "quantity".into(),
                "unit_price".into(),
                "total".into(),
            ],
            capped: vec!["total".into(), "unit_price".into(), "quantity".into()],
            sentinel: "Desconocido".into(),
            iqr_multiplier: 1.5,
            missing_policy: MissingColumnPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WranglingConfig {
    /// Columns coerced to integer representation (truncating).
    pub int_columns: Vec<String>,
    pub high_value_threshold: i64,
    /// Age bin edges, half-open on the left: (edge[i], edge[i+1]].
    pub age_bin_edges: Vec<f64>,
    pub age_bin_labels: Vec<String>,
    pub missing_policy: MissingColumnPolicy,
}

impl Default for WranglingConfig {
    fn default() -> Self {
        Self {
            int_columns: vec![
                "transaction_id".into(),
                "customer_id".into(),
                "quantity".into(),
                "unit_price".into(),
                "total".into(),
                "age".into(),
                "tenure_months".into(),
            ],
            high_value_threshold: 150_000,
            age_bin_edges: vec![17.0, 30.0, 45.0, 60.0, 100.0],
            age_bin_labels: vec![
                "18-30".into(),
                "31-45".into(),
                "46-60".into(),
                "60+".into(),
            ],
            missing_policy: MissingColumnPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Directory all artifacts are read from and written to.
    pub workdir: PathBuf,
    pub customer_count: usize,
    pub transaction_count: usize,
    pub seed: u64,
    pub cleaning: CleaningConfig,
    pub wrangling: WranglingConfig,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            customer_count: 500,
            transaction_count: 5000,
            seed: 42,
            cleaning: CleaningConfig::default(),
            wrangling: WranglingConfig::default(),
        }
    }
}

impl EtlConfig {
    /// Load overrides from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> EtlResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Resolve an artifact file name against the working directory.
    pub fn path(&self, file: &str) -> PathBuf {
        self.workdir.join(file)
    }
}
