//! On-disk formats.
//!
//! RULE: Only io/ touches the filesystem.
//! Stages call these readers and writers — they never open files
//! directly.

pub mod csv_file;
pub mod html;
pub mod npy;
pub mod xlsx;

use crate::error::{EtlError, EtlResult};
use std::path::Path;

/// Map a missing upstream file to the fatal InputNotFound error,
/// naming the stage and the file for the operator.
pub fn require_input(stage: &'static str, path: &Path) -> EtlResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(EtlError::InputNotFound {
            stage,
            path: path.to_path_buf(),
        })
    }
}
