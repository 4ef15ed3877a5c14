// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawWorkloadFile, WorkloadFile};
use crate::errors::Result;

/// Load a workload file and return the raw [`RawWorkloadFile`].
///
/// This only performs TOML deserialization; it does **not** check references,
/// recurrence or value ranges. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkloadFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let workload: RawWorkloadFile = toml::from_str(&contents)?;

    Ok(workload)
}

/// Load a workload file and validate it.
///
/// Checks for:
/// - at least one flat task or task graph,
/// - positive periods, deadlines and interarrivals,
/// - unknown graph, mode and node references,
/// - task graphs that never recur.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkloadFile> {
    let raw = load_from_path(&path)?;
    let workload = WorkloadFile::try_from(raw)?;
    Ok(workload)
}

/// `Workload.toml` in the current working directory.
pub fn default_workload_path() -> PathBuf {
    PathBuf::from("Workload.toml")
}
