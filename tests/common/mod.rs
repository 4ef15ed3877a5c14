#![allow(dead_code)]

pub use mtsched_test_utils::builders::*;
pub use mtsched_test_utils::init_tracing;

use std::path::PathBuf;

/// Path of a file under `workloads/`.
pub fn workload_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("workloads")
        .join(name)
}
