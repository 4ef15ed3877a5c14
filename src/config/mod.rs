// src/config/mod.rs

//! TOML workload files.
//!
//! - [`model`]: raw and validated workload types.
//! - [`loader`]: read and validate a file.
//! - [`validate`]: semantic checks behind `TryFrom<RawWorkloadFile>`.
//! - [`build`]: turn a validated workload into a task set or modal system.

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::IMPLICIT_MODE;
pub use loader::{default_workload_path, load_and_validate, load_from_path};
pub use model::{
    AnalysisSection, EdgeConfig, GraphConfig, GraphTaskConfig, ModeConfig, NodeConfig,
    RawWorkloadFile, TaskConfig, TaskTransitionConfig, TransitionConfig, WorkloadFile,
};
