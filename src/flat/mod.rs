// src/flat/mod.rs

//! Flat mixed-trust task model and its schedulers.
//!
//! - [`task`] holds the guest/hyper sub-task model.
//! - [`task_set`] keeps tasks in priority order and offers filtered views.
//! - [`base`] is the layered-trust response-time test.
//! - [`exact`] adds the job-level busy-period test and predictive budgets.
//! - [`zsrm`] adds zero-slack criticality degradation.
//! - [`report`] summarises the per-task results an analysis wrote back.

pub mod base;
pub mod exact;
pub mod report;
pub mod task;
pub mod task_set;
pub mod zsrm;

pub use base::BaseScheduler;
pub use exact::{Alignment, ExactScheduler};
pub use report::{SchedulabilityReport, TaskReport};
pub use task::{GuestTask, HyperBudget, HyperTask, MixedTrustTask};
pub use task_set::TaskSet;
pub use zsrm::{InterleavingBound, ZsrmScheduler};

use crate::errors::Result;

/// Common entry point of the flat schedulers.
pub trait SchedulabilityTest {
    /// Run the scheduler's top-level test, writing per-task results back onto
    /// the task set. `Ok(false)` means unschedulable.
    fn is_schedulable(&mut self) -> Result<bool>;

    /// The task set, including whatever the last run wrote back.
    fn task_set(&self) -> &TaskSet;

    /// Run the test and summarise the results.
    fn analyse(&mut self) -> Result<SchedulabilityReport> {
        let schedulable = self.is_schedulable()?;
        Ok(SchedulabilityReport::from_task_set(self.task_set(), schedulable))
    }
}
