// src/flat/report.rs

//! Read-only summary of a flat analysis run.

use std::fmt;

use crate::flat::task_set::TaskSet;
use crate::types::Time;

/// Per-task results copied out of the task set after an analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub name: String,
    pub priority: i64,
    pub hyper_response_time: Time,
    pub enforcement_timeout: Time,
    pub guest_response_time: Time,
    pub zero_slack_instant: Time,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulabilityReport {
    pub schedulable: bool,
    /// Tasks from highest to lowest priority.
    pub tasks: Vec<TaskReport>,
}

impl SchedulabilityReport {
    pub fn from_task_set(set: &TaskSet, schedulable: bool) -> Self {
        let tasks = set
            .decreasing_priority()
            .map(|idx| {
                let t = set.get(idx);
                TaskReport {
                    name: t.name.clone(),
                    priority: t.priority,
                    hyper_response_time: t.hyper.response_time,
                    enforcement_timeout: t.enforcement_timeout(),
                    guest_response_time: t.guest.normal_response_time,
                    zero_slack_instant: t.guest.zero_slack_instant,
                }
            })
            .collect();
        Self { schedulable, tasks }
    }

    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

impl fmt::Display for SchedulabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.schedulable {
            "SCHEDULABLE"
        } else {
            "NOT SCHEDULABLE"
        };
        writeln!(f, "verdict: {verdict}")?;
        for t in &self.tasks {
            writeln!(
                f,
                "  - {} (priority {}): hyper R={} enforcement={} guest R={} Z={}",
                t.name,
                t.priority,
                t.hyper_response_time,
                t.enforcement_timeout,
                t.guest_response_time,
                t.zero_slack_instant,
            )?;
        }
        Ok(())
    }
}
