// src/flat/base.rs

//! Layered-trust base scheduler.
//!
//! Hyper tasks run non-preemptively above every guest task, so:
//! - a hyper task suffers one blocking term from lower-priority hyper tasks
//!   plus interference from higher-priority hyper tasks;
//! - a guest task suffers interference from *every* other hyper task plus
//!   higher-priority guest tasks, and must finish within its enforcement
//!   timeout.

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::flat::SchedulabilityTest;
use crate::flat::task::MixedTrustTask;
use crate::flat::task_set::TaskSet;
use crate::types::{Time, ceil_div, floor_div};

/// Response time reported for a hyper task whose active period never closes.
pub const DIVERGED: Time = Time::MAX;

#[derive(Debug, Clone, Default)]
pub struct BaseScheduler {
    tasks: TaskSet,
}

impl BaseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_task_set(tasks: TaskSet) -> Self {
        Self { tasks }
    }

    /// Add a task to the set. Tasks are validated on construction, so this
    /// only keeps the priority orders up to date.
    pub fn add(&mut self, task: MixedTrustTask) -> Result<()> {
        debug!(task = %task.name, period = task.period, deadline = task.deadline, "adding task");
        self.tasks.push(task);
        Ok(())
    }

    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskSet {
        &mut self.tasks
    }

    pub fn assign_deadline_monotonic_priorities(&mut self) {
        self.tasks.assign_deadline_monotonic_priorities();
    }

    /// Worst-case response time of the hyper task of `idx`.
    ///
    /// Returns the first estimate that crossed the deadline if the task is
    /// unschedulable, or [`DIVERGED`] if the higher-priority hyper load alone
    /// saturates the processor.
    pub fn hyper_response_time(&self, idx: usize, predictive: bool) -> Time {
        let task = self.tasks.get(idx);
        let exec = task.hyper_execution(predictive);
        if exec == 0 {
            return 0;
        }
        if self.tasks.hyper_utilization_at_least_one(idx) {
            warn!(task = %task.name, "hyper utilization >= 1; active period diverges");
            return DIVERGED;
        }

        let blocking = self
            .tasks
            .lower_priority(idx)
            .map(|t| t.hyper_execution(predictive))
            .max()
            .unwrap_or(0);

        // Non-preemptive active period.
        let mut active = exec;
        loop {
            let next = exec
                + blocking
                + self
                    .tasks
                    .higher_priority(idx)
                    .map(|t| t.hyper_demand_in(active, predictive))
                    .sum::<Time>();
            if next == active {
                break;
            }
            active = next;
        }

        let jobs = ceil_div(active, task.period).max(1);
        let mut worst = 0;
        for q in 0..jobs {
            let mut start = blocking + q * exec;
            loop {
                // Jobs released at or before `start` delay it.
                let next = blocking
                    + q * exec
                    + self
                        .tasks
                        .higher_priority(idx)
                        .map(|t| t.hyper.demand(floor_div(start, t.period) + 1, predictive))
                        .sum::<Time>();
                let response = next - q * task.period + exec;
                if response > task.deadline {
                    return response;
                }
                if next == start {
                    break;
                }
                start = next;
            }
            worst = worst.max(start - q * task.period + exec);
        }

        debug!(task = %task.name, active_period = active, jobs, response = worst, "hyper response time");
        worst
    }

    /// Run the hyper test on every task, writing response times back.
    pub fn is_hyper_schedulable(&mut self, predictive: bool) -> bool {
        let mut ok = true;
        let order: Vec<usize> = self.tasks.decreasing_priority().collect();
        for idx in order {
            let response = self.hyper_response_time(idx, predictive);
            let task = self.tasks.get_mut(idx);
            task.hyper.response_time = response;
            if response > task.deadline {
                warn!(task = %task.name, response, deadline = task.deadline, "hyper task misses its deadline");
                ok = false;
            }
        }
        ok
    }

    /// Guest response time under the layered model; stops once the estimate
    /// exceeds the enforcement timeout.
    pub fn guest_response_time(&self, idx: usize) -> Time {
        let task = self.tasks.get(idx);
        let exec = task.guest.execution_time();
        let limit = task.enforcement_timeout();

        let mut response = exec;
        loop {
            let hyper: Time = self
                .tasks
                .others(idx)
                .map(|t| t.hyper_demand_in(response, false))
                .sum();
            let guest: Time = self
                .tasks
                .higher_priority(idx)
                .map(|t| t.guest_demand_in(response))
                .sum();
            let next = exec + hyper + guest;
            if next == response || next > limit {
                return next;
            }
            response = next;
        }
    }

    /// Run the base guest test on every task, writing response times back.
    pub fn is_guest_schedulable(&mut self) -> bool {
        let mut ok = true;
        let order: Vec<usize> = self.tasks.decreasing_priority().collect();
        for idx in order {
            let response = self.guest_response_time(idx);
            let task = self.tasks.get_mut(idx);
            task.guest.normal_response_time = response;
            if response > task.enforcement_timeout() {
                warn!(
                    task = %task.name,
                    response,
                    enforcement_timeout = task.enforcement_timeout(),
                    "guest task misses its enforcement timeout"
                );
                ok = false;
            }
        }
        ok
    }
}

impl SchedulabilityTest for BaseScheduler {
    fn is_schedulable(&mut self) -> Result<bool> {
        let verdict = self.is_hyper_schedulable(false) && self.is_guest_schedulable();
        info!(tasks = self.tasks.len(), schedulable = verdict, "base analysis finished");
        Ok(verdict)
    }

    fn task_set(&self) -> &TaskSet {
        &self.tasks
    }
}
