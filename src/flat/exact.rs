// src/flat/exact.rs

//! Exact and predictive scheduler.
//!
//! Replaces the layered guest test with a job-level busy-period analysis.
//! Inside a mixed-trust task the guest job is released at the start of the
//! period and the hyper job at the enforcement timeout, so the interference a
//! task causes depends on where the analysed window starts relative to its
//! releases. Two [`Alignment`]s are considered:
//!
//! - [`Alignment::Guest`]: the window opens at a guest release.
//! - [`Alignment::Hyper`]: the window opens at a hyper release.
//!
//! Higher-priority tasks always contribute the larger of both alignments.

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::flat::SchedulabilityTest;
use crate::flat::base::{BaseScheduler, DIVERGED};
use crate::flat::task::MixedTrustTask;
use crate::flat::task_set::TaskSet;
use crate::types::{Time, ceil_div};

/// Where the analysed window starts relative to a task's releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Guest,
    Hyper,
}

impl Alignment {
    pub const ALL: [Alignment; 2] = [Alignment::Guest, Alignment::Hyper];
}

/// Demand of `task` in a window of length `window` that opens at one of its
/// guest releases.
pub fn guest_aligned_demand(task: &MixedTrustTask, window: Time, predictive: bool) -> Time {
    let hyper_jobs = ceil_div(window - task.enforcement_timeout(), task.period);
    task.guest_demand_in(window) + task.hyper.demand(hyper_jobs, predictive)
}

/// Demand of `task` in a window of length `window` that opens at one of its
/// hyper releases.
pub fn hyper_aligned_demand(task: &MixedTrustTask, window: Time, predictive: bool) -> Time {
    let first_guest = task.period - task.enforcement_timeout();
    let guest_jobs = ceil_div(window - first_guest, task.period);
    task.hyper_demand_in(window, predictive) + guest_jobs * task.guest.execution_time()
}

#[derive(Debug, Clone, Default)]
pub struct ExactScheduler {
    base: BaseScheduler,
}

impl ExactScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_task_set(tasks: TaskSet) -> Self {
        Self {
            base: BaseScheduler::from_task_set(tasks),
        }
    }

    pub fn add(&mut self, task: MixedTrustTask) -> Result<()> {
        self.base.add(task)
    }

    pub fn assign_deadline_monotonic_priorities(&mut self) {
        self.base.assign_deadline_monotonic_priorities();
    }

    pub fn base(&self) -> &BaseScheduler {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseScheduler {
        &mut self.base
    }

    pub fn tasks(&self) -> &TaskSet {
        self.base.tasks()
    }

    /// Interference on `idx` from every other task in a window of `window`.
    fn others_demand(&self, idx: usize, window: Time, predictive: bool) -> Time {
        let tasks = self.base.tasks();
        let lower: Time = tasks
            .lower_priority(idx)
            .map(|t| t.hyper_demand_in(window, predictive))
            .sum();
        let higher: Time = tasks
            .higher_priority(idx)
            .map(|t| {
                guest_aligned_demand(t, window, predictive)
                    .max(hyper_aligned_demand(t, window, predictive))
            })
            .sum();
        lower + higher
    }

    /// Exact guest response time of `idx` for one alignment of its own
    /// releases. Returns 0 when no guest job of `idx` falls in the busy
    /// period, and the first estimate past the enforcement timeout when the
    /// task is unschedulable.
    pub fn exact_guest_response_time(
        &self,
        idx: usize,
        alignment: Alignment,
        predictive: bool,
    ) -> Time {
        let tasks = self.base.tasks();
        if tasks.utilization_at_least_one() {
            return DIVERGED;
        }

        let task = tasks.get(idx);
        let exec = task.guest.execution_time();
        if exec == 0 {
            return 0;
        }
        let timeout = task.enforcement_timeout();
        let period = task.period;

        let (first_offset, seed) = match alignment {
            Alignment::Guest => (0, exec),
            Alignment::Hyper => (period - timeout, task.hyper_execution(predictive)),
        };
        if seed == 0 {
            return 0;
        }

        let own_hyper = |window: Time| match alignment {
            Alignment::Guest => task.hyper.demand(ceil_div(window - timeout, period), predictive),
            Alignment::Hyper => task.hyper_demand_in(window, predictive),
        };
        let own_guest = |window: Time| match alignment {
            Alignment::Guest => task.guest_demand_in(window),
            Alignment::Hyper => ceil_div(window - first_offset, period) * exec,
        };

        let mut busy = seed;
        loop {
            let next = own_guest(busy) + own_hyper(busy) + self.others_demand(idx, busy, predictive);
            if next == busy {
                break;
            }
            busy = next;
        }

        let jobs = ceil_div(busy - first_offset, period);
        let mut worst = 0;
        for q in 0..jobs {
            let release = first_offset + q * period;
            let mut finish = (q + 1) * exec;
            loop {
                let next = (q + 1) * exec + own_hyper(finish) + self.others_demand(idx, finish, predictive);
                if next - release > timeout {
                    return next - release;
                }
                if next == finish {
                    break;
                }
                finish = next;
            }
            worst = worst.max(finish - release);
        }

        debug!(
            task = %task.name,
            ?alignment,
            busy_period = busy,
            jobs,
            response = worst,
            "exact guest response time"
        );
        worst
    }

    /// Maximum of [`Self::exact_guest_response_time`] over both alignments.
    pub fn guest_response_time(&self, idx: usize, predictive: bool) -> Time {
        Alignment::ALL
            .iter()
            .map(|a| self.exact_guest_response_time(idx, *a, predictive))
            .max()
            .unwrap_or(0)
    }

    fn is_exact_guest_schedulable(&mut self, predictive: bool) -> bool {
        let order: Vec<usize> = self.base.tasks().decreasing_priority().collect();
        let mut ok = true;
        for idx in order {
            let response = self.guest_response_time(idx, predictive);
            let task = self.base.tasks_mut().get_mut(idx);
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

    fn run(&mut self, predictive: bool) -> bool {
        let tasks = self.base.tasks();
        if tasks.utilization_at_least_one() {
            info!(
                utilization = tasks.total_utilization(),
                "total utilization >= 1; task set rejected"
            );
            return false;
        }
        self.base.is_hyper_schedulable(predictive) && self.is_exact_guest_schedulable(predictive)
    }

    /// Utilization gate, nominal hyper test, exact guest test.
    pub fn is_exact_schedulable(&mut self) -> Result<bool> {
        let verdict = self.run(false);
        info!(tasks = self.base.tasks().len(), schedulable = verdict, "exact analysis finished");
        Ok(verdict)
    }

    /// Like [`Self::is_exact_schedulable`], but predictive hyper tasks are
    /// charged their predicted execution time plus the frame correction.
    pub fn is_predictive_schedulable(&mut self) -> Result<bool> {
        let verdict = self.run(true);
        info!(tasks = self.base.tasks().len(), schedulable = verdict, "predictive analysis finished");
        Ok(verdict)
    }
}

impl SchedulabilityTest for ExactScheduler {
    fn is_schedulable(&mut self) -> Result<bool> {
        self.is_exact_schedulable()
    }

    fn task_set(&self) -> &TaskSet {
        self.base.tasks()
    }
}
