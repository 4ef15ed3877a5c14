// src/flat/zsrm.rs

//! Zero-slack rate-monotonic (ZSRM) criticality-degradation scheduler.
//!
//! Every guest task runs in normal mode until its zero-slack instant `Z`,
//! after which it switches to critical mode and lower-criticality work is
//! suspended in its favour. `Z` is computed backwards from the enforcement
//! timeout using the critical-mode response time; slack left in normal mode
//! is moved from the critical budget into the normal budget until the
//! per-task fixed point settles.
//!
//! Tasks are processed by decreasing criticality, ties by decreasing
//! priority, so higher-criticality tasks settle their budgets first.

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::flat::SchedulabilityTest;
use crate::flat::base::BaseScheduler;
use crate::flat::task::MixedTrustTask;
use crate::flat::task_set::TaskSet;
use crate::types::{Time, ceil_div, floor_div};

/// Alignments between the analysed task's normal-mode window `[0, Z)` and
/// a higher-priority sibling's own normal/critical phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterleavingBound {
    /// Every sibling job runs its normal budget.
    FullNormal,
    /// The window opens while the sibling is in its critical phase.
    CriticalCarryIn,
    /// The last sibling job in the window overruns into its critical phase.
    CriticalCarryOut,
    /// The window closes on the sibling's zero-slack instant.
    ZeroSlackAligned,
    /// Every sibling job runs both budgets. Disabled.
    EnforcementAligned,
    /// Two critical phases straddle the window. Disabled.
    DoubleCritical,
}

impl InterleavingBound {
    pub const ALL: [InterleavingBound; 6] = [
        InterleavingBound::FullNormal,
        InterleavingBound::CriticalCarryIn,
        InterleavingBound::CriticalCarryOut,
        InterleavingBound::ZeroSlackAligned,
        InterleavingBound::EnforcementAligned,
        InterleavingBound::DoubleCritical,
    ];

    /// The bounds that take part in the normal-mode interference.
    pub const ACTIVE: [InterleavingBound; 4] = [
        InterleavingBound::FullNormal,
        InterleavingBound::CriticalCarryIn,
        InterleavingBound::CriticalCarryOut,
        InterleavingBound::ZeroSlackAligned,
    ];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// Guest interference of `sibling` in a normal-mode window of `window`.
    pub fn evaluate(self, sibling: &MixedTrustTask, window: Time) -> Time {
        let period = sibling.period;
        let normal = sibling.guest.normal_budget;
        let critical = sibling.guest.critical_budget;
        let jobs = ceil_div(window, period);
        let full = floor_div(window, period);
        let rem = window - full * period;

        match self {
            InterleavingBound::FullNormal => jobs * normal,
            InterleavingBound::CriticalCarryIn => {
                let next_release = period - sibling.guest.zero_slack_instant;
                critical.min(window) + ceil_div(window - next_release, period) * normal
            }
            InterleavingBound::CriticalCarryOut => full * normal + rem.min(normal + critical),
            InterleavingBound::ZeroSlackAligned => {
                jobs * normal + if window >= period { critical } else { 0 }
            }
            InterleavingBound::EnforcementAligned => jobs * (normal + critical),
            InterleavingBound::DoubleCritical => {
                2 * critical + ceil_div(window - period, period) * normal
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ZsrmScheduler {
    base: BaseScheduler,
}

impl ZsrmScheduler {
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

    pub fn tasks(&self) -> &TaskSet {
        self.base.tasks()
    }

    /// Demand `other` places on `task` within a critical-mode window.
    fn critical_term(task: &MixedTrustTask, other: &MixedTrustTask, window: Time) -> Time {
        let jobs = ceil_div(window, other.period);
        let hyper = jobs * other.hyper.execution_time;
        let crit = task.guest.criticality;
        let other_crit = other.guest.criticality;

        if other.priority < task.priority {
            // Lower-priority hyper work always runs; higher-criticality guests
            // degrade gracefully into this task's window.
            let degradation = if other_crit > crit {
                jobs * other.guest.critical_budget
            } else {
                0
            };
            return hyper + degradation;
        }

        if other_crit > crit {
            // Delayable: its critical phase can be pushed past this window.
            let full = floor_div(window, other.period);
            let rem = window - full * other.period;
            let whole_jobs = jobs * other.guest.normal_budget;
            let carry = full * other.guest.normal_budget + rem.min(other.guest.execution_time());
            whole_jobs.max(carry) + hyper
        } else if other_crit == crit {
            jobs * (other.guest.execution_time() + other.hyper.execution_time)
        } else {
            hyper
        }
    }

    /// Critical-mode response time of `idx`, stopping once it exceeds the
    /// enforcement timeout.
    pub fn critical_response_time(&self, idx: usize) -> Time {
        let tasks = self.base.tasks();
        let task = tasks.get(idx);
        let limit = task.enforcement_timeout();

        let mut response = task.guest.critical_budget;
        loop {
            let next = task.guest.critical_budget
                + tasks
                    .others(idx)
                    .map(|o| Self::critical_term(task, o, response))
                    .sum::<Time>();
            if next == response || next > limit {
                return next;
            }
            response = next;
        }
    }

    /// Normal-mode interference on `idx` over `[0, window)`: the largest
    /// active interleaving bound summed over the higher-priority siblings,
    /// plus every other task's hyper work.
    pub fn normal_interference(&self, idx: usize, window: Time) -> Time {
        let tasks = self.base.tasks();
        let guests = InterleavingBound::ACTIVE
            .iter()
            .map(|bound| {
                tasks
                    .higher_priority(idx)
                    .map(|t| bound.evaluate(t, window))
                    .sum::<Time>()
            })
            .max()
            .unwrap_or(0);
        let hyper: Time = tasks
            .others(idx)
            .map(|t| t.hyper_demand_in(window, false))
            .sum();
        guests + hyper
    }

    /// Run the per-task fixed point. Returns `false` if the zero-slack
    /// instant of `idx` is negative.
    fn settle_task(&mut self, idx: usize) -> bool {
        loop {
            let critical_response = self.critical_response_time(idx);
            let task = self.base.tasks().get(idx);
            let timeout = task.enforcement_timeout();

            let zero_slack = if task.guest.execution_time() == 0 {
                timeout
            } else {
                timeout - critical_response
            };

            if zero_slack < 0 {
                let task = self.base.tasks_mut().get_mut(idx);
                task.guest.critical_response_time = critical_response;
                task.guest.zero_slack_instant = zero_slack;
                warn!(
                    task = %task.name,
                    zero_slack,
                    critical_response,
                    "negative zero-slack instant"
                );
                return false;
            }

            let interference = self.normal_interference(idx, zero_slack);
            let guest = &task.guest;
            let slack = (zero_slack - interference - guest.normal_budget).max(0);
            let normal_budget = guest.execution_time().min(guest.normal_budget + slack);
            let critical_budget = (guest.critical_budget - slack).max(0);
            let changed = (zero_slack, normal_budget, critical_budget)
                != (guest.zero_slack_instant, guest.normal_budget, guest.critical_budget);

            let task = self.base.tasks_mut().get_mut(idx);
            let guest = &mut task.guest;
            guest.critical_response_time = critical_response;
            guest.zero_slack_instant = zero_slack;
            guest.normal_interference = interference;
            guest.normal_slack = slack;
            guest.normal_budget = normal_budget;
            guest.critical_budget = critical_budget;
            guest.normal_response_time = normal_budget + interference;

            if !changed {
                debug!(
                    task = %task.name,
                    zero_slack,
                    normal_budget,
                    critical_budget,
                    interference,
                    "zero-slack fixed point reached"
                );
                return true;
            }
        }
    }

    /// Hyper test followed by the zero-slack test on every task.
    pub fn is_zero_slack_schedulable(&mut self) -> bool {
        if !self.base.is_hyper_schedulable(false) {
            return false;
        }

        let tasks = self.base.tasks_mut();
        for idx in 0..tasks.len() {
            let task = tasks.get_mut(idx);
            task.guest.reset_budgets();
            task.guest.zero_slack_instant = task.enforcement_timeout();
        }

        let order = self.base.tasks().by_decreasing_criticality();
        order.into_iter().all(|idx| self.settle_task(idx))
    }
}

impl SchedulabilityTest for ZsrmScheduler {
    fn is_schedulable(&mut self) -> Result<bool> {
        let verdict = self.is_zero_slack_schedulable();
        info!(tasks = self.base.tasks().len(), schedulable = verdict, "zsrm analysis finished");
        Ok(verdict)
    }

    fn task_set(&self) -> &TaskSet {
        self.base.tasks()
    }
}
