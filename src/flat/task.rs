// src/flat/task.rs

//! Flat mixed-trust task model.
//!
//! A [`MixedTrustTask`] owns exactly one preemptible [`GuestTask`] and one
//! non-preemptible [`HyperTask`]. The analyses write their results (response
//! times, budgets, zero-slack instants) straight back onto these structs.

use crate::errors::{Result, config_error};
use crate::types::{Criticality, Time, ceil_div};

/// How a hyper task's execution demand is accounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HyperBudget {
    /// Every job costs the nominal execution time.
    Nominal,
    /// Jobs are accounted with `predicted`, and every `frame_periods` jobs the
    /// accumulated difference to the nominal time is reconciled.
    Predictive { predicted: Time, frame_periods: Time },
}

/// Trusted, non-preemptible portion of a mixed-trust task.
#[derive(Debug, Clone)]
pub struct HyperTask {
    pub criticality: Criticality,
    pub execution_time: Time,
    pub budget: HyperBudget,
    /// Output of the hyper-task test.
    pub response_time: Time,
}

impl HyperTask {
    pub fn new(criticality: Criticality, execution_time: Time) -> Result<Self> {
        if execution_time < 0 {
            return Err(config_error(format!(
                "hyper execution time must be >= 0 (got {execution_time})"
            )));
        }
        Ok(Self {
            criticality,
            execution_time,
            budget: HyperBudget::Nominal,
            response_time: 0,
        })
    }

    pub fn predictive(
        criticality: Criticality,
        execution_time: Time,
        predicted: Time,
        frame_periods: Time,
    ) -> Result<Self> {
        if predicted < 0 {
            return Err(config_error(format!(
                "predicted hyper execution time must be >= 0 (got {predicted})"
            )));
        }
        if frame_periods <= 0 {
            return Err(config_error(format!(
                "frame_periods must be >= 1 (got {frame_periods})"
            )));
        }
        let mut hyper = Self::new(criticality, execution_time)?;
        hyper.budget = HyperBudget::Predictive {
            predicted,
            frame_periods,
        };
        Ok(hyper)
    }

    /// Per-job execution time used by the analysis.
    ///
    /// With `predictive` set, predictive hyper tasks report their predicted
    /// value; otherwise (and for nominal tasks) the nominal one.
    pub fn effective_execution(&self, predictive: bool) -> Time {
        match self.budget {
            HyperBudget::Predictive { predicted, .. } if predictive => predicted,
            _ => self.execution_time,
        }
    }

    /// Correction added to `jobs * predicted` so that every completed frame
    /// of `frame_periods` jobs is charged at the nominal rate.
    ///
    /// Negative and decreasing in elapsed frames when the prediction
    /// overestimates, positive and increasing when it underestimates.
    pub fn frame_interference_correction(&self, jobs: Time) -> Time {
        match self.budget {
            HyperBudget::Nominal => 0,
            HyperBudget::Predictive {
                predicted,
                frame_periods,
            } => {
                let frames = jobs.max(0) / frame_periods;
                frames * frame_periods * (self.execution_time - predicted)
            }
        }
    }

    /// Cumulative execution demand of the first `jobs` hyper jobs.
    pub fn demand(&self, jobs: Time, predictive: bool) -> Time {
        if jobs <= 0 {
            return 0;
        }
        match self.budget {
            HyperBudget::Predictive { predicted, .. } if predictive => {
                jobs * predicted + self.frame_interference_correction(jobs)
            }
            _ => jobs * self.execution_time,
        }
    }
}

/// Untrusted, preemptible portion of a mixed-trust task.
#[derive(Debug, Clone)]
pub struct GuestTask {
    pub criticality: Criticality,
    /// Execution time per criticality level; never empty.
    execution_times: Vec<Time>,

    pub normal_response_time: Time,
    pub critical_response_time: Time,
    /// Latest instant at which the task must switch to critical mode.
    pub zero_slack_instant: Time,
    pub normal_slack: Time,
    pub normal_interference: Time,
    pub normal_budget: Time,
    pub critical_budget: Time,
}

impl GuestTask {
    pub fn new(criticality: Criticality, execution_times: Vec<Time>) -> Result<Self> {
        if execution_times.is_empty() {
            return Err(config_error(
                "guest execution-time vector must have at least one entry",
            ));
        }
        if let Some(bad) = execution_times.iter().find(|c| **c < 0) {
            return Err(config_error(format!(
                "guest execution times must be >= 0 (got {bad})"
            )));
        }

        let mut guest = Self {
            criticality,
            execution_times,
            normal_response_time: 0,
            critical_response_time: 0,
            zero_slack_instant: 0,
            normal_slack: 0,
            normal_interference: 0,
            normal_budget: 0,
            critical_budget: 0,
        };
        guest.reset_budgets();
        Ok(guest)
    }

    /// Execution time at `level`, clamped to the last configured level.
    pub fn execution_time_at(&self, level: Criticality) -> Time {
        let idx = level.min(self.execution_times.len() - 1);
        self.execution_times[idx]
    }

    /// Execution time at the guest's own criticality level.
    pub fn execution_time(&self) -> Time {
        self.execution_time_at(self.criticality)
    }

    pub fn execution_times(&self) -> &[Time] {
        &self.execution_times
    }

    /// Restore the ZSRM budgets to their starting point: the lowest-level
    /// execution time in normal mode and the full critical-level time in
    /// critical mode.
    pub fn reset_budgets(&mut self) {
        self.normal_budget = self.execution_time_at(0);
        self.critical_budget = self.execution_time();
    }
}

/// A periodic task made of one hyper and one guest sub-task.
#[derive(Debug, Clone)]
pub struct MixedTrustTask {
    pub name: String,
    pub period: Time,
    pub deadline: Time,
    /// Larger value = higher priority.
    pub priority: i64,
    pub guest: GuestTask,
    pub hyper: HyperTask,
}

impl MixedTrustTask {
    pub fn new(
        name: impl Into<String>,
        period: Time,
        deadline: Time,
        priority: i64,
        guest: GuestTask,
        hyper: HyperTask,
    ) -> Result<Self> {
        let name = name.into();
        if period <= 0 {
            return Err(config_error(format!(
                "task '{name}' must have period > 0 (got {period})"
            )));
        }
        if deadline <= 0 {
            return Err(config_error(format!(
                "task '{name}' must have deadline > 0 (got {deadline})"
            )));
        }
        Ok(Self {
            name,
            period,
            deadline,
            priority,
            guest,
            hyper,
        })
    }

    /// Time left to the guest portion once the hyper portion has run.
    pub fn enforcement_timeout(&self) -> Time {
        self.deadline - self.hyper.response_time
    }

    /// Hyper execution at the given accounting mode.
    pub fn hyper_execution(&self, predictive: bool) -> Time {
        self.hyper.effective_execution(predictive)
    }

    /// Hyper demand of all jobs released in a window of length `window`
    /// starting at a hyper release.
    pub fn hyper_demand_in(&self, window: Time, predictive: bool) -> Time {
        self.hyper
            .demand(ceil_div(window, self.period), predictive)
    }

    /// Guest demand of all jobs released in a window of length `window`
    /// starting at a guest release.
    pub fn guest_demand_in(&self, window: Time) -> Time {
        ceil_div(window, self.period) * self.guest.execution_time()
    }
}
