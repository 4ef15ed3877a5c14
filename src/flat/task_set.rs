// src/flat/task_set.rs

//! Priority-ordered collection of flat tasks.
//!
//! The set keeps two index orders (decreasing and increasing priority) and
//! exposes the filtered traversals the schedulers need as lazy iterators.
//! The filters compare priority values directly, so they stay correct even if
//! a caller mutates a priority without re-sorting; only the visiting order
//! would be stale, and [`TaskSet::resort`] fixes that.

use num::{BigInt, BigRational, One, Zero};
use tracing::debug;

use crate::flat::task::MixedTrustTask;
use crate::types::Time;

#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    tasks: Vec<MixedTrustTask>,
    by_decreasing_priority: Vec<usize>,
    by_increasing_priority: Vec<usize>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: MixedTrustTask) -> usize {
        self.tasks.push(task);
        self.resort();
        self.tasks.len() - 1
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, idx: usize) -> &MixedTrustTask {
        &self.tasks[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut MixedTrustTask {
        &mut self.tasks[idx]
    }

    pub fn tasks(&self) -> &[MixedTrustTask] {
        &self.tasks
    }

    pub fn find(&self, name: &str) -> Option<&MixedTrustTask> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Recompute both priority orders. Ties are broken by insertion order.
    pub fn resort(&mut self) {
        let mut order: Vec<usize> = (0..self.tasks.len()).collect();
        order.sort_by_key(|&i| (std::cmp::Reverse(self.tasks[i].priority), i));
        self.by_increasing_priority = order.iter().rev().copied().collect();
        self.by_decreasing_priority = order;
    }

    /// Indices from highest to lowest priority.
    pub fn decreasing_priority(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_decreasing_priority.iter().copied()
    }

    /// Indices from lowest to highest priority.
    pub fn increasing_priority(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_increasing_priority.iter().copied()
    }

    /// Tasks with strictly higher priority than `idx`.
    pub fn higher_priority(&self, idx: usize) -> impl Iterator<Item = &MixedTrustTask> + '_ {
        let prio = self.tasks[idx].priority;
        self.decreasing_priority()
            .map(|j| &self.tasks[j])
            .filter(move |t| t.priority > prio)
    }

    /// Tasks with strictly lower priority than `idx`.
    pub fn lower_priority(&self, idx: usize) -> impl Iterator<Item = &MixedTrustTask> + '_ {
        let prio = self.tasks[idx].priority;
        self.decreasing_priority()
            .map(|j| &self.tasks[j])
            .filter(move |t| t.priority < prio)
    }

    /// Every task except `idx`.
    pub fn others(&self, idx: usize) -> impl Iterator<Item = &MixedTrustTask> + '_ {
        self.decreasing_priority()
            .filter(move |&j| j != idx)
            .map(|j| &self.tasks[j])
    }

    /// Higher priority *and* higher guest criticality than `idx`.
    pub fn higher_priority_higher_criticality(
        &self,
        idx: usize,
    ) -> impl Iterator<Item = &MixedTrustTask> + '_ {
        let crit = self.tasks[idx].guest.criticality;
        self.higher_priority(idx)
            .filter(move |t| t.guest.criticality > crit)
    }

    /// Lower priority but higher guest criticality than `idx`.
    pub fn lower_priority_higher_criticality(
        &self,
        idx: usize,
    ) -> impl Iterator<Item = &MixedTrustTask> + '_ {
        let crit = self.tasks[idx].guest.criticality;
        self.lower_priority(idx)
            .filter(move |t| t.guest.criticality > crit)
    }

    /// Indices by decreasing guest criticality, ties by decreasing priority.
    pub fn by_decreasing_criticality(&self) -> Vec<usize> {
        let mut order: Vec<usize> = self.decreasing_priority().collect();
        // Stable sort keeps the priority order inside each criticality level.
        order.sort_by_key(|&i| std::cmp::Reverse(self.tasks[i].guest.criticality));
        order
    }

    /// Deadline-monotonic assignment: the shortest deadline gets the largest
    /// priority value. Ties are broken by insertion order, so the result is a
    /// pure function of the task set.
    pub fn assign_deadline_monotonic_priorities(&mut self) {
        let mut order: Vec<usize> = (0..self.tasks.len()).collect();
        order.sort_by_key(|&i| (self.tasks[i].deadline, i));

        let n = self.tasks.len() as i64;
        for (rank, idx) in order.into_iter().enumerate() {
            let task = &mut self.tasks[idx];
            task.priority = n - 1 - rank as i64;
            debug!(task = %task.name, priority = task.priority, "assigned deadline-monotonic priority");
        }
        self.resort();
    }

    /// Total utilization as a float, for diagnostics only.
    pub fn total_utilization(&self) -> f64 {
        self.tasks
            .iter()
            .map(|t| (t.guest.execution_time() + t.hyper.execution_time) as f64 / t.period as f64)
            .sum()
    }

    /// Exact check of `sum((guest + hyper) / period) >= 1`.
    pub fn utilization_at_least_one(&self) -> bool {
        at_least_one(
            self.tasks
                .iter()
                .map(|t| (t.guest.execution_time() + t.hyper.execution_time, t.period)),
        )
    }

    /// Exact check of the hyper-level utilization of `idx` plus every
    /// higher-priority task reaching 1, in which case the non-preemptive
    /// active period never closes.
    pub fn hyper_utilization_at_least_one(&self, idx: usize) -> bool {
        let own = std::iter::once(&self.tasks[idx]);
        at_least_one(
            own.chain(self.higher_priority(idx))
                .map(|t| (t.hyper.execution_time, t.period)),
        )
    }
}

/// Sum `c / t` over the given pairs as an exact fraction and compare to 1.
///
/// The common denominator grows with the product of coprime periods, so the
/// sum is kept as a big rational.
fn at_least_one(parts: impl Iterator<Item = (Time, Time)>) -> bool {
    let sum = parts.fold(BigRational::zero(), |acc, (c, t)| {
        acc + BigRational::new(BigInt::from(c), BigInt::from(t))
    });
    sum >= BigRational::one()
}
