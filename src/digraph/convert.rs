// src/digraph/convert.rs

//! Collapse the graphs of one mode into flat mixed-trust tasks.

use crate::digraph::modal::{ModalSystem, ModeId};
use crate::errors::{Result, config_error};
use crate::flat::{GuestTask, HyperTask, MixedTrustTask, TaskSet};

/// One flat task per graph of `mode`.
///
/// - period: smallest self-loop interarrival of the graph
/// - deadline: smallest node deadline
/// - guest / hyper execution: largest preemptible / non-preemptible WCET
///
/// The guest runs at criticality 0 and the hyper part at 1. Priorities are
/// assigned deadline-monotonically on the returned set.
pub fn flat_tasks_from_mode(system: &ModalSystem, mode: ModeId) -> Result<TaskSet> {
    let mut set = TaskSet::default();

    for &graph in system.mode(mode).graphs() {
        let g = system.graph(graph);
        let period = system.min_self_loop(graph).ok_or_else(|| {
            config_error(format!("graph '{}' has no self-loop to take a period from", g.name))
        })?;
        let nodes = || g.nodes().iter().map(|n| system.node(*n));
        let deadline = nodes()
            .map(|n| n.deadline)
            .min()
            .ok_or_else(|| config_error(format!("graph '{}' has no nodes", g.name)))?;
        let guest = nodes()
            .filter(|n| n.preemptible)
            .map(|n| n.wcet)
            .max()
            .unwrap_or(0);
        let hyper = nodes()
            .filter(|n| !n.preemptible)
            .map(|n| n.wcet)
            .max()
            .unwrap_or(0);

        set.push(MixedTrustTask::new(
            g.name.clone(),
            period,
            deadline,
            0,
            GuestTask::new(0, vec![guest])?,
            HyperTask::new(1, hyper)?,
        )?);
    }

    set.assign_deadline_monotonic_priorities();
    Ok(set)
}
