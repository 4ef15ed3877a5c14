// src/config/build.rs

//! Turn a validated [`WorkloadFile`] into analysis models.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::model::{GraphConfig, TaskConfig, WorkloadFile};
use crate::digraph::{GraphId, ModalSystem, ModeId, NodeSpec};
use crate::errors::{Result, config_error};
use crate::flat::{GuestTask, HyperTask, MixedTrustTask, TaskSet};

/// Name of the mode used when a workload defines graphs but no modes.
pub const IMPLICIT_MODE: &str = "default";

impl WorkloadFile {
    /// Flat task set of `[task.*]`, with deadline-monotonic priorities unless
    /// every task sets its own.
    pub fn to_task_set(&self) -> Result<TaskSet> {
        if self.task.is_empty() {
            return Err(config_error(
                "flat analyses need at least one [task.<name>] section",
            ));
        }

        let mut set = TaskSet::new();
        for (name, cfg) in self.task.iter() {
            set.push(flat_task(name, cfg)?);
        }

        if self.task.values().all(|t| t.priority.is_none()) {
            set.assign_deadline_monotonic_priorities();
        }
        Ok(set)
    }

    /// Modal system of `[graph.*]`, `[mode.*]` and `[transition.*]`.
    /// Priorities are not assigned yet.
    pub fn to_modal_system(&self) -> Result<ModalSystem> {
        if self.graph.is_empty() {
            return Err(config_error(
                "modal analysis needs at least one [graph.<name>] section",
            ));
        }

        let mut system = ModalSystem::new();
        let mut graphs: BTreeMap<&str, GraphId> = BTreeMap::new();
        for (name, cfg) in self.graph.iter() {
            graphs.insert(name.as_str(), add_graph(&mut system, name, cfg)?);
        }

        let mut modes: BTreeMap<&str, ModeId> = BTreeMap::new();
        if self.mode.is_empty() {
            let all: Vec<GraphId> = graphs.values().copied().collect();
            modes.insert(IMPLICIT_MODE, system.add_mode(IMPLICIT_MODE, &all)?);
        }
        for (name, cfg) in self.mode.iter() {
            let members = cfg
                .graphs
                .iter()
                .map(|g| {
                    graphs
                        .get(g.as_str())
                        .copied()
                        .ok_or_else(|| config_error(format!("unknown graph '{g}'")))
                })
                .collect::<Result<Vec<_>>>()?;
            modes.insert(name.as_str(), system.add_mode(name.as_str(), &members)?);
        }

        for (name, cfg) in self.transition.iter() {
            let mode = |m: &str| {
                modes
                    .get(m)
                    .copied()
                    .ok_or_else(|| config_error(format!("unknown mode '{m}'")))
            };
            let transition = system.add_transition(name.as_str(), mode(&cfg.from)?, mode(&cfg.to)?)?;

            for task in cfg.task.iter() {
                let node = |n: &str| {
                    system
                        .find_node(n)
                        .ok_or_else(|| config_error(format!("unknown node '{n}'")))
                };
                let source = node(&task.source)?;
                let target = node(&task.target)?;
                system.add_task_transition(
                    transition,
                    source,
                    target,
                    NodeSpec::hyper(task.node.as_str(), task.wcet, task.deadline),
                    task.to_transitioning,
                    task.to_target,
                )?;
            }
        }

        debug!(
            graphs = graphs.len(),
            modes = modes.len(),
            transitions = self.transition.len(),
            "built modal system"
        );
        Ok(system)
    }
}

fn flat_task(name: &str, cfg: &TaskConfig) -> Result<MixedTrustTask> {
    let guest = GuestTask::new(cfg.guest_criticality, cfg.guest.clone())?;
    let hyper = match (cfg.predicted, cfg.frame_periods) {
        (Some(predicted), Some(frames)) => {
            HyperTask::predictive(cfg.hyper_criticality, cfg.hyper, predicted, frames)?
        }
        _ => HyperTask::new(cfg.hyper_criticality, cfg.hyper)?,
    };
    MixedTrustTask::new(
        name,
        cfg.period,
        cfg.effective_deadline(),
        cfg.priority.unwrap_or(0),
        guest,
        hyper,
    )
}

fn add_graph(system: &mut ModalSystem, name: &str, cfg: &GraphConfig) -> Result<GraphId> {
    let graph = system.add_graph(name);

    if let Some(task) = &cfg.task {
        system.add_mixed_trust_task(
            graph,
            name,
            task.period,
            task.effective_deadline(),
            task.guest,
            task.hyper,
        )?;
        return Ok(graph);
    }

    let mut nodes = BTreeMap::new();
    for (local, node) in cfg.node.iter() {
        let spec = NodeSpec {
            name: format!("{name}.{local}"),
            wcet: node.wcet,
            deadline: node.deadline,
            preemptible: node.preemptible,
        };
        nodes.insert(local.as_str(), system.add_node(graph, spec)?);
    }

    let lookup = |local: &str| {
        nodes
            .get(local)
            .copied()
            .ok_or_else(|| config_error(format!("graph '{name}' has no node '{local}'")))
    };

    for edge in cfg.edge.iter() {
        system.add_edge(graph, lookup(&edge.from)?, lookup(&edge.to)?, edge.interarrival)?;
    }

    for (local, node) in cfg.node.iter() {
        if let Some(partner) = &node.partner {
            let (a, b) = (lookup(local)?, lookup(partner)?);
            let (guest, hyper) = if node.preemptible { (a, b) } else { (b, a) };
            system.set_partners(guest, hyper)?;
        }
    }

    Ok(graph)
}
