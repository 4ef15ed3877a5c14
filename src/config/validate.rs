// src/config/validate.rs

use std::collections::BTreeSet;

use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{GraphConfig, RawWorkloadFile, TaskConfig, WorkloadFile};
use crate::errors::{Result, SchedError};

impl TryFrom<RawWorkloadFile> for WorkloadFile {
    type Error = SchedError;

    fn try_from(raw: RawWorkloadFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_workload(&raw)?;
        Ok(WorkloadFile::new_unchecked(raw))
    }
}

fn validate_raw_workload(cfg: &RawWorkloadFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_flat_tasks(cfg)?;
    for (name, graph) in cfg.graph.iter() {
        validate_graph(name, graph)?;
    }
    validate_modes(cfg)?;
    validate_transitions(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawWorkloadFile) -> Result<()> {
    if cfg.task.is_empty() && cfg.graph.is_empty() {
        return Err(SchedError::ConfigError(
            "workload must contain at least one [task.<name>] or [graph.<name>] section"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_flat_tasks(cfg: &RawWorkloadFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        validate_flat_task(name, task)?;
    }

    let explicit = cfg.task.values().filter(|t| t.priority.is_some()).count();
    if explicit != 0 && explicit != cfg.task.len() {
        return Err(SchedError::ConfigError(format!(
            "either every task sets `priority` or none does ({explicit} of {} do)",
            cfg.task.len()
        )));
    }
    Ok(())
}

fn validate_flat_task(name: &str, task: &TaskConfig) -> Result<()> {
    if task.period <= 0 {
        return Err(SchedError::ConfigError(format!(
            "task '{name}' must have period > 0 (got {})",
            task.period
        )));
    }
    if task.effective_deadline() <= 0 {
        return Err(SchedError::ConfigError(format!(
            "task '{name}' must have deadline > 0 (got {})",
            task.effective_deadline()
        )));
    }
    if task.guest.is_empty() {
        return Err(SchedError::ConfigError(format!(
            "task '{name}' must list at least one guest execution time"
        )));
    }
    if task.guest.iter().any(|c| *c < 0) || task.hyper < 0 {
        return Err(SchedError::ConfigError(format!(
            "task '{name}' has a negative execution time"
        )));
    }

    match (task.predicted, task.frame_periods) {
        (None, None) => {}
        (Some(predicted), Some(frames)) => {
            if predicted < 0 {
                return Err(SchedError::ConfigError(format!(
                    "task '{name}' must have predicted >= 0 (got {predicted})"
                )));
            }
            if frames < 1 {
                return Err(SchedError::ConfigError(format!(
                    "task '{name}' must have frame_periods >= 1 (got {frames})"
                )));
            }
        }
        _ => {
            return Err(SchedError::ConfigError(format!(
                "task '{name}' must set both `predicted` and `frame_periods` or neither"
            )));
        }
    }
    Ok(())
}

fn validate_graph(name: &str, graph: &GraphConfig) -> Result<()> {
    if let Some(task) = &graph.task {
        if !graph.node.is_empty() || !graph.edge.is_empty() {
            return Err(SchedError::ConfigError(format!(
                "graph '{name}' mixes a `task` shorthand with explicit nodes or edges"
            )));
        }
        if task.period <= 0 || task.effective_deadline() <= 0 {
            return Err(SchedError::ConfigError(format!(
                "graph '{name}' must have period and deadline > 0"
            )));
        }
        if task.effective_deadline() > task.period {
            return Err(SchedError::ConfigError(format!(
                "graph '{name}' must have deadline <= period ({} > {})",
                task.effective_deadline(),
                task.period
            )));
        }
        if task.guest < 0 || task.hyper < 0 {
            return Err(SchedError::ConfigError(format!(
                "graph '{name}' has a negative execution time"
            )));
        }
        if task.hyper > 0 && task.effective_deadline() - task.hyper <= 0 {
            return Err(SchedError::ConfigError(format!(
                "graph '{name}' hyper execution leaves no room before the deadline"
            )));
        }
        return Ok(());
    }

    if graph.node.is_empty() {
        return Err(SchedError::ConfigError(format!(
            "graph '{name}' must define a `task` or at least one node"
        )));
    }

    for (node_name, node) in graph.node.iter() {
        if node.wcet < 0 || node.deadline <= 0 {
            return Err(SchedError::ConfigError(format!(
                "node '{name}.{node_name}' must have wcet >= 0 and deadline > 0"
            )));
        }
        if let Some(partner) = &node.partner {
            let other = graph.node.get(partner).ok_or_else(|| {
                SchedError::ConfigError(format!(
                    "node '{name}.{node_name}' has unknown partner '{partner}'"
                ))
            })?;
            if other.preemptible == node.preemptible {
                return Err(SchedError::ConfigError(format!(
                    "node '{name}.{node_name}' and its partner '{partner}' must be one guest and one hyper node"
                )));
            }
        }
    }

    for edge in graph.edge.iter() {
        for end in [&edge.from, &edge.to] {
            if !graph.node.contains_key(end) {
                return Err(SchedError::ConfigError(format!(
                    "graph '{name}' has an edge to unknown node '{end}'"
                )));
            }
        }
        if edge.interarrival <= 0 {
            return Err(SchedError::ConfigError(format!(
                "graph '{name}' edge {} -> {} must have interarrival > 0 (got {})",
                edge.from, edge.to, edge.interarrival
            )));
        }
    }

    validate_recurrence(name, graph)
}

/// A task graph describes a recurring task, so it must contain a cycle.
fn validate_recurrence(name: &str, graph: &GraphConfig) -> Result<()> {
    let mut g: DiGraphMap<&str, ()> = DiGraphMap::new();
    for node in graph.node.keys() {
        g.add_node(node.as_str());
    }
    for edge in graph.edge.iter() {
        g.add_edge(edge.from.as_str(), edge.to.as_str(), ());
    }

    if is_cyclic_directed(&g) {
        Ok(())
    } else {
        Err(SchedError::ConfigError(format!(
            "graph '{name}' has no cycle, so it never recurs"
        )))
    }
}

fn validate_modes(cfg: &RawWorkloadFile) -> Result<()> {
    for (name, mode) in cfg.mode.iter() {
        for graph in mode.graphs.iter() {
            if !cfg.graph.contains_key(graph) {
                return Err(SchedError::ConfigError(format!(
                    "mode '{name}' refers to unknown graph '{graph}'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_transitions(cfg: &RawWorkloadFile) -> Result<()> {
    let nodes: BTreeSet<String> = cfg
        .graph
        .iter()
        .flat_map(|(name, g)| g.node_names(name))
        .collect();

    for (name, transition) in cfg.transition.iter() {
        for mode in [&transition.from, &transition.to] {
            if !cfg.mode.contains_key(mode) {
                return Err(SchedError::ConfigError(format!(
                    "transition '{name}' refers to unknown mode '{mode}'"
                )));
            }
        }

        for task in transition.task.iter() {
            for node in [&task.source, &task.target] {
                if !nodes.contains(node) {
                    return Err(SchedError::ConfigError(format!(
                        "transition '{name}' refers to unknown node '{node}'"
                    )));
                }
            }
            if task.wcet < 0 || task.deadline <= 0 {
                return Err(SchedError::ConfigError(format!(
                    "transitioning node '{}' must have wcet >= 0 and deadline > 0",
                    task.node
                )));
            }
            if task.to_transitioning <= 0 || task.to_target <= 0 {
                return Err(SchedError::ConfigError(format!(
                    "transition '{name}' edges around '{}' must have interarrival > 0",
                    task.node
                )));
            }
        }
    }
    Ok(())
}
