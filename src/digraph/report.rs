// src/digraph/report.rs

//! Read-only summary of a modal analysis run.

use std::fmt;

use crate::digraph::modal::ModalSystem;
use crate::types::Time;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub name: String,
    pub priority: Option<i64>,
    pub preemptible: bool,
    pub response_time: Time,
    /// Enforcement deadline for guest nodes, raw deadline otherwise.
    pub deadline: Time,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalReport {
    pub schedulable: bool,
    /// Nodes in creation order.
    pub nodes: Vec<NodeReport>,
}

impl ModalReport {
    pub fn from_system(system: &ModalSystem, schedulable: bool) -> Self {
        let nodes = system
            .nodes()
            .map(|n| NodeReport {
                name: n.name.clone(),
                priority: system.node_priority(n.id).ok(),
                preemptible: n.preemptible,
                response_time: n.response_time,
                deadline: n.effective_deadline(),
            })
            .collect();
        Self { schedulable, nodes }
    }

    pub fn node(&self, name: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

impl fmt::Display for ModalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.schedulable {
            "SCHEDULABLE"
        } else {
            "NOT SCHEDULABLE"
        };
        writeln!(f, "verdict: {verdict}")?;
        for n in &self.nodes {
            let kind = if n.preemptible { "guest" } else { "hyper" };
            let priority = n
                .priority
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "  - {} ({kind}, priority {priority}): R={} deadline={}",
                n.name, n.response_time, n.deadline
            )?;
        }
        Ok(())
    }
}
