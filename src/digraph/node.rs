// src/digraph/node.rs

//! Nodes (job types) and edges (minimum inter-arrival times) of task graphs.

use crate::digraph::graph::GraphId;
use crate::types::Time;

/// Arena handle of a [`TaskNode`]. Its value is the creation order, which
/// doubles as the last-resort tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Arena handle of a [`TaskEdge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

/// Static parameters of a new node.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub name: String,
    pub wcet: Time,
    pub deadline: Time,
    pub preemptible: bool,
}

impl NodeSpec {
    /// A preemptible (guest) job type.
    pub fn guest(name: impl Into<String>, wcet: Time, deadline: Time) -> Self {
        Self {
            name: name.into(),
            wcet,
            deadline,
            preemptible: true,
        }
    }

    /// A non-preemptible (hyper) job type.
    pub fn hyper(name: impl Into<String>, wcet: Time, deadline: Time) -> Self {
        Self {
            name: name.into(),
            wcet,
            deadline,
            preemptible: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskNode {
    pub id: NodeId,
    pub name: String,
    pub wcet: Time,
    pub deadline: Time,
    /// Budget window of a guest node; derived from its partner's response
    /// time during analysis. Starts out equal to `deadline`.
    pub enforcement_deadline: Time,
    pub preemptible: bool,
    /// Own priority (lower = higher). `None` inherits the first owning
    /// graph's priority.
    pub priority: Option<i64>,
    /// Output of the analysis.
    pub response_time: Time,
    /// Guest ↔ hyper pairing. A transitioning node points at the source hyper
    /// node it takes over from.
    pub partner: Option<NodeId>,
    /// Only consulted for transitioning nodes.
    pub active: bool,
    pub transitioning: bool,
    pub(crate) graphs: Vec<GraphId>,
}

impl TaskNode {
    pub(crate) fn new(id: NodeId, spec: NodeSpec) -> Self {
        Self {
            id,
            name: spec.name,
            wcet: spec.wcet,
            deadline: spec.deadline,
            enforcement_deadline: spec.deadline,
            preemptible: spec.preemptible,
            priority: None,
            response_time: 0,
            partner: None,
            active: false,
            transitioning: false,
            graphs: Vec::new(),
        }
    }

    /// Deadline the node is checked against.
    pub fn effective_deadline(&self) -> Time {
        if self.preemptible {
            self.enforcement_deadline
        } else {
            self.deadline
        }
    }

    /// Slack between release and the latest start that still meets the
    /// effective deadline.
    pub fn jitter(&self) -> Time {
        self.effective_deadline() - self.wcet
    }

    pub fn graphs(&self) -> &[GraphId] {
        &self.graphs
    }

    /// Whether both nodes belong to a common graph.
    pub fn shares_graph_with(&self, other: &TaskNode) -> bool {
        self.graphs.iter().any(|g| other.graphs.contains(g))
    }
}

#[derive(Debug, Clone)]
pub struct TaskEdge {
    pub id: EdgeId,
    pub interarrival: Time,
    pub source: NodeId,
    pub target: NodeId,
    pub(crate) graphs: Vec<GraphId>,
}

impl TaskEdge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn graphs(&self) -> &[GraphId] {
        &self.graphs
    }
}
