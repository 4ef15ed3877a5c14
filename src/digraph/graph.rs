// src/digraph/graph.rs

use std::collections::HashMap;

use crate::digraph::modal::{ModeId, TransitionId};
use crate::digraph::node::{EdgeId, NodeId};

/// Arena handle of a [`TaskGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(pub usize);

/// Who a graph belongs to. A graph with no owner is always active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Mode(ModeId),
    Transition(TransitionId),
}

/// A recurring task automaton.
///
/// Nodes and edges live in the [`ModalSystem`](crate::digraph::ModalSystem)
/// arena; the graph only keeps their handles plus local adjacency, so a node
/// or edge can belong to several graphs at once.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    pub id: GraphId,
    pub name: String,
    /// Lower = higher priority. Together with `id` this gives graphs a total
    /// order; do not change it while the graph sits in a sorted working set.
    pub priority: i64,
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) successors: HashMap<NodeId, Vec<EdgeId>>,
    pub(crate) predecessors: HashMap<NodeId, Vec<EdgeId>>,
    pub(crate) owners: Vec<Owner>,
}

impl TaskGraph {
    pub(crate) fn new(id: GraphId, name: String) -> Self {
        Self {
            id,
            name,
            priority: 0,
            nodes: Vec::new(),
            successors: HashMap::new(),
            predecessors: HashMap::new(),
            owners: Vec::new(),
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Outgoing edges of `node` inside this graph.
    pub fn successors_of(&self, node: NodeId) -> &[EdgeId] {
        self.successors
            .get(&node)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Incoming edges of `node` inside this graph.
    pub fn predecessors_of(&self, node: NodeId) -> &[EdgeId] {
        self.predecessors
            .get(&node)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All edges of the graph, each reported once.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.nodes
            .iter()
            .flat_map(move |n| self.successors_of(*n).iter().copied())
    }

    pub fn owners(&self) -> &[Owner] {
        &self.owners
    }

    /// Key of the canonical iteration order.
    pub fn order_key(&self) -> (i64, GraphId) {
        (self.priority, self.id)
    }
}
