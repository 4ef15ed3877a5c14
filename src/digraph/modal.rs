// src/digraph/modal.rs

//! Modes, mode transitions and the [`ModalSystem`] arena.
//!
//! The arena owns every node, edge, graph, mode and transition; everything
//! else refers to them by integer handle. Membership is recorded both ways
//! (graph → nodes, node → graphs) so activity queries are a walk over a
//! handful of owners.

use std::collections::BTreeSet;

use tracing::debug;

use crate::digraph::graph::{GraphId, Owner, TaskGraph};
use crate::digraph::node::{EdgeId, NodeId, NodeSpec, TaskEdge, TaskNode};
use crate::errors::{Result, config_error, internal_error};
use crate::types::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub usize);

/// One operating configuration.
#[derive(Debug, Clone)]
pub struct Mode {
    pub id: ModeId,
    pub name: String,
    pub active: bool,
    pub(crate) graphs: Vec<GraphId>,
}

impl Mode {
    pub fn graphs(&self) -> &[GraphId] {
        &self.graphs
    }
}

/// A change from `source` to `target`, owning the task-transition graphs
/// that model the overlap of both workloads.
#[derive(Debug, Clone)]
pub struct ModeTransition {
    pub id: TransitionId,
    pub name: String,
    pub source: ModeId,
    pub target: ModeId,
    pub active: bool,
    pub(crate) graphs: Vec<GraphId>,
}

impl ModeTransition {
    pub fn graphs(&self) -> &[GraphId] {
        &self.graphs
    }
}

/// What is switched on while one part of the system is analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Mode(ModeId),
    Transition(TransitionId),
}

/// Guest/hyper node pair created by [`ModalSystem::add_mixed_trust_task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixedTrustNodes {
    pub guest: NodeId,
    pub hyper: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct ModalSystem {
    nodes: Vec<TaskNode>,
    edges: Vec<TaskEdge>,
    graphs: Vec<TaskGraph>,
    modes: Vec<Mode>,
    transitions: Vec<ModeTransition>,
    priorities_assigned: bool,
}

impl ModalSystem {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- construction -------------------------------------------------

    pub fn add_graph(&mut self, name: impl Into<String>) -> GraphId {
        let id = GraphId(self.graphs.len());
        self.graphs.push(TaskGraph::new(id, name.into()));
        id
    }

    /// Create a node and make it a member of `graph`.
    pub fn add_node(&mut self, graph: GraphId, spec: NodeSpec) -> Result<NodeId> {
        if spec.wcet < 0 {
            return Err(config_error(format!(
                "node '{}' must have wcet >= 0 (got {})",
                spec.name, spec.wcet
            )));
        }
        if spec.deadline <= 0 {
            return Err(config_error(format!(
                "node '{}' must have deadline > 0 (got {})",
                spec.name, spec.deadline
            )));
        }
        self.check_graph(graph)?;

        let id = NodeId(self.nodes.len());
        self.nodes.push(TaskNode::new(id, spec));
        self.attach_node(graph, id)?;
        Ok(id)
    }

    /// Make an existing node a member of another graph as well.
    pub fn attach_node(&mut self, graph: GraphId, node: NodeId) -> Result<()> {
        self.check_graph(graph)?;
        self.check_node(node)?;
        let g = &mut self.graphs[graph.0];
        if !g.nodes.contains(&node) {
            g.nodes.push(node);
            self.nodes[node.0].graphs.push(graph);
        }
        Ok(())
    }

    /// Add an edge between two members of `graph`.
    pub fn add_edge(
        &mut self,
        graph: GraphId,
        source: NodeId,
        target: NodeId,
        interarrival: Time,
    ) -> Result<EdgeId> {
        self.check_graph(graph)?;
        self.check_node(source)?;
        self.check_node(target)?;
        if interarrival <= 0 {
            return Err(config_error(format!(
                "edge {} -> {} must have interarrival > 0 (got {interarrival})",
                self.node(source).name,
                self.node(target).name
            )));
        }
        let g = &mut self.graphs[graph.0];
        if !g.contains(source) || !g.contains(target) {
            return Err(config_error(format!(
                "edge endpoints must belong to graph '{}'",
                g.name
            )));
        }

        let id = EdgeId(self.edges.len());
        g.successors.entry(source).or_default().push(id);
        g.predecessors.entry(target).or_default().push(id);
        self.edges.push(TaskEdge {
            id,
            interarrival,
            source,
            target,
            graphs: vec![graph],
        });
        Ok(id)
    }

    /// Pair a guest node with its hyper node.
    pub fn set_partners(&mut self, guest: NodeId, hyper: NodeId) -> Result<()> {
        self.check_node(guest)?;
        self.check_node(hyper)?;
        self.nodes[guest.0].partner = Some(hyper);
        self.nodes[hyper.0].partner = Some(guest);
        Ok(())
    }

    /// Add a periodic mixed-trust task to `graph`: a guest node released at
    /// the period start and, if `hyper_wcet > 0`, a hyper node released at
    /// the guest's enforcement deadline.
    ///
    /// Both nodes get a self-loop of `period`. The cross edges start out at
    /// `deadline - hyper_wcet` (guest → hyper) and the rest of the period
    /// (hyper → guest); the analysis re-times them once the hyper response
    /// time is known.
    pub fn add_mixed_trust_task(
        &mut self,
        graph: GraphId,
        name: &str,
        period: Time,
        deadline: Time,
        guest_wcet: Time,
        hyper_wcet: Time,
    ) -> Result<MixedTrustNodes> {
        if period <= 0 {
            return Err(config_error(format!(
                "task '{name}' must have period > 0 (got {period})"
            )));
        }
        if deadline > period {
            return Err(config_error(format!(
                "task '{name}' must have deadline <= period ({deadline} > {period})"
            )));
        }

        let guest_spec = NodeSpec::guest(format!("{name}.guest"), guest_wcet, deadline);
        let guest = self.add_node(graph, guest_spec)?;
        self.add_edge(graph, guest, guest, period)?;

        if hyper_wcet == 0 {
            return Ok(MixedTrustNodes { guest, hyper: None });
        }

        let window = deadline - hyper_wcet;
        if window <= 0 {
            return Err(config_error(format!(
                "task '{name}' hyper wcet {hyper_wcet} leaves no guest window before deadline {deadline}"
            )));
        }

        let hyper_spec = NodeSpec::hyper(format!("{name}.hyper"), hyper_wcet, deadline);
        let hyper = self.add_node(graph, hyper_spec)?;
        self.add_edge(graph, hyper, hyper, period)?;
        self.add_edge(graph, guest, hyper, window)?;
        self.add_edge(graph, hyper, guest, period - window)?;
        self.set_partners(guest, hyper)?;

        Ok(MixedTrustNodes {
            guest,
            hyper: Some(hyper),
        })
    }

    pub fn add_mode(&mut self, name: impl Into<String>, graphs: &[GraphId]) -> Result<ModeId> {
        let id = ModeId(self.modes.len());
        for g in graphs {
            self.check_graph(*g)?;
            self.graphs[g.0].owners.push(Owner::Mode(id));
        }
        self.modes.push(Mode {
            id,
            name: name.into(),
            active: false,
            graphs: graphs.to_vec(),
        });
        Ok(id)
    }

    pub fn add_transition(
        &mut self,
        name: impl Into<String>,
        source: ModeId,
        target: ModeId,
    ) -> Result<TransitionId> {
        self.check_mode(source)?;
        self.check_mode(target)?;
        let id = TransitionId(self.transitions.len());
        self.transitions.push(ModeTransition {
            id,
            name: name.into(),
            source,
            target,
            active: false,
            graphs: Vec::new(),
        });
        Ok(id)
    }

    /// Splice `source_hyper → transitioning → target_guest` into a new graph
    /// owned by `transition`, and return the fresh transitioning node.
    pub fn add_task_transition(
        &mut self,
        transition: TransitionId,
        source_hyper: NodeId,
        target_guest: NodeId,
        transitioning: NodeSpec,
        to_transitioning: Time,
        to_target: Time,
    ) -> Result<NodeId> {
        self.check_transition(transition)?;
        self.check_node(source_hyper)?;
        self.check_node(target_guest)?;
        if self.node(source_hyper).preemptible {
            return Err(config_error(format!(
                "transition source '{}' must be a hyper node",
                self.node(source_hyper).name
            )));
        }
        if !self.node(target_guest).preemptible {
            return Err(config_error(format!(
                "transition target '{}' must be a guest node",
                self.node(target_guest).name
            )));
        }

        let spec = NodeSpec {
            preemptible: false,
            ..transitioning
        };
        let graph_name = format!("{}:{}", self.transitions[transition.0].name, spec.name);
        let graph = self.add_graph(graph_name);
        self.attach_node(graph, source_hyper)?;
        let node = self.add_node(graph, spec)?;
        self.attach_node(graph, target_guest)?;
        self.add_edge(graph, source_hyper, node, to_transitioning)?;
        self.add_edge(graph, node, target_guest, to_target)?;

        let n = &mut self.nodes[node.0];
        n.transitioning = true;
        n.partner = Some(source_hyper);

        self.graphs[graph.0].owners.push(Owner::Transition(transition));
        self.transitions[transition.0].graphs.push(graph);
        Ok(node)
    }

    // ----- accessors ----------------------------------------------------

    pub fn node(&self, id: NodeId) -> &TaskNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TaskNode {
        &mut self.nodes[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &TaskEdge {
        &self.edges[id.0]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut TaskEdge {
        &mut self.edges[id.0]
    }

    pub fn graph(&self, id: GraphId) -> &TaskGraph {
        &self.graphs[id.0]
    }

    pub fn mode(&self, id: ModeId) -> &Mode {
        &self.modes[id.0]
    }

    pub fn transition(&self, id: TransitionId) -> &ModeTransition {
        &self.transitions[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &TaskEdge> {
        self.edges.iter()
    }

    pub fn mode_ids(&self) -> impl Iterator<Item = ModeId> + use<> {
        (0..self.modes.len()).map(ModeId)
    }

    pub fn transition_ids(&self) -> impl Iterator<Item = TransitionId> + use<> {
        (0..self.transitions.len()).map(TransitionId)
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.name == name).map(|n| n.id)
    }

    pub fn find_mode(&self, name: &str) -> Option<ModeId> {
        self.modes.iter().find(|m| m.name == name).map(|m| m.id)
    }

    /// Graphs owned by an activation.
    pub fn activation_graphs(&self, activation: Activation) -> &[GraphId] {
        match activation {
            Activation::Mode(m) => &self.modes[m.0].graphs,
            Activation::Transition(t) => &self.transitions[t.0].graphs,
        }
    }

    /// Every mode followed by every transition.
    pub fn activations(&self) -> Vec<Activation> {
        self.mode_ids()
            .map(Activation::Mode)
            .chain(self.transition_ids().map(Activation::Transition))
            .collect()
    }

    /// Every graph owned by some mode or transition, deduplicated and sorted
    /// by `(priority, id)`.
    pub fn working_set(&self) -> Vec<GraphId> {
        let unique: BTreeSet<GraphId> = self
            .activations()
            .into_iter()
            .flat_map(|a| self.activation_graphs(a).iter().copied())
            .collect();
        let mut graphs: Vec<GraphId> = unique.into_iter().collect();
        graphs.sort_by_key(|g| self.graphs[g.0].order_key());
        graphs
    }

    /// Distinct nodes of the given graphs, in first-seen order.
    pub fn nodes_of(&self, graphs: &[GraphId]) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        graphs
            .iter()
            .flat_map(|g| self.graphs[g.0].nodes.iter().copied())
            .filter(|n| seen.insert(*n))
            .collect()
    }

    // ----- priorities ---------------------------------------------------

    /// Priority of `node`: its own, else its first owning graph's.
    pub fn node_priority(&self, node: NodeId) -> Result<i64> {
        let n = self.node(node);
        if let Some(p) = n.priority {
            return Ok(p);
        }
        n.graphs
            .first()
            .map(|g| self.graphs[g.0].priority)
            .ok_or_else(|| internal_error(format!("node '{}' belongs to no graph", n.name)))
    }

    pub fn set_node_priority(&mut self, node: NodeId, priority: i64) {
        self.nodes[node.0].priority = Some(priority);
        self.priorities_assigned = true;
    }

    pub fn set_graph_priority(&mut self, graph: GraphId, priority: i64) {
        self.graphs[graph.0].priority = priority;
        self.priorities_assigned = true;
    }

    pub fn priorities_assigned(&self) -> bool {
        self.priorities_assigned
    }

    // ----- activity -----------------------------------------------------

    pub fn graph_is_active(&self, graph: GraphId) -> bool {
        let owners = &self.graphs[graph.0].owners;
        owners.is_empty()
            || owners.iter().any(|o| match o {
                Owner::Mode(m) => self.modes[m.0].active,
                Owner::Transition(t) => self.transitions[t.0].active,
            })
    }

    /// A node is active when one of its graphs is; a transitioning node
    /// additionally needs its own flag set.
    pub fn node_is_active(&self, node: NodeId) -> Result<bool> {
        let n = self.node(node);
        if n.graphs.is_empty() {
            return Err(internal_error(format!(
                "activity query on node '{}' which belongs to no graph",
                n.name
            )));
        }
        let any_graph = n.graphs.iter().any(|g| self.graph_is_active(*g));
        Ok(if n.transitioning {
            n.active && any_graph
        } else {
            any_graph
        })
    }

    pub fn edge_is_active(&self, edge: EdgeId) -> bool {
        self.edges[edge.0]
            .graphs
            .iter()
            .any(|g| self.graph_is_active(*g))
    }

    /// Switch everything off, transitioning nodes included.
    pub fn deactivate_all(&mut self) {
        for m in &mut self.modes {
            m.active = false;
        }
        for t in &mut self.transitions {
            t.active = false;
        }
        for n in self.nodes.iter_mut().filter(|n| n.transitioning) {
            n.active = false;
        }
    }

    /// Make `activation` the only active part of the system.
    pub fn activate(&mut self, activation: Activation) {
        self.deactivate_all();
        match activation {
            Activation::Mode(m) => {
                self.modes[m.0].active = true;
                debug!(mode = %self.modes[m.0].name, "activated mode");
            }
            Activation::Transition(t) => {
                self.transitions[t.0].active = true;
                let graphs = self.transitions[t.0].graphs.clone();
                for node in self.nodes_of(&graphs) {
                    let n = &mut self.nodes[node.0];
                    if n.transitioning {
                        n.active = true;
                    }
                }
                debug!(transition = %self.transitions[t.0].name, "activated transition");
            }
        }
    }

    // ----- adjacency ----------------------------------------------------

    /// Incoming edges of `node` in `graph` whose source is another node.
    pub fn non_self_predecessors(&self, graph: GraphId, node: NodeId) -> Vec<EdgeId> {
        self.graphs[graph.0]
            .predecessors_of(node)
            .iter()
            .copied()
            .filter(|e| !self.edges[e.0].is_self_loop())
            .collect()
    }

    /// Outgoing edges of `node` in `graph` whose target is another node.
    pub fn non_self_successors(&self, graph: GraphId, node: NodeId) -> Vec<EdgeId> {
        self.graphs[graph.0]
            .successors_of(node)
            .iter()
            .copied()
            .filter(|e| !self.edges[e.0].is_self_loop())
            .collect()
    }

    /// Edges from `source` to `target` in any graph.
    pub fn edges_between(&self, source: NodeId, target: NodeId) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|e| e.source == source && e.target == target)
            .map(|e| e.id)
            .collect()
    }

    /// Smallest self-loop interarrival in `graph`, i.e. its period.
    pub fn min_self_loop(&self, graph: GraphId) -> Option<Time> {
        self.graphs[graph.0]
            .edges()
            .map(|e| &self.edges[e.0])
            .filter(|e| e.is_self_loop())
            .map(|e| e.interarrival)
            .min()
    }

    // ----- validation helpers -------------------------------------------

    fn check_graph(&self, graph: GraphId) -> Result<()> {
        if graph.0 < self.graphs.len() {
            Ok(())
        } else {
            Err(config_error(format!("unknown graph handle {}", graph.0)))
        }
    }

    fn check_node(&self, node: NodeId) -> Result<()> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(config_error(format!("unknown node handle {}", node.0)))
        }
    }

    fn check_mode(&self, mode: ModeId) -> Result<()> {
        if mode.0 < self.modes.len() {
            Ok(())
        } else {
            Err(config_error(format!("unknown mode handle {}", mode.0)))
        }
    }

    fn check_transition(&self, transition: TransitionId) -> Result<()> {
        if transition.0 < self.transitions.len() {
            Ok(())
        } else {
            Err(config_error(format!(
                "unknown transition handle {}",
                transition.0
            )))
        }
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut TaskNode> {
        self.nodes.iter_mut()
    }

    pub(crate) fn mark_priorities_assigned(&mut self) {
        self.priorities_assigned = true;
    }
}
