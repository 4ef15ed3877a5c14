// src/digraph/request_bound.rs

//! Request-bound search over a sibling task graph.

use std::collections::{HashMap, HashSet};

use crate::digraph::graph::GraphId;
use crate::digraph::modal::ModalSystem;
use crate::digraph::node::NodeId;
use crate::errors::{Result, internal_error};
use crate::types::Time;

/// How an edge's interarrival is compared against the remaining interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// `interarrival <= remaining`. Used for non-preemptible victims.
    Inclusive,
    /// `interarrival < remaining`. Used for preemptible victims.
    Strict,
}

impl Boundary {
    /// Boundary matching a victim's preemptibility.
    pub fn for_victim(preemptible: bool) -> Self {
        if preemptible {
            Boundary::Strict
        } else {
            Boundary::Inclusive
        }
    }

    fn admits(self, span: Time, remaining: Time) -> bool {
        match self {
            Boundary::Inclusive => span <= remaining,
            Boundary::Strict => span < remaining,
        }
    }

    fn starts(self, interval: Time) -> bool {
        self.admits(0, interval)
    }
}

/// Maximum cumulative WCET `graph` can request against `victim` within
/// `interval`.
///
/// Nodes in `accounted` were already charged by another graph in the same
/// iteration and contribute nothing here.
pub fn request_bound(
    system: &ModalSystem,
    graph: GraphId,
    victim: NodeId,
    interval: Time,
    boundary: Boundary,
    accounted: &HashSet<NodeId>,
) -> Result<Time> {
    if !boundary.starts(interval) {
        return Ok(0);
    }

    let mut search = Search {
        system,
        graph,
        victim,
        boundary,
        accounted,
        graph_active: system.graph_is_active(graph),
        victim_priority: system.node_priority(victim)?,
        memo: HashMap::new(),
    };

    let mut best = 0;
    for &start in system.graph(graph).nodes() {
        best = best.max(search.visit(start, interval)?);
    }
    Ok(best)
}

struct Search<'a> {
    system: &'a ModalSystem,
    graph: GraphId,
    victim: NodeId,
    boundary: Boundary,
    accounted: &'a HashSet<NodeId>,
    graph_active: bool,
    victim_priority: i64,
    memo: HashMap<(NodeId, Time), Time>,
}

impl Search<'_> {
    /// Heaviest path demand starting at `start` with `remaining` time left.
    ///
    /// Every hop consumes a positive interarrival, so `(node, remaining)`
    /// states form a DAG. It is walked with an explicit stack: a state is
    /// settled once all of its admitted successors are in the memo.
    fn visit(&mut self, start: NodeId, remaining: Time) -> Result<Time> {
        let mut stack = vec![(start, remaining)];

        while let Some((node, left)) = stack.last().copied() {
            if self.memo.contains_key(&(node, left)) {
                stack.pop();
                continue;
            }

            let mut deepest = 0;
            let mut pending = false;
            for next in self.successors(node, left) {
                match self.memo.get(&next) {
                    Some(&demand) => deepest = deepest.max(demand),
                    None => {
                        stack.push(next);
                        pending = true;
                    }
                }
            }
            if pending {
                continue;
            }

            stack.pop();
            let total = self.contribution(node)? + deepest;
            self.memo.insert((node, left), total);
        }

        self.memo.get(&(start, remaining)).copied().ok_or_else(|| {
            internal_error(format!(
                "request-bound search left node {} unsettled",
                start.0
            ))
        })
    }

    /// States reachable over one active edge the boundary admits.
    fn successors(&self, node: NodeId, remaining: Time) -> Vec<(NodeId, Time)> {
        let system = self.system;
        system
            .graph(self.graph)
            .successors_of(node)
            .iter()
            .map(|&edge| system.edge(edge))
            .filter(|e| {
                system.edge_is_active(e.id) && self.boundary.admits(e.interarrival, remaining)
            })
            .map(|e| (e.target, remaining - e.interarrival))
            .collect()
    }

    fn contribution(&self, node: NodeId) -> Result<Time> {
        let system = self.system;
        let n = system.node(node);
        let interferes = self.graph_active
            && !self.accounted.contains(&node)
            && !n.shares_graph_with(system.node(self.victim))
            && system.node_priority(node)? <= self.victim_priority
            && system.node_is_active(node)?;
        Ok(if interferes { n.wcet } else { 0 })
    }
}
