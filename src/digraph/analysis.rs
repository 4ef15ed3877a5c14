// src/digraph/analysis.rs

//! Response-time analysis of a [`ModalSystem`].
//!
//! The per-node test ([`analyse_node`]) is a fixed point over the request
//! bounds of every other active graph. [`is_modal_system_schedulable`] runs it
//! for every node in every mode and every transition: hyper nodes first, then
//! the enforcement deadlines their response times imply, then guest nodes.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::digraph::graph::GraphId;
use crate::digraph::modal::ModalSystem;
use crate::digraph::node::NodeId;
use crate::digraph::request_bound::{Boundary, request_bound};
use crate::errors::{Result, internal_error};
use crate::types::Time;

/// Outcome of [`analyse_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeVerdict {
    pub schedulable: bool,
    pub response_time: Time,
}

/// Which kind of node a pass over the system tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Hyper,
    Guest,
}

impl Phase {
    fn tests(self, preemptible: bool) -> bool {
        match self {
            Phase::Hyper => !preemptible,
            Phase::Guest => preemptible,
        }
    }
}

/// Longest non-preemptible execution that can block `victim`: the maximum
/// WCET over active, lower-priority, non-preemptible nodes of `working_set`
/// that share no graph with it.
pub fn blocking_of(system: &ModalSystem, working_set: &[GraphId], victim: NodeId) -> Result<Time> {
    let v = system.node(victim);
    let victim_priority = system.node_priority(victim)?;

    let mut blocking = 0;
    for id in system.nodes_of(working_set) {
        let n = system.node(id);
        if n.preemptible || n.shares_graph_with(v) {
            continue;
        }
        if system.node_priority(id)? > victim_priority && system.node_is_active(id)? {
            blocking = blocking.max(n.wcet);
        }
    }
    Ok(blocking)
}

/// Release jitter `graph` can apply against `victim`: the largest
/// `effective deadline - wcet` over its nodes that may interfere, never
/// negative.
pub fn jitter_of(system: &ModalSystem, graph: GraphId, victim: NodeId) -> Result<Time> {
    let v = system.node(victim);
    let victim_priority = system.node_priority(victim)?;

    let mut jitter = 0;
    for &id in system.graph(graph).nodes() {
        let n = system.node(id);
        if !n.shares_graph_with(v) && system.node_priority(id)? <= victim_priority {
            jitter = jitter.max(n.jitter());
        }
    }
    Ok(jitter)
}

/// Response-time test of a single node against the currently active part of
/// the system.
pub fn analyse_node(
    system: &ModalSystem,
    working_set: &[GraphId],
    victim: NodeId,
) -> Result<NodeVerdict> {
    let v = system.node(victim);
    let boundary = Boundary::for_victim(v.preemptible);
    let deadline = v.effective_deadline();

    let seed = if v.preemptible {
        v.wcet
    } else {
        blocking_of(system, working_set, victim)?
    };

    let mut response = seed;
    let mut accounted = HashSet::new();
    loop {
        accounted.clear();
        let mut total = seed;
        for &graph in working_set {
            if v.graphs().contains(&graph) || !system.graph_is_active(graph) {
                continue;
            }
            let interval = response + jitter_of(system, graph, victim)?;
            total += request_bound(system, graph, victim, interval, boundary, &accounted)?;
            accounted.extend(system.graph(graph).nodes().iter().copied());
        }

        let settled = total == response;
        response = total;
        if settled || total > deadline {
            break;
        }
    }

    if !v.preemptible {
        response += v.wcet;
    }

    let schedulable = response <= deadline;
    debug!(node = %v.name, response, deadline, schedulable, "analysed node");
    Ok(NodeVerdict {
        schedulable,
        response_time: response,
    })
}

/// Decide whether every node of `system` meets its deadline in every mode and
/// every mode transition.
///
/// Priorities must already be assigned, e.g. by
/// [`assign_deadline_monotonic_priorities`](crate::digraph::assign_deadline_monotonic_priorities).
/// Response times and guest enforcement deadlines are written back onto the
/// nodes, and guest → hyper edges are re-timed to the derived enforcement
/// deadlines.
pub fn is_modal_system_schedulable(system: &mut ModalSystem) -> Result<bool> {
    if !system.priorities_assigned() {
        return Err(internal_error(
            "modal system analysed before priorities were assigned",
        ));
    }

    let working_set = system.working_set();
    system.deactivate_all();
    for node in system.nodes_mut() {
        node.response_time = 0;
    }

    let schedulable = run_phase(system, &working_set, Phase::Hyper)?
        && propagate_enforcement_deadlines(system)?
        && run_phase(system, &working_set, Phase::Guest)?;

    system.deactivate_all();
    info!(schedulable, "modal system analysis finished");
    Ok(schedulable)
}

/// Test every node of `phase`'s kind, one mode and then one transition at a
/// time. Each node keeps the largest response time seen across activations.
fn run_phase(system: &mut ModalSystem, working_set: &[GraphId], phase: Phase) -> Result<bool> {
    for activation in system.activations() {
        system.activate(activation);
        let graphs = system.activation_graphs(activation).to_vec();

        for node in system.nodes_of(&graphs) {
            if !phase.tests(system.node(node).preemptible) {
                continue;
            }
            let verdict = analyse_node(system, working_set, node)?;
            let n = system.node_mut(node);
            n.response_time = n.response_time.max(verdict.response_time);

            if !verdict.schedulable {
                warn!(
                    ?phase,
                    ?activation,
                    node = %n.name,
                    response = verdict.response_time,
                    deadline = n.effective_deadline(),
                    "node misses its deadline"
                );
                system.deactivate_all();
                return Ok(false);
            }
        }
    }

    system.deactivate_all();
    Ok(true)
}

/// Derive guest enforcement deadlines from hyper response times.
///
/// A transitioning node and the hyper node it takes over from are aligned to
/// the larger of their two response times first; every other hyper node
/// uses its own.
fn propagate_enforcement_deadlines(system: &mut ModalSystem) -> Result<bool> {
    let mut aligned_nodes = HashSet::new();

    for transition in system.transition_ids() {
        for graph in system.transition(transition).graphs().to_vec() {
            for node in system.graph(graph).nodes().to_vec() {
                if !system.node(node).transitioning {
                    continue;
                }
                let source = transition_source(system, graph, node)?;
                let aligned = system
                    .node(node)
                    .response_time
                    .max(system.node(source).response_time);
                system.node_mut(node).response_time = aligned;
                system.node_mut(source).response_time = aligned;
                aligned_nodes.insert(node);
                aligned_nodes.insert(source);

                if let Some(guest) = system.node(source).partner {
                    if !enforce(system, guest, source, aligned)? {
                        return Ok(false);
                    }
                }
            }
        }
    }

    let hypers: Vec<(NodeId, NodeId)> = system
        .nodes()
        .filter(|n| !n.preemptible && !aligned_nodes.contains(&n.id))
        .filter_map(|n| n.partner.map(|p| (n.id, p)))
        .filter(|(_, p)| system.node(*p).preemptible)
        .collect();

    for (hyper, guest) in hypers {
        let response = system.node(hyper).response_time;
        if !enforce(system, guest, hyper, response)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// The hyper node a transitioning node takes over from: the source of its
/// only non-self incoming edge. The node must also have exactly one non-self
/// outgoing edge.
fn transition_source(system: &ModalSystem, graph: GraphId, node: NodeId) -> Result<NodeId> {
    let incoming = system.non_self_predecessors(graph, node);
    let outgoing = system.non_self_successors(graph, node);
    match (incoming.as_slice(), outgoing.as_slice()) {
        ([edge], [_]) => Ok(system.edge(*edge).source),
        _ => Err(internal_error(format!(
            "transitioning node '{}' needs exactly one incoming and one outgoing edge (found {} and {})",
            system.node(node).name,
            incoming.len(),
            outgoing.len()
        ))),
    }
}

/// Give `guest` the budget left by `hyper_response` and re-time the cross
/// edges of the pair to match. `false` when no budget is left.
fn enforce(
    system: &mut ModalSystem,
    guest: NodeId,
    hyper: NodeId,
    hyper_response: Time,
) -> Result<bool> {
    let enforcement = system.node(guest).deadline - hyper_response;
    if enforcement <= 0 {
        warn!(
            guest = %system.node(guest).name,
            hyper_response,
            "no enforcement budget left for guest"
        );
        return Ok(false);
    }
    system.node_mut(guest).enforcement_deadline = enforcement;

    let forward = system.edges_between(guest, hyper);
    let backward = system.edges_between(hyper, guest);
    for (fwd, back) in forward.into_iter().zip(backward) {
        let cycle = system.edge(fwd).interarrival + system.edge(back).interarrival;
        system.edge_mut(fwd).interarrival = enforcement;
        system.edge_mut(back).interarrival = cycle - enforcement;
    }

    debug!(guest = %system.node(guest).name, enforcement, "derived enforcement deadline");
    Ok(true)
}
