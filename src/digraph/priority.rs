// src/digraph/priority.rs

use tracing::debug;

use crate::digraph::modal::ModalSystem;
use crate::digraph::node::NodeId;
use crate::errors::Result;

/// Deadline-monotonic priorities for every node reachable from a mode or a
/// transition.
///
/// Non-preemptible nodes rank above preemptible ones; within each class the
/// order is `(deadline, id)`. Priorities are dense from 0 (highest). Each
/// graph then takes the highest priority (smallest number) of its nodes.
pub fn assign_deadline_monotonic_priorities(system: &mut ModalSystem) -> Result<()> {
    let graphs = system.working_set();
    let mut nodes: Vec<NodeId> = system.nodes_of(&graphs);
    nodes.sort_by_key(|id| {
        let n = system.node(*id);
        (n.preemptible, n.deadline, n.id)
    });

    for (priority, id) in nodes.iter().enumerate() {
        let priority = priority as i64;
        system.set_node_priority(*id, priority);
        debug!(node = %system.node(*id).name, priority, "assigned node priority");
    }

    for graph in graphs {
        let highest = system
            .graph(graph)
            .nodes()
            .iter()
            .map(|n| system.node_priority(*n))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .min();
        if let Some(p) = highest {
            system.set_graph_priority(graph, p);
        }
    }

    system.mark_priorities_assigned();
    Ok(())
}
