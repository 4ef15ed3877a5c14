// src/digraph/mod.rs

//! Digraph task model and its modal response-time analysis.
//!
//! - [`node`] / [`graph`]: job types, minimum inter-arrival edges, graphs.
//! - [`modal`]: modes, transitions and the [`ModalSystem`] arena.
//! - [`request_bound`]: demand a sibling graph can impose on a node.
//! - [`analysis`]: per-node test and whole-system orchestration.
//! - [`priority`]: deadline-monotonic priority assignment.
//! - [`convert`]: collapse a mode into a flat task set.
//! - [`report`]: per-node summary of an analysis run.

pub mod analysis;
pub mod convert;
pub mod graph;
pub mod modal;
pub mod node;
pub mod priority;
pub mod report;
pub mod request_bound;

pub use analysis::{NodeVerdict, analyse_node, blocking_of, is_modal_system_schedulable, jitter_of};
pub use convert::flat_tasks_from_mode;
pub use graph::{GraphId, Owner, TaskGraph};
pub use modal::{
    Activation, MixedTrustNodes, ModalSystem, Mode, ModeId, ModeTransition, TransitionId,
};
pub use node::{EdgeId, NodeId, NodeSpec, TaskEdge, TaskNode};
pub use priority::assign_deadline_monotonic_priorities;
pub use report::{ModalReport, NodeReport};
pub use request_bound::{Boundary, request_bound};
