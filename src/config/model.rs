// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{AnalysisKind, Criticality, Time};

/// Top-level workload as read from a TOML file, before validation.
///
/// A workload describes flat tasks, digraph tasks or both:
///
/// ```toml
/// [analysis]
/// kind = "exact"
///
/// [task.sensor]
/// period = 10
/// guest = [2, 4]
/// hyper = 1
///
/// [graph.x.task]
/// period = 10
/// deadline = 10
/// guest = 2
/// hyper = 1
///
/// [mode.A]
/// graphs = ["x"]
/// ```
///
/// All sections are optional, but at least one `[task.<name>]` or
/// `[graph.<name>]` must be present.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawWorkloadFile {
    #[serde(default)]
    pub analysis: AnalysisSection,

    /// Flat mixed-trust tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Task graphs from `[graph.<name>]`.
    #[serde(default)]
    pub graph: BTreeMap<String, GraphConfig>,

    /// Modes from `[mode.<name>]`. Without any, all graphs form one mode.
    #[serde(default)]
    pub mode: BTreeMap<String, ModeConfig>,

    /// Mode transitions from `[transition.<name>]`.
    #[serde(default)]
    pub transition: BTreeMap<String, TransitionConfig>,
}

/// A workload that passed validation. Only constructed through
/// `TryFrom<RawWorkloadFile>`.
#[derive(Debug, Clone)]
pub struct WorkloadFile {
    pub analysis: AnalysisSection,
    pub task: BTreeMap<String, TaskConfig>,
    pub graph: BTreeMap<String, GraphConfig>,
    pub mode: BTreeMap<String, ModeConfig>,
    pub transition: BTreeMap<String, TransitionConfig>,
}

impl WorkloadFile {
    pub(crate) fn new_unchecked(raw: RawWorkloadFile) -> Self {
        Self {
            analysis: raw.analysis,
            task: raw.task,
            graph: raw.graph,
            mode: raw.mode,
            transition: raw.transition,
        }
    }
}

/// `[analysis]` section.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct AnalysisSection {
    /// Test to run when `--analysis` is not given.
    #[serde(default)]
    pub kind: AnalysisKind,
}

/// `[task.<name>]` section: one flat mixed-trust task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub period: Time,

    /// Defaults to the period.
    #[serde(default)]
    pub deadline: Option<Time>,

    /// Larger = higher priority. Either every task sets one or none does, in
    /// which case priorities are assigned deadline-monotonically.
    #[serde(default)]
    pub priority: Option<i64>,

    /// Guest execution time per criticality level.
    pub guest: Vec<Time>,

    #[serde(default)]
    pub guest_criticality: Criticality,

    /// Nominal hyper execution time.
    #[serde(default)]
    pub hyper: Time,

    #[serde(default)]
    pub hyper_criticality: Criticality,

    /// Predicted hyper execution time; needs `frame_periods` as well.
    #[serde(default)]
    pub predicted: Option<Time>,

    /// Jobs per frame of the predictive budget.
    #[serde(default)]
    pub frame_periods: Option<Time>,
}

impl TaskConfig {
    pub fn effective_deadline(&self) -> Time {
        self.deadline.unwrap_or(self.period)
    }
}

/// `[graph.<name>]` section.
///
/// Either a mixed-trust shorthand under `task` or explicit `node` / `edge`
/// tables, never both.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GraphConfig {
    #[serde(default)]
    pub task: Option<GraphTaskConfig>,

    /// Nodes keyed by local name. Elsewhere they are referred to as
    /// `<graph>.<node>`.
    #[serde(default)]
    pub node: BTreeMap<String, NodeConfig>,

    #[serde(default)]
    pub edge: Vec<EdgeConfig>,
}

impl GraphConfig {
    /// Qualified names of the nodes this graph will create.
    pub fn node_names(&self, graph: &str) -> Vec<String> {
        match &self.task {
            Some(task) => {
                let mut names = vec![format!("{graph}.guest")];
                if task.hyper > 0 {
                    names.push(format!("{graph}.hyper"));
                }
                names
            }
            None => self.node.keys().map(|n| format!("{graph}.{n}")).collect(),
        }
    }
}

/// `[graph.<name>.task]`: a periodic guest/hyper pair.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphTaskConfig {
    pub period: Time,
    #[serde(default)]
    pub deadline: Option<Time>,
    pub guest: Time,
    #[serde(default)]
    pub hyper: Time,
}

impl GraphTaskConfig {
    pub fn effective_deadline(&self) -> Time {
        self.deadline.unwrap_or(self.period)
    }
}

/// `[graph.<name>.node.<node>]`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub wcet: Time,
    pub deadline: Time,

    /// Guest nodes are preemptible, hyper nodes are not.
    #[serde(default = "default_preemptible")]
    pub preemptible: bool,

    /// Local name of the paired guest/hyper node.
    #[serde(default)]
    pub partner: Option<String>,
}

fn default_preemptible() -> bool {
    true
}

/// `[[graph.<name>.edge]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeConfig {
    pub from: String,
    pub to: String,
    pub interarrival: Time,
}

/// `[mode.<name>]`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModeConfig {
    pub graphs: Vec<String>,
}

/// `[transition.<name>]`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionConfig {
    pub from: String,
    pub to: String,

    #[serde(default)]
    pub task: Vec<TaskTransitionConfig>,
}

/// `[[transition.<name>.task]]`: hand-over from a hyper node of the source
/// mode to a guest node of the target mode through a fresh transitioning
/// node.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskTransitionConfig {
    /// Qualified name of the source hyper node.
    pub source: String,
    /// Qualified name of the target guest node.
    pub target: String,
    /// Name of the transitioning node.
    pub node: String,
    pub wcet: Time,
    pub deadline: Time,
    /// Interarrival of the `source → node` edge.
    pub to_transitioning: Time,
    /// Interarrival of the `node → target` edge.
    pub to_target: Time,
}
