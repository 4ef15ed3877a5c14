#![allow(dead_code)]

use std::collections::BTreeMap;

use mtsched::config::{
    AnalysisSection, GraphConfig, GraphTaskConfig, ModeConfig, RawWorkloadFile, TaskConfig,
    WorkloadFile,
};
use mtsched::digraph::{GraphId, MixedTrustNodes, ModalSystem, ModeId};
use mtsched::flat::{GuestTask, HyperTask, MixedTrustTask, TaskSet};
use mtsched::types::{AnalysisKind, Criticality, Time};

/// Builder for a flat [`MixedTrustTask`].
///
/// Defaults: deadline = period, priority 0, guest criticality 0, hyper
/// criticality 0, nominal hyper budget.
pub struct TaskBuilder {
    name: String,
    period: Time,
    deadline: Option<Time>,
    priority: i64,
    guest: Vec<Time>,
    guest_criticality: Criticality,
    hyper: Time,
    hyper_criticality: Criticality,
    predictive: Option<(Time, Time)>,
}

impl TaskBuilder {
    pub fn new(name: &str, period: Time) -> Self {
        Self {
            name: name.to_string(),
            period,
            deadline: None,
            priority: 0,
            guest: vec![0],
            guest_criticality: 0,
            hyper: 0,
            hyper_criticality: 0,
            predictive: None,
        }
    }

    pub fn deadline(mut self, deadline: Time) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Single-level guest execution time.
    pub fn guest(mut self, exec: Time) -> Self {
        self.guest = vec![exec];
        self
    }

    /// Guest execution time per criticality level.
    pub fn guest_levels(mut self, execs: &[Time]) -> Self {
        self.guest = execs.to_vec();
        self
    }

    pub fn guest_criticality(mut self, level: Criticality) -> Self {
        self.guest_criticality = level;
        self
    }

    pub fn hyper(mut self, exec: Time) -> Self {
        self.hyper = exec;
        self
    }

    pub fn hyper_criticality(mut self, level: Criticality) -> Self {
        self.hyper_criticality = level;
        self
    }

    pub fn predictive(mut self, predicted: Time, frame_periods: Time) -> Self {
        self.predictive = Some((predicted, frame_periods));
        self
    }

    pub fn build(self) -> MixedTrustTask {
        let guest = GuestTask::new(self.guest_criticality, self.guest)
            .expect("valid guest task");
        let hyper = match self.predictive {
            Some((predicted, frames)) => {
                HyperTask::predictive(self.hyper_criticality, self.hyper, predicted, frames)
            }
            None => HyperTask::new(self.hyper_criticality, self.hyper),
        }
        .expect("valid hyper task");
        MixedTrustTask::new(
            self.name,
            self.period,
            self.deadline.unwrap_or(self.period),
            self.priority,
            guest,
            hyper,
        )
        .expect("valid mixed-trust task")
    }
}

/// `(name, period, deadline, guest, hyper)` tuples to a task set with
/// deadline-monotonic priorities.
pub fn task_set(tasks: &[(&str, Time, Time, Time, Time)]) -> TaskSet {
    let mut set = TaskSet::new();
    for &(name, period, deadline, guest, hyper) in tasks {
        set.push(
            TaskBuilder::new(name, period)
                .deadline(deadline)
                .guest(guest)
                .hyper(hyper)
                .build(),
        );
    }
    set.assign_deadline_monotonic_priorities();
    set
}

/// Builder for a [`ModalSystem`] made of mixed-trust graphs.
pub struct ModalSystemBuilder {
    system: ModalSystem,
    graphs: BTreeMap<String, (GraphId, MixedTrustNodes)>,
}

impl ModalSystemBuilder {
    pub fn new() -> Self {
        Self {
            system: ModalSystem::new(),
            graphs: BTreeMap::new(),
        }
    }

    /// Add a graph holding one guest/hyper pair named after the graph.
    pub fn task(mut self, name: &str, period: Time, deadline: Time, guest: Time, hyper: Time) -> Self {
        let graph = self.system.add_graph(name);
        let nodes = self
            .system
            .add_mixed_trust_task(graph, name, period, deadline, guest, hyper)
            .expect("valid mixed-trust graph");
        self.graphs.insert(name.to_string(), (graph, nodes));
        self
    }

    pub fn graph(&self, name: &str) -> GraphId {
        self.graphs[name].0
    }

    pub fn nodes(&self, name: &str) -> MixedTrustNodes {
        self.graphs[name].1
    }

    /// Add a mode over the named graphs.
    pub fn mode(mut self, name: &str, graphs: &[&str]) -> (Self, ModeId) {
        let ids: Vec<GraphId> = graphs.iter().map(|g| self.graph(g)).collect();
        let mode = self.system.add_mode(name, &ids).expect("valid mode");
        (self, mode)
    }

    pub fn system_mut(&mut self) -> &mut ModalSystem {
        &mut self.system
    }

    pub fn build(self) -> ModalSystem {
        self.system
    }
}

impl Default for ModalSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `(name, period, deadline, guest, hyper)` tuples to a modal system with a
/// single mode holding one graph per task.
pub fn single_mode_system(tasks: &[(&str, Time, Time, Time, Time)]) -> (ModalSystem, ModeId) {
    let mut builder = ModalSystemBuilder::new();
    for &(name, period, deadline, guest, hyper) in tasks {
        builder = builder.task(name, period, deadline, guest, hyper);
    }
    let names: Vec<&str> = tasks.iter().map(|t| t.0).collect();
    let (builder, mode) = builder.mode("single", &names);
    (builder.build(), mode)
}

/// Builder for workload files, mirroring the TOML sections.
pub struct WorkloadBuilder {
    raw: RawWorkloadFile,
}

impl WorkloadBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawWorkloadFile::default(),
        }
    }

    pub fn analysis(mut self, kind: AnalysisKind) -> Self {
        self.raw.analysis = AnalysisSection { kind };
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.raw.task.insert(name.to_string(), task);
        self
    }

    /// `[graph.<name>.task]` shorthand.
    pub fn with_graph_task(mut self, name: &str, period: Time, deadline: Time, guest: Time, hyper: Time) -> Self {
        let graph = GraphConfig {
            task: Some(GraphTaskConfig {
                period,
                deadline: Some(deadline),
                guest,
                hyper,
            }),
            ..GraphConfig::default()
        };
        self.raw.graph.insert(name.to_string(), graph);
        self
    }

    pub fn with_mode(mut self, name: &str, graphs: &[&str]) -> Self {
        let mode = ModeConfig {
            graphs: graphs.iter().map(|g| g.to_string()).collect(),
        };
        self.raw.mode.insert(name.to_string(), mode);
        self
    }

    pub fn raw(self) -> RawWorkloadFile {
        self.raw
    }

    pub fn build(self) -> WorkloadFile {
        WorkloadFile::try_from(self.raw).expect("Failed to build valid workload from builder")
    }
}

impl Default for WorkloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat `[task.<name>]` entry with a single guest level.
pub fn task_config(period: Time, guest: Time, hyper: Time) -> TaskConfig {
    TaskConfig {
        period,
        deadline: None,
        priority: None,
        guest: vec![guest],
        guest_criticality: 0,
        hyper,
        hyper_criticality: 0,
        predicted: None,
        frame_periods: None,
    }
}
