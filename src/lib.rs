// src/lib.rs

pub mod cli;
pub mod config;
pub mod digraph;
pub mod errors;
pub mod flat;
pub mod logging;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::WorkloadFile;
use crate::digraph::ModalReport;
use crate::errors::config_error;
use crate::flat::{
    BaseScheduler, ExactScheduler, SchedulabilityReport, SchedulabilityTest, ZsrmScheduler,
};
use crate::types::AnalysisKind;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the workload, runs the selected analysis and prints
/// its report to stdout. Returns the verdict.
pub fn run(args: CliArgs) -> Result<bool> {
    let workload_path = PathBuf::from(&args.workload);
    let workload = load_and_validate(&workload_path)?;
    let kind = args.analysis.unwrap_or(workload.analysis.kind);

    if args.dry_run {
        print_dry_run(&workload, kind);
        return Ok(true);
    }

    info!(workload = %workload_path.display(), ?kind, "running analysis");

    let schedulable = match kind {
        AnalysisKind::Modal => {
            let report = analyse_modal(&workload)?;
            print!("{report}");
            report.schedulable
        }
        flat => {
            let report = analyse_flat(&workload, flat)?;
            print!("{report}");
            report.schedulable
        }
    };

    Ok(schedulable)
}

/// Run one of the flat analyses over the `[task.*]` part of a workload.
pub fn analyse_flat(
    workload: &WorkloadFile,
    kind: AnalysisKind,
) -> errors::Result<SchedulabilityReport> {
    let set = workload.to_task_set()?;
    match kind {
        AnalysisKind::Base => BaseScheduler::from_task_set(set).analyse(),
        AnalysisKind::Exact => ExactScheduler::from_task_set(set).analyse(),
        AnalysisKind::Predictive => {
            let mut scheduler = ExactScheduler::from_task_set(set);
            let schedulable = scheduler.is_predictive_schedulable()?;
            Ok(SchedulabilityReport::from_task_set(
                scheduler.tasks(),
                schedulable,
            ))
        }
        AnalysisKind::Zsrm => ZsrmScheduler::from_task_set(set).analyse(),
        AnalysisKind::Modal => Err(config_error(
            "the modal analysis runs on task graphs, not flat tasks",
        )),
    }
}

/// Run the digraph analysis over the `[graph.*]` part of a workload.
pub fn analyse_modal(workload: &WorkloadFile) -> errors::Result<ModalReport> {
    let mut system = workload.to_modal_system()?;
    digraph::assign_deadline_monotonic_priorities(&mut system)?;
    let schedulable = digraph::is_modal_system_schedulable(&mut system)?;
    Ok(ModalReport::from_system(&system, schedulable))
}

/// Simple dry-run output: print the parsed workload.
fn print_dry_run(workload: &WorkloadFile, kind: AnalysisKind) {
    println!("mtsched dry-run");
    println!("  analysis = {kind:?}");
    println!();

    if !workload.task.is_empty() {
        println!("tasks ({}):", workload.task.len());
        for (name, task) in workload.task.iter() {
            println!("  - {name}");
            println!(
                "      period: {}  deadline: {}",
                task.period,
                task.effective_deadline()
            );
            println!(
                "      guest: {:?} (criticality {})",
                task.guest, task.guest_criticality
            );
            println!(
                "      hyper: {} (criticality {})",
                task.hyper, task.hyper_criticality
            );
            if let (Some(p), Some(n)) = (task.predicted, task.frame_periods) {
                println!("      predicted: {p} every {n} periods");
            }
            if let Some(p) = task.priority {
                println!("      priority: {p}");
            }
        }
    }

    if !workload.graph.is_empty() {
        println!("graphs ({}):", workload.graph.len());
        for (name, graph) in workload.graph.iter() {
            println!("  - {name}: {:?}", graph.node_names(name));
        }
        for (name, mode) in workload.mode.iter() {
            println!("mode {name}: {:?}", mode.graphs);
        }
        for (name, transition) in workload.transition.iter() {
            println!(
                "transition {name}: {} -> {} ({} task transitions)",
                transition.from,
                transition.to,
                transition.task.len()
            );
        }
    }

    debug!("dry-run complete (no analysis)");
}
