// tests/config_loading.rs

mod common;

use std::io::Write;

use common::{WorkloadBuilder, init_tracing, task_config, workload_path};
use mtsched::cli::CliArgs;
use mtsched::config::{IMPLICIT_MODE, load_and_validate, load_from_path};
use mtsched::errors::SchedError;
use mtsched::types::AnalysisKind;
use mtsched::{analyse_flat, analyse_modal, run};
use tempfile::NamedTempFile;

#[test]
fn exact_workload_file_is_schedulable() {
    init_tracing();
    let workload = load_and_validate(workload_path("exact.toml")).unwrap();
    assert_eq!(workload.analysis.kind, AnalysisKind::Exact);

    let report = analyse_flat(&workload, workload.analysis.kind).unwrap();
    assert!(report.schedulable);

    let names: Vec<&str> = report.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let c = report.task("c").unwrap();
    assert_eq!(c.priority, 0);
    assert_eq!(c.hyper_response_time, 3);
    assert_eq!(c.enforcement_timeout, 17);
    assert_eq!(c.guest_response_time, 12);
}

#[test]
fn predictive_workload_file_uses_the_prediction() {
    init_tracing();
    let workload = load_and_validate(workload_path("predictive.toml")).unwrap();

    let report = analyse_flat(&workload, AnalysisKind::Predictive).unwrap();
    assert!(report.schedulable);
    assert_eq!(report.task("b").unwrap().hyper_response_time, 2);

    // Same file under the nominal test.
    let nominal = analyse_flat(&workload, AnalysisKind::Exact).unwrap();
    assert_eq!(nominal.task("b").unwrap().hyper_response_time, 3);
}

#[test]
fn zsrm_workload_file_reports_zero_slack_instants() {
    init_tracing();
    let workload = load_and_validate(workload_path("zsrm.toml")).unwrap();

    let report = analyse_flat(&workload, workload.analysis.kind).unwrap();
    assert!(report.schedulable);
    assert_eq!(report.task("a").unwrap().zero_slack_instant, 9);
    assert_eq!(report.task("b").unwrap().zero_slack_instant, 12);
    assert_eq!(report.task("b").unwrap().guest_response_time, 13);
}

#[test]
fn two_mode_workload_file_is_schedulable() {
    init_tracing();
    let workload = load_and_validate(workload_path("two_modes.toml")).unwrap();
    assert_eq!(workload.analysis.kind, AnalysisKind::Modal);

    let report = analyse_modal(&workload).unwrap();
    assert!(report.schedulable);
    assert_eq!(report.nodes.len(), 7);

    assert_eq!(report.node("y.hyper").unwrap().response_time, 4);
    assert_eq!(report.node("y->z").unwrap().response_time, 4);
    assert_eq!(report.node("z.guest").unwrap().response_time, 8);
    assert_eq!(report.node("x.guest").unwrap().deadline, 7);
    assert_eq!(report.node("y.guest").unwrap().deadline, 16);
}

#[test]
fn explicit_nodes_analyse_like_the_shorthand() {
    init_tracing();
    let explicit = load_and_validate(workload_path("explicit_graph.toml")).unwrap();
    let shorthand = WorkloadBuilder::new()
        .analysis(AnalysisKind::Modal)
        .with_graph_task("a", 8, 8, 4, 0)
        .with_graph_task("b", 14, 14, 3, 2)
        .build();

    let explicit = analyse_modal(&explicit).unwrap();
    let shorthand = analyse_modal(&shorthand).unwrap();
    assert!(explicit.schedulable);
    assert_eq!(explicit, shorthand);

    let b = explicit.node("b.guest").unwrap();
    assert_eq!((b.response_time, b.deadline), (11, 12));
}

#[test]
fn graphs_without_modes_share_an_implicit_mode() {
    let workload = WorkloadBuilder::new()
        .with_graph_task("x", 10, 10, 2, 1)
        .with_graph_task("y", 20, 20, 3, 2)
        .build();

    let system = workload.to_modal_system().unwrap();
    let mode = system.find_mode(IMPLICIT_MODE).unwrap();
    assert_eq!(system.mode(mode).graphs().len(), 2);
    assert_eq!(system.mode_ids().count(), 1);
}

#[test]
fn explicit_priorities_are_kept() {
    let mut low = task_config(10, 2, 0);
    low.priority = Some(0);
    let mut high = task_config(20, 3, 0);
    high.priority = Some(1);

    let set = WorkloadBuilder::new()
        .with_task("short", low)
        .with_task("long", high)
        .build()
        .to_task_set()
        .unwrap();

    assert_eq!(set.find("short").unwrap().priority, 0);
    assert_eq!(set.find("long").unwrap().priority, 1);
}

#[test]
fn missing_priorities_are_assigned_deadline_monotonically() {
    let set = WorkloadBuilder::new()
        .with_task("short", task_config(10, 2, 0))
        .with_task("long", task_config(20, 3, 0))
        .build()
        .to_task_set()
        .unwrap();

    assert_eq!(set.find("short").unwrap().priority, 1);
    assert_eq!(set.find("long").unwrap().priority, 0);
}

#[test]
fn modal_kind_is_rejected_by_the_flat_entry_point() {
    let workload = WorkloadBuilder::new()
        .with_task("a", task_config(10, 2, 0))
        .build();

    assert!(matches!(
        analyse_flat(&workload, AnalysisKind::Modal),
        Err(SchedError::ConfigError(_))
    ));
    assert!(matches!(
        analyse_modal(&workload),
        Err(SchedError::ConfigError(_))
    ));
}

#[test]
fn graph_only_workload_has_no_flat_task_set() {
    let workload = WorkloadBuilder::new()
        .with_graph_task("x", 10, 10, 2, 1)
        .build();
    assert!(matches!(
        workload.to_task_set(),
        Err(SchedError::ConfigError(_))
    ));
}

#[test]
fn raw_loading_skips_validation() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.a]
period = -5
guest = [1]
"#
    )
    .unwrap();

    let raw = load_from_path(file.path()).unwrap();
    assert_eq!(raw.task["a"].period, -5);
    assert!(load_and_validate(file.path()).is_err());
}

#[test]
fn defaults_are_filled_in() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.a]
period = 10
guest = [2]
"#
    )
    .unwrap();

    let workload = load_and_validate(file.path()).unwrap();
    assert_eq!(workload.analysis.kind, AnalysisKind::Exact);

    let a = &workload.task["a"];
    assert_eq!(a.effective_deadline(), 10);
    assert_eq!(a.hyper, 0);
    assert_eq!(a.priority, None);
}

#[test]
fn run_reports_the_verdict() {
    init_tracing();
    let args = |file: &str, dry_run: bool| CliArgs {
        workload: workload_path(file).display().to_string(),
        analysis: None,
        log_level: None,
        dry_run,
    };

    assert!(run(args("exact.toml", false)).unwrap());
    assert!(run(args("two_modes.toml", false)).unwrap());
    assert!(run(args("two_modes.toml", true)).unwrap());
}

#[test]
fn run_propagates_load_errors() {
    let args = CliArgs {
        workload: "does/not/exist.toml".to_string(),
        analysis: Some(AnalysisKind::Base),
        log_level: None,
        dry_run: false,
    };
    assert!(run(args).is_err());
}
