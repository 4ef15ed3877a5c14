// tests/priorities.rs

mod common;

use common::{TaskBuilder, task_set};
use mtsched::flat::{MixedTrustTask, TaskSet};

fn priorities(set: &TaskSet) -> Vec<i64> {
    set.tasks().iter().map(|t| t.priority).collect()
}

fn names<'a>(tasks: impl Iterator<Item = &'a MixedTrustTask>) -> Vec<String> {
    tasks.map(|t| t.name.clone()).collect()
}

#[test]
fn shortest_deadline_gets_the_largest_value() {
    let set = task_set(&[("slow", 20, 20, 1, 0), ("fast", 8, 8, 1, 0), ("mid", 14, 14, 1, 0)]);
    assert_eq!(priorities(&set), vec![0, 2, 1]);

    let order: Vec<&str> = set
        .decreasing_priority()
        .map(|i| set.get(i).name.as_str())
        .collect();
    assert_eq!(order, vec!["fast", "mid", "slow"]);

    let reverse: Vec<usize> = set.increasing_priority().collect();
    let mut forward: Vec<usize> = set.decreasing_priority().collect();
    forward.reverse();
    assert_eq!(reverse, forward);
}

#[test]
fn equal_deadlines_are_broken_by_insertion_order() {
    let set = task_set(&[("first", 10, 10, 1, 0), ("second", 10, 10, 1, 0)]);
    assert_eq!(priorities(&set), vec![1, 0]);
}

#[test]
fn reassignment_is_deterministic() {
    let mut set = task_set(&[
        ("a", 20, 15, 1, 1),
        ("b", 10, 15, 1, 1),
        ("c", 30, 5, 1, 1),
    ]);
    let first = priorities(&set);
    set.assign_deadline_monotonic_priorities();
    assert_eq!(priorities(&set), first);
    assert_eq!(first, vec![1, 0, 2]);
}

#[test]
fn filtered_views_follow_priority_and_criticality() {
    let mut set = TaskSet::new();
    set.push(TaskBuilder::new("hi", 10).priority(3).guest_criticality(0).build());
    set.push(TaskBuilder::new("crit", 20).priority(2).guest_criticality(2).build());
    set.push(TaskBuilder::new("lo", 30).priority(1).guest_criticality(1).build());
    set.push(TaskBuilder::new("lo_crit", 40).priority(0).guest_criticality(2).build());

    let lo = 2;
    assert_eq!(names(set.higher_priority(lo)), vec!["hi", "crit"]);
    assert_eq!(names(set.lower_priority(lo)), vec!["lo_crit"]);
    assert_eq!(names(set.others(lo)).len(), 3);
    assert_eq!(
        names(set.higher_priority_higher_criticality(lo)),
        vec!["crit"]
    );
    assert_eq!(
        names(set.lower_priority_higher_criticality(lo)),
        vec!["lo_crit"]
    );

    let by_crit: Vec<&str> = set
        .by_decreasing_criticality()
        .into_iter()
        .map(|i| set.get(i).name.as_str())
        .collect();
    assert_eq!(by_crit, vec!["crit", "lo_crit", "lo", "hi"]);
}
