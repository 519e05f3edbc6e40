//! Tests for utility functions

use prometheus_task_scheduler::core::SchedulerError;
use prometheus_task_scheduler::util::{init_tracing_with, now_ms, Priority, TaskId};

#[test]
fn test_task_id_display_and_parse() {
    let id = TaskId::from_seq(12);
    assert_eq!(id.to_string(), "task12");
    assert_eq!("task12".parse::<TaskId>().unwrap(), id);
    assert_eq!(id.seq(), 12);
}

#[test]
fn test_task_id_rejects_malformed() {
    for raw in ["task", "task0", "job3", "task-1", "3"] {
        assert!(
            matches!(raw.parse::<TaskId>(), Err(SchedulerError::InvalidTaskId(_))),
            "{raw} should not parse"
        );
    }
}

#[test]
fn test_task_id_orders_numerically() {
    let mut ids: Vec<TaskId> = ["task10", "task9", "task2"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    ids.sort();
    let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["task2", "task9", "task10"]);
}

#[test]
fn test_task_id_serde_uses_string_form() {
    let json = serde_json::to_string(&TaskId::from_seq(5)).unwrap();
    assert_eq!(json, "\"task5\"");
    let back: TaskId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, TaskId::from_seq(5));
    assert!(serde_json::from_str::<TaskId>("\"five\"").is_err());
}

#[test]
fn test_priority_ordering() {
    assert!(Priority::from(3) > Priority::from(1));
    assert!(Priority::from(0) > Priority::from(-5));
    assert_eq!(Priority::default().value(), 0);
    assert_eq!(serde_json::to_string(&Priority(7)).unwrap(), "7");
}

#[test]
fn test_now_ms_is_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(b >= a);
    assert!(a > 0);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing_with("debug");
    init_tracing_with("info");
    tracing::info!("tracing initialised twice without panicking");
}
