//! Tests for audit sink

use prometheus_task_scheduler::core::{
    build_audit_event, AuditAction, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
use prometheus_task_scheduler::util::TaskId;

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        TaskId::from_seq(1),
        AuditAction::Fail,
        2,
        Some("failed: boom".to_string()),
    );

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0], event);
    assert_eq!(events[0].task_id.to_string(), "task1");
    assert_eq!(events[0].action, AuditAction::Fail);
    assert_eq!(events[0].detail.as_deref(), Some("failed: boom"));
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    for seq in 1..=3 {
        sink.record(build_audit_event(
            TaskId::from_seq(seq),
            AuditAction::Register,
            0,
            None,
        ));
    }

    let ids: Vec<String> = sink.events().iter().map(|e| e.task_id.to_string()).collect();
    assert_eq!(ids, vec!["task2", "task3"]);
}

#[test]
fn test_zero_capacity_sink_records_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event(TaskId::from_seq(1), AuditAction::Admit, 1, None));
    assert!(sink.events().is_empty());
    assert_eq!(sink.max_running(), 0);
}

#[test]
fn test_clones_share_buffer() {
    let reader = InMemoryAuditSink::new(8);
    let mut writer = reader.clone();

    writer.record(build_audit_event(TaskId::from_seq(1), AuditAction::Admit, 1, None));
    writer.record(build_audit_event(TaskId::from_seq(2), AuditAction::Admit, 2, None));
    writer.record(build_audit_event(TaskId::from_seq(1), AuditAction::Complete, 1, None));

    assert_eq!(
        reader.tasks_with_action(AuditAction::Admit),
        vec![TaskId::from_seq(1), TaskId::from_seq(2)]
    );
    assert_eq!(reader.max_running(), 2);
}

#[test]
fn test_event_ids_are_unique() {
    let a = build_audit_event(TaskId::from_seq(1), AuditAction::Register, 0, None);
    let b = build_audit_event(TaskId::from_seq(1), AuditAction::Register, 0, None);
    assert_ne!(a.event_id, b.event_id);
}

#[test]
fn test_audit_event_json_shape() {
    let event = build_audit_event(TaskId::from_seq(4), AuditAction::Timeout, 0, None);
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"task_id\":\"task4\""));
    assert!(json.contains("\"action\":\"timeout\""));
}

#[test]
fn test_tracing_sink_accepts_events() {
    let mut sink = TracingAuditSink;
    sink.record(build_audit_event(TaskId::from_seq(1), AuditAction::Complete, 0, None));
}
