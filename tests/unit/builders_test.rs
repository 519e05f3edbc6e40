//! Tests for builder modules

use std::time::Duration;

use prometheus_task_scheduler::builders::{SchedulerBuilder, TaskSpec};
use prometheus_task_scheduler::config::{AdmissionMode, SchedulerConfig};
use prometheus_task_scheduler::core::{SchedulerError, TaskStatus};
use prometheus_task_scheduler::runtime::TokioSpawner;
use prometheus_task_scheduler::util::{Priority, TaskId};

#[test]
fn test_scheduler_builder_overrides() {
    let builder = SchedulerBuilder::new()
        .with_max_concurrency(3)
        .with_admission(AdmissionMode::Sequential)
        .with_poll_interval(Duration::from_millis(25))
        .with_default_timeout(Duration::from_secs(2));

    let config = builder.config();
    assert_eq!(config.max_concurrency, 3);
    assert_eq!(config.admission, AdmissionMode::Sequential);
    assert_eq!(config.poll_interval_ms, 25);
    assert_eq!(config.default_timeout_ms, Some(2000));
}

#[test]
fn test_scheduler_builder_with_config() {
    let config = SchedulerConfig {
        max_concurrency: 7,
        ..SchedulerConfig::default()
    };
    let scheduler = SchedulerBuilder::new()
        .with_config(config.clone())
        .build::<()>()
        .unwrap();
    assert_eq!(scheduler.config(), &config);
    assert_eq!(scheduler.task_count(), 0);
}

#[test]
fn test_scheduler_builder_rejects_invalid_config() {
    let result = SchedulerBuilder::new().with_max_concurrency(0).build::<()>();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_task_spec_defaults() {
    let spec = TaskSpec::<u8>::new(|| async { anyhow::Ok(1_u8) });
    assert_eq!(spec.priority(), Priority::default());
    assert!(spec.dependencies().is_empty());
    assert_eq!(spec.timeout(), None);
}

#[test]
fn test_task_spec_chaining() {
    let spec = TaskSpec::<u8>::new(|| async { anyhow::Ok(1_u8) })
        .with_priority(4)
        .after(TaskId::from_seq(1))
        .with_dependencies([TaskId::from_seq(2), TaskId::from_seq(3)])
        .with_timeout(Duration::from_millis(40));

    assert_eq!(spec.priority().value(), 4);
    assert_eq!(
        spec.dependencies(),
        &[TaskId::from_seq(1), TaskId::from_seq(2), TaskId::from_seq(3)]
    );
    assert_eq!(spec.timeout(), Some(Duration::from_millis(40)));
}

#[tokio::test]
async fn test_builder_with_bound_spawner_runs_tasks() {
    let scheduler = SchedulerBuilder::new()
        .with_spawner(TokioSpawner::new(tokio::runtime::Handle::current()))
        .with_max_concurrency(2)
        .build::<u8>()
        .unwrap();

    let first = scheduler
        .submit(TaskSpec::new(|| async { anyhow::Ok(1_u8) }))
        .unwrap();
    let second = scheduler
        .submit(TaskSpec::new(|| async { anyhow::Ok(2_u8) }).after(first))
        .unwrap();

    scheduler.execute_tasks().await.unwrap();
    assert_eq!(scheduler.get_status()[&second], TaskStatus::Completed);
    assert_eq!(scheduler.take_result(second), Some(2));
}
