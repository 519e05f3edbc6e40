//! # Prometheus Task Scheduler
//!
//! An async batch scheduler for units of work that carry priorities,
//! inter-task dependencies and per-task deadlines, running under a global
//! concurrency cap while exposing live status.
//!
//! ## Core Problem Solved
//!
//! Agent pipelines fan out into many small async jobs with ordering
//! constraints between them:
//!
//! - **Dependencies**: a job may only start once the jobs it depends on have
//!   finished, whether they succeeded or failed
//! - **Priorities**: when several jobs are ready, the most important goes first
//! - **Capacity**: downstream services only tolerate a bounded number of
//!   concurrent calls
//! - **Deadlines**: a hung job must not stall the whole batch
//!
//! ## Key Features
//!
//! - **Dependency Gating**: a task becomes eligible once every dependency is
//!   terminal; failures do not cascade
//! - **Priority Admission**: eligible tasks are admitted by descending
//!   priority, ties broken by submission order
//! - **Concurrency Cap**: never more than `max_concurrency` tasks running
//! - **Timeout Guard**: each task can race its own deadline
//! - **Live Status**: a cloneable [`StatusReporter`](core::StatusReporter)
//!   takes consistent snapshots while the batch runs
//! - **Audit Trail**: every lifecycle transition can be recorded
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use prometheus_task_scheduler::builders::SchedulerBuilder;
//! use prometheus_task_scheduler::core::TaskStatus;
//!
//! let scheduler = SchedulerBuilder::new()
//!     .with_max_concurrency(4)
//!     .build::<String>()?;
//!
//! let download = scheduler.add_task(
//!     || async { anyhow::Ok("weights".to_string()) },
//!     10,
//!     [],
//!     Some(Duration::from_secs(30)),
//! )?;
//! let warmup = scheduler.add_task(|| async { anyhow::Ok("warm".to_string()) }, 5, [download], None)?;
//!
//! scheduler.execute_tasks().await?;
//! assert_eq!(scheduler.get_status()[&warmup], TaskStatus::Completed);
//! ```
//!
//! For complete examples, see:
//! - `tests/end_to_end_test.rs` - the full dependency scenario
//! - `tests/scheduler_test.rs` - admission order and concurrency bounds

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: registry, timeout guard, scheduler, status.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Builders to construct schedulers and task descriptions.
pub mod builders;
/// Runtime adapters for spawning task execution.
pub mod runtime;
/// Shared utilities.
pub mod util;
