//! Core scheduling abstractions: task registry, deadlines, admission and status.

pub mod audit;
pub mod error;
pub mod executor;
pub mod registry;
pub mod reporter;
pub mod scheduler;
pub mod timeout;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use error::{AppResult, SchedulerError, TaskError};
pub use executor::{Spawn, TaskOperation};
pub use registry::{TaskRecord, TaskRegistry, TaskStatus};
pub use reporter::{StatusCounts, StatusReport, StatusReporter, TaskStatusEntry};
pub use scheduler::{RunSummary, Scheduler};
pub use timeout::TimeoutGuard;
