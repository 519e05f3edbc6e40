//! Task records, their lifecycle, and dependency-gated eligibility.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{SchedulerError, TaskError, TaskOperation};
use crate::util::clock::now_ms;
use crate::util::serde::{Priority, TaskId};

/// Status of a task in the scheduler lifecycle.
///
/// Transitions are monotonic: `Pending -> Running -> {Completed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Registered, waiting for dependencies or capacity.
    Pending,
    /// Admitted and executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error, a timeout or a panic.
    Failed,
}

impl TaskStatus {
    /// `Completed` and `Failed` are terminal; nothing leaves them.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Lowercase label used in snapshots and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running) | (Self::Running, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered task and everything known about its progress.
pub struct TaskRecord<T> {
    id: TaskId,
    operation: Arc<dyn TaskOperation<T>>,
    priority: Priority,
    dependencies: BTreeSet<TaskId>,
    timeout: Option<Duration>,
    status: TaskStatus,
    failure: Option<TaskError>,
    result: Option<T>,
    submitted_at_ms: u128,
    started_at_ms: Option<u128>,
    finished_at_ms: Option<u128>,
}

impl<T> TaskRecord<T> {
    /// Task identifier.
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Scheduling priority.
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Tasks that must be terminal before this one may run.
    pub const fn dependencies(&self) -> &BTreeSet<TaskId> {
        &self.dependencies
    }

    /// Deadline applied when the task runs, if any.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Current status.
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Failure reason once the task has failed.
    pub const fn failure(&self) -> Option<&TaskError> {
        self.failure.as_ref()
    }

    /// Result of a completed task, unless already taken.
    pub const fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Registration time in milliseconds since epoch.
    pub const fn submitted_at_ms(&self) -> u128 {
        self.submitted_at_ms
    }

    /// Admission time, once running.
    pub const fn started_at_ms(&self) -> Option<u128> {
        self.started_at_ms
    }

    /// Time the task reached a terminal status.
    pub const fn finished_at_ms(&self) -> Option<u128> {
        self.finished_at_ms
    }

    pub(crate) fn operation(&self) -> Arc<dyn TaskOperation<T>> {
        Arc::clone(&self.operation)
    }
}

impl<T> fmt::Debug for TaskRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("dependencies", &self.dependencies)
            .field("timeout", &self.timeout)
            .field("status", &self.status)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

/// Owned, indexed store of task records.
///
/// The registry is the single owner of id assignment, so ids are handed out
/// strictly in submission order and never reused.
pub struct TaskRegistry<T> {
    records: BTreeMap<TaskId, TaskRecord<T>>,
    next_seq: u64,
    running: usize,
}

impl<T> Default for TaskRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskRegistry<T> {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_seq: 0,
            running: 0,
        }
    }

    /// Register a task with status `pending` and return its new id.
    ///
    /// Every dependency must already be registered; this also rules out
    /// dependency cycles. A rejected registration consumes no id.
    pub fn register<I>(
        &mut self,
        operation: Arc<dyn TaskOperation<T>>,
        priority: Priority,
        dependencies: I,
        timeout: Option<Duration>,
    ) -> Result<TaskId, SchedulerError>
    where
        I: IntoIterator<Item = TaskId>,
    {
        let dependencies: BTreeSet<TaskId> = dependencies.into_iter().collect();
        if let Some(missing) = dependencies
            .iter()
            .find(|dep| !self.records.contains_key(dep))
        {
            return Err(SchedulerError::UnknownDependency(*missing));
        }

        self.next_seq += 1;
        let id = TaskId::from_seq(self.next_seq);
        debug!(task = %id, %priority, deps = dependencies.len(), "task registered");

        self.records.insert(
            id,
            TaskRecord {
                id,
                operation,
                priority,
                dependencies,
                timeout: timeout.filter(|d| !d.is_zero()),
                status: TaskStatus::Pending,
                failure: None,
                result: None,
                submitted_at_ms: now_ms(),
                started_at_ms: None,
                finished_at_ms: None,
            },
        );
        Ok(id)
    }

    /// Look up a record.
    pub fn get(&self, id: TaskId) -> Result<&TaskRecord<T>, SchedulerError> {
        self.records.get(&id).ok_or(SchedulerError::UnknownTask(id))
    }

    /// Move a task to `status`, rejecting non-monotonic transitions.
    pub fn set_status(&mut self, id: TaskId, status: TaskStatus) -> Result<(), SchedulerError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(SchedulerError::UnknownTask(id))?;

        if !record.status.can_transition_to(status) {
            return Err(SchedulerError::InvalidTransition {
                task: id,
                from: record.status,
                to: status,
            });
        }

        match status {
            TaskStatus::Running => {
                record.started_at_ms = Some(now_ms());
                self.running += 1;
            }
            TaskStatus::Completed | TaskStatus::Failed => {
                record.finished_at_ms = Some(now_ms());
                self.running = self.running.saturating_sub(1);
            }
            TaskStatus::Pending => {}
        }
        record.status = status;
        Ok(())
    }

    /// Record the outcome of a running task and return its terminal status.
    pub fn finish(
        &mut self,
        id: TaskId,
        outcome: Result<T, TaskError>,
    ) -> Result<TaskStatus, SchedulerError> {
        let status = if outcome.is_ok() {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        self.set_status(id, status)?;

        let record = self
            .records
            .get_mut(&id)
            .ok_or(SchedulerError::UnknownTask(id))?;
        match outcome {
            Ok(value) => record.result = Some(value),
            Err(err) => record.failure = Some(err),
        }
        Ok(status)
    }

    /// Point-in-time copy of every task's status.
    pub fn snapshot(&self) -> BTreeMap<TaskId, TaskStatus> {
        self.records
            .iter()
            .map(|(id, record)| (*id, record.status))
            .collect()
    }

    /// Whether `id` is pending with every dependency terminal.
    ///
    /// A failed dependency unblocks its dependents just like a completed one.
    pub fn is_eligible(&self, id: TaskId) -> bool {
        self.records
            .get(&id)
            .is_some_and(|record| self.is_eligible_record(record))
    }

    fn is_eligible_record(&self, record: &TaskRecord<T>) -> bool {
        record.status == TaskStatus::Pending
            && record.dependencies.iter().all(|dep| {
                self.records
                    .get(dep)
                    .is_some_and(|d| d.status.is_terminal())
            })
    }

    /// Eligible tasks in admission order: descending priority, then
    /// submission order.
    pub fn eligible(&self) -> Vec<TaskId> {
        let mut ready: Vec<(Priority, TaskId)> = self
            .records
            .values()
            .filter(|record| self.is_eligible_record(record))
            .map(|record| (record.priority, record.id))
            .collect();
        ready.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        ready.into_iter().map(|(_, id)| id).collect()
    }

    /// Ids still waiting to run, in submission order.
    pub fn pending_ids(&self) -> Vec<TaskId> {
        self.records
            .values()
            .filter(|record| record.status == TaskStatus::Pending)
            .map(|record| record.id)
            .collect()
    }

    /// Number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.records
            .values()
            .filter(|record| record.status == TaskStatus::Pending)
            .count()
    }

    /// Number of tasks currently running.
    pub const fn running_count(&self) -> usize {
        self.running
    }

    /// Take the result of a completed task, leaving `None` behind.
    pub fn take_result(&mut self, id: TaskId) -> Option<T> {
        self.records.get_mut(&id).and_then(|r| r.result.take())
    }

    /// Iterate over records in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord<T>> {
        self.records.values()
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no task has been registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
