//! Read-only status snapshots for external monitors.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::{SchedulerError, TaskRegistry, TaskStatus};
use crate::util::clock::now_ms;
use crate::util::serde::{Priority, TaskId};

/// Status of one task inside a [`StatusReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusEntry {
    /// Task identifier.
    pub id: TaskId,
    /// Current status.
    pub status: TaskStatus,
    /// Scheduling priority.
    pub priority: Priority,
    /// Declared dependencies.
    pub dependencies: Vec<TaskId>,
    /// Failure reason for failed tasks.
    pub reason: Option<String>,
}

/// Number of tasks in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Pending tasks.
    pub pending: usize,
    /// Running tasks.
    pub running: usize,
    /// Completed tasks.
    pub completed: usize,
    /// Failed tasks.
    pub failed: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::Running => self.running += 1,
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Failed => self.failed += 1,
        }
    }

    /// Total number of tasks counted.
    pub const fn total(&self) -> usize {
        self.pending + self.running + self.completed + self.failed
    }
}

/// Point-in-time report over every registered task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// When the report was taken (ms since epoch).
    pub generated_at_ms: u128,
    /// Per-task entries in submission order.
    pub tasks: Vec<TaskStatusEntry>,
    /// Aggregate counts.
    pub counts: StatusCounts,
}

impl StatusReport {
    /// Whether every task has reached a terminal status.
    pub const fn all_terminal(&self) -> bool {
        self.counts.pending == 0 && self.counts.running == 0
    }

    /// Status of a single task, if it was registered.
    pub fn status_of(&self, id: TaskId) -> Option<TaskStatus> {
        self.tasks.iter().find(|e| e.id == id).map(|e| e.status)
    }

    /// Serialize the report as JSON.
    pub fn to_json(&self) -> Result<String, SchedulerError> {
        serde_json::to_string(self)
            .map_err(|e| SchedulerError::Internal(format!("status report encode: {e}")))
    }
}

/// Cloneable read-only handle over the task registry.
///
/// Safe to use from any task or thread while the scheduler is executing;
/// every call copies the data it returns under a short read lock.
pub struct StatusReporter<T> {
    registry: Arc<RwLock<TaskRegistry<T>>>,
}

impl<T> Clone for StatusReporter<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> StatusReporter<T> {
    pub(crate) const fn new(registry: Arc<RwLock<TaskRegistry<T>>>) -> Self {
        Self { registry }
    }

    /// Mapping from task id to status.
    pub fn snapshot(&self) -> BTreeMap<TaskId, TaskStatus> {
        self.registry.read().snapshot()
    }

    /// Status of one task.
    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.registry.read().get(id).ok().map(|r| r.status())
    }

    /// Whether every registered task is terminal.
    pub fn all_terminal(&self) -> bool {
        self.registry
            .read()
            .iter()
            .all(|record| record.status().is_terminal())
    }

    /// Detailed report including failure reasons and counts.
    pub fn report(&self) -> StatusReport {
        let registry = self.registry.read();
        let mut counts = StatusCounts::default();
        let tasks = registry
            .iter()
            .map(|record| {
                counts.bump(record.status());
                TaskStatusEntry {
                    id: record.id(),
                    status: record.status(),
                    priority: record.priority(),
                    dependencies: record.dependencies().iter().copied().collect(),
                    reason: record.failure().map(ToString::to_string),
                }
            })
            .collect();

        StatusReport {
            generated_at_ms: now_ms(),
            tasks,
            counts,
        }
    }
}
