//! Fluent description of a task before registration.

use std::sync::Arc;
use std::time::Duration;

use crate::core::TaskOperation;
use crate::util::serde::{Priority, TaskId};

/// A task ready to be submitted with [`Scheduler::submit`](crate::core::Scheduler::submit).
pub struct TaskSpec<T> {
    operation: Arc<dyn TaskOperation<T>>,
    priority: Priority,
    dependencies: Vec<TaskId>,
    timeout: Option<Duration>,
}

impl<T> TaskSpec<T> {
    /// Describe a task with default priority, no dependencies and no deadline.
    pub fn new<O>(operation: O) -> Self
    where
        O: TaskOperation<T>,
    {
        Self {
            operation: Arc::new(operation),
            priority: Priority::default(),
            dependencies: Vec::new(),
            timeout: None,
        }
    }

    /// Set the scheduling priority.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Run only after `dependency` is terminal.
    #[must_use]
    pub fn after(mut self, dependency: TaskId) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Add several dependencies at once.
    #[must_use]
    pub fn with_dependencies<I>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = TaskId>,
    {
        self.dependencies.extend(dependencies);
        self
    }

    /// Fail the task if it runs longer than `timeout`. Zero means unbounded.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Configured priority.
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Declared dependencies.
    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }

    /// Configured deadline.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Arc<dyn TaskOperation<T>>,
        Priority,
        Vec<TaskId>,
        Option<Duration>,
    ) {
        (self.operation, self.priority, self.dependencies, self.timeout)
    }
}
