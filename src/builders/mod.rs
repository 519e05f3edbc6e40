//! Builders for schedulers and task descriptions.

pub mod scheduler_builder;
pub mod task_builder;

pub use scheduler_builder::SchedulerBuilder;
pub use task_builder::TaskSpec;
