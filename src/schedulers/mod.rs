//! Superstep scheduler.

mod scheduler;

pub use scheduler::{Scheduler, SchedulerError, SuperstepResult};
