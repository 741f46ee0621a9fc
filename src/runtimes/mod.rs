//! Runtime layer: configuration, checkpoint persistence, and the run driver.

mod checkpoint;
mod persistence;
mod runner;
mod runtime_config;

pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore, InMemoryStore};
pub use persistence::{PersistedCheckpoint, PersistedState, PersistedTask, PersistenceError};
pub use runner::{RunError, RunHandle, Runner};
pub use runtime_config::RuntimeConfig;
