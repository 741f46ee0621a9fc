//! Checkpoint store: durable superstep boundaries.
//!
//! A checkpoint captures everything needed to resume a run: the committed
//! state, the frontier that has *not yet* executed, and the superstep
//! counter. One checkpoint is written after every committed superstep (and
//! one at step 0, before anything runs), so a crash at any point loses at
//! most the superstep in flight.

use super::persistence::{PersistedCheckpoint, PersistenceError};
use crate::schema::StateSchema;
use crate::state::RunState;
use crate::types::Task;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

/// A resumable point in a run. `frontier` is the next work to execute, not
/// the work that produced `state`.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    pub run_id: String,
    pub step: u64,
    pub state: RunState,
    pub frontier: Vec<Task>,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    #[must_use]
    pub fn new(run_id: impl Into<String>, step: u64, state: RunState, frontier: Vec<Task>) -> Self {
        Self {
            run_id: run_id.into(),
            step,
            state,
            frontier,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointError {
    #[error("checkpoint storage failed: {0}")]
    #[diagnostic(code(superstep::checkpoint::storage))]
    Storage(String),

    #[error("checkpoint codec failed")]
    #[diagnostic(code(superstep::checkpoint::codec))]
    Codec(
        #[from]
        #[diagnostic_source]
        PersistenceError,
    ),
}

/// Storage backend for checkpoints.
///
/// `save` must be atomic per call: a reader sees either the previous latest
/// checkpoint or the new one, never a torn write.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;

    /// The most recently saved checkpoint for `run_id`, if any.
    async fn load_latest(&self, run_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;

    async fn exists(&self, run_id: &str) -> Result<bool, CheckpointError>;

    /// Run ids with at least one checkpoint, unordered.
    async fn list_runs(&self) -> Result<Vec<String>, CheckpointError>;
}

/// In-memory store keeping full checkpoint history per run.
///
/// Checkpoints pass through their persisted form on the way in and out, so
/// this store exercises the same codec a durable backend would.
pub struct InMemoryStore {
    schema: Arc<StateSchema>,
    runs: RwLock<FxHashMap<String, Vec<PersistedCheckpoint>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new(schema: Arc<StateSchema>) -> Self {
        Self {
            schema,
            runs: RwLock::new(FxHashMap::default()),
        }
    }

    /// Number of checkpoints retained for `run_id`.
    #[must_use]
    pub fn history_len(&self, run_id: &str) -> usize {
        self.runs.read().get(run_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl CheckpointStore for InMemoryStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let stored = PersistedCheckpoint::from(checkpoint);
        self.runs
            .write()
            .entry(checkpoint.run_id.clone())
            .or_default()
            .push(stored);
        Ok(())
    }

    async fn load_latest(&self, run_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let stored = {
            let runs = self.runs.read();
            runs.get(run_id).and_then(|history| history.last()).cloned()
        };
        match stored {
            Some(checkpoint) => Ok(Some(
                checkpoint.into_checkpoint(Arc::clone(&self.schema))?,
            )),
            None => Ok(None),
        }
    }

    async fn exists(&self, run_id: &str) -> Result<bool, CheckpointError> {
        Ok(self.runs.read().contains_key(run_id))
    }

    async fn list_runs(&self) -> Result<Vec<String>, CheckpointError> {
        Ok(self.runs.read().keys().cloned().collect())
    }
}
