//! Serde-facing shapes for checkpoints.
//!
//! Runtime types stay free of serialization concerns; these mirrors define
//! the stored layout and own the fallible conversion back into runtime
//! types. Node kinds are stored in their string encoding and timestamps as
//! RFC 3339 so the format stays inspectable.

use super::checkpoint::Checkpoint;
use crate::schema::StateSchema;
use crate::state::{FieldSlot, RunState};
use crate::types::{NodeKind, Task};
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("stored timestamp `{raw}` is not RFC 3339")]
    #[diagnostic(code(superstep::persistence::timestamp))]
    Timestamp { raw: String },

    #[error("stored state does not match the graph schema")]
    #[diagnostic(
        code(superstep::persistence::schema_mismatch),
        help("the checkpoint was written by a graph with a different state schema")
    )]
    SchemaMismatch {
        #[source]
        #[diagnostic_source]
        source: crate::reducers::MergeError,
    },

    #[error("checkpoint (de)serialization failed")]
    #[diagnostic(code(superstep::persistence::serde))]
    Serde(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersistedField {
    pub value: Value,
    pub version: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    pub fields: FxHashMap<String, PersistedField>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersistedTask {
    pub node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

/// The full stored form of a [`Checkpoint`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersistedCheckpoint {
    pub run_id: String,
    pub step: u64,
    pub state: PersistedState,
    pub frontier: Vec<PersistedTask>,
    pub created_at: String,
}

impl From<&RunState> for PersistedState {
    fn from(state: &RunState) -> Self {
        let fields = state
            .slots()
            .map(|(name, slot)| {
                (
                    name.to_string(),
                    PersistedField {
                        value: slot.value.clone(),
                        version: slot.version,
                    },
                )
            })
            .collect();
        Self { fields }
    }
}

impl From<&Task> for PersistedTask {
    fn from(task: &Task) -> Self {
        Self {
            node: task.node.encode(),
            input: task.input.clone(),
        }
    }
}

impl From<&PersistedTask> for Task {
    fn from(stored: &PersistedTask) -> Self {
        Self {
            node: NodeKind::decode(&stored.node),
            input: stored.input.clone(),
        }
    }
}

impl From<&Checkpoint> for PersistedCheckpoint {
    fn from(checkpoint: &Checkpoint) -> Self {
        Self {
            run_id: checkpoint.run_id.clone(),
            step: checkpoint.step,
            state: PersistedState::from(&checkpoint.state),
            frontier: checkpoint.frontier.iter().map(PersistedTask::from).collect(),
            created_at: checkpoint.created_at.to_rfc3339(),
        }
    }
}

impl PersistedCheckpoint {
    /// Rehydrate against the graph's schema.
    ///
    /// # Errors
    ///
    /// Fails when the stored timestamp is malformed or the stored fields do
    /// not fit the schema.
    pub fn into_checkpoint(
        self,
        schema: Arc<StateSchema>,
    ) -> Result<Checkpoint, PersistenceError> {
        let created_at: DateTime<Utc> = self
            .created_at
            .parse()
            .map_err(|_| PersistenceError::Timestamp {
                raw: self.created_at.clone(),
            })?;
        let fields = self
            .state
            .fields
            .into_iter()
            .map(|(name, field)| {
                (
                    name,
                    FieldSlot {
                        value: field.value,
                        version: field.version,
                    },
                )
            })
            .collect();
        let state = RunState::from_slots(schema, fields)
            .map_err(|source| PersistenceError::SchemaMismatch { source })?;
        Ok(Checkpoint {
            run_id: self.run_id,
            step: self.step,
            state,
            frontier: self.frontier.iter().map(Task::from).collect(),
            created_at,
        })
    }
}
