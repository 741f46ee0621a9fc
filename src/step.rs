//! Step contract: the user-implemented unit of work.
//!
//! A step receives an immutable [`StateSnapshot`] plus a [`StepContext`] and
//! returns exactly one of two things: a set of field writes to merge at the
//! barrier, or a list of [`SpawnRequest`]s that override its static outgoing
//! edges for the next superstep. It never mutates shared state directly.
//!
//! ```rust
//! use async_trait::async_trait;
//! use rustc_hash::FxHashMap;
//! use superstep::state::StateSnapshot;
//! use superstep::step::{Step, StepContext, StepError, StepOutput};
//!
//! struct SetTopic;
//!
//! #[async_trait]
//! impl Step for SetTopic {
//!     async fn run(
//!         &self,
//!         _snapshot: StateSnapshot,
//!         _ctx: StepContext,
//!     ) -> Result<StepOutput, StepError> {
//!         let mut fields = FxHashMap::default();
//!         fields.insert("topic".to_string(), serde_json::json!("rust"));
//!         Ok(StepOutput::Update(fields))
//!     }
//! }
//! ```

use crate::state::StateSnapshot;
use crate::types::NodeKind;
use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

/// Per-invocation context handed to a step alongside the snapshot.
#[derive(Clone, Debug)]
pub struct StepContext {
    /// The node this invocation belongs to.
    pub node: NodeKind,
    /// The 1-based superstep being executed.
    pub step: u64,
    /// Isolated payload when this task was spawned; `None` for tasks
    /// scheduled through static edges.
    pub input: Option<Value>,
}

impl StepContext {
    /// The spawn payload, or a `MissingInput` error for statically scheduled
    /// tasks. Worker-style steps that only make sense when fanned out call
    /// this first.
    pub fn require_input(&self) -> Result<&Value, StepError> {
        self.input.as_ref().ok_or_else(|| StepError::MissingInput {
            what: format!("spawn input for node {}", self.node),
        })
    }
}

/// A request to run `target` next superstep with an isolated `input`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    pub target: NodeKind,
    pub input: Value,
}

impl SpawnRequest {
    #[must_use]
    pub fn new(target: impl Into<String>, input: Value) -> Self {
        Self {
            target: NodeKind::Custom(target.into()),
            input,
        }
    }
}

/// What a step produced: state writes or a dynamic fan-out.
///
/// The two are mutually exclusive by construction; a step that wants both
/// writes state in one superstep and spawns from a successor in the next.
#[derive(Clone, Debug)]
pub enum StepOutput {
    /// Field writes to merge at the barrier. May be empty.
    Update(FxHashMap<String, Value>),
    /// Replace this node's static successors with these spawned tasks.
    /// An empty list schedules nothing from this node.
    Spawn(Vec<SpawnRequest>),
}

impl StepOutput {
    /// An update that writes nothing.
    #[must_use]
    pub fn empty() -> Self {
        StepOutput::Update(crate::utils::new_field_map())
    }

    /// Convenience for building an update from pairs.
    #[must_use]
    pub fn update<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        StepOutput::Update(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }
}

/// Failure raised by a step's own logic.
#[derive(Debug, Error, Diagnostic)]
pub enum StepError {
    #[error("missing input: {what}")]
    #[diagnostic(
        code(superstep::step::missing_input),
        help("this step expects to be spawned with a payload")
    )]
    MissingInput { what: String },

    #[error("provider `{provider}` failed: {message}")]
    #[diagnostic(code(superstep::step::provider))]
    Provider { provider: String, message: String },

    #[error("serialization error")]
    #[diagnostic(code(superstep::step::serde))]
    Serde(#[from] serde_json::Error),

    #[error("validation failed: {0}")]
    #[diagnostic(code(superstep::step::validation))]
    ValidationFailed(String),
}

/// A unit of work bound to a graph node.
///
/// Implementations must be `Send + Sync`; the scheduler runs many of them
/// concurrently against clones of the same snapshot.
#[async_trait]
pub trait Step: Send + Sync {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: StepContext,
    ) -> Result<StepOutput, StepError>;
}
