//! Core identifiers for the task graph.
//!
//! [`NodeKind`] names the nodes of a graph, with `Start` and `End` as virtual
//! structural endpoints that are never executed. [`Task`] pairs a node with
//! its per-superstep input and is the unit of work carried by a [`Frontier`].
//!
//! # Examples
//!
//! ```rust
//! use superstep::types::NodeKind;
//!
//! let writer = NodeKind::Custom("writer".to_string());
//! assert_eq!(writer.encode(), "Custom:writer");
//! assert_eq!(NodeKind::decode("Custom:writer"), writer);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifies a node within a task graph.
///
/// `Start` and `End` are virtual: they carry topology (entry edges, terminal
/// edges) but have no step function and are skipped by the scheduler. Every
/// executable node is a `Custom` with a user-chosen, graph-unique name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Virtual entry point; the initial frontier is its static successors.
    Start,
    /// Virtual terminal; a frontier containing only `End` completes the run.
    End,
    /// Executable node identified by a user-defined name.
    Custom(String),
}

impl NodeKind {
    /// Encode into the persisted string form.
    ///
    /// - `Start` → `"Start"`
    /// - `End` → `"End"`
    /// - `Custom("x")` → `"Custom:x"`
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NodeKind::Start => "Start".to_string(),
            NodeKind::End => "End".to_string(),
            NodeKind::Custom(name) => format!("Custom:{name}"),
        }
    }

    /// Decode the persisted string form, falling back to `Custom` for any
    /// unrecognized input so old checkpoints keep loading.
    pub fn decode(s: &str) -> Self {
        if s == "Start" {
            NodeKind::Start
        } else if s == "End" {
            NodeKind::End
        } else if let Some(rest) = s.strip_prefix("Custom:") {
            NodeKind::Custom(rest.to_string())
        } else {
            NodeKind::Custom(s.to_string())
        }
    }

    /// Returns `true` for the virtual `Start` endpoint.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Returns `true` for the virtual `End` endpoint.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeKind::Start,
            "End" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}

/// One schedulable unit of work: a node plus its input for this superstep.
///
/// `input: None` means the task was scheduled through a static edge and works
/// from the shared state snapshot alone. `input: Some(v)` is an isolated
/// per-child payload from a spawn request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub node: NodeKind,
    pub input: Option<Value>,
}

impl Task {
    /// A task scheduled by a static edge, reading the shared snapshot.
    #[must_use]
    pub fn shared(node: NodeKind) -> Self {
        Self { node, input: None }
    }

    /// A dynamically spawned task carrying its own isolated input.
    #[must_use]
    pub fn spawned(node: NodeKind, input: Value) -> Self {
        Self {
            node,
            input: Some(input),
        }
    }
}

/// The set of tasks scheduled for the next superstep.
pub type Frontier = Vec<Task>;

/// Lifecycle of a run as tracked by the runner.
///
/// Exactly one scheduler loop may be active per run id; a cancelled run drops
/// back to `Created` since its last checkpoint remains valid and resumable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Created,
    Running,
    Completed,
    Failed,
}
