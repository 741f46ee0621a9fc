//! Field reducers: the merge strategies behind each [`MergePolicy`].
//!
//! A reducer combines the writes that landed on one field during a single
//! superstep with the field's current value. Reducers are pure and
//! deterministic given the write order; the scheduler fixes that order
//! (completion order) before the barrier merge runs.

mod extend;
mod last_write;

pub use extend::ExtendReducer;
pub use last_write::LastWriteReducer;

use crate::schema::MergePolicy;
use crate::types::NodeKind;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

/// One node's write to one field within a superstep.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldWrite {
    pub node: NodeKind,
    pub value: Value,
}

/// A barrier-merge failure. Any variant fails the whole superstep; no partial
/// state is committed.
#[derive(Debug, Error, Diagnostic)]
pub enum MergeError {
    #[error("conflicting writes to replace-field `{field}`: {first} wrote {first_value}, {second} wrote {second_value}")]
    #[diagnostic(
        code(superstep::merge::conflict),
        help("route the writers into different supersteps, or declare the field as accumulate")
    )]
    Conflict {
        field: String,
        first: NodeKind,
        first_value: Value,
        second: NodeKind,
        second_value: Value,
    },

    #[error("node {node} wrote undeclared field `{field}`")]
    #[diagnostic(
        code(superstep::merge::unknown_field),
        help("declare the field on the state schema before building the graph")
    )]
    UnknownField { field: String, node: NodeKind },

    #[error("node {node} wrote non-array value to accumulate-field `{field}`")]
    #[diagnostic(
        code(superstep::merge::not_a_list),
        help("accumulate fields take JSON arrays; wrap single items as [item]")
    )]
    NotAList { field: String, node: NodeKind },
}

/// Combines the writes to one field with its current value.
pub trait Reducer: Send + Sync {
    /// `writes` is non-empty and ordered by task completion within the
    /// superstep. `current` is the committed value from the previous step.
    fn combine(
        &self,
        field: &str,
        current: &Value,
        writes: &[FieldWrite],
    ) -> Result<Value, MergeError>;
}

/// The reducer implementing a given merge policy.
#[must_use]
pub fn reducer_for(policy: MergePolicy) -> &'static dyn Reducer {
    match policy {
        MergePolicy::Replace => &LastWriteReducer,
        MergePolicy::Accumulate => &ExtendReducer,
    }
}
