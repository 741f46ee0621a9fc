//! State schema: the fixed set of named fields a run's state may hold, each
//! with a declared merge policy.
//!
//! The schema is declared once, before the graph is built, and validated at
//! every merge: writes to undeclared fields are rejected rather than silently
//! widening the state.
//!
//! ```rust
//! use superstep::schema::{MergePolicy, StateSchema};
//!
//! let schema = StateSchema::builder()
//!     .replace("topic")
//!     .accumulate("notes")
//!     .build();
//! assert_eq!(schema.policy("notes"), Some(MergePolicy::Accumulate));
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// How concurrent writes to a single field are combined at the barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Last-write-wins for a sole writer; concurrent *differing* writes are a
    /// conflict that fails the superstep.
    Replace,
    /// Each write must be a JSON array; contributions are concatenated onto
    /// the current value in completion order.
    Accumulate,
}

/// Declared fields and their merge policies.
///
/// Field iteration order is not specified; callers that need determinism
/// (e.g. persistence) sort by name themselves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSchema {
    fields: FxHashMap<String, MergePolicy>,
}

impl StateSchema {
    #[must_use]
    pub fn builder() -> StateSchemaBuilder {
        StateSchemaBuilder::default()
    }

    /// The merge policy for `field`, or `None` if the field is undeclared.
    #[must_use]
    pub fn policy(&self, field: &str) -> Option<MergePolicy> {
        self.fields.get(field).copied()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, MergePolicy)> {
        self.fields.iter().map(|(name, policy)| (name.as_str(), *policy))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Fluent builder for [`StateSchema`].
///
/// Re-declaring a field name keeps the last policy given.
#[derive(Default, Clone, Debug)]
pub struct StateSchemaBuilder {
    fields: FxHashMap<String, MergePolicy>,
}

impl StateSchemaBuilder {
    /// Declare a field merged by last-write-wins.
    #[must_use]
    pub fn replace(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), MergePolicy::Replace);
        self
    }

    /// Declare a field merged by array concatenation.
    #[must_use]
    pub fn accumulate(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), MergePolicy::Accumulate);
        self
    }

    #[must_use]
    pub fn build(self) -> StateSchema {
        StateSchema {
            fields: self.fields,
        }
    }
}
