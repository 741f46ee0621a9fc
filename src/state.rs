//! Versioned run state.
//!
//! [`RunState`] is the single shared state of a run: one slot per schema
//! field, each carrying a value and a monotonically increasing version. The
//! state is only ever replaced wholesale at a superstep barrier via
//! [`RunState::apply`], which merges all of the step's writes through the
//! schema's reducers or fails without committing anything.
//!
//! Steps never see `RunState` directly; they get an immutable
//! [`StateSnapshot`] taken before the superstep launched.

use crate::reducers::{reducer_for, FieldWrite, MergeError};
use crate::schema::{MergePolicy, StateSchema};
use crate::types::NodeKind;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// One field's committed value plus its bump count.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSlot {
    pub value: Value,
    pub version: u32,
}

/// The committed state of a run, validated against its schema.
#[derive(Clone, Debug)]
pub struct RunState {
    schema: Arc<StateSchema>,
    fields: FxHashMap<String, FieldSlot>,
}

/// A step's declared writes, produced by one task during a superstep.
#[derive(Clone, Debug)]
pub struct StepUpdate {
    pub node: NodeKind,
    pub fields: FxHashMap<String, Value>,
}

/// Immutable view of the state handed to steps.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    pub values: FxHashMap<String, Value>,
    pub versions: FxHashMap<String, u32>,
}

impl StateSnapshot {
    /// Shorthand for looking up a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
}

impl RunState {
    /// Build the initial state for a run.
    ///
    /// Fields present in `initial` take those values at version 1; undeclared
    /// initial fields are rejected. Absent accumulate fields start as `[]`,
    /// absent replace fields as `null`, both at version 0.
    pub fn init(
        schema: Arc<StateSchema>,
        initial: FxHashMap<String, Value>,
    ) -> Result<Self, MergeError> {
        for name in initial.keys() {
            if !schema.contains(name) {
                return Err(MergeError::UnknownField {
                    field: name.clone(),
                    node: NodeKind::Start,
                });
            }
        }
        let mut fields = FxHashMap::default();
        for (name, policy) in schema.fields() {
            let slot = match initial.get(name) {
                Some(value) => FieldSlot {
                    value: value.clone(),
                    version: 1,
                },
                None => FieldSlot {
                    value: match policy {
                        MergePolicy::Accumulate => Value::Array(Vec::new()),
                        MergePolicy::Replace => Value::Null,
                    },
                    version: 0,
                },
            };
            fields.insert(name.to_string(), slot);
        }
        Ok(Self { schema, fields })
    }

    /// Rehydrate a state from persisted slots, without re-running reducers.
    pub(crate) fn from_slots(
        schema: Arc<StateSchema>,
        fields: FxHashMap<String, FieldSlot>,
    ) -> Result<Self, MergeError> {
        for name in fields.keys() {
            if !schema.contains(name) {
                return Err(MergeError::UnknownField {
                    field: name.clone(),
                    node: NodeKind::Start,
                });
            }
        }
        Ok(Self { schema, fields })
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    #[must_use]
    pub fn slot(&self, field: &str) -> Option<&FieldSlot> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).map(|slot| &slot.value)
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = (&str, &FieldSlot)> {
        self.fields.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    /// Take the immutable view handed to every step of a superstep.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let mut values = FxHashMap::default();
        let mut versions = FxHashMap::default();
        for (name, slot) in &self.fields {
            values.insert(name.clone(), slot.value.clone());
            versions.insert(name.clone(), slot.version);
        }
        StateSnapshot { values, versions }
    }

    /// Merge one superstep's writes into a new state.
    ///
    /// `updates` is ordered by task completion; per-field write order follows
    /// it. Each touched field goes through its schema reducer, its version is
    /// bumped once when the value actually changed, and untouched fields are
    /// carried over as-is. Any reducer error aborts the whole merge; `self`
    /// is never mutated.
    pub fn apply(&self, updates: &[StepUpdate]) -> Result<RunState, MergeError> {
        // Group writes per field, preserving completion order.
        let mut per_field: FxHashMap<&str, Vec<FieldWrite>> = FxHashMap::default();
        for update in updates {
            for (field, value) in &update.fields {
                if !self.schema.contains(field) {
                    return Err(MergeError::UnknownField {
                        field: field.clone(),
                        node: update.node.clone(),
                    });
                }
                per_field.entry(field.as_str()).or_default().push(FieldWrite {
                    node: update.node.clone(),
                    value: value.clone(),
                });
            }
        }

        let mut next = self.fields.clone();
        for (field, writes) in per_field {
            let slot = match next.get_mut(field) {
                Some(slot) => slot,
                None => continue, // schema checked above; slots cover the schema
            };
            let policy = match self.schema.policy(field) {
                Some(policy) => policy,
                None => continue,
            };
            let merged = reducer_for(policy).combine(field, &slot.value, &writes)?;
            if merged != slot.value {
                debug!(field, writers = writes.len(), "field updated");
                slot.version += 1;
                slot.value = merged;
            }
        }
        Ok(RunState {
            schema: Arc::clone(&self.schema),
            fields: next,
        })
    }
}
