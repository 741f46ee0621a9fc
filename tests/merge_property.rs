//! Property tests for the barrier merge.

use proptest::collection::vec;
use proptest::prelude::*;
use rustc_hash::FxHashMap;
use serde_json::{json, Value};
use std::sync::Arc;
use superstep::schema::StateSchema;
use superstep::state::{RunState, StepUpdate};
use superstep::types::NodeKind;

fn schema() -> Arc<StateSchema> {
    Arc::new(
        StateSchema::builder()
            .replace("topic")
            .accumulate("notes")
            .build(),
    )
}

fn notes_update(writer: usize, items: &[i64]) -> StepUpdate {
    let mut fields = FxHashMap::default();
    fields.insert(
        "notes".to_string(),
        Value::Array(items.iter().map(|i| json!(i)).collect()),
    );
    StepUpdate {
        node: NodeKind::Custom(format!("w{writer}")),
        fields,
    }
}

proptest! {
    /// Concatenating per-writer arrays in any completion order yields
    /// exactly the union of contributed elements, as a multiset.
    #[test]
    fn accumulate_preserves_every_contribution(
        contributions in vec(vec(-100i64..100, 0..8), 0..6),
    ) {
        let state = RunState::init(schema(), FxHashMap::default()).unwrap();
        let updates: Vec<StepUpdate> = contributions
            .iter()
            .enumerate()
            .map(|(i, items)| notes_update(i, items))
            .collect();
        let merged = state.apply(&updates).unwrap();

        let mut got: Vec<i64> = merged
            .value("notes")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();
        let mut expected: Vec<i64> = contributions.into_iter().flatten().collect();
        got.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(got, expected);
    }

    /// Writer contributions stay contiguous and in completion order.
    #[test]
    fn accumulate_respects_completion_order(
        first in vec(-100i64..100, 1..5),
        second in vec(-100i64..100, 1..5),
    ) {
        let state = RunState::init(schema(), FxHashMap::default()).unwrap();
        let merged = state
            .apply(&[notes_update(0, &first), notes_update(1, &second)])
            .unwrap();

        let got: Vec<i64> = merged
            .value("notes")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();
        let expected: Vec<i64> = first.into_iter().chain(second).collect();
        prop_assert_eq!(got, expected);
    }

    /// Two concurrent replace writes conflict exactly when they differ.
    #[test]
    fn replace_conflicts_iff_values_differ(a in -50i64..50, b in -50i64..50) {
        let state = RunState::init(schema(), FxHashMap::default()).unwrap();
        let write = |writer: &str, v: i64| {
            let mut fields = FxHashMap::default();
            fields.insert("topic".to_string(), json!(v));
            StepUpdate {
                node: NodeKind::Custom(writer.to_string()),
                fields,
            }
        };
        let result = state.apply(&[write("a", a), write("b", b)]);
        if a == b {
            let merged = result.unwrap();
            prop_assert_eq!(merged.value("topic"), Some(&json!(a)));
        } else {
            prop_assert!(result.is_err());
        }
    }
}
