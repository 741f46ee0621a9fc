use super::{FieldWrite, MergeError, Reducer};
use serde_json::Value;

/// Accumulate-policy reducer: every write must be a JSON array, and each is
/// appended onto the current value in write order. Writers embed an ordering
/// key in their elements if they need more than arrival order.
pub struct ExtendReducer;

impl Reducer for ExtendReducer {
    fn combine(
        &self,
        field: &str,
        current: &Value,
        writes: &[FieldWrite],
    ) -> Result<Value, MergeError> {
        let mut merged = match current {
            Value::Array(items) => items.clone(),
            // Accumulate fields are initialized to [] by RunState::init; any
            // other shape here came from a hand-built state.
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        };
        for write in writes {
            match &write.value {
                Value::Array(items) => merged.extend(items.iter().cloned()),
                _ => {
                    return Err(MergeError::NotAList {
                        field: field.to_string(),
                        node: write.node.clone(),
                    });
                }
            }
        }
        Ok(Value::Array(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;
    use serde_json::json;

    fn write(node: &str, value: Value) -> FieldWrite {
        FieldWrite {
            node: NodeKind::Custom(node.to_string()),
            value,
        }
    }

    #[test]
    fn concatenates_in_write_order() {
        let out = ExtendReducer
            .combine(
                "notes",
                &json!(["seed"]),
                &[write("a", json!([1, 2])), write("b", json!([3]))],
            )
            .unwrap();
        assert_eq!(out, json!(["seed", 1, 2, 3]));
    }

    #[test]
    fn empty_array_write_is_a_noop() {
        let out = ExtendReducer
            .combine("notes", &json!([1]), &[write("a", json!([]))])
            .unwrap();
        assert_eq!(out, json!([1]));
    }

    #[test]
    fn scalar_write_is_rejected() {
        let err = ExtendReducer
            .combine("notes", &json!([]), &[write("a", json!("bare"))])
            .unwrap_err();
        assert!(matches!(err, MergeError::NotAList { ref field, .. } if field == "notes"));
    }
}
