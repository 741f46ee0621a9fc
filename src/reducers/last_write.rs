use super::{FieldWrite, MergeError, Reducer};
use serde_json::Value;

/// Replace-policy reducer: a sole write overwrites the field; concurrent
/// writes agreeing on the value are collapsed; concurrent *differing* writes
/// are a conflict.
///
/// Equal-value concurrent writes are deliberately accepted: two workers
/// independently arriving at the same answer is not a race worth failing
/// a run over.
pub struct LastWriteReducer;

impl Reducer for LastWriteReducer {
    fn combine(
        &self,
        field: &str,
        current: &Value,
        writes: &[FieldWrite],
    ) -> Result<Value, MergeError> {
        let Some(first) = writes.first() else {
            return Ok(current.clone());
        };
        for later in &writes[1..] {
            if later.value != first.value {
                return Err(MergeError::Conflict {
                    field: field.to_string(),
                    first: first.node.clone(),
                    first_value: first.value.clone(),
                    second: later.node.clone(),
                    second_value: later.value.clone(),
                });
            }
        }
        Ok(first.value.clone())
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
    fn sole_write_replaces() {
        let out = LastWriteReducer
            .combine("topic", &json!("old"), &[write("a", json!("new"))])
            .unwrap();
        assert_eq!(out, json!("new"));
    }

    #[test]
    fn equal_concurrent_writes_collapse() {
        let out = LastWriteReducer
            .combine(
                "topic",
                &Value::Null,
                &[write("a", json!(42)), write("b", json!(42))],
            )
            .unwrap();
        assert_eq!(out, json!(42));
    }

    #[test]
    fn differing_concurrent_writes_conflict() {
        let err = LastWriteReducer
            .combine(
                "topic",
                &Value::Null,
                &[write("a", json!(1)), write("b", json!(2))],
            )
            .unwrap_err();
        assert!(matches!(err, MergeError::Conflict { ref field, .. } if field == "topic"));
    }
}
