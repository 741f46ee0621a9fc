use rustc_hash::FxHashMap;
use serde_json::Value;

/// Fresh field-write map, the shape steps fill in for an update.
#[must_use]
pub fn new_field_map() -> FxHashMap<String, Value> {
    FxHashMap::default()
}
