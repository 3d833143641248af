//! Convert dotted-key overrides into a nested mapping.
//!
//! Each `("training_dataset.batch_size", Value)` pair is expanded into the nested
//! structure the merge engine overlays onto a config tree.

use serde_json::{Map, Value};

/// Convert dotted-key overrides into a nested mapping.
///
/// `("database.url", "pg://")` becomes `{"database": {"url": "pg://"}}`.
///
/// If multiple entries target the same key, the last one wins. An entry whose
/// path runs through a key that already holds a leaf replaces that leaf with a
/// mapping; the schema rejects the result if the field is not a struct.
pub fn overrides_to_map(entries: &[(String, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (dotted_key, value) in entries {
        set_nested(&mut map, dotted_key, value.clone());
    }
    map
}

/// A single dotted override as a nested mapping.
pub fn nest(dotted_key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    set_nested(&mut map, dotted_key, value);
    map
}

fn set_nested(map: &mut Map<String, Value>, dotted_key: &str, value: Value) {
    let (parents, leaf) = match dotted_key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, dotted_key),
    };

    let mut current = map;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }

    current.insert(leaf.to_string(), value);
}

/// Join a parent path and a field name with `.`.
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
