//! In-band "no data" markers and their replacement by JSON `null`.
//!
//! The engine reports missing measures as `-9999` and missing scores as `-1`
//! under a key literally named `score`. Both become `null` wherever they
//! appear in a decoded payload.

use serde_json::Value;

/// Missing-data sentinel used by the engine for any numeric leaf.
pub const MISSING_DATA: f64 = -9999.0;
/// Missing-score sentinel, only meaningful under [`SCORE_KEY`].
pub const MISSING_SCORE: f64 = -1.0;
pub const SCORE_KEY: &str = "score";

/// Return `value` with every sentinel leaf replaced by `null`.
pub fn normalize(mut value: Value) -> Value {
    normalize_in_place(&mut value);
    value
}

/// Rewrite sentinel leaves in place. Key order and sequence order are kept.
pub fn normalize_in_place(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == SCORE_KEY && is_number(child, MISSING_SCORE) {
                    *child = Value::Null;
                } else {
                    normalize_in_place(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_in_place),
        leaf => {
            if is_missing_data(leaf) {
                *leaf = Value::Null;
            }
        }
    }
}

/// True when `value` is the `-9999` sentinel, integer or float form.
pub fn is_missing_data(value: &Value) -> bool {
    is_number(value, MISSING_DATA)
}

fn is_number(value: &Value, target: f64) -> bool {
    value.as_f64() == Some(target)
}
