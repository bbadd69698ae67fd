//! Additive subset comparison between desired and observed attributes.
//!
//! The change model is a patch, not a full replace: a write is needed only
//! when some desired value is missing from, or different in, the observed
//! state. Observed attributes with no desired counterpart never count as a
//! difference, so supplying fewer attributes than currently set is never
//! itself a change.

use serde_json::Value;

/// Whether `proposed` is already fully represented within `observed`.
///
/// - Objects: every proposed key must exist in `observed` with a
///   recursively matching value. An empty proposed object matches
///   anything.
/// - Arrays: every proposed element must match *some* observed element
///   (existential, not positional).
/// - Scalars: exact equality, no type coercion (`"1"` does not equal `1`,
///   `"true"` does not equal `true`).
pub fn is_subset(proposed: &Value, observed: &Value) -> bool {
    match proposed {
        Value::Object(map) => map
            .iter()
            .all(|(key, value)| observed.get(key).is_some_and(|o| is_subset(value, o))),
        Value::Array(items) => observed.as_array().is_some_and(|observed| {
            items
                .iter()
                .all(|item| observed.iter().any(|o| is_subset(item, o)))
        }),
        _ => proposed == observed,
    }
}
