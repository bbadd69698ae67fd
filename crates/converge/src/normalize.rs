//! Canonicalization of string-or-list caller input.
//!
//! Callers may pass identifiers as repeated tokens, as one comma-joined
//! string, or any mix. Normalization happens once at the boundary so the
//! rest of the system only ever sees a plain list.

/// Token meaning "match everything".
pub const WILDCARD: &str = "*";

/// Expand comma-joined elements into their trimmed fragments.
///
/// Elements without commas keep their positions; each comma-joined element
/// is removed and its fragments are appended at the end, in order. A result
/// of exactly `[""]` collapses to the empty list. Duplicates survive; the
/// occurrence count of every fragment is preserved.
pub fn expand_comma_items(items: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    let mut expanded: Vec<String> = Vec::new();

    for item in items {
        if item.contains(',') {
            expanded.extend(item.split(',').map(|e| e.trim().to_string()));
        } else {
            kept.push(item.clone());
        }
    }

    kept.extend(expanded);

    if kept == [""] {
        return Vec::new();
    }

    kept
}

/// Replace an empty selection with the wildcard-all token.
///
/// This is the caller-side default: "no explicit filter" means
/// "everything". The normalizer itself never injects the wildcard.
pub fn or_wildcard(items: Vec<String>) -> Vec<String> {
    if items.is_empty() {
        vec![WILDCARD.to_string()]
    } else {
        items
    }
}

/// Whether a selection asks for everything.
pub fn matches_all(items: &[String]) -> bool {
    items.iter().any(|i| i == WILDCARD)
}
