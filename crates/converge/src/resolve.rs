//! Identifier resolution against fetched collections.
//!
//! A caller-supplied token may be a display name, a secondary identifier
//! (external-id, email, key) or the canonical ID itself. Resolution scans
//! a freshly fetched collection against an ordered list of match fields;
//! the order is fixed per resource type and the first field with a match
//! decides. Results are never cached across invocations.

use thiserror::Error;

use tfapi::Resource;

/// One field a token may be matched against, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    /// The canonical resource ID.
    Id,
    /// A named entry in the resource's attributes map.
    Attr(&'static str),
}

/// The token matched more than one resource on the same field.
///
/// Uniform policy across all resource types: silently picking one of
/// several same-named resources risks mutating the wrong one, so this is
/// always a distinct, fatal error.
#[derive(Debug, Error)]
#[error("found {count} {kind}s matching \"{token}\"; refer to the {kind} by its ID")]
pub struct AmbiguousMatch {
    pub kind: String,
    pub token: String,
    pub count: usize,
}

/// Resolve `token` to a canonical resource ID.
///
/// Fields are tried in the given order; the first field with at least one
/// match decides. No match on any field resolves to `None`; whether that
/// triggers creation or is fatal depends on the caller's requested state.
pub fn resolve_id(
    kind: &str,
    token: &str,
    collection: &[Resource],
    fields: &[MatchField],
) -> Result<Option<String>, AmbiguousMatch> {
    for field in fields {
        let mut matches = collection.iter().filter(|r| match field {
            MatchField::Id => r.id == token,
            MatchField::Attr(name) => r.attr_str(name) == Some(token),
        });

        if let Some(first) = matches.next() {
            let extra = matches.count();
            if extra > 0 {
                return Err(AmbiguousMatch {
                    kind: kind.to_string(),
                    token: token.to_string(),
                    count: extra + 1,
                });
            }
            return Ok(Some(first.id.clone()));
        }
    }

    Ok(None)
}
