//! # Converge
//!
//! The reconciliation core shared by every resource module: turn a
//! caller-supplied desired state into the minimal set of remote calls.
//!
//! ## Core Concepts
//!
//! - **Normalization**: caller input arrives as repeated tokens and/or
//!   comma-joined strings; [`normalize`] produces one canonical list.
//! - **Resolution**: a human-supplied identifier (name, external-id, key,
//!   raw ID) is matched against a freshly fetched collection in a fixed
//!   per-resource field order ([`resolve`]).
//! - **Subset comparison**: a write happens only when the desired
//!   attributes are not already fully represented in the observed
//!   attributes ([`subset`]). The model is additive: attributes absent
//!   from the desired set are never considered for removal.
//! - **Driver**: the Resolve → Fetch → Decide → Act pipeline expressed as
//!   [`Decision`] plus a dry-run-aware [`ApplyContext`], producing a
//!   [`Report`] with a `changed` flag.
//!
//! Each invocation owns its state exclusively; nothing here is cached or
//! shared across invocations. The window between fetching observed state
//! and acting on it is unsynchronized with concurrent external writers;
//! callers that need stronger guarantees must serialize externally.

pub mod driver;
pub mod normalize;
pub mod resolve;
pub mod subset;
pub mod types;

pub use driver::{ApplyContext, decide};
pub use normalize::{WILDCARD, expand_comma_items, matches_all, or_wildcard};
pub use resolve::{AmbiguousMatch, MatchField, resolve_id};
pub use subset::is_subset;
pub use types::{Decision, DesiredState, Report};
