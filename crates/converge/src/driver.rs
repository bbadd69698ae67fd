//! The Decide and Act halves of the reconciliation pipeline.
//!
//! A module resolves identifiers, fetches observed state, then calls
//! [`decide`] to pick the required mutation and [`ApplyContext::apply`]
//! to perform it. Each Act step performs at most one mutating call; a
//! module with several independent concerns (attributes, lock state,
//! key assignment) runs one Act step per concern so a failure in one
//! cannot mask the outcome of another.
//!
//! Nothing locks the remote resource between Fetch and Act; a concurrent
//! external change can win the race. That window is inherent to the
//! list-then-write design and is not hidden here.

use serde_json::{Map, Value};

use crate::subset::is_subset;
use crate::types::{Decision, DesiredState, Report};
use tfapi::Resource;

/// Pick the mutation required to take `existing` to the requested state.
///
/// For `present` with an existing resource the desired attributes are
/// compared additively: only a desired value that is missing or different
/// forces an update. `None` desired attributes mean "existence only" and
/// never force a write.
pub fn decide(
    state: DesiredState,
    existing: Option<&Resource>,
    desired: Option<&Map<String, Value>>,
) -> Decision {
    match (state, existing) {
        (DesiredState::Present, Some(current)) => match desired {
            Some(attrs) if !attrs_satisfied(attrs, current) => Decision::Update,
            _ => Decision::NoOp,
        },
        (DesiredState::Present, None) => Decision::Create,
        (DesiredState::Absent, Some(_)) => Decision::Destroy,
        (DesiredState::Absent, None) => Decision::NoOp,
    }
}

/// Whether every desired attribute is already satisfied by the resource.
fn attrs_satisfied(desired: &Map<String, Value>, current: &Resource) -> bool {
    desired
        .iter()
        .all(|(key, value)| current.attr(key).is_some_and(|o| is_subset(value, o)))
}

/// Dry-run-aware execution of Act steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyContext {
    /// Report intended changes without performing mutating calls.
    pub dry_run: bool,
}

impl ApplyContext {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Run one mutating step.
    ///
    /// Marks the report changed; the operation itself is only invoked when
    /// dry-run is off, and its response payload replaces the report's
    /// `json`. An error aborts the invocation with no further steps.
    pub fn apply<F>(&self, report: &mut Report, operation: F) -> anyhow::Result<()>
    where
        F: FnOnce() -> anyhow::Result<Value>,
    {
        if !self.dry_run {
            report.json = operation()?;
        }
        report.changed = true;
        Ok(())
    }
}
