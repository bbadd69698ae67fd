//! Core types for reconciliation invocations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The caller's requested existence of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// The resource should exist with the supplied attributes.
    Present,
    /// The resource should not exist.
    Absent,
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Present => write!(f, "present"),
            DesiredState::Absent => write!(f, "absent"),
        }
    }
}

/// What the Act phase has to do, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Create,
    Update,
    Destroy,
    NoOp,
}

impl Decision {
    /// Whether this decision requires a mutating call.
    pub fn is_change(&self) -> bool {
        !matches!(self, Decision::NoOp)
    }
}

/// The per-invocation result handed back to the caller.
///
/// Constructed once, filled during the pipeline, and never mutated after
/// the final handoff: `changed` says whether any mutating call was (or,
/// under dry-run, would have been) made, `params` echoes the invocation
/// input, and `json` carries the last remote response payload.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<DesiredState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
    pub json: Value,
}

impl Report {
    /// A report for a present/absent style invocation.
    pub fn for_state(state: DesiredState) -> Self {
        Self {
            changed: false,
            state: Some(state),
            action: None,
            params: Map::new(),
            json: Value::Object(Map::new()),
        }
    }

    /// A report for an action-style invocation (queue, apply, cancel, ...).
    pub fn for_action(action: impl Into<String>) -> Self {
        Self {
            changed: false,
            state: None,
            action: Some(action.into()),
            params: Map::new(),
            json: Value::Object(Map::new()),
        }
    }

    /// Echo an input parameter into the report.
    pub fn param(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}
