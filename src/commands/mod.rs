//! Per-resource reconciliation modules.
//!
//! Every module follows the same four-phase pipeline: resolve supplied
//! identifiers against freshly listed collections, fetch observed state,
//! decide which mutations are needed, and act, honoring dry-run and
//! reporting a `changed` flag. Fatal errors carry the operation, the
//! resource identifier, and the scope in a single message.

pub mod org_resource;
pub mod organization;
pub mod run;
pub mod ssh_key;
pub mod team;
pub mod variable;
pub mod vcs;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::fs;

use crate::ui;
use converge::{MatchField, Report, resolve_id};
use tfapi::{Client, Collection};

/// Output flags shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Print the full report as JSON.
    pub json: bool,
    /// Suppress non-essential lines.
    pub quiet: bool,
}

/// Print the outcome of a reconciliation invocation.
pub fn emit_report(report: &Report, out: Output, dry_run: bool) -> Result<()> {
    if out.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if report.changed {
        if dry_run {
            ui::warn("changes required (dry-run, nothing applied)");
        } else {
            ui::success("changed");
        }
    } else if !out.quiet {
        ui::info("no changes needed");
    }

    if !out.quiet {
        for (key, value) in &report.params {
            match value {
                Value::String(s) => ui::kv(key, s),
                other => ui::kv(key, &other.to_string()),
            }
        }
    }

    Ok(())
}

/// Print a listing as pretty JSON.
pub fn emit_collection(collection: &Collection) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(collection)?);
    Ok(())
}

/// Parse an `--attributes` argument: inline JSON, or `@path` to read a file.
///
/// The value must be a JSON object.
pub fn parse_attributes(input: &str) -> Result<Map<String, Value>> {
    let content = match input.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Could not read {path}"))?
        }
        None => input.to_string(),
    };

    let value: Value =
        serde_json::from_str(&content).context("Invalid JSON in --attributes")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("--attributes must be a JSON object"),
    }
}

/// Resolve an organization token (name or external-id) to its canonical
/// name for scoping further calls.
///
/// A failing list call, or a token that matches nothing, falls back to the
/// supplied token so the authoritative error surfaces from the scoped call
/// itself.
pub fn resolve_org_scope(client: &Client, organization: &str) -> String {
    match client.list("organizations", &[]) {
        Ok(collection) => match resolve_id(
            "organization",
            organization,
            &collection.data,
            organization::MATCH_FIELDS,
        ) {
            Ok(Some(id)) => id,
            _ => organization.to_string(),
        },
        Err(e) => {
            log::debug!("unable to list organizations: {e}; using \"{organization}\" as-is");
            organization.to_string()
        }
    }
}

/// Resolve a workspace token (name or ID) to its canonical ID.
///
/// The workspace is the parent scope here: it must exist no matter what
/// state is requested for the resource inside it.
pub fn require_workspace_id(
    client: &Client,
    organization: &str,
    workspace: &str,
) -> Result<String> {
    let all = client
        .list(&format!("organizations/{organization}/workspaces"), &[])
        .with_context(|| {
            format!("Unable to list workspaces in \"{organization}\" organization")
        })?;

    let resolved = resolve_id(
        "workspace",
        workspace,
        &all.data,
        &[MatchField::Attr("name"), MatchField::Id],
    )?;

    match resolved {
        Some(id) => Ok(id),
        None => bail!(
            "The supplied \"{workspace}\" workspace does not exist in \"{organization}\" organization"
        ),
    }
}
