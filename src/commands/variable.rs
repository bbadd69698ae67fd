//! Workspace variable reconciliation.
//!
//! Variables live under a workspace, and the workspace must exist no
//! matter what state is requested for the variable itself. Sensitive
//! variables never echo their value back in the report.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};

use super::{Output, emit_collection, emit_report, parse_attributes, require_workspace_id, resolve_org_scope};
use crate::cli::VarCommand;
use crate::ui;
use converge::{
    ApplyContext, Decision, DesiredState, MatchField, Report, decide, expand_comma_items,
    matches_all, or_wildcard, resolve_id,
};
use tfapi::{Client, Collection};

/// Resolution order for variable tokens.
pub const MATCH_FIELDS: &[MatchField] = &[MatchField::Attr("key"), MatchField::Id];

pub fn run(client: &Client, ctx: &ApplyContext, cmd: VarCommand, out: Output) -> Result<()> {
    match cmd {
        VarCommand::Apply {
            organization,
            workspace,
            variable,
            attributes,
        } => {
            let attributes = parse_attributes(&attributes)?;
            let report = ensure(
                client,
                ctx,
                DesiredState::Present,
                &organization,
                &workspace,
                variable.as_deref(),
                Some(attributes),
            )?;
            emit_report(&report, out, ctx.dry_run)
        }
        VarCommand::Delete {
            organization,
            workspace,
            variable,
        } => {
            let report = ensure(
                client,
                ctx,
                DesiredState::Absent,
                &organization,
                &workspace,
                Some(&variable),
                None,
            )?;
            emit_report(&report, out, ctx.dry_run)
        }
        VarCommand::List {
            organization,
            workspace,
            names,
        } => {
            let collection = list(client, &organization, &workspace, &names)?;
            emit_collection(&collection)
        }
    }
}

/// Reconcile one workspace variable to the requested state.
pub fn ensure(
    client: &Client,
    ctx: &ApplyContext,
    state: DesiredState,
    organization: &str,
    workspace: &str,
    variable: Option<&str>,
    attributes: Option<Map<String, Value>>,
) -> Result<Report> {
    if state == DesiredState::Present && attributes.is_none() {
        bail!("Applying a variable requires --attributes");
    }

    let organization = resolve_org_scope(client, organization);

    let mut report = Report::for_state(state);
    report
        .param("organization", organization.clone())
        .param("workspace", workspace);
    if let Some(variable) = variable {
        report.param("variable", variable);
    }
    if let Some(attributes) = &attributes {
        report.param("attributes", Value::Object(redact_sensitive(attributes)));
    }

    let workspace_id = require_workspace_id(client, &organization, workspace)?;

    let vars_path = format!("workspaces/{workspace_id}/vars");
    let all = client.list(&vars_path, &[]).with_context(|| {
        format!("Unable to list variables in \"{workspace}\" workspace")
    })?;

    let existing = match variable {
        Some(token) => {
            let resolved = resolve_id("variable", token, &all.data, MATCH_FIELDS)?;
            if resolved.is_none() && state == DesiredState::Present {
                bail!(
                    "The supplied \"{token}\" variable does not exist in \"{workspace}\" workspace"
                );
            }
            resolved
        }
        None => {
            let key = attributes
                .as_ref()
                .and_then(|a| a.get("key"))
                .and_then(Value::as_str);
            match key {
                Some(key) => {
                    resolve_id("variable", key, &all.data, &[MatchField::Attr("key")])?
                }
                None => None,
            }
        }
    };

    let label = variable
        .map(String::from)
        .or_else(|| {
            attributes
                .as_ref()
                .and_then(|a| a.get("key"))
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_default();

    match (state, existing) {
        (DesiredState::Absent, Some(id)) => {
            ctx.apply(&mut report, || {
                let destroyed = client
                    .destroy(&format!("{vars_path}/{id}"))
                    .with_context(|| {
                        format!(
                            "Unable to delete \"{label}\" variable from \"{workspace}\" workspace"
                        )
                    })?;
                Ok(destroyed)
            })?;
        }
        (DesiredState::Absent, None) => {}
        (DesiredState::Present, Some(id)) => {
            let current = all.by_id(&id);
            if let Some(attributes) = &attributes
                && decide(DesiredState::Present, current, Some(attributes)) == Decision::Update
            {
                let payload = json!({
                    "data": {
                        "id": id,
                        "type": "vars",
                        "attributes": attributes,
                    }
                });
                ctx.apply(&mut report, || {
                    let updated = client
                        .update(&format!("{vars_path}/{id}"), &payload)
                        .with_context(|| {
                            format!(
                                "Unable to update \"{label}\" variable in \"{workspace}\" workspace"
                            )
                        })?;
                    Ok(serde_json::to_value(&updated)?)
                })?;
            }
        }
        (DesiredState::Present, None) => {
            let Some(attributes) = &attributes else {
                bail!("Applying a variable requires --attributes");
            };
            if !attributes.contains_key("key") {
                bail!("`key` is required in --attributes when creating a new variable");
            }
            let payload = json!({
                "data": {
                    "type": "vars",
                    "attributes": attributes,
                }
            });
            ctx.apply(&mut report, || {
                let created = client.create(&vars_path, &payload).with_context(|| {
                    format!(
                        "Unable to create \"{label}\" variable in \"{workspace}\" workspace"
                    )
                })?;
                Ok(serde_json::to_value(&created)?)
            })?;
        }
    }

    Ok(report)
}

/// Echoed attributes with the value removed for sensitive variables.
fn redact_sensitive(attributes: &Map<String, Value>) -> Map<String, Value> {
    let mut echoed = attributes.clone();
    if echoed.get("sensitive").and_then(Value::as_bool).unwrap_or(false) {
        echoed.remove("value");
    }
    echoed
}

/// List variables in a workspace, restricted to the supplied keys or IDs.
pub fn list(
    client: &Client,
    organization: &str,
    workspace: &str,
    names: &[String],
) -> Result<Collection> {
    let names = or_wildcard(expand_comma_items(names));
    let organization = resolve_org_scope(client, organization);
    let workspace_id = require_workspace_id(client, &organization, workspace)?;

    let all = client
        .list(&format!("workspaces/{workspace_id}/vars"), &[])
        .with_context(|| {
            format!("Unable to list variables in \"{workspace}\" workspace")
        })?;

    if matches_all(&names) {
        return Ok(all);
    }

    let mut selected = Collection::default();
    for token in &names {
        match resolve_id("variable", token, &all.data, MATCH_FIELDS)? {
            Some(id) => {
                if let Some(variable) = all.by_id(&id) {
                    selected.data.push(variable.clone());
                }
            }
            None => ui::warn(&format!("variable \"{token}\" not found")),
        }
    }

    Ok(selected)
}
