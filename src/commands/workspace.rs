//! Workspace reconciliation.
//!
//! Besides plain attributes, a workspace carries two independent
//! concerns reconciled as separate Act steps: the lock state and the
//! assigned SSH key. Each step performs at most one mutating call and a
//! failure in one never masks the outcome of another; whatever already
//! happened stays visible in the report.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};

use super::{Output, emit_collection, emit_report, parse_attributes, resolve_org_scope};
use crate::cli::{WorkspaceApplyArgs, WorkspaceCommand};
use crate::ui;
use converge::{
    ApplyContext, Decision, DesiredState, MatchField, Report, decide, expand_comma_items,
    matches_all, or_wildcard, resolve_id,
};
use tfapi::{Client, Collection, Resource};

/// Resolution order for workspace tokens.
pub const MATCH_FIELDS: &[MatchField] = &[MatchField::Attr("name"), MatchField::Id];

/// Desired workspace configuration for one invocation.
#[derive(Debug, Default)]
pub struct Params {
    pub organization: String,
    pub workspace: Option<String>,
    pub attributes: Option<Map<String, Value>>,
    pub locked: Option<bool>,
    pub lock_reason: Option<String>,
    pub ssh_key: Option<String>,
}

pub fn run(client: &Client, ctx: &ApplyContext, cmd: WorkspaceCommand, out: Output) -> Result<()> {
    match cmd {
        WorkspaceCommand::Apply(args) => {
            let params = params_from(args)?;
            let report = ensure(client, ctx, DesiredState::Present, params)?;
            emit_report(&report, out, ctx.dry_run)
        }
        WorkspaceCommand::Delete {
            organization,
            workspace,
        } => {
            let params = Params {
                organization,
                workspace: Some(workspace),
                ..Params::default()
            };
            let report = ensure(client, ctx, DesiredState::Absent, params)?;
            emit_report(&report, out, ctx.dry_run)
        }
        WorkspaceCommand::List {
            organization,
            names,
        } => {
            let collection = list(client, &organization, &names)?;
            emit_collection(&collection)
        }
    }
}

fn params_from(args: WorkspaceApplyArgs) -> Result<Params> {
    let locked = if args.lock {
        Some(true)
    } else if args.unlock {
        Some(false)
    } else {
        None
    };

    Ok(Params {
        organization: args.organization,
        workspace: args.workspace,
        attributes: args.attributes.as_deref().map(parse_attributes).transpose()?,
        locked,
        lock_reason: args.lock_reason,
        ssh_key: args.ssh_key,
    })
}

/// Reconcile one workspace to the requested state.
pub fn ensure(
    client: &Client,
    ctx: &ApplyContext,
    state: DesiredState,
    params: Params,
) -> Result<Report> {
    if state == DesiredState::Present
        && params.attributes.is_none()
        && params.locked.is_none()
        && params.ssh_key.is_none()
    {
        bail!("Applying a workspace requires --attributes, --lock/--unlock, or --ssh-key");
    }
    if state == DesiredState::Absent && params.workspace.is_none() {
        bail!("Deleting a workspace requires its name or ID");
    }

    let organization = resolve_org_scope(client, &params.organization);

    let mut report = Report::for_state(state);
    report.param("organization", organization.clone());
    if let Some(workspace) = &params.workspace {
        report.param("workspace", workspace.clone());
    }
    if let Some(attributes) = &params.attributes {
        report.param("attributes", Value::Object(attributes.clone()));
    }

    let all = client
        .list(&format!("organizations/{organization}/workspaces"), &[])
        .with_context(|| {
            format!("Unable to list workspaces in \"{organization}\" organization")
        })?;

    let workspace_id = resolve_target(&all, state, &params, &organization)?;
    let label = params
        .workspace
        .clone()
        .or_else(|| {
            params
                .attributes
                .as_ref()
                .and_then(|a| a.get("name"))
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_default();

    match (state, workspace_id) {
        (DesiredState::Absent, Some(id)) => {
            ctx.apply(&mut report, || {
                let destroyed = client.destroy(&format!("workspaces/{id}")).with_context(|| {
                    format!(
                        "Unable to destroy \"{label}\" workspace in \"{organization}\" organization"
                    )
                })?;
                Ok(destroyed)
            })?;
        }
        (DesiredState::Absent, None) => {}
        (DesiredState::Present, Some(id)) => {
            let current = all
                .by_id(&id)
                .cloned()
                .with_context(|| format!("Workspace \"{id}\" vanished from the listing"))?;
            converge_existing(client, ctx, &mut report, &organization, &label, &current, &params)?;
        }
        (DesiredState::Present, None) => {
            let Some(attributes) = &params.attributes else {
                bail!("`name` is required in --attributes when creating a new workspace");
            };
            if !attributes.contains_key("name") {
                bail!("`name` is required in --attributes when creating a new workspace");
            }
            let payload = json!({
                "data": {
                    "type": "workspaces",
                    "attributes": attributes,
                }
            });
            ctx.apply(&mut report, || {
                let created = client
                    .create(&format!("organizations/{organization}/workspaces"), &payload)
                    .with_context(|| {
                        format!(
                            "Unable to create \"{label}\" workspace in \"{organization}\" organization"
                        )
                    })?;
                Ok(serde_json::to_value(&created)?)
            })?;
        }
    }

    Ok(report)
}

/// Resolve the target workspace ID for this invocation.
///
/// A supplied token that matches nothing is fatal only for `present`;
/// without a token, the `name` attribute locates a pre-existing workspace.
fn resolve_target(
    all: &Collection,
    state: DesiredState,
    params: &Params,
    organization: &str,
) -> Result<Option<String>> {
    match &params.workspace {
        Some(token) => {
            let resolved = resolve_id("workspace", token, &all.data, MATCH_FIELDS)?;
            if resolved.is_none() && state == DesiredState::Present {
                bail!(
                    "The supplied \"{token}\" workspace does not exist in \"{organization}\" organization"
                );
            }
            Ok(resolved)
        }
        None => {
            let name = params
                .attributes
                .as_ref()
                .and_then(|a| a.get("name"))
                .and_then(Value::as_str);
            match name {
                Some(name) => Ok(resolve_id(
                    "workspace",
                    name,
                    &all.data,
                    &[MatchField::Attr("name")],
                )?),
                None => Ok(None),
            }
        }
    }
}

/// Run the attribute, lock, and SSH-key Act steps against an existing
/// workspace.
fn converge_existing(
    client: &Client,
    ctx: &ApplyContext,
    report: &mut Report,
    organization: &str,
    label: &str,
    current: &Resource,
    params: &Params,
) -> Result<()> {
    let id = &current.id;

    // Attributes
    if let Some(attributes) = &params.attributes {
        if decide(DesiredState::Present, Some(current), Some(attributes)) == Decision::Update {
            let payload = json!({
                "data": {
                    "type": "workspaces",
                    "attributes": attributes,
                }
            });
            ctx.apply(report, || {
                let updated = client
                    .update(&format!("workspaces/{id}"), &payload)
                    .with_context(|| {
                        format!(
                            "Unable to update \"{label}\" workspace in \"{organization}\" organization"
                        )
                    })?;
                Ok(serde_json::to_value(&updated)?)
            })?;
        }
    }

    // Lock state
    if let Some(locked) = params.locked {
        let currently_locked = current.attr("locked").and_then(Value::as_bool).unwrap_or(false);

        if locked && !currently_locked {
            let payload = json!({
                "reason": params.lock_reason.clone().unwrap_or_default(),
            });
            ctx.apply(report, || {
                let response = client
                    .action(&format!("workspaces/{id}/actions/lock"), Some(&payload))
                    .with_context(|| {
                        format!(
                            "Unable to lock \"{label}\" workspace in \"{organization}\" organization"
                        )
                    })?;
                Ok(response)
            })?;
        }

        if !locked && currently_locked {
            ctx.apply(report, || {
                let response = client
                    .action(&format!("workspaces/{id}/actions/unlock"), None)
                    .with_context(|| {
                        format!(
                            "Unable to unlock \"{label}\" workspace in \"{organization}\" organization"
                        )
                    })?;
                Ok(response)
            })?;
        }
    }

    // SSH key assignment
    if let Some(ssh_key) = &params.ssh_key {
        let desired_key = if ssh_key.is_empty() {
            None
        } else {
            let keys = client
                .list(&format!("organizations/{organization}/ssh-keys"), &[])
                .with_context(|| {
                    format!("Unable to list SSH keys in \"{organization}\" organization")
                })?;
            let resolved = resolve_id(
                "SSH key",
                ssh_key,
                &keys.data,
                &[MatchField::Attr("name"), MatchField::Id],
            )?;
            match resolved {
                Some(key_id) => Some(key_id),
                None => bail!(
                    "The supplied \"{ssh_key}\" SSH key does not exist in \"{organization}\" organization"
                ),
            }
        };

        let assigned = current.relationship_id("ssh-key").map(String::from);

        if let Some(key_id) = &desired_key {
            if assigned.as_deref() != Some(key_id.as_str()) {
                let payload = json!({
                    "data": {
                        "type": "workspaces",
                        "attributes": { "id": key_id },
                    }
                });
                ctx.apply(report, || {
                    let updated = client
                        .update(&format!("workspaces/{id}/relationships/ssh-key"), &payload)
                        .with_context(|| {
                            format!(
                                "Unable to assign \"{ssh_key}\" SSH key to \"{label}\" workspace"
                            )
                        })?;
                    Ok(serde_json::to_value(&updated)?)
                })?;
            }
        } else if assigned.is_some() {
            let payload = json!({
                "data": {
                    "type": "workspaces",
                    "attributes": { "id": null },
                }
            });
            ctx.apply(report, || {
                let updated = client
                    .update(&format!("workspaces/{id}/relationships/ssh-key"), &payload)
                    .with_context(|| {
                        format!(
                            "Unable to unassign \"{ssh_key}\" SSH key from \"{label}\" workspace"
                        )
                    })?;
                Ok(serde_json::to_value(&updated)?)
            })?;
        }
    }

    Ok(())
}

/// List workspaces, restricted to the supplied names or IDs.
pub fn list(client: &Client, organization: &str, names: &[String]) -> Result<Collection> {
    let names = or_wildcard(expand_comma_items(names));
    let organization = resolve_org_scope(client, organization);

    let all = client
        .list(&format!("organizations/{organization}/workspaces"), &[])
        .with_context(|| {
            format!("Unable to list workspaces in \"{organization}\" organization")
        })?;

    if matches_all(&names) {
        return Ok(all);
    }

    let mut selected = Collection::default();
    for token in &names {
        match resolve_id("workspace", token, &all.data, MATCH_FIELDS)? {
            Some(id) => {
                if let Some(workspace) = all.by_id(&id) {
                    selected.data.push(workspace.clone());
                }
            }
            None => ui::warn(&format!("workspace \"{token}\" not found")),
        }
    }

    Ok(selected)
}
