//! Run queueing, steering, and listing.
//!
//! Runs are action-style: queueing creates a run, the remaining verbs
//! drive an existing run through its lifecycle. Every action re-reads the
//! run afterwards so the report reflects the state the action produced.

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};

use super::{Output, emit_collection, emit_report, parse_attributes, require_workspace_id, resolve_org_scope};
use crate::cli::{RunCommand, RunTargetArgs};
use converge::{ApplyContext, Report, expand_comma_items, matches_all, or_wildcard};
use tfapi::{Client, Collection};

/// Message attached to queued runs when the caller supplies none.
const DEFAULT_MESSAGE: &str = "Queued via tfsync";

/// Lifecycle actions on an existing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Apply,
    Discard,
    Cancel,
    ForceCancel,
    ForceExecute,
}

impl Action {
    fn name(self) -> &'static str {
        match self {
            Action::Apply => "apply",
            Action::Discard => "discard",
            Action::Cancel => "cancel",
            Action::ForceCancel => "force-cancel",
            Action::ForceExecute => "force-execute",
        }
    }

    /// Whether the action endpoint accepts a comment payload.
    fn takes_comment(self) -> bool {
        !matches!(self, Action::ForceExecute)
    }
}

pub fn run(client: &Client, ctx: &ApplyContext, cmd: RunCommand, out: Output) -> Result<()> {
    match cmd {
        RunCommand::Queue {
            organization,
            workspace,
            attributes,
        } => {
            let attributes = attributes.as_deref().map(parse_attributes).transpose()?;
            let report = queue(client, ctx, &organization, &workspace, attributes)?;
            emit_report(&report, out, ctx.dry_run)
        }
        RunCommand::Apply(args) => steer_cmd(client, ctx, Action::Apply, args, out),
        RunCommand::Discard(args) => steer_cmd(client, ctx, Action::Discard, args, out),
        RunCommand::Cancel(args) => steer_cmd(client, ctx, Action::Cancel, args, out),
        RunCommand::ForceCancel(args) => steer_cmd(client, ctx, Action::ForceCancel, args, out),
        RunCommand::ForceExecute(args) => steer_cmd(client, ctx, Action::ForceExecute, args, out),
        RunCommand::List {
            organization,
            workspace,
            runs,
        } => {
            let collection = list(client, &organization, &workspace, &runs)?;
            emit_collection(&collection)
        }
    }
}

fn steer_cmd(
    client: &Client,
    ctx: &ApplyContext,
    action: Action,
    args: RunTargetArgs,
    out: Output,
) -> Result<()> {
    let report = steer(
        client,
        ctx,
        action,
        &args.organization,
        &args.workspace,
        &args.run,
        args.comment.as_deref(),
    )?;
    emit_report(&report, out, ctx.dry_run)
}

/// Queue a new run in a workspace.
pub fn queue(
    client: &Client,
    ctx: &ApplyContext,
    organization: &str,
    workspace: &str,
    attributes: Option<Map<String, Value>>,
) -> Result<Report> {
    let organization = resolve_org_scope(client, organization);

    let mut attributes = attributes.unwrap_or_default();
    attributes
        .entry("message".to_string())
        .or_insert_with(|| Value::String(DEFAULT_MESSAGE.to_string()));

    let mut report = Report::for_action("queue");
    report
        .param("organization", organization.clone())
        .param("workspace", workspace)
        .param("attributes", Value::Object(attributes.clone()));

    let workspace_id = require_workspace_id(client, &organization, workspace)?;

    let payload = json!({
        "data": {
            "type": "runs",
            "attributes": attributes,
            "relationships": {
                "workspace": {
                    "data": {
                        "type": "workspaces",
                        "id": workspace_id,
                    }
                }
            }
        }
    });

    ctx.apply(&mut report, || {
        let created = client.create("runs", &payload).with_context(|| {
            format!("Unable to create a run in \"{workspace}\" workspace")
        })?;
        Ok(serde_json::to_value(&created)?)
    })?;

    Ok(report)
}

/// Drive an existing run through one lifecycle action.
pub fn steer(
    client: &Client,
    ctx: &ApplyContext,
    action: Action,
    organization: &str,
    workspace: &str,
    run: &str,
    comment: Option<&str>,
) -> Result<Report> {
    let organization = resolve_org_scope(client, organization);

    let mut report = Report::for_action(action.name());
    report
        .param("organization", organization.clone())
        .param("workspace", workspace)
        .param("run", run);
    if let Some(comment) = comment {
        report.param("comment", comment);
    }

    require_workspace_id(client, &organization, workspace)?;

    // The run must exist before we try to steer it.
    client
        .show(&format!("runs/{run}"), None)
        .with_context(|| {
            format!("Unable to retrieve details on \"{run}\" run in \"{workspace}\" workspace")
        })?;

    let payload = comment
        .filter(|_| action.takes_comment())
        .map(|comment| json!({ "comment": comment }));

    ctx.apply(&mut report, || {
        client
            .action(
                &format!("runs/{run}/actions/{}", action.name()),
                payload.as_ref(),
            )
            .with_context(|| {
                format!(
                    "Unable to {} \"{run}\" run in \"{workspace}\" workspace",
                    action.name()
                )
            })?;
        Ok(Value::Null)
    })?;

    // Re-read the run so the report reflects the post-action state. This
    // also runs under dry-run, where it reports the unchanged run.
    let details = client
        .show(&format!("runs/{run}"), Some("plan,apply"))
        .with_context(|| {
            format!("Unable to retrieve details on \"{run}\" run in \"{workspace}\" workspace")
        })?;
    report.json = serde_json::to_value(&details)?;

    Ok(report)
}

/// List runs in a workspace by message or ID, deduplicated by run ID.
pub fn list(
    client: &Client,
    organization: &str,
    workspace: &str,
    runs: &[String],
) -> Result<Collection> {
    let runs = or_wildcard(expand_comma_items(runs));
    let organization = resolve_org_scope(client, organization);
    let workspace_id = require_workspace_id(client, &organization, workspace)?;

    let runs_path = format!("workspaces/{workspace_id}/runs");
    let all = client.list(&runs_path, &[]).with_context(|| {
        format!("Unable to list runs in \"{workspace}\" workspace")
    })?;

    let mut result = if matches_all(&runs) {
        all
    } else {
        let mut selected = Collection::default();
        for token in &runs {
            // A token is a run message first; anything else is treated as
            // a run ID and fetched directly.
            let matching: Vec<&tfapi::Resource> = all
                .data
                .iter()
                .filter(|r| r.attr_str("message") == Some(token))
                .collect();

            if matching.is_empty() {
                let shown = client
                    .show(&format!("runs/{token}"), None)
                    .with_context(|| {
                        format!(
                            "Unable to retrieve details on \"{token}\" run in \"{workspace}\" workspace"
                        )
                    })?;
                selected.data.push(shown.data);
                selected.included.extend(shown.included);
            } else {
                for found in matching {
                    let shown = client
                        .show(&format!("runs/{}", found.id), None)
                        .with_context(|| {
                            format!(
                                "Unable to retrieve details on \"{}\" run in \"{workspace}\" workspace",
                                found.id
                            )
                        })?;
                    selected.data.push(shown.data);
                    selected.included.extend(shown.included);
                }
            }
        }
        selected
    };

    result.dedup_by_id();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{FakeApi, resource};

    const WS_PATH: &str = "organizations/acme/workspaces";
    const RUNS: &str = "workspaces/ws-1/runs";

    fn fake() -> FakeApi {
        FakeApi::new()
            .with_collection("organizations", vec![])
            .with_collection(
                WS_PATH,
                vec![resource("ws-1", "workspaces", json!({"name": "net-prod"}))],
            )
            .with_collection(
                RUNS,
                vec![
                    resource("run-1", "runs", json!({"message": "weekly plan"})),
                    resource("run-2", "runs", json!({"message": "weekly plan"})),
                    resource("run-3", "runs", json!({"message": "hotfix"})),
                ],
            )
            .with_single("runs/run-1", resource("run-1", "runs", json!({"message": "weekly plan"})))
            .with_single("runs/run-2", resource("run-2", "runs", json!({"message": "weekly plan"})))
            .with_single("runs/run-3", resource("run-3", "runs", json!({"message": "hotfix"})))
    }

    #[test]
    fn test_queue_defaults_message() {
        let api = fake();
        let mutations = api.mutations();
        let client = api.into_client();

        let report = queue(&client, &ApplyContext::new(false), "acme", "net-prod", None).unwrap();

        assert!(report.changed);
        assert_eq!(mutations.borrow().as_slice(), ["POST runs"]);
        assert_eq!(report.params["attributes"]["message"], DEFAULT_MESSAGE);
    }

    #[test]
    fn test_queue_requires_existing_workspace() {
        let api = FakeApi::new()
            .with_collection("organizations", vec![])
            .with_collection(WS_PATH, vec![]);
        let mutations = api.mutations();
        let client = api.into_client();

        let err = queue(&client, &ApplyContext::new(false), "acme", "ghost", None).unwrap_err();

        assert!(err.to_string().contains("\"ghost\" workspace does not exist"));
        assert!(mutations.borrow().is_empty());
    }

    #[test]
    fn test_steer_applies_run() {
        let api = fake();
        let mutations = api.mutations();
        let client = api.into_client();

        let report = steer(
            &client,
            &ApplyContext::new(false),
            Action::Apply,
            "acme",
            "net-prod",
            "run-1",
            Some("looks good"),
        )
        .unwrap();

        assert!(report.changed);
        assert_eq!(mutations.borrow().as_slice(), ["POST runs/run-1/actions/apply"]);
        assert_eq!(report.json["data"]["id"], "run-1");
    }

    #[test]
    fn test_steer_missing_run_is_fatal() {
        let api = fake();
        let mutations = api.mutations();
        let client = api.into_client();

        let err = steer(
            &client,
            &ApplyContext::new(false),
            Action::Cancel,
            "acme",
            "net-prod",
            "run-404",
            None,
        )
        .unwrap_err();

        assert!(err.to_string().contains("\"run-404\" run"));
        assert!(mutations.borrow().is_empty());
    }

    #[test]
    fn test_steer_dry_run_reports_without_acting() {
        let api = fake();
        let mutations = api.mutations();
        let client = api.into_client();

        let report = steer(
            &client,
            &ApplyContext::new(true),
            Action::Discard,
            "acme",
            "net-prod",
            "run-1",
            None,
        )
        .unwrap();

        assert!(report.changed);
        assert!(mutations.borrow().is_empty());
    }

    #[test]
    fn test_list_by_message_dedups_by_id() {
        let api = fake();
        let client = api.into_client();

        // "weekly plan" matches run-1 and run-2; run-1 is also requested
        // directly, so it would appear twice without the final dedup.
        let collection = list(
            &client,
            "acme",
            "net-prod",
            &["weekly plan".to_string(), "run-1".to_string()],
        )
        .unwrap();

        let ids: Vec<&str> = collection.data.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["run-1", "run-2"]);
    }

    #[test]
    fn test_list_wildcard() {
        let api = fake();
        let client = api.into_client();

        let collection = list(&client, "acme", "net-prod", &[]).unwrap();
        assert_eq!(collection.data.len(), 3);
    }
}
