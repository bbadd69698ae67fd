//! Organization reconciliation.
//!
//! Organizations are addressed by name (which doubles as the canonical
//! ID) or by their `external-id` attribute; the external-id wins when
//! both could match.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};

use super::{Output, emit_collection, emit_report, parse_attributes};
use crate::cli::OrgCommand;
use crate::ui;
use converge::{
    ApplyContext, Decision, DesiredState, MatchField, Report, decide, expand_comma_items,
    matches_all, or_wildcard, resolve_id,
};
use tfapi::{Client, Collection};

/// Resolution order for organization tokens.
pub const MATCH_FIELDS: &[MatchField] = &[MatchField::Attr("external-id"), MatchField::Id];

pub fn run(client: &Client, ctx: &ApplyContext, cmd: OrgCommand, out: Output) -> Result<()> {
    match cmd {
        OrgCommand::Apply { attributes } => {
            let attributes = parse_attributes(&attributes)?;
            let report = ensure_present(client, ctx, attributes)?;
            emit_report(&report, out, ctx.dry_run)
        }
        OrgCommand::Delete { organization } => {
            let report = ensure_absent(client, ctx, &organization)?;
            emit_report(&report, out, ctx.dry_run)
        }
        OrgCommand::List { names } => {
            let collection = list(client, &names)?;
            emit_collection(&collection)
        }
    }
}

/// Create or update an organization from its desired attributes.
pub fn ensure_present(
    client: &Client,
    ctx: &ApplyContext,
    attributes: Map<String, Value>,
) -> Result<Report> {
    let Some(name) = attributes.get("name").and_then(Value::as_str).map(String::from) else {
        bail!("`name` is required in --attributes when applying an organization");
    };

    let mut report = Report::for_state(DesiredState::Present);
    report
        .param("organization", name.clone())
        .param("attributes", Value::Object(attributes.clone()));

    let all = client
        .list("organizations", &[])
        .context("Unable to list organizations")?;
    let existing = resolve_id("organization", &name, &all.data, MATCH_FIELDS)?;

    let payload = json!({
        "data": {
            "type": "organizations",
            "attributes": &attributes,
        }
    });

    match existing {
        None => ctx.apply(&mut report, || {
            let created = client
                .create("organizations", &payload)
                .context("Unable to create organization")?;
            Ok(serde_json::to_value(&created)?)
        })?,
        Some(id) => {
            let current = all.by_id(&id);
            if decide(DesiredState::Present, current, Some(&attributes)) == Decision::Update {
                ctx.apply(&mut report, || {
                    let updated = client
                        .update(&format!("organizations/{id}"), &payload)
                        .with_context(|| format!("Unable to update \"{id}\" organization"))?;
                    Ok(serde_json::to_value(&updated)?)
                })?;
            }
        }
    }

    Ok(report)
}

/// Delete an organization when it exists.
pub fn ensure_absent(client: &Client, ctx: &ApplyContext, organization: &str) -> Result<Report> {
    let mut report = Report::for_state(DesiredState::Absent);
    report.param("organization", organization);

    // A token without list scope cannot verify existence; use the supplied
    // name and let the destroy call report the authoritative error.
    let existing = match client.list("organizations", &[]) {
        Ok(all) => resolve_id("organization", organization, &all.data, MATCH_FIELDS)?,
        Err(e) => {
            log::debug!("unable to list organizations: {e}; using \"{organization}\" as-is");
            Some(organization.to_string())
        }
    };

    if let Some(id) = existing {
        ctx.apply(&mut report, || {
            let destroyed = client
                .destroy(&format!("organizations/{id}"))
                .with_context(|| format!("Unable to destroy \"{id}\" organization"))?;
            Ok(destroyed)
        })?;
    }

    Ok(report)
}

/// List organizations, restricted to the supplied names or external-ids.
pub fn list(client: &Client, names: &[String]) -> Result<Collection> {
    let names = or_wildcard(expand_comma_items(names));

    let all = client
        .list("organizations", &[])
        .context("Unable to list organizations")?;

    if matches_all(&names) {
        return Ok(all);
    }

    let mut selected = Collection::default();
    for token in &names {
        match resolve_id("organization", token, &all.data, MATCH_FIELDS)? {
            Some(id) => {
                if let Some(org) = all.by_id(&id) {
                    selected.data.push(org.clone());
                }
            }
            None => ui::warn(&format!("organization \"{token}\" not found")),
        }
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{FakeApi, resource};
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn acme() -> tfapi::Resource {
        resource(
            "acme",
            "organizations",
            json!({"name": "acme", "email": "ops@acme.io", "external-id": "org-XYZ"}),
        )
    }

    #[test]
    fn test_create_when_missing() {
        let api = FakeApi::new().with_collection("organizations", vec![]);
        let mutations = api.mutations();
        let client = api.into_client();

        let report = ensure_present(
            &client,
            &ApplyContext::new(false),
            attrs(json!({"name": "acme", "email": "ops@acme.io"})),
        )
        .unwrap();

        assert!(report.changed);
        assert_eq!(mutations.borrow().as_slice(), ["POST organizations"]);
    }

    #[test]
    fn test_noop_when_attributes_satisfied() {
        let api = FakeApi::new().with_collection("organizations", vec![acme()]);
        let mutations = api.mutations();
        let client = api.into_client();

        let report = ensure_present(
            &client,
            &ApplyContext::new(false),
            attrs(json!({"name": "acme", "email": "ops@acme.io"})),
        )
        .unwrap();

        assert!(!report.changed);
        assert!(mutations.borrow().is_empty());
    }

    #[test]
    fn test_update_on_drift() {
        let api = FakeApi::new().with_collection("organizations", vec![acme()]);
        let mutations = api.mutations();
        let client = api.into_client();

        let report = ensure_present(
            &client,
            &ApplyContext::new(false),
            attrs(json!({"name": "acme", "email": "platform@acme.io"})),
        )
        .unwrap();

        assert!(report.changed);
        assert_eq!(mutations.borrow().as_slice(), ["PATCH organizations/acme"]);
    }

    #[test]
    fn test_missing_name_is_a_validation_error() {
        let api = FakeApi::new();
        let mutations = api.mutations();
        let client = api.into_client();

        let err = ensure_present(
            &client,
            &ApplyContext::new(false),
            attrs(json!({"email": "ops@acme.io"})),
        )
        .unwrap_err();

        assert!(err.to_string().contains("`name` is required"));
        // Detected before any remote call.
        assert!(mutations.borrow().is_empty());
    }

    #[test]
    fn test_delete_resolves_external_id() {
        let api = FakeApi::new().with_collection("organizations", vec![acme()]);
        let mutations = api.mutations();
        let client = api.into_client();

        let report =
            ensure_absent(&client, &ApplyContext::new(false), "org-XYZ").unwrap();

        assert!(report.changed);
        assert_eq!(mutations.borrow().as_slice(), ["DELETE organizations/acme"]);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let api = FakeApi::new().with_collection("organizations", vec![acme()]);
        let mutations = api.mutations();
        let client = api.into_client();

        let report = ensure_absent(&client, &ApplyContext::new(false), "ghost").unwrap();

        assert!(!report.changed);
        assert!(mutations.borrow().is_empty());
    }

    #[test]
    fn test_delete_without_list_scope_uses_supplied_name() {
        let api = FakeApi::new().with_failing_list("organizations");
        let mutations = api.mutations();
        let client = api.into_client();

        let report = ensure_absent(&client, &ApplyContext::new(false), "acme").unwrap();

        assert!(report.changed);
        assert_eq!(mutations.borrow().as_slice(), ["DELETE organizations/acme"]);
    }

    #[test]
    fn test_list_filters_by_token() {
        let other = resource("beta", "organizations", json!({"name": "beta"}));
        let api = FakeApi::new().with_collection("organizations", vec![acme(), other]);
        let client = api.into_client();

        let all = list(&client, &[]).unwrap();
        assert_eq!(all.data.len(), 2);

        let selected = list(&client, &["org-XYZ".to_string()]).unwrap();
        assert_eq!(selected.data.len(), 1);
        assert_eq!(selected.data[0].id, "acme");
    }
}
