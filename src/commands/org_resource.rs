//! Shared driver for simple organization-scoped resources.
//!
//! Teams, SSH keys, and VCS connections all reconcile the same way:
//! resolve the token against the organization's collection, then create,
//! update, or destroy exactly one resource. The per-type differences are
//! captured in a [`Descriptor`] - paths, resolution order, and payload
//! quirks - so the pipeline itself is written once.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};

use super::{Output, emit_collection, emit_report, resolve_org_scope};
use crate::ui;
use converge::{
    ApplyContext, Decision, DesiredState, MatchField, Report, decide, expand_comma_items,
    matches_all, or_wildcard, resolve_id,
};
use tfapi::{Client, Collection};

/// The per-type wiring of the shared driver.
pub struct Descriptor {
    /// Human label used in messages ("team", "SSH key", "OAuth client").
    pub label: &'static str,
    /// Plural label for listing messages ("teams", "SSH keys").
    pub plural: &'static str,
    /// Key under which the token is echoed in the report.
    pub param_key: &'static str,
    /// JSON:API type written into payloads.
    pub jsonapi_type: &'static str,
    /// Collection segment under the organization ("teams", "ssh-keys").
    pub collection: &'static str,
    /// Top-level segment for item paths ("teams", "ssh-keys").
    pub item: &'static str,
    /// Resolution order for supplied tokens.
    pub match_fields: &'static [MatchField],
    /// Whether update payloads carry the resource ID.
    pub id_in_update_payload: bool,
    /// Whether to re-read the resource after a present reconciliation.
    pub show_after_update: bool,
}

impl Descriptor {
    fn collection_path(&self, organization: &str) -> String {
        format!("organizations/{organization}/{}", self.collection)
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{id}", self.item)
    }
}

/// Reconcile one organization-scoped resource to the requested state.
pub fn ensure(
    client: &Client,
    ctx: &ApplyContext,
    desc: &Descriptor,
    state: DesiredState,
    organization: &str,
    token: Option<&str>,
    attributes: Option<Map<String, Value>>,
) -> Result<Report> {
    if state == DesiredState::Present && attributes.is_none() {
        bail!("Applying a {} requires --attributes", desc.label);
    }

    let organization = resolve_org_scope(client, organization);

    let mut report = Report::for_state(state);
    report.param("organization", organization.clone());
    if let Some(token) = token {
        report.param(desc.param_key, token);
    }
    if let Some(attributes) = &attributes {
        report.param("attributes", Value::Object(attributes.clone()));
    }

    let all = client
        .list(&desc.collection_path(&organization), &[])
        .with_context(|| {
            format!(
                "Unable to list {} in \"{organization}\" organization",
                desc.plural
            )
        })?;

    let existing = match token {
        Some(token) => {
            let resolved = resolve_id(desc.label, token, &all.data, desc.match_fields)?;
            if resolved.is_none() && state == DesiredState::Present {
                bail!(
                    "The supplied \"{token}\" {} does not exist in \"{organization}\" organization",
                    desc.label
                );
            }
            resolved
        }
        None => {
            let name = attributes
                .as_ref()
                .and_then(|a| a.get("name"))
                .and_then(Value::as_str);
            match name {
                Some(name) => {
                    resolve_id(desc.label, name, &all.data, &[MatchField::Attr("name")])?
                }
                None => None,
            }
        }
    };

    let label = token
        .map(String::from)
        .or_else(|| {
            attributes
                .as_ref()
                .and_then(|a| a.get("name"))
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_default();

    match (state, existing) {
        (DesiredState::Absent, Some(id)) => {
            ctx.apply(&mut report, || {
                let destroyed = client.destroy(&desc.item_path(&id)).with_context(|| {
                    format!(
                        "Unable to delete \"{label}\" {} in \"{organization}\" organization",
                        desc.label
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
                let payload = if desc.id_in_update_payload {
                    json!({
                        "data": {
                            "id": id,
                            "type": desc.jsonapi_type,
                            "attributes": attributes,
                        }
                    })
                } else {
                    json!({
                        "data": {
                            "type": desc.jsonapi_type,
                            "attributes": attributes,
                        }
                    })
                };
                ctx.apply(&mut report, || {
                    let updated =
                        client.update(&desc.item_path(&id), &payload).with_context(|| {
                            format!(
                                "Unable to update \"{label}\" {} in \"{organization}\" organization",
                                desc.label
                            )
                        })?;
                    Ok(serde_json::to_value(&updated)?)
                })?;
            }

            if desc.show_after_update {
                let shown = client.show(&desc.item_path(&id), None).with_context(|| {
                    format!(
                        "Unable to retrieve details on \"{label}\" {} in \"{organization}\" organization",
                        desc.label
                    )
                })?;
                report.json = serde_json::to_value(&shown)?;
            }
        }
        (DesiredState::Present, None) => {
            let Some(attributes) = attributes else {
                bail!("Applying a {} requires --attributes", desc.label);
            };
            if !attributes.contains_key("name") {
                bail!(
                    "`name` is required in --attributes when creating a new {}",
                    desc.label
                );
            }
            let payload = json!({
                "data": {
                    "type": desc.jsonapi_type,
                    "attributes": attributes,
                }
            });
            ctx.apply(&mut report, || {
                let created = client
                    .create(&desc.collection_path(&organization), &payload)
                    .with_context(|| {
                        format!(
                            "Unable to create \"{label}\" {} in \"{organization}\" organization",
                            desc.label
                        )
                    })?;
                Ok(serde_json::to_value(&created)?)
            })?;
        }
    }

    Ok(report)
}

/// List resources of one type, restricted to the supplied tokens.
pub fn list(
    client: &Client,
    desc: &Descriptor,
    organization: &str,
    names: &[String],
) -> Result<Collection> {
    let names = or_wildcard(expand_comma_items(names));
    let organization = resolve_org_scope(client, organization);

    let all = client
        .list(&desc.collection_path(&organization), &[])
        .with_context(|| {
            format!(
                "Unable to list {} in \"{organization}\" organization",
                desc.plural
            )
        })?;

    if matches_all(&names) {
        return Ok(all);
    }

    let mut selected = Collection::default();
    for token in &names {
        match resolve_id(desc.label, token, &all.data, desc.match_fields)? {
            Some(id) => {
                if let Some(found) = all.by_id(&id) {
                    selected.data.push(found.clone());
                }
            }
            None => ui::warn(&format!("{} \"{token}\" not found", desc.label)),
        }
    }

    Ok(selected)
}

/// Show one resource by token, fatal when it does not exist.
pub fn show(
    client: &Client,
    desc: &Descriptor,
    organization: &str,
    token: &str,
) -> Result<Collection> {
    let organization = resolve_org_scope(client, organization);

    let all = client
        .list(&desc.collection_path(&organization), &[])
        .with_context(|| {
            format!(
                "Unable to list {} in \"{organization}\" organization",
                desc.plural
            )
        })?;

    let Some(id) = resolve_id(desc.label, token, &all.data, desc.match_fields)? else {
        bail!(
            "The supplied \"{token}\" {} does not exist in \"{organization}\" organization",
            desc.label
        );
    };

    let shown = client.show(&desc.item_path(&id), None).with_context(|| {
        format!(
            "Unable to retrieve details on \"{token}\" {} in \"{organization}\" organization",
            desc.label
        )
    })?;

    Ok(Collection {
        data: vec![shown.data],
        included: shown.included,
        meta: None,
    })
}

/// Shared dispatch used by the thin per-resource command modules.
pub fn run_verb(
    client: &Client,
    ctx: &ApplyContext,
    desc: &Descriptor,
    verb: Verb,
    out: Output,
) -> Result<()> {
    match verb {
        Verb::Apply {
            organization,
            token,
            attributes,
        } => {
            let report = ensure(
                client,
                ctx,
                desc,
                DesiredState::Present,
                &organization,
                token.as_deref(),
                Some(attributes),
            )?;
            emit_report(&report, out, ctx.dry_run)
        }
        Verb::Delete {
            organization,
            token,
        } => {
            let report = ensure(
                client,
                ctx,
                desc,
                DesiredState::Absent,
                &organization,
                Some(&token),
                None,
            )?;
            emit_report(&report, out, ctx.dry_run)
        }
        Verb::Show {
            organization,
            token,
        } => {
            let collection = show(client, desc, &organization, &token)?;
            emit_collection(&collection)
        }
        Verb::List {
            organization,
            names,
        } => {
            let collection = list(client, desc, &organization, &names)?;
            emit_collection(&collection)
        }
    }
}

/// A normalized verb from the CLI layer.
pub enum Verb {
    Apply {
        organization: String,
        token: Option<String>,
        attributes: Map<String, Value>,
    },
    Delete {
        organization: String,
        token: String,
    },
    Show {
        organization: String,
        token: String,
    },
    List {
        organization: String,
        names: Vec<String>,
    },
}
