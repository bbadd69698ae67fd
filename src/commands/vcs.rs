//! VCS connection (OAuth client) reconciliation.
//!
//! OAuth client names are not unique, so tokens are matched against the
//! ID first and a name that matches several clients is rejected. After a
//! present reconciliation the client is re-read so the report carries the
//! connection including its OAuth token relationship.

use anyhow::Result;

use super::org_resource::{Descriptor, Verb, run_verb};
use super::{Output, parse_attributes};
use crate::cli::VcsCommand;
use converge::{ApplyContext, MatchField};
use tfapi::Client;

pub const DESCRIPTOR: Descriptor = Descriptor {
    label: "OAuth client",
    plural: "OAuth clients",
    param_key: "client",
    jsonapi_type: "oauth-clients",
    collection: "oauth-clients",
    item: "oauth-clients",
    match_fields: &[MatchField::Id, MatchField::Attr("name")],
    id_in_update_payload: true,
    show_after_update: true,
};

pub fn run(client: &Client, ctx: &ApplyContext, cmd: VcsCommand, out: Output) -> Result<()> {
    let verb = match cmd {
        VcsCommand::Apply {
            organization,
            client: token,
            attributes,
        } => Verb::Apply {
            organization,
            token,
            attributes: parse_attributes(&attributes)?,
        },
        VcsCommand::Delete {
            organization,
            client: token,
        } => Verb::Delete {
            organization,
            token,
        },
        VcsCommand::Show {
            organization,
            client: token,
        } => Verb::Show {
            organization,
            token,
        },
        VcsCommand::List {
            organization,
            names,
        } => Verb::List {
            organization,
            names,
        },
    };
    run_verb(client, ctx, &DESCRIPTOR, verb, out)
}
