//! Team reconciliation.

use anyhow::Result;

use super::org_resource::{Descriptor, Verb, run_verb};
use super::{Output, parse_attributes};
use crate::cli::TeamCommand;
use converge::{ApplyContext, MatchField};
use tfapi::Client;

pub const DESCRIPTOR: Descriptor = Descriptor {
    label: "team",
    plural: "teams",
    param_key: "team",
    jsonapi_type: "teams",
    collection: "teams",
    item: "teams",
    match_fields: &[MatchField::Attr("name"), MatchField::Id],
    id_in_update_payload: false,
    show_after_update: false,
};

pub fn run(client: &Client, ctx: &ApplyContext, cmd: TeamCommand, out: Output) -> Result<()> {
    let verb = match cmd {
        TeamCommand::Apply {
            organization,
            team,
            attributes,
        } => Verb::Apply {
            organization,
            token: team,
            attributes: parse_attributes(&attributes)?,
        },
        TeamCommand::Delete { organization, team } => Verb::Delete {
            organization,
            token: team,
        },
        TeamCommand::List {
            organization,
            names,
        } => Verb::List {
            organization,
            names,
        },
    };
    run_verb(client, ctx, &DESCRIPTOR, verb, out)
}
