//! Single-row mutations: `create`, `update`, `delete`.
//!
//! All three go through the session's action dispatcher, so the outcome is
//! reported with the same notifications an interactive table would show.

use gridline_core::{Effect, EntityId, Row, RowIntent};

use crate::cli::{CreateArgs, DeleteArgs, GlobalOpts, UpdateArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn create(args: CreateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let payload = util::read_payload(&args.payload)?;
    let (session, mut notifications) = super::mount(config::resolve(global, &args.collection)?)?;

    let result = session.dispatcher().submit_create(&payload).await;
    output::print_notifications(&mut notifications, global.quiet);
    let row = result.map_err(|e| CliError::from_core(e, &args.collection))?;

    let out = output::render_row(global.output, &row, &session.collection().export)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn update(args: UpdateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let payload = util::read_payload(&args.payload)?;
    let id = EntityId::from(args.id.as_str());
    let (session, mut notifications) = super::mount(config::resolve(global, &args.collection)?)?;

    let result = session.dispatcher().submit_edit(&id, &payload).await;
    output::print_notifications(&mut notifications, global.quiet);
    let row = result.map_err(|e| CliError::from_core(e, &args.collection))?;

    let out = output::render_row(global.output, &row, &session.collection().export)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn delete(args: DeleteArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (session, mut notifications) = super::mount(config::resolve(global, &args.collection)?)?;
    let dispatcher = session.dispatcher();

    let row = Row::from_id(EntityId::from(args.id.as_str()));
    if let Effect::Confirm { prompt } = dispatcher.request(RowIntent::Delete, row)? {
        if !util::confirm(&prompt, "delete", global.yes)? {
            dispatcher.cancel();
            if !global.quiet {
                eprintln!("Cancelled");
            }
            return Ok(());
        }
    }

    let result = dispatcher.confirm().await;
    output::print_notifications(&mut notifications, global.quiet);
    result.map_err(|e| CliError::from_core(e, &args.collection))
}
