//! Command dispatch: resolves config, mounts a table session over HTTP,
//! and hands it to the handler.

pub mod config_cmd;
pub mod export;
pub mod import;
pub mod list;
pub mod mutate;
pub mod util;

use std::sync::Arc;

use tokio::sync::mpsc;

use gridline_core::{FetchOutcome, HttpBackend, Notification, TableSession};

use crate::cli::{Command, GlobalOpts, PageArgs};
use crate::config::Resolved;
use crate::error::CliError;

pub type Session = TableSession<HttpBackend>;
pub type Notifications = mpsc::UnboundedReceiver<Notification>;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => list::handle(args, global).await,
        Command::Export(args) => export::handle(args, global).await,
        Command::Import(args) => import::handle(args, global).await,
        Command::Create(args) => mutate::create(args, global).await,
        Command::Update(args) => mutate::update(args, global).await,
        Command::Delete(args) => mutate::delete(args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

pub fn mount(resolved: Resolved) -> Result<(Session, Notifications), CliError> {
    let http = HttpBackend::new(&resolved.backend, &resolved.collection)?;
    Ok(TableSession::mount(
        Arc::new(http),
        &resolved.engine,
        resolved.collection,
    ))
}

/// Apply page flags to the query and load it. A page past the end falls
/// back to the last page.
pub async fn load_page(session: &mut Session, page: &PageArgs) -> Result<(), CliError> {
    let builder = session.query_builder();
    if let Some(limit) = page.limit {
        builder.set_limit(limit)?;
    }
    if let Some(ref search) = page.search {
        builder.set_search(search);
    }
    builder.set_page(page.page);

    match session.start().await {
        FetchOutcome::Applied | FetchOutcome::Unchanged => Ok(()),
        FetchOutcome::Failed(e) => Err(CliError::from_core(e, &session.collection().name)),
        outcome @ (FetchOutcome::Stale | FetchOutcome::Closed) => Err(CliError::Api {
            message: format!("page load did not complete ({outcome:?})"),
        }),
    }
}
