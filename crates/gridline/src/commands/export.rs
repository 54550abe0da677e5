//! `gridline export`: CSV of the loaded page, or of the rows picked with
//! `--id`.

use std::io::Write;

use gridline_core::EntityId;

use crate::cli::{ExportArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;

pub async fn handle(args: ExportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (mut session, _notifications) = super::mount(config::resolve(global, &args.collection)?)?;
    super::load_page(&mut session, &args.page).await?;

    if !args.ids.is_empty() {
        // Matched on the displayed id, so `7` finds both numeric and string keys.
        let visible = session.selection().visible();
        let mut ids: Vec<EntityId> = Vec::with_capacity(args.ids.len());
        for wanted in &args.ids {
            let row = visible
                .iter()
                .find(|row| row.id().to_string() == *wanted)
                .ok_or_else(|| CliError::NotFound {
                    collection: session.collection().name.clone(),
                    identifier: wanted.clone(),
                })?;
            ids.push(row.id().clone());
        }
        session.selection().set_selected(ids);
    }

    let csv = session.export_selection()?;
    let count = session.selection().effective_rows().len();

    match args.out {
        Some(ref path) => {
            std::fs::write(path, &csv)?;
            if !global.quiet {
                eprintln!("Exported {count} rows to {}", path.display());
            }
        }
        None => std::io::stdout().lock().write_all(&csv)?,
    }
    Ok(())
}
