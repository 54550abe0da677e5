//! `gridline list`

use crate::cli::{GlobalOpts, ListArgs, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (mut session, mut notifications) = super::mount(config::resolve(global, &args.collection)?)?;
    super::load_page(&mut session, &args.page).await?;

    let spec = util::table_spec(&session)?;
    let spec = if args.actions {
        spec
    } else {
        spec.without_actions()
    };
    let grid = session.render(&spec);
    let state = session.cache().snapshot();

    let mut out = output::render_page(
        global.output,
        &grid,
        &state.rows,
        state.pagination,
        &session.collection().export,
    )?;
    if global.output == OutputFormat::Table && !grid.rows().is_empty() {
        out.push('\n');
        out.push_str(&util::footer_line(&session, &grid));
    }

    output::print_output(&out, global.quiet);
    output::print_notifications(&mut notifications, global.quiet);
    Ok(())
}
