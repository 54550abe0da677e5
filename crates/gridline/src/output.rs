//! Output formatting: table, JSON, CSV, plain.
//!
//! Tables come from the core's rendered `Grid`, so every front end shows
//! the same cells. Structured formats serialize the raw rows.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tokio::sync::mpsc;

use gridline_core::{
    Align, ExportLayout, Grid, GridBody, ImportReport, Notification, NotificationLevel, Pagination,
    Row, export_csv,
};

use crate::cli::OutputFormat;
use crate::error::CliError;

fn should_color() -> bool {
    io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render one loaded page. `grid` drives the table format; the others
/// use the raw rows.
pub fn render_page(
    format: OutputFormat,
    grid: &Grid,
    rows: &[Row],
    pagination: Pagination,
    layout: &ExportLayout,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_grid(grid)),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Page<'a> {
                items: &'a [Row],
                pagination: Pagination,
            }
            render_json(&Page {
                items: rows,
                pagination,
            })
        }
        OutputFormat::Csv => render_csv(rows, layout),
        OutputFormat::Plain => Ok(render_ids(rows)),
    }
}

/// Render a single row, e.g. the result of a create or update.
pub fn render_row(format: OutputFormat, row: &Row, layout: &ExportLayout) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_detail(row)),
        OutputFormat::Json => render_json(row),
        OutputFormat::Csv => render_csv(std::slice::from_ref(row), layout),
        OutputFormat::Plain => Ok(row.id().to_string()),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", output.trim_end_matches('\n'));
}

/// Print every queued notification to stderr. Errors and warnings are
/// shown even in quiet mode.
pub fn print_notifications(rx: &mut mpsc::UnboundedReceiver<Notification>, quiet: bool) {
    let color = should_color();
    let mut stderr = io::stderr().lock();
    while let Ok(note) = rx.try_recv() {
        let important = matches!(note.level, NotificationLevel::Error | NotificationLevel::Warning);
        if quiet && !important {
            continue;
        }
        let _ = writeln!(stderr, "{}", format_notification(&note, color));
    }
}

fn format_notification(note: &Notification, color: bool) -> String {
    let marker = match note.level {
        NotificationLevel::Success => "✓",
        NotificationLevel::Info => "·",
        NotificationLevel::Warning => "!",
        NotificationLevel::Error => "✗",
    };
    if !color {
        return format!("{marker} {}", note.message);
    }
    match note.level {
        NotificationLevel::Success => format!("{} {}", marker.green(), note.message),
        NotificationLevel::Info => format!("{} {}", marker.blue(), note.message),
        NotificationLevel::Warning => format!("{} {}", marker.yellow(), note.message.yellow()),
        NotificationLevel::Error => format!("{} {}", marker.red(), note.message.red()),
    }
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_grid(grid: &Grid) -> String {
    let rows = match &grid.body {
        GridBody::Loading => return "Loading...".into(),
        GridBody::Empty(message) => return message.clone(),
        GridBody::Failed(message) => return format!("Could not load rows: {message}"),
        GridBody::Rows(rows) => rows,
    };

    let mut builder = Builder::default();
    builder.push_record(grid.header.iter().map(|h| h.label.clone()));
    for row in rows {
        builder.push_record(row.cells.iter().map(ToString::to_string));
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    for (index, header) in grid.header.iter().enumerate() {
        match header.align {
            Align::Start => {}
            Align::Center => {
                table.modify(Columns::single(index), Alignment::center());
            }
            Align::End => {
                table.modify(Columns::single(index), Alignment::right());
            }
        }
    }
    table.to_string()
}

/// Two-column FIELD / VALUE view of one row.
fn render_detail(row: &Row) -> String {
    let mut builder = Builder::default();
    builder.push_record(["FIELD".to_owned(), "VALUE".to_owned()]);
    for (key, value) in row.fields() {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        builder.push_record([key.clone(), text]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Rejected import records as a LINE / REASON table.
pub fn render_rejections(report: &ImportReport) -> String {
    let mut builder = Builder::default();
    builder.push_record(["LINE".to_owned(), "REASON".to_owned()]);
    for outcome in report.rejected() {
        builder.push_record([
            outcome.line.to_string(),
            outcome.rejection().unwrap_or_default().to_owned(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

pub fn render_json<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(data)?)
}

fn render_csv(rows: &[Row], layout: &ExportLayout) -> Result<String, CliError> {
    let bytes = export_csv(rows, layout)?;
    String::from_utf8(bytes).map_err(|e| CliError::Api {
        message: format!("CSV output is not UTF-8: {e}"),
    })
}

fn render_ids(rows: &[Row]) -> String {
    rows.iter()
        .map(|r| r.id().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gridline_core::{
        CollectionState, Column, Footer, Query, RowSchema, SelectionState, TableSpec,
    };
    use serde_json::json;
    use std::sync::Arc;

    fn rows() -> Vec<Row> {
        vec![
            Row::from_value(json!({ "id": 1, "name": "Widget", "code": "W-1" })).unwrap(),
            Row::from_value(json!({ "id": 2, "name": "Gadget", "code": null })).unwrap(),
        ]
    }

    fn loaded(rows: Vec<Row>) -> CollectionState {
        CollectionState {
            rows: Arc::new(rows),
            pagination: Pagination {
                total: 2,
                total_pages: 1,
            },
            query: Some(Query::new(1, 10, None)),
            ..CollectionState::default()
        }
    }

    #[test]
    fn table_shows_headers_cells_and_placeholder() {
        let spec = TableSpec::new(
            vec![Column::text("name", "NAME"), Column::chip("code", "CODE", "code")],
            &RowSchema::open(),
        )
        .unwrap();
        let grid = spec.render(&loaded(rows()), &SelectionState::default(), "No rows");
        let out = render_grid(&grid);

        assert!(out.contains("NAME"));
        assert!(out.contains("Widget"));
        assert!(out.contains("[W-1]"));
        assert!(out.contains('—'));
        assert!(out.contains('╭'));
    }

    #[test]
    fn empty_grid_prints_the_message() {
        let grid = Grid {
            header: Vec::new(),
            body: GridBody::Empty("No products found".into()),
            busy: false,
            error: None,
            footer: Footer {
                shown: 0,
                total: 0,
                page: 1,
                total_pages: 0,
                skipped: 0,
            },
        };
        assert_eq!(render_grid(&grid), "No products found");
    }

    #[test]
    fn plain_lists_ids() {
        assert_eq!(render_ids(&rows()), "1\n2");
    }

    #[test]
    fn notifications_without_color_are_plain_text() {
        let note = Notification::error("Could not delete #4: gone");
        assert_eq!(format_notification(&note, false), "✗ Could not delete #4: gone");
    }
}
