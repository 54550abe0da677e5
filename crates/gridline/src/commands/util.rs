//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde_json::Value;

use gridline_core::model::ID_FIELD;
use gridline_core::{Column, ExportLayout, Grid, RowSchema, TableSpec};

use crate::cli::PayloadArgs;
use crate::error::CliError;

use super::Session;

/// The collection's configured columns, or one text column per field seen
/// on the loaded page.
pub fn table_spec(session: &Session) -> Result<TableSpec, CliError> {
    let collection = session.collection();
    if !collection.columns.is_empty() {
        return Ok(collection.table_spec()?);
    }

    let rows = session.cache().rows();
    let mut fields = ExportLayout::Inferred.columns(&rows);
    if fields.is_empty() {
        fields.push(ID_FIELD.to_owned());
    }
    let columns = fields
        .into_iter()
        .map(|field| {
            let label = field.to_uppercase();
            Column::text(field, label)
        })
        .collect();
    Ok(TableSpec::new(columns, &RowSchema::open())?)
}

/// "8 of 8 products · page 1 of 1"
pub fn footer_line(session: &Session, grid: &Grid) -> String {
    format!(
        "{} · page {} of {}",
        session.footer_text(grid),
        grid.footer.page,
        grid.footer.page_count()
    )
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// JSON object from `--data` or `--from-file`.
pub fn read_payload(args: &PayloadArgs) -> Result<Value, CliError> {
    let value = match (&args.data, &args.from_file) {
        (Some(data), _) => serde_json::from_str(data)?,
        (None, Some(path)) => read_json_file(path)?,
        (None, None) => {
            return Err(CliError::Validation {
                field: "payload".into(),
                reason: "pass --data or --from-file".into(),
            });
        }
    };
    if !value.is_object() {
        return Err(CliError::Validation {
            field: "payload".into(),
            reason: "must be a JSON object".into(),
        });
    }
    Ok(value)
}

fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn payload_must_be_an_object() {
        let args = PayloadArgs {
            data: Some("[1, 2]".into()),
            from_file: None,
        };
        assert!(matches!(read_payload(&args), Err(CliError::Validation { .. })));
    }

    #[test]
    fn payload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("row.json");
        std::fs::write(&path, r#"{"product_name": "Widget"}"#).unwrap();
        let args = PayloadArgs {
            data: None,
            from_file: Some(path),
        };
        assert_eq!(read_payload(&args).unwrap()["product_name"], "Widget");
    }

    #[test]
    fn yes_flag_skips_the_prompt() {
        assert!(confirm("Delete \"#4\"?", "delete", true).unwrap());
    }
}
