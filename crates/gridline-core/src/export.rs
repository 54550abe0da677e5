// ── Export serializer ──
//
// Writes the rows currently loaded in a collection (one page, not the
// whole remote dataset) as CSV. Exports raw field values; column renderers
// are never applied.
//
// Null, missing and empty-string fields all export as an empty cell, and
// the importer reads an empty cell back as null. A `""` value does not
// survive an export/import round trip.

use std::io::Write;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{ID_FIELD, Row, value_text};

/// Which fields become columns, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportLayout {
    /// Exactly these fields (dotted paths allowed).
    Fields(Vec<String>),
    /// `id`, then every other field in first-seen order.
    #[default]
    Inferred,
}

impl ExportLayout {
    pub fn columns(&self, rows: &[Row]) -> Vec<String> {
        match self {
            Self::Fields(fields) => fields.clone(),
            Self::Inferred => {
                let mut columns: IndexSet<String> = IndexSet::new();
                columns.insert(ID_FIELD.to_owned());
                for row in rows {
                    for key in row.fields().keys() {
                        if !columns.contains(key) {
                            columns.insert(key.clone());
                        }
                    }
                }
                columns.into_iter().collect()
            }
        }
    }
}

/// Serialize `rows` to CSV bytes.
pub fn export_csv(rows: &[Row], layout: &ExportLayout) -> Result<Vec<u8>, CoreError> {
    let mut out = Vec::new();
    write_csv(&mut out, rows, layout)?;
    Ok(out)
}

/// Serialize `rows` as CSV into any writer (file, stdout, buffer).
pub fn write_csv<W: Write>(writer: W, rows: &[Row], layout: &ExportLayout) -> Result<(), CoreError> {
    let columns = layout.columns(rows);
    if columns.is_empty() {
        return Err(CoreError::InvalidTable {
            message: "export needs at least one column".into(),
        });
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&columns).map_err(write_error)?;
    for row in rows {
        csv.write_record(columns.iter().map(|column| cell(row, column)))
            .map_err(write_error)?;
    }
    csv.flush().map_err(|e| CoreError::Internal(format!("export flush failed: {e}")))?;

    debug!(rows = rows.len(), columns = columns.len(), "export written");
    Ok(())
}

fn cell(row: &Row, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(value) => value_text(value),
    }
}

fn write_error(e: csv::Error) -> CoreError {
    CoreError::Internal(format!("export failed: {e}"))
}
