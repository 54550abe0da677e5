// ── Import file parsing ──
//
// Turns an uploaded CSV or XLSX file into ordered flat records keyed by
// header name. Parsing is all-or-nothing: any structural problem fails the
// whole file before a single request is made.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xlsx};
use indexmap::IndexMap;
use serde_json::{Value, json};

use crate::error::CoreError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            _ => None,
        }
    }

    /// XLSX files are ZIP containers; everything else is read as CSV.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            Self::Xlsx
        } else {
            Self::Csv
        }
    }

    pub fn detect(path: &Path, bytes: &[u8]) -> Self {
        Self::from_extension(path).unwrap_or_else(|| Self::sniff(bytes))
    }
}

/// One data row of an import file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based row number in the source file (the header is row 1).
    pub line: u64,
    pub values: IndexMap<String, Value>,
}

impl Record {
    pub fn new(line: u64, values: IndexMap<String, Value>) -> Self {
        Self { line, values }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    fn is_blank(&self) -> bool {
        self.values.values().all(crate::model::is_absent)
    }
}

pub fn parse_records(bytes: &[u8], format: FileFormat) -> Result<Vec<Record>, CoreError> {
    match format {
        FileFormat::Csv => parse_csv(bytes),
        FileFormat::Xlsx => parse_xlsx(bytes),
    }
}

// ── CSV ─────────────────────────────────────────────────────────────

fn parse_csv(bytes: &[u8]) -> Result<Vec<Record>, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(clean_header)
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(parse_error)?;
        let line = row.position().map_or(0, csv::Position::line);
        let values = headers
            .iter()
            .zip(row.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_owned())
                };
                (header.clone(), value)
            })
            .collect();
        let record = Record::new(line, values);
        if !record.is_blank() {
            records.push(record);
        }
    }
    Ok(records)
}

fn parse_error(e: csv::Error) -> CoreError {
    CoreError::Parse {
        message: e.to_string(),
    }
}

// ── XLSX ────────────────────────────────────────────────────────────

fn parse_xlsx(bytes: &[u8]) -> Result<Vec<Record>, CoreError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(|e| CoreError::Parse {
        message: format!("not a readable XLSX workbook: {e}"),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CoreError::Parse {
            message: "workbook has no worksheets".into(),
        })?
        .map_err(|e| CoreError::Parse {
            message: format!("failed to read first worksheet: {e}"),
        })?;

    let first_row = range.start().map_or(0, |(row, _)| row);
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| clean_header(&cell.to_string()))
        .collect();

    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        // +1 for 1-based numbering, +1 for the header row
        let line = u64::from(first_row) + u64::try_from(offset).unwrap_or(u64::MAX) + 2;
        let values = headers
            .iter()
            .zip(row.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell_to_value(cell)))
            .collect();
        let record = Record::new(line, values);
        if !record.is_blank() {
            records.push(record);
        }
    }
    Ok(records)
}

/// Convert a spreadsheet cell to JSON. Whole floats become integers, since
/// spreadsheets store every number as a float.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions, clippy::cast_precision_loss)]
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Int(i) => json!(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                json!(*f as i64)
            } else {
                json!(*f)
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => Value::String(dt.to_string()),
    }
}

fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn csv_records_keep_header_order() {
        let csv = "product_name,product_code\nLamp,LP-1\n\"Desk, oak\",DK-2\n";
        let records = parse_records(csv.as_bytes(), FileFormat::Csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].values.keys().collect::<Vec<_>>(),
            vec!["product_name", "product_code"]
        );
        assert_eq!(records[1].get("product_name"), Some(&json!("Desk, oak")));
        assert_eq!(records[1].line, 3);
    }

    #[test]
    fn header_only_file_has_no_records() {
        let records = parse_records(b"name,code\n", FileFormat::Csv).unwrap();
        assert!(records.is_empty());
        assert!(parse_records(b"", FileFormat::Csv).unwrap().is_empty());
    }

    #[test]
    fn blank_rows_are_skipped_and_empty_cells_are_null() {
        let records = parse_records(b"name,code\n,\nA,\n", FileFormat::Csv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("code"), Some(&Value::Null));
        assert_eq!(records[0].line, 3);
    }

    #[test]
    fn ragged_csv_fails_fast() {
        let err = parse_records(b"name,code\nA,1,extra\n", FileFormat::Csv).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn bom_is_stripped_from_first_header() {
        let records = parse_records("\u{feff}name\nA\n".as_bytes(), FileFormat::Csv).unwrap();
        assert_eq!(records[0].get("name"), Some(&json!("A")));
    }

    #[test]
    fn garbage_xlsx_is_a_parse_error() {
        let err = parse_records(b"PK\x03\x04 not really a zip", FileFormat::Xlsx).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn format_detection() {
        assert_eq!(
            FileFormat::detect(Path::new("products.XLSX"), b""),
            FileFormat::Xlsx
        );
        assert_eq!(
            FileFormat::detect(Path::new("upload.bin"), b"PK\x03\x04rest"),
            FileFormat::Xlsx
        );
        assert_eq!(
            FileFormat::detect(Path::new("upload"), b"name\nA\n"),
            FileFormat::Csv
        );
    }

    #[test]
    fn whole_floats_become_integers() {
        assert_eq!(cell_to_value(&Data::Float(3.0)), json!(3));
        assert_eq!(cell_to_value(&Data::Float(2.5)), json!(2.5));
        assert_eq!(cell_to_value(&Data::String("  ".into())), Value::Null);
    }
}
