// ── Record → create payload mapping ──
//
// Entity-specific configuration that says which spreadsheet column feeds
// which payload field and how to coerce it. A record that cannot be mapped
// is rejected on its own; it never reaches the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::parse::Record;
use crate::model::{is_absent, value_text};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
    Number,
    Boolean,
}

/// One column-to-field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Header name in the import file.
    pub column: String,
    /// Payload field name; defaults to the column name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldMapping {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            field: None,
            kind: FieldKind::Text,
            required: false,
        }
    }

    pub fn rename(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn field_name(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.column)
    }
}

/// Mapping for a whole collection. With no field rules, every column is
/// passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportMapping {
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
    /// Fields added to every payload (e.g. `status = 1`).
    #[serde(default)]
    pub constants: Map<String, Value>,
}

impl ImportMapping {
    pub fn new(fields: Vec<FieldMapping>) -> Self {
        Self {
            fields,
            constants: Map::new(),
        }
    }

    pub fn with_constant(mut self, field: impl Into<String>, value: Value) -> Self {
        self.constants.insert(field.into(), value);
        self
    }

    /// Build the create payload for one record, or the reason it was rejected.
    pub fn map(&self, record: &Record) -> Result<Value, String> {
        let mut payload = Map::new();

        if self.fields.is_empty() {
            for (column, value) in &record.values {
                if !is_absent(value) {
                    payload.insert(column.clone(), value.clone());
                }
            }
        }

        for rule in &self.fields {
            let value = record.get(&rule.column).filter(|v| !is_absent(v));
            match value {
                Some(value) => {
                    let coerced = coerce(value, rule.kind)
                        .map_err(|expected| format!("column `{}`: expected {expected}, got {value}", rule.column))?;
                    payload.insert(rule.field_name().to_owned(), coerced);
                }
                None if rule.required => {
                    return Err(format!("missing required column `{}`", rule.column));
                }
                None => {}
            }
        }

        for (field, value) in &self.constants {
            payload.insert(field.clone(), value.clone());
        }

        Ok(Value::Object(payload))
    }
}

fn coerce(value: &Value, kind: FieldKind) -> Result<Value, &'static str> {
    match kind {
        FieldKind::Text => Ok(Value::String(value_text(value).trim().to_owned())),
        FieldKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .and_then(|f| format!("{f:.0}").parse::<i64>().ok())
                .map(Value::from)
                .ok_or("an integer"),
            Value::String(s) => s.trim().parse::<i64>().map(Value::from).map_err(|_| "an integer"),
            _ => Err("an integer"),
        },
        FieldKind::Number => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or("a number"),
            _ => Err("a number"),
        },
        FieldKind::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err("a boolean"),
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "n" | "0" => Ok(Value::Bool(false)),
                _ => Err("a boolean"),
            },
            _ => Err("a boolean"),
        },
    }
}
