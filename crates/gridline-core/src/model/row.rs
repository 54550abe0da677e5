// ── Row ──
//
// One record of a collection: an identifier plus its raw JSON fields.
// Entity shapes are heterogeneous, so fields stay untyped here and get
// interpreted by column render functions and import mappings.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::EntityId;
use crate::error::CoreError;

pub const ID_FIELD: &str = "id";

/// Field names tried, in order, when a row needs a human label.
const LABEL_FIELDS: &[&str] = &["name", "nameEn", "product_name", "title", "slug"];

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: EntityId,
    fields: Map<String, Value>,
}

impl Row {
    /// Build a row from a backend JSON object. The object must carry an `id`.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        let Value::Object(fields) = value else {
            return Err(CoreError::Internal(format!(
                "expected a JSON object for a row, got {value}"
            )));
        };
        let id = fields
            .get(ID_FIELD)
            .and_then(EntityId::from_json)
            .ok_or_else(|| CoreError::Internal("row has no usable `id` field".into()))?;
        Ok(Self { id, fields })
    }

    /// A row known only by identifier (e.g. a delete requested by id).
    pub fn from_id(id: EntityId) -> Self {
        let mut fields = Map::new();
        fields.insert(ID_FIELD.to_owned(), id_to_json(&id));
        Self { id, fields }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Raw lookup by dotted path (`"menu.nameEn"`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Lookup that treats JSON null and empty/blank strings as absent.
    ///
    /// The literal string `"null"` is data, not absence.
    pub fn present(&self, path: &str) -> Option<&Value> {
        self.get(path).filter(|value| !is_absent(value))
    }

    /// Present value rendered as display text.
    pub fn text(&self, path: &str) -> Option<String> {
        self.present(path).map(value_text)
    }

    /// Best-effort human label for prompts and notifications.
    pub fn label(&self) -> String {
        LABEL_FIELDS
            .iter()
            .find_map(|field| self.text(field))
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

pub(crate) fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Strings verbatim, everything else as compact JSON text.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn id_to_json(id: &EntityId) -> Value {
    match id {
        EntityId::Number(n) => Value::from(*n),
        other => Value::String(other.to_string()),
    }
}
