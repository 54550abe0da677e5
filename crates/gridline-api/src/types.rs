// Wire types for collection endpoints.
//
// Rows stay as raw JSON objects; only the envelope and pagination block
// have a fixed shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// Query-string parameters for a list request.
///
/// `search` is omitted from the query string entirely when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListParams {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params
    }
}

/// Pagination block returned alongside a page of items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u64,
}

/// One decoded page of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResponse {
    pub items: Vec<Value>,
    pub pagination: PaginationResponse,
}

impl ListResponse {
    /// Unwrap `{ data: { <items_key>: [...], pagination: {...} } }`.
    ///
    /// A body without the `data` wrapper is read from the top level instead.
    /// A missing pagination block is derived from the item count.
    pub fn from_envelope(body: Value, items_key: &str) -> Result<Self, Error> {
        let Value::Object(mut root) = body else {
            return Err(Error::Envelope("response body is not a JSON object".into()));
        };
        let mut payload = match root.remove("data") {
            Some(Value::Object(data)) => data,
            Some(_) | None => root,
        };

        let items = match payload.remove(items_key) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(Error::Envelope(format!(
                    "`{items_key}` is not an array (found {})",
                    json_kind(&other)
                )));
            }
        };

        let pagination = match payload.remove("pagination") {
            Some(raw @ Value::Object(_)) => serde_json::from_value(raw).map_err(|e| {
                Error::Envelope(format!("invalid pagination block: {e}"))
            })?,
            _ => {
                let total = u64::try_from(items.len()).unwrap_or(u64::MAX);
                PaginationResponse {
                    total,
                    total_pages: u64::from(total > 0),
                }
            }
        };

        Ok(Self { items, pagination })
    }
}

/// Unwrap a single-row mutation response: either the bare row or `{ data: row }`.
pub(crate) fn unwrap_row(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.len() <= 3 && map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
