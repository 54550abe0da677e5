// ── Backend seam ──
//
// The engine talks to its data source through `CollectionBackend`.
// `HttpBackend` adapts gridline-api's REST client; tests plug in an
// in-memory implementation.

use std::future::Future;

use serde_json::Value;
use tracing::warn;

use gridline_api::CollectionClient;

use crate::config::{BackendConfig, CollectionConfig};
use crate::error::CoreError;
use crate::model::{EntityId, Pagination, Query, Row};

/// One fetched page: rows in backend order plus pagination metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<Row>,
    pub pagination: Pagination,
    /// Items the backend returned without a usable identifier. They are
    /// still counted in `pagination.total`.
    pub skipped: usize,
}

/// Async CRUD over a single paginated collection.
pub trait CollectionBackend: Send + Sync {
    fn list(&self, query: &Query) -> impl Future<Output = Result<Page, CoreError>> + Send;

    fn create(&self, payload: &Value) -> impl Future<Output = Result<Row, CoreError>> + Send;

    fn update(
        &self,
        id: &EntityId,
        payload: &Value,
    ) -> impl Future<Output = Result<Row, CoreError>> + Send;

    fn delete(&self, id: &EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;
}

// ── HTTP implementation ─────────────────────────────────────────────

/// `CollectionBackend` over a REST/JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: CollectionClient,
}

impl HttpBackend {
    pub fn new(backend: &BackendConfig, collection: &CollectionConfig) -> Result<Self, CoreError> {
        let client = CollectionClient::new(
            backend.base_url.as_str(),
            &collection.path,
            &backend.transport(),
        )?
        .with_items_key(collection.items_key.clone());
        Ok(Self { client })
    }

    pub fn from_client(client: CollectionClient) -> Self {
        Self { client }
    }

    /// A mutation response without an identifier still counts as success;
    /// the row is rebuilt from what we sent.
    fn echoed_row(response: Value, payload: &Value, id: Option<&EntityId>) -> Result<Row, CoreError> {
        if let Ok(row) = Row::from_value(response) {
            return Ok(row);
        }
        let mut merged = payload.clone();
        if let (Some(id), Value::Object(map)) = (id, &mut merged) {
            map.insert(crate::model::ID_FIELD.into(), Value::String(id.to_string()));
        }
        Row::from_value(merged).or_else(|_| match id {
            Some(id) => Ok(Row::from_id(id.clone())),
            None => Err(CoreError::Internal(
                "backend accepted the row but returned no identifier".into(),
            )),
        })
    }
}

impl CollectionBackend for HttpBackend {
    async fn list(&self, query: &Query) -> Result<Page, CoreError> {
        let response = self.client.list(&query.params()).await?;
        let mut rows = Vec::with_capacity(response.items.len());
        let mut skipped = 0;
        for item in response.items {
            match Row::from_value(item) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warn!(error = %e, "skipping row without identifier");
                    skipped += 1;
                }
            }
        }
        Ok(Page {
            rows,
            pagination: response.pagination.into(),
            skipped,
        })
    }

    async fn create(&self, payload: &Value) -> Result<Row, CoreError> {
        let response = self.client.create(payload).await?;
        Self::echoed_row(response, payload, None)
    }

    async fn update(&self, id: &EntityId, payload: &Value) -> Result<Row, CoreError> {
        let response = self.client.update(&id.as_path_segment(), payload).await?;
        Self::echoed_row(response, payload, Some(id))
    }

    async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        self.client.delete(&id.as_path_segment()).await?;
        Ok(())
    }
}
