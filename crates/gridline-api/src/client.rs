// Async HTTP client for one REST collection endpoint.
//
// Routes:
//   GET    {base}/{path}?page=&limit=&search=
//   POST   {base}/{path}
//   PUT    {base}/{path}/{id}
//   DELETE {base}/{path}/{id}

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{ListParams, ListResponse, unwrap_row};

const DEFAULT_ITEMS_KEY: &str = "items";

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for a single paginated collection.
#[derive(Debug, Clone)]
pub struct CollectionClient {
    http: reqwest::Client,
    collection_url: Url,
    items_key: String,
}

impl CollectionClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, a collection path, and transport settings.
    pub fn new(base_url: &str, path: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, path, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, path: &str, http: reqwest::Client) -> Result<Self, Error> {
        let collection_url = Self::collection_url(base_url, path)?;
        Ok(Self {
            http,
            collection_url,
            items_key: DEFAULT_ITEMS_KEY.to_owned(),
        })
    }

    /// Use an entity-specific key for the item array in list responses.
    pub fn with_items_key(mut self, items_key: impl Into<String>) -> Self {
        self.items_key = items_key.into();
        self
    }

    /// `https://host/api/` + `master-data/products` → `https://host/api/master-data/products`
    fn collection_url(raw: &str, path: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        let base = url.path().trim_end_matches('/').to_owned();
        let path = path.trim_matches('/');
        if path.is_empty() {
            url.set_path(&base);
        } else {
            url.set_path(&format!("{base}/{path}"));
        }
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    pub fn url(&self) -> &Url {
        &self.collection_url
    }

    pub fn items_key(&self) -> &str {
        &self.items_key
    }

    /// Append an identifier as a single, percent-encoded path segment.
    fn item_url(&self, id: &str) -> Result<Url, Error> {
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn delete_at(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            // 201/204 with an empty body still decodes as JSON null
            let text = if body.trim().is_empty() { "null" } else { body.as_str() };
            serde_json::from_str(text).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) => Error::Http {
                status: status.as_u16(),
                message: err
                    .message
                    .or(err.error)
                    .unwrap_or_else(|| status.to_string()),
                code: err.code,
            },
            Err(_) => Error::Http {
                status: status.as_u16(),
                message: if raw.trim().is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fetch one page of the collection.
    pub async fn list(&self, params: &ListParams) -> Result<ListResponse, Error> {
        let body: Value = self
            .get_with_params(self.collection_url.clone(), &params.to_query())
            .await?;
        ListResponse::from_envelope(body, &self.items_key)
    }

    /// Create a row. Returns the created row as echoed by the backend.
    pub async fn create(&self, payload: &Value) -> Result<Value, Error> {
        let body: Value = self.post(self.collection_url.clone(), payload).await?;
        Ok(unwrap_row(body))
    }

    /// Replace a row's editable fields.
    pub async fn update(&self, id: &str, payload: &Value) -> Result<Value, Error> {
        let body: Value = self.put(self.item_url(id)?, payload).await?;
        Ok(unwrap_row(body))
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.delete_at(self.item_url(id)?).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str, path: &str) -> CollectionClient {
        CollectionClient::from_reqwest(base, path, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn joins_base_and_path() {
        let c = client("https://admin.example.com/api/", "/master-data/other-products/");
        assert_eq!(
            c.url().as_str(),
            "https://admin.example.com/api/master-data/other-products"
        );
    }

    #[test]
    fn item_url_encodes_identifier() {
        let c = client("https://admin.example.com", "sub-menus");
        assert_eq!(
            c.item_url("a b/c").unwrap().as_str(),
            "https://admin.example.com/sub-menus/a%20b%2Fc"
        );
    }

    #[test]
    fn rejects_non_base_url() {
        let err = CollectionClient::from_reqwest("mailto:ops@example.com", "x", reqwest::Client::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
