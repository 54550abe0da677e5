// gridline-api: Async client for paginated REST/JSON collections.
//
// One client per collection endpoint. List responses arrive wrapped in a
// `{ data: { <items>: [...], pagination: {...} } }` envelope; rows are kept
// as raw JSON objects so every entity type flows through the same code.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::CollectionClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{ListParams, ListResponse, PaginationResponse};
