// ── Data storage layer ──

mod collection;

pub use collection::{CollectionCache, CollectionState, FetchOutcome};
