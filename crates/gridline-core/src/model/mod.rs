// ── Domain model ──
//
// Collection-agnostic value types shared by every engine component.

mod entity_id;
mod link;
mod query;
mod row;

pub use entity_id::EntityId;
pub use link::LinkTarget;
pub use query::{Pagination, Query, normalize_search};
pub use row::{ID_FIELD, Row};

pub(crate) use row::{is_absent, value_text};
