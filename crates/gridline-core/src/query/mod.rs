// ── Query building ──

mod builder;
mod debounce;

pub use builder::QueryBuilder;
pub use debounce::Debouncer;
