// ── Table presentation ──
//
// Column descriptors, their rendered cell values, and the grid a front
// end draws from cache + selection state.

mod cell;
mod column;
mod grid;

pub use cell::{Cell, PLACEHOLDER};
pub use column::{Align, Column, ColumnConfig, ColumnKind, ColumnType, RenderFn, RowSchema, TextFormat};
pub use grid::{Footer, Grid, GridBody, GridRow, HeaderCell, TableSpec};
