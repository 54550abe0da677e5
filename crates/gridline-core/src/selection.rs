// ── Selection context ──
//
// Explicitly scoped shared state for one table instance: the set of
// selected row ids plus the rows currently visible. Any number of handles
// (table, bulk toolbars, action dispatcher) clone the same context.
//
// Writers: the table owns toggles, the cache owns the visible rows, the
// action dispatcher owns removal-on-delete.

use std::sync::Arc;

use indexmap::IndexSet;
use tokio::sync::watch;

use crate::model::{EntityId, Row};

/// Snapshot published to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    selected: IndexSet<EntityId>,
    visible: Arc<Vec<Row>>,
}

impl SelectionState {
    /// Selected ids in the order they were selected.
    pub fn selected(&self) -> &IndexSet<EntityId> {
        &self.selected
    }

    pub fn visible(&self) -> &[Row] {
        &self.visible
    }

    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.selected.contains(id)
    }

    /// Rows a bulk action should apply to: the selected visible rows, or
    /// every visible row when nothing is selected.
    pub fn effective_rows(&self) -> Vec<Row> {
        if self.selected.is_empty() {
            return self.visible.to_vec();
        }
        self.visible
            .iter()
            .filter(|row| self.selected.contains(row.id()))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct SelectionContext {
    state: Arc<watch::Sender<SelectionState>>,
}

impl SelectionContext {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SelectionState::default());
        Self {
            state: Arc::new(state),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SelectionState {
        self.state.borrow().clone()
    }

    pub fn selected(&self) -> IndexSet<EntityId> {
        self.state.borrow().selected.clone()
    }

    pub fn visible(&self) -> Arc<Vec<Row>> {
        Arc::clone(&self.state.borrow().visible)
    }

    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.state.borrow().is_selected(id)
    }

    pub fn effective_rows(&self) -> Vec<Row> {
        self.state.borrow().effective_rows()
    }

    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.state.subscribe()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace the whole selection.
    pub fn set_selected(&self, ids: impl IntoIterator<Item = EntityId>) {
        let ids: IndexSet<EntityId> = ids.into_iter().collect();
        self.state.send_if_modified(|state| {
            if state.selected == ids {
                return false;
            }
            state.selected = ids;
            true
        });
    }

    pub fn select(&self, id: EntityId) -> bool {
        self.state.send_if_modified(|state| state.selected.insert(id))
    }

    pub fn deselect(&self, id: &EntityId) -> bool {
        self.state
            .send_if_modified(|state| state.selected.shift_remove(id))
    }

    /// Flip one row. Returns whether it is selected afterwards.
    pub fn toggle(&self, id: EntityId) -> bool {
        let mut now_selected = false;
        self.state.send_modify(|state| {
            if !state.selected.shift_remove(&id) {
                state.selected.insert(id);
                now_selected = true;
            }
        });
        now_selected
    }

    pub fn select_all_visible(&self) {
        self.state.send_if_modified(|state| {
            let before = state.selected.len();
            let ids: Vec<EntityId> = state.visible.iter().map(|row| row.id().clone()).collect();
            state.selected.extend(ids);
            state.selected.len() != before
        });
    }

    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            if state.selected.is_empty() {
                return false;
            }
            state.selected.clear();
            true
        });
    }

    /// Drop an id that no longer exists (deleted row).
    pub fn remove(&self, id: &EntityId) -> bool {
        self.deselect(id)
    }

    /// Keep only ids present in `ids`.
    pub fn prune_to<'a>(&self, ids: impl IntoIterator<Item = &'a EntityId>) {
        let keep: IndexSet<&EntityId> = ids.into_iter().collect();
        self.state.send_if_modified(|state| {
            let before = state.selected.len();
            state.selected.retain(|id| keep.contains(id));
            state.selected.len() != before
        });
    }

    /// Publish the rows the table currently shows.
    pub fn set_visible(&self, rows: Arc<Vec<Row>>) {
        self.state.send_modify(|state| state.visible = rows);
    }
}

impl Default for SelectionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows(ids: &[i64]) -> Arc<Vec<Row>> {
        Arc::new(
            ids.iter()
                .map(|id| Row::from_value(json!({ "id": id })).unwrap())
                .collect(),
        )
    }

    fn id(n: i64) -> EntityId {
        EntityId::Number(n)
    }

    #[test]
    fn handles_share_state() {
        let table = SelectionContext::new();
        let toolbar = table.clone();
        table.select(id(1));
        assert!(toolbar.is_selected(&id(1)));
    }

    #[test]
    fn toggle_flips_membership() {
        let ctx = SelectionContext::new();
        assert!(ctx.toggle(id(2)));
        assert!(!ctx.toggle(id(2)));
        assert!(ctx.selected().is_empty());
    }

    #[test]
    fn empty_selection_means_all_visible() {
        let ctx = SelectionContext::new();
        ctx.set_visible(rows(&[1, 2, 3]));
        assert_eq!(ctx.effective_rows().len(), 3);

        ctx.select(id(2));
        let effective = ctx.effective_rows();
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].id(), &id(2));
    }

    #[test]
    fn select_all_visible_and_clear() {
        let ctx = SelectionContext::new();
        ctx.set_visible(rows(&[1, 2]));
        ctx.select_all_visible();
        assert_eq!(ctx.selected().len(), 2);
        ctx.clear();
        assert!(ctx.selected().is_empty());
    }

    #[test]
    fn prune_drops_missing_ids() {
        let ctx = SelectionContext::new();
        ctx.set_selected([id(1), id(2), id(3)]);
        let keep = [id(3), id(9)];
        ctx.prune_to(keep.iter());
        assert_eq!(ctx.selected().into_iter().collect::<Vec<_>>(), vec![id(3)]);
    }

    #[test]
    fn subscribers_see_changes() {
        let ctx = SelectionContext::new();
        let mut rx = ctx.subscribe();
        rx.mark_unchanged();
        ctx.select(id(1));
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();
        ctx.select(id(1));
        assert!(!rx.has_changed().unwrap());
    }
}
