// ── Action dispatcher ──
//
// Row intents (edit, delete, view, custom) coming from the actions column
// or a toolbar go through here. Destructive intents pause in a
// confirmation state; everything that reaches the backend ends in exactly
// one notification and, on success, exactly one collection refresh.
//
// State flow: Idle → Confirming → Submitting → Succeeded | Failed → Idle
//             Confirming → Cancelled → Idle
//
// Terminal states are published to subscribers, then replaced by `Idle`.

mod notification;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::backend::CollectionBackend;
use crate::error::CoreError;
use crate::model::{EntityId, Row};
use crate::selection::SelectionContext;
use crate::store::CollectionCache;

pub use notification::{Notification, NotificationLevel, Notifier};

// ── Intents ─────────────────────────────────────────────────────────

/// What the user asked to do with a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RowIntent {
    Edit,
    Delete,
    View,
    Custom(String),
}

impl RowIntent {
    pub fn label(&self) -> &str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::View => "view",
            Self::Custom(name) => name,
        }
    }

    /// Destructive intents need an explicit confirmation.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl From<String> for RowIntent {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "edit" => Self::Edit,
            "delete" => Self::Delete,
            "view" => Self::View,
            _ => Self::Custom(raw),
        }
    }
}

impl From<RowIntent> for String {
    fn from(intent: RowIntent) -> Self {
        intent.label().to_owned()
    }
}

impl fmt::Display for RowIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the caller (UI or CLI) has to do next for an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the user; answer with `confirm()` or `cancel()`.
    Confirm { prompt: String },
    /// Show an edit form; submit with `submit_edit()`.
    OpenEditor { row: Row },
    OpenViewer { row: Row },
    Custom { name: String, row: Row },
}

// ── State ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActionState {
    #[default]
    Idle,
    Confirming { intent: RowIntent, row: Row },
    Submitting { mutation: Mutation, id: Option<EntityId> },
    Succeeded { mutation: Mutation, id: Option<EntityId> },
    Failed {
        mutation: Mutation,
        id: Option<EntityId>,
        reason: String,
    },
    Cancelled,
}

impl ActionState {
    /// A confirmation or a submission is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Confirming { .. } | Self::Submitting { .. })
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Confirming { intent, row } => write!(f, "confirming {intent} of {}", row.id()),
            Self::Submitting { mutation, .. } => write!(f, "submitting {mutation}"),
            Self::Succeeded { mutation, .. } => write!(f, "{mutation} succeeded"),
            Self::Failed { mutation, reason, .. } => write!(f, "{mutation} failed: {reason}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

// ── Dispatcher ──────────────────────────────────────────────────────

pub struct ActionDispatcher<B> {
    cache: Arc<CollectionCache<B>>,
    selection: SelectionContext,
    notifier: Notifier,
    state: watch::Sender<ActionState>,
    /// Most recent terminal state (`Succeeded`, `Failed` or `Cancelled`).
    outcome: watch::Sender<Option<ActionState>>,
}

impl<B: CollectionBackend> ActionDispatcher<B> {
    pub fn new(cache: Arc<CollectionCache<B>>, selection: SelectionContext, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(ActionState::Idle);
        let (outcome, _) = watch::channel(None);
        Self {
            cache,
            selection,
            notifier,
            state,
            outcome,
        }
    }

    pub fn state(&self) -> ActionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ActionState> {
        self.state.subscribe()
    }

    /// How the last action ended. `state()` is back to `Idle` by then.
    pub fn last_outcome(&self) -> Option<ActionState> {
        self.outcome.borrow().clone()
    }

    /// Route an intent. Delete moves into the confirmation state; the other
    /// intents hand the row back to the caller.
    pub fn request(&self, intent: RowIntent, row: Row) -> Result<Effect, CoreError> {
        match intent {
            RowIntent::Delete => {
                let prompt = format!("Delete \"{}\"? This cannot be undone.", row.label());
                self.begin(ActionState::Confirming { intent, row })?;
                Ok(Effect::Confirm { prompt })
            }
            RowIntent::Edit => Ok(Effect::OpenEditor { row }),
            RowIntent::View => Ok(Effect::OpenViewer { row }),
            RowIntent::Custom(name) => Ok(Effect::Custom { name, row }),
        }
    }

    /// Carry out the intent awaiting confirmation.
    ///
    /// The outcome has already been turned into a notification when this
    /// returns; the `Err` is for callers that also need an exit status.
    pub async fn confirm(&self) -> Result<(), CoreError> {
        let mut pending = None;
        self.state.send_if_modified(|state| {
            if let ActionState::Confirming { row, .. } = state {
                let row = row.clone();
                *state = ActionState::Submitting {
                    mutation: Mutation::Delete,
                    id: Some(row.id().clone()),
                };
                pending = Some(row);
                true
            } else {
                false
            }
        });
        let row = pending.ok_or(CoreError::NothingToConfirm)?;
        self.execute_delete(row).await
    }

    /// Abandon the pending confirmation. Returns `false` if none was pending.
    pub fn cancel(&self) -> bool {
        let cancelled = self.state.send_if_modified(|state| {
            if matches!(state, ActionState::Confirming { .. }) {
                *state = ActionState::Cancelled;
                true
            } else {
                false
            }
        });
        if cancelled {
            self.settle(ActionState::Cancelled);
        }
        cancelled
    }

    /// Create a row from an add form (or any other single payload).
    pub async fn submit_create(&self, payload: &Value) -> Result<Row, CoreError> {
        self.begin(ActionState::Submitting {
            mutation: Mutation::Create,
            id: None,
        })?;

        match self.cache.backend().create(payload).await {
            Ok(row) => {
                info!(id = %row.id(), "row created");
                self.finish(Mutation::Create, Some(row.id().clone()), None);
                self.notifier
                    .send(Notification::success(format!("Created \"{}\"", row.label())));
                self.cache.refresh().await;
                Ok(row)
            }
            Err(e) => {
                warn!(error = %e, "create failed");
                self.finish(Mutation::Create, None, Some(&e));
                self.notifier
                    .send(Notification::error(format!("Could not create row: {}", e.reason())));
                Err(e)
            }
        }
    }

    /// Save an edit form for `id`.
    pub async fn submit_edit(&self, id: &EntityId, payload: &Value) -> Result<Row, CoreError> {
        self.begin(ActionState::Submitting {
            mutation: Mutation::Update,
            id: Some(id.clone()),
        })?;

        match self.cache.backend().update(id, payload).await {
            Ok(row) => {
                info!(%id, "row updated");
                self.finish(Mutation::Update, Some(id.clone()), None);
                self.notifier
                    .send(Notification::success(format!("Updated \"{}\"", row.label())));
                self.cache.refresh().await;
                Ok(row)
            }
            Err(e) => {
                warn!(%id, error = %e, "update failed");
                self.finish(Mutation::Update, Some(id.clone()), Some(&e));
                self.notifier
                    .send(Notification::error(format!("Could not update #{id}: {}", e.reason())));
                Err(e)
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn execute_delete(&self, row: Row) -> Result<(), CoreError> {
        let id = row.id().clone();
        match self.cache.backend().delete(&id).await {
            Ok(()) => {
                // Local removal lands before the refetch is triggered.
                self.cache.remove_local(&id);
                self.selection.remove(&id);
                info!(%id, "row deleted");
                self.finish(Mutation::Delete, Some(id), None);
                self.notifier
                    .send(Notification::success(format!("Deleted \"{}\"", row.label())));
                self.cache.refresh().await;
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "delete failed");
                self.finish(Mutation::Delete, Some(id), Some(&e));
                self.notifier.send(Notification::error(format!(
                    "Could not delete \"{}\": {}",
                    row.label(),
                    e.reason()
                )));
                Err(e)
            }
        }
    }

    /// Enter `next` unless another action is outstanding.
    fn begin(&self, next: ActionState) -> Result<(), CoreError> {
        let mut busy = None;
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                busy = Some(state.to_string());
                false
            } else {
                *state = next;
                true
            }
        });
        match busy {
            Some(state) => Err(CoreError::Busy { state }),
            None => Ok(()),
        }
    }

    fn finish(&self, mutation: Mutation, id: Option<EntityId>, error: Option<&CoreError>) {
        let next = match error {
            None => ActionState::Succeeded { mutation, id },
            Some(e) => ActionState::Failed {
                mutation,
                id,
                reason: e.reason(),
            },
        };
        self.state.send_replace(next.clone());
        self.settle(next);
    }

    fn settle(&self, terminal: ActionState) {
        self.outcome.send_replace(Some(terminal));
        self.state.send_replace(ActionState::Idle);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn intents_parse_from_config_strings() {
        assert_eq!(RowIntent::from("Delete".to_owned()), RowIntent::Delete);
        assert_eq!(
            RowIntent::from("duplicate".to_owned()),
            RowIntent::Custom("duplicate".into())
        );
        assert_eq!(String::from(RowIntent::View), "view");
    }

    #[test]
    fn only_delete_is_destructive() {
        assert!(RowIntent::Delete.is_destructive());
        assert!(!RowIntent::Edit.is_destructive());
        assert!(!RowIntent::Custom("archive".into()).is_destructive());
    }

    #[test]
    fn busy_states() {
        assert!(!ActionState::Idle.is_busy());
        assert!(!ActionState::Cancelled.is_busy());
        assert!(
            ActionState::Submitting {
                mutation: Mutation::Create,
                id: None
            }
            .is_busy()
        );
    }
}
