//! Client-side owner of a board view.
//!
//! Drops are applied to the local [`BoardState`] immediately and persisted in
//! the background. Each submission resolves to a [`SyncEvent`] which the
//! owner collects on its own loop. A rejected or lost submission is never
//! patched up locally, the whole board is fetched again instead.

use std::sync::Arc;

use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::{
    apply_drag, BoardState, Card, CardId, DropTarget, ReorderRequest, ReorderUpdate, WorkspaceId,
};
use tokio::task::{JoinError, JoinSet};

use crate::api::BoardApi;

/// Result of a background reorder submission.
#[derive(Debug)]
pub enum SyncEvent {
    Confirmed { updates: usize, degraded: bool },
    Rejected { error: KanbanError },
}

/// What a drop did to the local board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropResult {
    /// The dragged card or the target is no longer on the board.
    Ignored,
    /// Nothing moved; no request was sent.
    Unchanged,
    /// The board changed locally and the updates were submitted.
    Submitted { updates: usize },
}

impl From<JoinError> for SyncEvent {
    fn from(err: JoinError) -> Self {
        SyncEvent::Rejected {
            error: KanbanError::Internal(format!("Reorder submission did not complete: {}", err)),
        }
    }
}

pub struct BoardSession {
    api: Arc<dyn BoardApi>,
    workspace_id: WorkspaceId,
    state: BoardState,
    ordering_degraded: bool,
    snapshot_degraded: bool,
    submissions: JoinSet<SyncEvent>,
}

impl BoardSession {
    /// An empty session. Call [`BoardSession::load`] before handling drops.
    pub fn new(api: Arc<dyn BoardApi>, workspace_id: WorkspaceId) -> Self {
        Self {
            api,
            workspace_id,
            state: BoardState::empty(),
            ordering_degraded: false,
            snapshot_degraded: false,
            submissions: JoinSet::new(),
        }
    }

    pub async fn open(api: Arc<dyn BoardApi>, workspace_id: WorkspaceId) -> KanbanResult<Self> {
        let mut session = Self::new(api, workspace_id);
        session.load().await?;
        Ok(session)
    }

    /// Replace the local board with the server's snapshot.
    pub async fn load(&mut self) -> KanbanResult<()> {
        let response = self.api.fetch_board(self.workspace_id).await?;
        self.snapshot_degraded = response.degraded;
        self.state = BoardState::from_cards(response.requirements);
        tracing::debug!(
            "Loaded {} card(s) for workspace {}",
            self.state.len(),
            self.workspace_id
        );
        Ok(())
    }

    /// Refetch after the local board is known to disagree with the server.
    pub async fn resync(&mut self) -> KanbanResult<()> {
        tracing::info!("Resynchronising board {}", self.workspace_id);
        self.load().await
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        self.workspace_id
    }

    /// A reorder was acknowledged without persisting ranks.
    pub fn ordering_degraded(&self) -> bool {
        self.ordering_degraded
    }

    /// The last snapshot was served with reduced fidelity.
    pub fn snapshot_degraded(&self) -> bool {
        self.snapshot_degraded
    }

    /// Submissions whose outcome has not been processed yet.
    pub fn in_flight(&self) -> usize {
        self.submissions.len()
    }

    /// Apply a drop locally and submit the resulting updates.
    ///
    /// Must be called from within a tokio runtime.
    pub fn handle_drop(&mut self, active_id: CardId, target: DropTarget) -> DropResult {
        let Some(outcome) = apply_drag(&self.state, active_id, target) else {
            tracing::debug!("Ignoring drop of {} onto stale target {}", active_id, target);
            return DropResult::Ignored;
        };

        self.state = outcome.next;
        if outcome.updates.is_empty() {
            return DropResult::Unchanged;
        }

        let updates = outcome.updates.len();
        self.submit(outcome.updates);
        DropResult::Submitted { updates }
    }

    fn submit(&mut self, updates: Vec<ReorderUpdate>) {
        let api = Arc::clone(&self.api);
        let request = ReorderRequest::new(self.workspace_id, updates);
        let count = request.updates.len();

        self.submissions.spawn(async move {
            match api.reorder(request).await {
                Ok(response) => SyncEvent::Confirmed {
                    updates: count,
                    degraded: response.degraded,
                },
                Err(error) => SyncEvent::Rejected { error },
            }
        });
    }

    /// Replace a card edited outside drag and drop.
    ///
    /// Returns false when the card is not on this board.
    pub fn apply_card_update(&mut self, card: Card) -> bool {
        self.state.replace_card(card)
    }

    /// Handle every outcome already received, resyncing once if any submission
    /// was rejected. Returns the number of events handled.
    pub async fn process_events(&mut self) -> KanbanResult<usize> {
        let mut handled = 0;
        let mut needs_resync = false;
        while let Some(outcome) = self.submissions.try_join_next() {
            needs_resync |= self.handle_event(outcome.unwrap_or_else(SyncEvent::from));
            handled += 1;
        }
        if needs_resync {
            self.resync().await?;
        }
        Ok(handled)
    }

    /// Wait for every in-flight submission, then behave like
    /// [`BoardSession::process_events`].
    pub async fn settle(&mut self) -> KanbanResult<usize> {
        let mut handled = 0;
        let mut needs_resync = false;
        while let Some(outcome) = self.submissions.join_next().await {
            needs_resync |= self.handle_event(outcome.unwrap_or_else(SyncEvent::from));
            handled += 1;
        }
        if needs_resync {
            self.resync().await?;
        }
        Ok(handled)
    }

    /// Returns true when the board must be refetched.
    fn handle_event(&mut self, event: SyncEvent) -> bool {
        match event {
            SyncEvent::Confirmed { updates, degraded } => {
                tracing::debug!("Server confirmed {} update(s)", updates);
                if degraded && !self.ordering_degraded {
                    tracing::warn!("Server stored statuses only; card ranks are not persisted");
                    self.ordering_degraded = true;
                }
                false
            }
            SyncEvent::Rejected { error } => {
                tracing::warn!("Reorder rejected: {}", error);
                true
            }
        }
    }
}

impl Drop for BoardSession {
    /// Pending submissions still reach the server; their outcomes are discarded.
    fn drop(&mut self) {
        self.submissions.detach_all();
    }
}
