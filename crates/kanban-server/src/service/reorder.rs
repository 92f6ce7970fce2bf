use std::sync::Arc;

use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::{CardId, ReorderRequest, ReorderResponse, ReorderUpdate, SessionUser, WorkspaceId};
use kanban_persistence::{BoardStore, CapabilityFlags, WriteMode, ORDER_COLUMN};

use super::access::{require_access, Access};

/// Persists the rank and status changes produced by a drag.
///
/// Requests are validated, authorised and checked for existence before a
/// single atomic write. When the store cannot hold ranks, only statuses are
/// written and the response is flagged degraded.
pub struct ReorderService {
    store: Arc<dyn BoardStore>,
    capabilities: Arc<CapabilityFlags>,
}

impl ReorderService {
    pub fn new(store: Arc<dyn BoardStore>, capabilities: Arc<CapabilityFlags>) -> Self {
        Self {
            store,
            capabilities,
        }
    }

    pub async fn reorder(
        &self,
        user: &SessionUser,
        request: &ReorderRequest,
    ) -> KanbanResult<ReorderResponse> {
        request.validate()?;
        let workspace_id = request.workspace_id;
        require_access(self.store.as_ref(), workspace_id, user, Access::Edit).await?;

        let ids: Vec<CardId> = request.updates.iter().map(|u| u.id).collect();
        let found = self.store.existing_card_ids(workspace_id, &ids).await?;
        if found.len() < ids.len() {
            tracing::warn!(
                "Reorder in workspace {} references {} unknown requirement(s)",
                workspace_id,
                ids.len() - found.len()
            );
            return Err(KanbanError::NotFound("Requirement not found".to_string()));
        }

        let degraded = self.commit(workspace_id, &request.updates).await?;
        tracing::debug!(
            "User {} reordered {} requirement(s) in workspace {}{}",
            user.id,
            request.updates.len(),
            workspace_id,
            if degraded { " (status only)" } else { "" }
        );
        Ok(ReorderResponse::ok(degraded))
    }

    /// Returns true when ranks were not persisted.
    async fn commit(&self, workspace_id: WorkspaceId, updates: &[ReorderUpdate]) -> KanbanResult<bool> {
        if !self.capabilities.ordering() {
            self.store
                .apply_reorder(workspace_id, updates, WriteMode::StatusOnly)
                .await?;
            return Ok(true);
        }

        match self
            .store
            .apply_reorder(workspace_id, updates, WriteMode::Full)
            .await
        {
            Ok(()) => Ok(false),
            Err(err) if err.is_missing_column(ORDER_COLUMN) => {
                if self.capabilities.disable_ordering() {
                    tracing::warn!(
                        "Column {} is missing; switching to status-only reorders",
                        ORDER_COLUMN
                    );
                }
                self.store
                    .apply_reorder(workspace_id, updates, WriteMode::StatusOnly)
                    .await?;
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }
}
