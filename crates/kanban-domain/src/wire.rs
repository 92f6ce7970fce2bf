//! Request and response bodies shared by the HTTP service and its clients.

use kanban_core::{KanbanError, KanbanResult, PageInfo};
use serde::{Deserialize, Serialize};

use crate::{Card, ReorderUpdate, WorkspaceId};

pub const MAX_REORDER_UPDATES: usize = 500;
pub const MAX_ORDER: u32 = 1_000_000;

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub workspace_id: WorkspaceId,
    pub updates: Vec<ReorderUpdate>,
}

impl ReorderRequest {
    pub fn new(workspace_id: WorkspaceId, updates: Vec<ReorderUpdate>) -> Self {
        Self {
            workspace_id,
            updates,
        }
    }

    /// Shape checks that do not need the store: 1..=500 entries and ranks
    /// within bounds. Repeated ids are left to the existence check.
    pub fn validate(&self) -> KanbanResult<()> {
        if self.updates.is_empty() || self.updates.len() > MAX_REORDER_UPDATES {
            return Err(KanbanError::Validation(format!(
                "Expected 1 to {} updates, got {}",
                MAX_REORDER_UPDATES,
                self.updates.len()
            )));
        }

        for update in &self.updates {
            if update.order > MAX_ORDER {
                return Err(KanbanError::Validation(format!(
                    "Order {} for {} exceeds {}",
                    update.order, update.id, MAX_ORDER
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderResponse {
    pub success: bool,
    /// Set when only statuses were persisted; ranks were dropped.
    #[serde(default, skip_serializing_if = "is_false")]
    pub degraded: bool,
}

impl ReorderResponse {
    pub fn ok(degraded: bool) -> Self {
        Self {
            success: true,
            degraded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardResponse {
    pub requirements: Vec<Card>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub degraded: bool,
    pub pagination: PageInfo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardView {
    #[default]
    List,
    Board,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
