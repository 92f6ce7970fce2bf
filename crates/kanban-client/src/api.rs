use async_trait::async_trait;
use kanban_core::KanbanResult;
use kanban_domain::{BoardResponse, ReorderRequest, ReorderResponse, WorkspaceId};

/// Transport to the board API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// Full board snapshot for a workspace, in board order.
    async fn fetch_board(&self, workspace_id: WorkspaceId) -> KanbanResult<BoardResponse>;

    async fn reorder(&self, request: ReorderRequest) -> KanbanResult<ReorderResponse>;
}
