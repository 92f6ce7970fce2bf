use std::sync::Arc;

use kanban_core::config::MAX_PAGE_SIZE;
use kanban_core::{KanbanResult, PageInfo, PageRequest};
use kanban_domain::{
    BoardResponse, BoardView, Card, CardQuery, SessionUser, SortChain, WorkspaceId,
};
use kanban_persistence::{BoardStore, CapabilityFlags, StoreCapabilities, ORDER_COLUMN, TAG_TABLE};

use super::access::{require_access, Access};

/// Parameters of a board or list read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardFetchRequest {
    pub workspace_id: WorkspaceId,
    pub query: CardQuery,
    pub view: BoardView,
    /// 1-indexed; list view only.
    pub page: Option<u32>,
    /// List view only.
    pub page_size: Option<u32>,
}

impl BoardFetchRequest {
    pub fn board(workspace_id: WorkspaceId) -> Self {
        Self {
            workspace_id,
            query: CardQuery::default(),
            view: BoardView::Board,
            page: None,
            page_size: None,
        }
    }
}

/// Serves a workspace's cards sorted for the board or for the list view.
pub struct BoardFetchService {
    store: Arc<dyn BoardStore>,
    capabilities: Arc<CapabilityFlags>,
    default_page_size: u32,
}

impl BoardFetchService {
    pub fn new(
        store: Arc<dyn BoardStore>,
        capabilities: Arc<CapabilityFlags>,
        default_page_size: u32,
    ) -> Self {
        Self {
            store,
            capabilities,
            default_page_size,
        }
    }

    pub async fn fetch(
        &self,
        user: &SessionUser,
        request: &BoardFetchRequest,
    ) -> KanbanResult<BoardResponse> {
        require_access(self.store.as_ref(), request.workspace_id, user, Access::View).await?;

        let (mut cards, read) = self.read_cards(request.workspace_id, &request.query).await?;

        let (requirements, pagination) = match request.view {
            BoardView::Board => {
                SortChain::board(read.ordering).sort(&mut cards);
                let info = PageInfo::single(cards.len());
                (cards, info)
            }
            BoardView::List => {
                SortChain::list().sort(&mut cards);
                let page = PageRequest::new(
                    request.page.unwrap_or(1),
                    request.page_size.unwrap_or(self.default_page_size),
                    MAX_PAGE_SIZE,
                );
                page.apply(cards)
            }
        };

        Ok(BoardResponse {
            requirements,
            degraded: read.is_degraded(),
            pagination,
        })
    }

    /// Read with the current capabilities, switching a capability off and
    /// reading again if the store reports it missing.
    async fn read_cards(
        &self,
        workspace_id: WorkspaceId,
        query: &CardQuery,
    ) -> KanbanResult<(Vec<Card>, StoreCapabilities)> {
        loop {
            let read = self.capabilities.snapshot();
            match self.store.list_cards(workspace_id, query, read).await {
                Ok(cards) => return Ok((cards, read)),
                Err(err) if read.ordering && err.is_missing_column(ORDER_COLUMN) => {
                    if self.capabilities.disable_ordering() {
                        tracing::warn!(
                            "Column {} is missing; serving boards without ranks",
                            ORDER_COLUMN
                        );
                    }
                }
                Err(err) if read.tagging && err.is_missing_column(TAG_TABLE) => {
                    if self.capabilities.disable_tagging() {
                        tracing::warn!("Tag tables are missing; serving cards without tags");
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}
