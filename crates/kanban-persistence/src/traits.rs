use async_trait::async_trait;
use kanban_core::KanbanResult;
use kanban_domain::{
    Card, CardId, CardQuery, MemberRole, ReorderUpdate, SessionUser, UserId, WorkspaceId,
};
use std::collections::HashSet;

/// Name of the column holding a card's manual rank.
pub const ORDER_COLUMN: &str = "sort_order";
/// Name of the table holding tag definitions.
pub const TAG_TABLE: &str = "tags";

/// Optional parts of the schema a store may or may not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// The ordering column exists and ranks can be read and written.
    pub ordering: bool,
    /// Tag tables exist and cards can be returned with their tags.
    pub tagging: bool,
}

impl StoreCapabilities {
    pub const FULL: Self = Self {
        ordering: true,
        tagging: true,
    };

    pub fn is_degraded(&self) -> bool {
        !self.ordering || !self.tagging
    }
}

impl Default for StoreCapabilities {
    fn default() -> Self {
        Self::FULL
    }
}

/// Which fields a reorder write touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Write both `status` and `order`.
    Full,
    /// Write `status` only; ranks are dropped.
    StatusOnly,
}

/// Resolves bearer tokens to users.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn resolve_session(&self, token: &str) -> KanbanResult<Option<SessionUser>>;
}

/// Workspace membership lookup.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Role of `user_id` in `workspace_id`, or `None` when not a member.
    async fn member_role(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> KanbanResult<Option<MemberRole>>;
}

/// Card reads and ordering writes.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Inspect the schema for optional columns and tables.
    async fn detect_capabilities(&self) -> KanbanResult<StoreCapabilities>;

    /// Subset of `ids` that are live cards of `workspace_id`.
    async fn existing_card_ids(
        &self,
        workspace_id: WorkspaceId,
        ids: &[CardId],
    ) -> KanbanResult<HashSet<CardId>>;

    /// Apply every update in one transaction. On any error nothing is written.
    ///
    /// Fails with `SchemaMissing` when `mode` is `Full` and the store has no
    /// ordering column.
    async fn apply_reorder(
        &self,
        workspace_id: WorkspaceId,
        updates: &[ReorderUpdate],
        mode: WriteMode,
    ) -> KanbanResult<()>;

    /// Live cards of a workspace matching `query`, in no particular order.
    ///
    /// With `read.ordering` off every card reports `order == 0`; with
    /// `read.tagging` off every card has no tags.
    async fn list_cards(
        &self,
        workspace_id: WorkspaceId,
        query: &CardQuery,
        read: StoreCapabilities,
    ) -> KanbanResult<Vec<Card>>;
}

/// Everything the board services need from a backend.
pub trait BoardStore: SessionStore + MembershipStore + CardStore {}

impl<T: SessionStore + MembershipStore + CardStore> BoardStore for T {}
