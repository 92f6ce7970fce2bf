use crate::traits::{
    CardStore, MembershipStore, SessionStore, StoreCapabilities, WriteMode, ORDER_COLUMN,
    TAG_TABLE,
};
use async_trait::async_trait;
use chrono::Utc;
use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::{
    Card, CardFilter, CardId, CardQuery, MemberRole, ReorderUpdate, SessionUser, UserId,
    WorkspaceId,
};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct StoredCard {
    card: Card,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct MemoryData {
    schema: StoreCapabilities,
    users: HashMap<UserId, SessionUser>,
    sessions: HashMap<String, UserId>,
    members: HashMap<(WorkspaceId, UserId), MemberRole>,
    cards: HashMap<CardId, StoredCard>,
    /// Fail a reorder once this many rows have been written.
    fail_writes_after: Option<usize>,
}

/// Store kept entirely in memory.
///
/// Writes go to a copy of the data that replaces the original only when
/// every update succeeded, so a failed reorder leaves nothing behind.
pub struct InMemoryStore {
    data: RwLock<MemoryData>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(MemoryData {
                schema: StoreCapabilities::FULL,
                users: HashMap::new(),
                sessions: HashMap::new(),
                members: HashMap::new(),
                cards: HashMap::new(),
                fail_writes_after: None,
            }),
        }
    }

    /// Behave like a schema without the ordering column.
    pub fn without_ordering(self) -> Self {
        self.data.write().schema.ordering = false;
        self
    }

    /// Behave like a schema without the tag tables.
    pub fn without_tagging(self) -> Self {
        self.data.write().schema.tagging = false;
        self
    }

    /// Make the next reorders fail after `rows` rows were written.
    pub fn fail_writes_after(self, rows: usize) -> Self {
        self.data.write().fail_writes_after = Some(rows);
        self
    }

    /// Remove the ordering column from a running store.
    pub fn drop_ordering_column(&self) {
        self.data.write().schema.ordering = false;
    }

    pub fn add_user(&self, user: SessionUser) {
        self.data.write().users.insert(user.id, user);
    }

    pub fn add_session(&self, token: impl Into<String>, user_id: UserId) {
        self.data.write().sessions.insert(token.into(), user_id);
    }

    pub fn add_member(&self, workspace_id: WorkspaceId, user_id: UserId, role: MemberRole) {
        self.data
            .write()
            .members
            .insert((workspace_id, user_id), role);
    }

    pub fn insert_card(&self, card: Card) {
        self.data.write().cards.insert(
            card.id,
            StoredCard {
                card,
                deleted: false,
            },
        );
    }

    /// Returns false when no such card exists.
    pub fn soft_delete(&self, id: CardId) -> bool {
        match self.data.write().cards.get_mut(&id) {
            Some(stored) => {
                stored.deleted = true;
                true
            }
            None => false,
        }
    }

    /// Raw stored copy of a card, deleted or not.
    pub fn card(&self, id: CardId) -> Option<Card> {
        self.data.read().cards.get(&id).map(|s| s.card.clone())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn resolve_session(&self, token: &str) -> KanbanResult<Option<SessionUser>> {
        let data = self.data.read();
        Ok(data
            .sessions
            .get(token)
            .and_then(|user_id| data.users.get(user_id))
            .cloned())
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn member_role(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> KanbanResult<Option<MemberRole>> {
        Ok(self
            .data
            .read()
            .members
            .get(&(workspace_id, user_id))
            .copied())
    }
}

#[async_trait]
impl CardStore for InMemoryStore {
    async fn detect_capabilities(&self) -> KanbanResult<StoreCapabilities> {
        Ok(self.data.read().schema)
    }

    async fn existing_card_ids(
        &self,
        workspace_id: WorkspaceId,
        ids: &[CardId],
    ) -> KanbanResult<HashSet<CardId>> {
        let data = self.data.read();
        Ok(ids
            .iter()
            .filter(|id| {
                data.cards
                    .get(*id)
                    .is_some_and(|s| !s.deleted && s.card.workspace_id == workspace_id)
            })
            .copied()
            .collect())
    }

    async fn apply_reorder(
        &self,
        workspace_id: WorkspaceId,
        updates: &[ReorderUpdate],
        mode: WriteMode,
    ) -> KanbanResult<()> {
        let mut data = self.data.write();
        if mode == WriteMode::Full && !data.schema.ordering {
            return Err(KanbanError::SchemaMissing {
                column: ORDER_COLUMN.to_string(),
            });
        }

        let mut staged = data.cards.clone();
        let now = Utc::now();
        let mut written = 0;

        for update in updates {
            if mode == WriteMode::StatusOnly && update.status.is_none() {
                continue;
            }
            if data.fail_writes_after.is_some_and(|limit| written >= limit) {
                return Err(KanbanError::Database(format!(
                    "Write failed after {} rows",
                    written
                )));
            }

            let stored = staged
                .get_mut(&update.id)
                .filter(|s| !s.deleted && s.card.workspace_id == workspace_id)
                .ok_or_else(|| KanbanError::NotFound("Requirement not found".to_string()))?;

            if let Some(status) = update.status {
                stored.card.status = status;
            }
            if mode == WriteMode::Full {
                stored.card.order = update.order;
            }
            stored.card.updated_at = now;
            written += 1;
        }

        data.cards = staged;
        Ok(())
    }

    async fn list_cards(
        &self,
        workspace_id: WorkspaceId,
        query: &CardQuery,
        read: StoreCapabilities,
    ) -> KanbanResult<Vec<Card>> {
        let data = self.data.read();
        if read.ordering && !data.schema.ordering {
            return Err(KanbanError::SchemaMissing {
                column: ORDER_COLUMN.to_string(),
            });
        }
        if read.tagging && !data.schema.tagging {
            return Err(KanbanError::SchemaMissing {
                column: TAG_TABLE.to_string(),
            });
        }

        let filter = query.to_filter(workspace_id);
        Ok(data
            .cards
            .values()
            .filter(|s| !s.deleted && filter.matches(&s.card))
            .map(|s| {
                let mut card = s.card.clone();
                if !read.ordering {
                    card.order = 0;
                }
                if !read.tagging {
                    card.tags.clear();
                }
                card
            })
            .collect())
    }
}
