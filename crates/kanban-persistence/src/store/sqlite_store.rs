use crate::migration::Migrator;
use crate::traits::{
    CardStore, MembershipStore, SessionStore, StoreCapabilities, WriteMode, ORDER_COLUMN,
    TAG_TABLE,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::{
    Card, CardId, CardQuery, MemberRole, ReorderUpdate, SessionUser, TagSummary, UserId,
    UserSummary, WorkspaceId,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Map a driver error onto the crate error, recognising missing columns
/// and tables.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> KanbanError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            KanbanError::Connection(err.to_string())
        }
        _ => {
            let message = err.to_string();
            match missing_schema_item(&message) {
                Some(column) => KanbanError::SchemaMissing { column },
                None => KanbanError::Database(message),
            }
        }
    }
}

fn missing_schema_item(message: &str) -> Option<String> {
    const MARKERS: [&str; 3] = ["no such column: ", "has no column named ", "no such table: "];

    MARKERS.iter().find_map(|marker| {
        let start = message.find(marker)? + marker.len();
        let qualified = message[start..]
            .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .next()?;
        let name = qualified.rsplit('.').next().unwrap_or(qualified);
        (!name.is_empty()).then(|| name.to_string())
    })
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

fn parse_timestamp(value: &str) -> KanbanResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KanbanError::Database(format!("Invalid timestamp {}: {}", value, e)))
}

fn parse_uuid(value: &str) -> KanbanResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| KanbanError::Database(format!("Invalid id {}: {}", value, e)))
}

fn parse_field<T: FromStr<Err = String>>(value: &str) -> KanbanResult<T> {
    value.parse().map_err(KanbanError::Database)
}

fn user_summary(id: Option<String>, username: Option<String>) -> KanbanResult<Option<UserSummary>> {
    match (id, username) {
        (Some(id), Some(username)) => Ok(Some(UserSummary {
            id: parse_uuid(&id)?,
            username,
        })),
        _ => Ok(None),
    }
}

fn row_to_card(row: &SqliteRow) -> KanbanResult<Card> {
    let order: i64 = row.get("sort_order");
    let due_date: Option<String> = row.get("due_date");

    Ok(Card {
        id: parse_uuid(row.get("id"))?,
        workspace_id: parse_uuid(row.get("workspace_id"))?,
        title: row.get("title"),
        description: row.get("description"),
        status: parse_field(row.get("status"))?,
        priority: parse_field(row.get("priority"))?,
        order: u32::try_from(order).unwrap_or(0),
        tags: Vec::new(),
        assignee: user_summary(row.get("assignee_id"), row.get("assignee_username"))?,
        created_by: user_summary(row.get("creator_id"), row.get("creator_username"))?,
        due_date: due_date.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

/// SQLite-backed store.
///
/// The pool is opened lazily on first use. Schema changes are applied only
/// through [`SqliteStore::migrate`].
pub struct SqliteStore {
    path: PathBuf,
    pool: tokio::sync::OnceCell<Pool<Sqlite>>,
}

impl SqliteStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pool: tokio::sync::OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn get_pool(&self) -> KanbanResult<&Pool<Sqlite>> {
        self.pool
            .get_or_try_init(|| async {
                let options = SqliteConnectOptions::from_str(&format!(
                    "sqlite://{}?mode=rwc",
                    self.path.display()
                ))
                .map_err(|e| KanbanError::Connection(e.to_string()))?
                .create_if_missing(true)
                .foreign_keys(true)
                .busy_timeout(Duration::from_secs(5));

                let pool = SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await
                    .map_err(|e| KanbanError::Connection(e.to_string()))?;

                tracing::debug!("Opened SQLite database at {}", self.path.display());
                Ok(pool)
            })
            .await
    }

    /// Apply pending migrations up to `up_to` (all when `None`).
    pub async fn migrate(&self, up_to: Option<u32>) -> KanbanResult<Vec<u32>> {
        let pool = self.get_pool().await?;
        Migrator::run(pool, up_to).await
    }

    pub async fn applied_migrations(&self) -> KanbanResult<Vec<u32>> {
        let pool = self.get_pool().await?;
        Migrator::applied(pool).await
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }

    pub async fn insert_user(&self, user: &SessionUser) -> KanbanResult<()> {
        let pool = self.get_pool().await?;
        sqlx::query("INSERT INTO users (id, username, created_at) VALUES (?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.username)
            .bind(timestamp(Utc::now()))
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub async fn insert_session(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: Option<DateTime<Utc>>,
    ) -> KanbanResult<()> {
        let pool = self.get_pool().await?;
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
            .bind(token)
            .bind(user_id.to_string())
            .bind(expires_at.map(timestamp))
            .bind(timestamp(Utc::now()))
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub async fn insert_workspace(&self, id: WorkspaceId, name: &str) -> KanbanResult<()> {
        let pool = self.get_pool().await?;
        sqlx::query("INSERT INTO workspaces (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id.to_string())
            .bind(name)
            .bind(timestamp(Utc::now()))
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub async fn insert_member(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
        role: MemberRole,
    ) -> KanbanResult<()> {
        let pool = self.get_pool().await?;
        sqlx::query("INSERT INTO workspace_members (workspace_id, user_id, role) VALUES (?, ?, ?)")
            .bind(workspace_id.to_string())
            .bind(user_id.to_string())
            .bind(role.as_str())
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Insert a card. Its rank is stored only when the ordering column exists.
    pub async fn insert_card(&self, card: &Card) -> KanbanResult<()> {
        let pool = self.get_pool().await?;
        let ordering = self.detect_capabilities().await?.ordering;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "INSERT INTO requirements (id, workspace_id, title, description, status, priority, \
             assignee_id, created_by_id, due_date, created_at, updated_at",
        );
        if ordering {
            builder.push(", sort_order");
        }
        builder.push(") VALUES (");
        let mut values = builder.separated(", ");
        values
            .push_bind(card.id.to_string())
            .push_bind(card.workspace_id.to_string())
            .push_bind(card.title.clone())
            .push_bind(card.description.clone())
            .push_bind(card.status.as_str())
            .push_bind(card.priority.as_str())
            .push_bind(card.assignee_id().map(|id| id.to_string()))
            .push_bind(card.created_by.as_ref().map(|u| u.id.to_string()))
            .push_bind(card.due_date.map(timestamp))
            .push_bind(timestamp(card.created_at))
            .push_bind(timestamp(card.updated_at));
        if ordering {
            values.push_bind(i64::from(card.order));
        }
        values.push_unseparated(")");

        builder
            .build()
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub async fn insert_tag(&self, workspace_id: WorkspaceId, tag: &TagSummary) -> KanbanResult<()> {
        let pool = self.get_pool().await?;
        sqlx::query("INSERT INTO tags (id, workspace_id, name, color) VALUES (?, ?, ?, ?)")
            .bind(tag.id.to_string())
            .bind(workspace_id.to_string())
            .bind(&tag.name)
            .bind(tag.color.as_deref())
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub async fn tag_card(&self, card_id: CardId, tag_id: Uuid) -> KanbanResult<()> {
        let pool = self.get_pool().await?;
        sqlx::query("INSERT INTO requirement_tags (requirement_id, tag_id) VALUES (?, ?)")
            .bind(card_id.to_string())
            .bind(tag_id.to_string())
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub async fn soft_delete(&self, card_id: CardId) -> KanbanResult<()> {
        let pool = self.get_pool().await?;
        sqlx::query("UPDATE requirements SET deleted_at = ? WHERE id = ?")
            .bind(timestamp(Utc::now()))
            .bind(card_id.to_string())
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn load_tags(
        &self,
        pool: &Pool<Sqlite>,
        workspace_id: WorkspaceId,
    ) -> KanbanResult<HashMap<CardId, Vec<TagSummary>>> {
        let rows = sqlx::query(
            "SELECT rt.requirement_id, t.id AS tag_id, t.name, t.color
             FROM requirement_tags rt
             JOIN tags t ON t.id = rt.tag_id
             WHERE t.workspace_id = ?
             ORDER BY t.name",
        )
        .bind(workspace_id.to_string())
        .fetch_all(pool)
        .await
        .map_err(|e| match map_sqlx_error(e) {
            KanbanError::SchemaMissing { .. } => KanbanError::SchemaMissing {
                column: TAG_TABLE.to_string(),
            },
            other => other,
        })?;

        let mut tags: HashMap<CardId, Vec<TagSummary>> = HashMap::new();
        for row in &rows {
            tags.entry(parse_uuid(row.get("requirement_id"))?)
                .or_default()
                .push(TagSummary {
                    id: parse_uuid(row.get("tag_id"))?,
                    name: row.get("name"),
                    color: row.get("color"),
                });
        }
        Ok(tags)
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn resolve_session(&self, token: &str) -> KanbanResult<Option<SessionUser>> {
        let pool = self.get_pool().await?;
        let row = sqlx::query(
            "SELECT u.id, u.username, s.expires_at
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: Option<String> = row.get("expires_at");
        if let Some(expires_at) = expires_at.as_deref().map(parse_timestamp).transpose()? {
            if expires_at <= Utc::now() {
                tracing::debug!("Rejected expired session");
                return Ok(None);
            }
        }

        Ok(Some(SessionUser {
            id: parse_uuid(row.get("id"))?,
            username: row.get("username"),
        }))
    }
}

#[async_trait]
impl MembershipStore for SqliteStore {
    async fn member_role(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> KanbanResult<Option<MemberRole>> {
        let pool = self.get_pool().await?;
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(workspace_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;

        role.as_deref().map(parse_field).transpose()
    }
}

#[async_trait]
impl CardStore for SqliteStore {
    async fn detect_capabilities(&self) -> KanbanResult<StoreCapabilities> {
        let pool = self.get_pool().await?;

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('requirements')")
                .fetch_all(pool)
                .await
                .map_err(map_sqlx_error)?;

        let tag_tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('tags', 'requirement_tags')",
        )
        .fetch_one(pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(StoreCapabilities {
            ordering: columns.iter().any(|name| name == ORDER_COLUMN),
            tagging: tag_tables == 2,
        })
    }

    async fn existing_card_ids(
        &self,
        workspace_id: WorkspaceId,
        ids: &[CardId],
    ) -> KanbanResult<HashSet<CardId>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let pool = self.get_pool().await?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id FROM requirements WHERE deleted_at IS NULL AND workspace_id = ",
        );
        builder.push_bind(workspace_id.to_string());
        builder.push(" AND id IN (");
        let mut list = builder.separated(", ");
        for id in ids {
            list.push_bind(id.to_string());
        }
        list.push_unseparated(")");

        let found: Vec<String> = builder
            .build_query_scalar()
            .fetch_all(pool)
            .await
            .map_err(map_sqlx_error)?;

        found.iter().map(|id| parse_uuid(id)).collect()
    }

    async fn apply_reorder(
        &self,
        workspace_id: WorkspaceId,
        updates: &[ReorderUpdate],
        mode: WriteMode,
    ) -> KanbanResult<()> {
        let pool = self.get_pool().await?;
        let mut tx = pool.begin().await.map_err(map_sqlx_error)?;
        let now = timestamp(Utc::now());

        for update in updates {
            let statement = match mode {
                WriteMode::Full => sqlx::query(
                    "UPDATE requirements
                     SET status = COALESCE(?, status), sort_order = ?, updated_at = ?
                     WHERE id = ? AND workspace_id = ? AND deleted_at IS NULL",
                )
                .bind(update.status.map(|s| s.as_str()))
                .bind(i64::from(update.order)),
                WriteMode::StatusOnly => {
                    let Some(status) = update.status else {
                        continue;
                    };
                    sqlx::query(
                        "UPDATE requirements
                         SET status = ?, updated_at = ?
                         WHERE id = ? AND workspace_id = ? AND deleted_at IS NULL",
                    )
                    .bind(status.as_str())
                }
            };

            let result = statement
                .bind(&now)
                .bind(update.id.to_string())
                .bind(workspace_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            // Dropping `tx` without commit rolls back the earlier rows.
            if result.rows_affected() == 0 {
                return Err(KanbanError::NotFound("Requirement not found".to_string()));
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_cards(
        &self,
        workspace_id: WorkspaceId,
        query: &CardQuery,
        read: StoreCapabilities,
    ) -> KanbanResult<Vec<Card>> {
        let pool = self.get_pool().await?;
        let order_expr = if read.ordering { "r.sort_order" } else { "0" };

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT r.id, r.workspace_id, r.title, r.description, r.status, r.priority,
                    {} AS sort_order, r.due_date, r.created_at, r.updated_at,
                    a.id AS assignee_id, a.username AS assignee_username,
                    c.id AS creator_id, c.username AS creator_username
             FROM requirements r
             LEFT JOIN users a ON a.id = r.assignee_id
             LEFT JOIN users c ON c.id = r.created_by_id
             WHERE r.deleted_at IS NULL AND r.workspace_id = ",
            order_expr
        ));
        builder.push_bind(workspace_id.to_string());
        if let Some(status) = query.status {
            builder.push(" AND r.status = ").push_bind(status.as_str());
        }
        if let Some(priority) = query.priority {
            builder.push(" AND r.priority = ").push_bind(priority.as_str());
        }
        if let Some(assignee_id) = query.assignee_id {
            builder
                .push(" AND r.assignee_id = ")
                .push_bind(assignee_id.to_string());
        }

        let rows = builder
            .build()
            .fetch_all(pool)
            .await
            .map_err(map_sqlx_error)?;
        let mut cards = rows
            .iter()
            .map(row_to_card)
            .collect::<KanbanResult<Vec<_>>>()?;

        if read.tagging {
            let mut tags = self.load_tags(pool, workspace_id).await?;
            for card in &mut cards {
                if let Some(card_tags) = tags.remove(&card.id) {
                    card.tags = card_tags;
                }
            }
        }

        Ok(cards)
    }
}
