use chrono::Utc;
use kanban_core::{KanbanError, KanbanResult};
use sqlx::{Pool, Row, Sqlite};

use crate::store::sqlite_store::map_sqlx_error;

/// One schema step. Versions are applied in ascending order and never re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "base",
        sql: include_str!("../../migrations/0001_base.sql"),
    },
    Migration {
        version: 2,
        name: "sort_order",
        sql: include_str!("../../migrations/0002_sort_order.sql"),
    },
];

/// Version that adds the ordering column.
pub const ORDERING_VERSION: u32 = 2;

const CREATE_LEDGER: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

/// Applies [`MIGRATIONS`] to a SQLite database and records them in
/// `schema_migrations`.
pub struct Migrator;

impl Migrator {
    pub fn latest_version() -> u32 {
        MIGRATIONS.iter().map(|m| m.version).max().unwrap_or(0)
    }

    /// Versions already recorded, ascending.
    pub async fn applied(pool: &Pool<Sqlite>) -> KanbanResult<Vec<u32>> {
        sqlx::query(CREATE_LEDGER)
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;

        let rows = sqlx::query("SELECT version FROM schema_migrations ORDER BY version")
            .fetch_all(pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                let version: i64 = row.get("version");
                u32::try_from(version).map_err(|_| {
                    KanbanError::Database(format!("Invalid migration version {}", version))
                })
            })
            .collect()
    }

    /// Apply every pending migration up to and including `up_to`
    /// (all of them when `None`). Returns the versions applied by this call.
    pub async fn run(pool: &Pool<Sqlite>, up_to: Option<u32>) -> KanbanResult<Vec<u32>> {
        let applied = Self::applied(pool).await?;
        let target = up_to.unwrap_or_else(Self::latest_version);
        let mut newly_applied = Vec::new();

        for migration in MIGRATIONS
            .iter()
            .filter(|m| m.version <= target && !applied.contains(&m.version))
        {
            let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

            sqlx::raw_sql(migration.sql)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)")
                .bind(i64::from(migration.version))
                .bind(migration.name)
                .bind(Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            tx.commit().await.map_err(map_sqlx_error)?;

            tracing::info!(
                "Applied migration {} ({})",
                migration.version,
                migration.name
            );
            newly_applied.push(migration.version);
        }

        if newly_applied.is_empty() {
            tracing::debug!("Schema up to date at version {}", target);
        }
        Ok(newly_applied)
    }
}
