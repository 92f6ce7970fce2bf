use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::workspace::{UserId, WorkspaceId};

pub type CardId = Uuid;

/// A board column. Declaration order is board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Backlog,
    Todo,
    InProgress,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Backlog, Stage::Todo, Stage::InProgress, Stage::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "BACKLOG",
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("Unknown status: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| format!("Unknown priority: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A requirement as the board sees it.
///
/// Only `id`, `status`, `order` and `updated_at` take part in ordering; the
/// rest is carried for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub workspace_id: WorkspaceId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Stage,
    pub priority: Priority,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub tags: Vec<TagSummary>,
    #[serde(default)]
    pub assignee: Option<UserSummary>,
    #[serde(default)]
    pub created_by: Option<UserSummary>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn new(workspace_id: WorkspaceId, title: String, status: Stage, order: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            title,
            description: None,
            status,
            priority: Priority::Medium,
            order,
            tags: Vec::new(),
            assignee: None,
            created_by: None,
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn assignee_id(&self) -> Option<UserId> {
        self.assignee.as_ref().map(|user| user.id)
    }

    /// Relocate to `status` at rank `order`.
    pub fn place(&mut self, status: Stage, order: u32) {
        self.status = status;
        self.order = order;
    }
}
