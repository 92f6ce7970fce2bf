//! Card filtering implementations.
//!
//! Provides the CardFilter trait and filters by workspace, status, priority
//! and assignee.

use crate::{Card, Priority, Stage, UserId, WorkspaceId};

/// Trait for filtering cards by various criteria.
pub trait CardFilter: Send + Sync {
    /// Returns true if the card matches the filter criteria.
    fn matches(&self, card: &Card) -> bool;
}

/// Filter cards by tenant.
pub struct WorkspaceFilter {
    workspace_id: WorkspaceId,
}

impl WorkspaceFilter {
    pub fn new(workspace_id: WorkspaceId) -> Self {
        Self { workspace_id }
    }
}

impl CardFilter for WorkspaceFilter {
    fn matches(&self, card: &Card) -> bool {
        card.workspace_id == self.workspace_id
    }
}

/// Filter cards by board column.
pub struct StatusFilter {
    status: Stage,
}

impl StatusFilter {
    pub fn new(status: Stage) -> Self {
        Self { status }
    }
}

impl CardFilter for StatusFilter {
    fn matches(&self, card: &Card) -> bool {
        card.status == self.status
    }
}

pub struct PriorityFilter {
    priority: Priority,
}

impl PriorityFilter {
    pub fn new(priority: Priority) -> Self {
        Self { priority }
    }
}

impl CardFilter for PriorityFilter {
    fn matches(&self, card: &Card) -> bool {
        card.priority == self.priority
    }
}

/// Filter cards assigned to a specific user. Unassigned cards never match.
pub struct AssigneeFilter {
    assignee_id: UserId,
}

impl AssigneeFilter {
    pub fn new(assignee_id: UserId) -> Self {
        Self { assignee_id }
    }
}

impl CardFilter for AssigneeFilter {
    fn matches(&self, card: &Card) -> bool {
        card.assignee_id() == Some(self.assignee_id)
    }
}

/// Combine multiple filters with AND logic.
///
/// A card matches only if it passes all filters.
pub struct CompositeFilter {
    filters: Vec<Box<dyn CardFilter>>,
}

impl CompositeFilter {
    /// Create an empty composite filter (matches all cards).
    pub fn new() -> Self {
        Self { filters: vec![] }
    }

    /// Add a filter to the composite (builder pattern).
    pub fn with_filter(mut self, filter: Box<dyn CardFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Check if the composite has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for CompositeFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CardFilter for CompositeFilter {
    fn matches(&self, card: &Card) -> bool {
        self.filters.iter().all(|f| f.matches(card))
    }
}
