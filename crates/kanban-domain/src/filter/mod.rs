//! Card filtering functionality.
//!
//! Provides the filter trait, the concrete filters behind the board query
//! parameters, and [`CardQuery`] which combines them.

pub mod card_filter;

pub use card_filter::{
    AssigneeFilter, CardFilter, CompositeFilter, PriorityFilter, StatusFilter, WorkspaceFilter,
};

use crate::{Card, Priority, Stage, UserId, WorkspaceId};

/// Optional narrowing of a workspace's cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardQuery {
    pub status: Option<Stage>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<UserId>,
}

impl CardQuery {
    /// Build the AND-combination of the set criteria, scoped to `workspace_id`.
    pub fn to_filter(&self, workspace_id: WorkspaceId) -> CompositeFilter {
        let mut filter = CompositeFilter::new().with_filter(Box::new(WorkspaceFilter::new(workspace_id)));
        if let Some(status) = self.status {
            filter = filter.with_filter(Box::new(StatusFilter::new(status)));
        }
        if let Some(priority) = self.priority {
            filter = filter.with_filter(Box::new(PriorityFilter::new(priority)));
        }
        if let Some(assignee_id) = self.assignee_id {
            filter = filter.with_filter(Box::new(AssigneeFilter::new(assignee_id)));
        }
        filter
    }

    pub fn matches(&self, workspace_id: WorkspaceId, card: &Card) -> bool {
        self.to_filter(workspace_id).matches(card)
    }
}
