use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::{MemberRole, SessionUser, WorkspaceId};
use kanban_persistence::MembershipStore;

/// What the caller wants to do with a workspace's cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    View,
    Edit,
}

/// Resolve the caller's role and reject it if it does not grant `access`.
///
/// Non-members and read-only members both get `Forbidden`, with distinct
/// messages.
pub async fn require_access<S>(
    store: &S,
    workspace_id: WorkspaceId,
    user: &SessionUser,
    access: Access,
) -> KanbanResult<MemberRole>
where
    S: MembershipStore + ?Sized,
{
    let role = store.member_role(workspace_id, user.id).await?;

    match role {
        None => {
            tracing::warn!(
                "User {} is not a member of workspace {}",
                user.id,
                workspace_id
            );
            Err(KanbanError::Forbidden(
                "Not a member of this workspace".to_string(),
            ))
        }
        Some(role) if access == Access::Edit && !role.can_edit_cards() => {
            tracing::warn!(
                "User {} with role {} may not edit workspace {}",
                user.id,
                role,
                workspace_id
            );
            Err(KanbanError::Forbidden(format!(
                "Role {} cannot modify requirements",
                role
            )))
        }
        Some(role) => Ok(role),
    }
}
