pub mod board;
pub mod card;
pub mod drag;
pub mod filter;
pub mod sort;
pub mod wire;
pub mod workspace;

pub use board::BoardState;
pub use card::{Card, CardId, Priority, Stage, TagSummary, UserSummary};
pub use drag::{apply_drag, DragOutcome, DropTarget, ReorderUpdate};
pub use filter::{CardFilter, CardQuery};
pub use sort::{SortBy, SortChain, SortOrder};
pub use wire::{BoardResponse, BoardView, ReorderRequest, ReorderResponse};
pub use workspace::{MemberRole, SessionUser, UserId, WorkspaceId};
