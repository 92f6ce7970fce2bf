pub mod access;
pub mod fetch;
pub mod reorder;

pub use access::{require_access, Access};
pub use fetch::{BoardFetchRequest, BoardFetchService};
pub use reorder::ReorderService;
