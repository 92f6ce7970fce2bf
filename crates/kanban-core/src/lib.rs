pub mod config;
pub mod error;
pub mod logging;
pub mod pagination;
pub mod result;

pub use config::{AppConfig, OrderingMode};
pub use error::KanbanError;
pub use pagination::{PageInfo, PageRequest};
pub use result::KanbanResult;
