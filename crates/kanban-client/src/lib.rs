pub mod api;
pub mod http;
pub mod session;

pub use api::BoardApi;
pub use http::HttpBoardApi;
pub use session::{BoardSession, DropResult, SyncEvent};
