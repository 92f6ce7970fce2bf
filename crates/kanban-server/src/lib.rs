pub mod api;
pub mod cli;
pub mod handlers;
pub mod output;
pub mod server;
pub mod service;
pub mod session;

pub use api::{api_router, ApiError, AppState, SharedState};
pub use server::{build_router, start_server, ServerConfig};
pub use service::{BoardFetchRequest, BoardFetchService, ReorderService};
