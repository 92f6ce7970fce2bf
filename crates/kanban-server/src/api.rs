use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use kanban_core::KanbanError;
use kanban_domain::{BoardResponse, BoardView, CardQuery, ReorderRequest, ReorderResponse};
use kanban_persistence::{BoardStore, CapabilityFlags};
use serde::Deserialize;
use uuid::Uuid;

use crate::service::{BoardFetchRequest, BoardFetchService, ReorderService};
use crate::session;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub store: Arc<dyn BoardStore>,
    pub capabilities: Arc<CapabilityFlags>,
    pub reorder: ReorderService,
    pub fetch: BoardFetchService,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        store: Arc<dyn BoardStore>,
        capabilities: Arc<CapabilityFlags>,
        default_page_size: u32,
    ) -> Self {
        Self {
            reorder: ReorderService::new(store.clone(), capabilities.clone()),
            fetch: BoardFetchService::new(store.clone(), capabilities.clone(), default_page_size),
            store,
            capabilities,
        }
    }
}

// ── Request payload types ─────────────────────────────────────────────

/// Raw query string of the card listing. Parsed by hand so that bad values
/// are reported after authentication, with the same error body as the rest.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardQueryParams {
    pub workspace_id: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<String>,
    pub view: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

fn parse_param<T>(name: &str, value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse()
                .map_err(|e| ApiError::BadRequest(format!("Invalid {}: {}", name, e)))
        })
        .transpose()
}

impl BoardQueryParams {
    pub fn into_request(self) -> Result<BoardFetchRequest, ApiError> {
        let workspace_id = parse_param::<Uuid>("workspaceId", self.workspace_id.as_deref())?
            .ok_or_else(|| ApiError::BadRequest("workspaceId is required".to_string()))?;

        let view = match self.view.as_deref() {
            Some("board") => BoardView::Board,
            None | Some("") | Some("list") => BoardView::List,
            Some(other) => {
                return Err(ApiError::BadRequest(format!("Invalid view: {}", other)));
            }
        };

        Ok(BoardFetchRequest {
            workspace_id,
            query: CardQuery {
                status: parse_param("status", self.status.as_deref())?,
                priority: parse_param("priority", self.priority.as_deref())?,
                assignee_id: parse_param("assigneeId", self.assignee_id.as_deref())?,
            },
            view,
            page: parse_param("page", self.page.as_deref())?,
            page_size: parse_param("pageSize", self.page_size.as_deref())?,
        })
    }
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<KanbanError> for ApiError {
    fn from(err: KanbanError) -> Self {
        match err {
            KanbanError::Unauthorized => ApiError::Unauthorized,
            KanbanError::Forbidden(msg) => ApiError::Forbidden(msg),
            KanbanError::NotFound(msg) => ApiError::NotFound(msg),
            KanbanError::Validation(msg) => ApiError::BadRequest(msg),
            other => {
                tracing::error!("Request failed: {}", other);
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/requirements", get(list_requirements))
        .route("/api/requirements/reorder", patch(reorder_requirements))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn list_requirements(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<BoardQueryParams>,
) -> Result<Json<BoardResponse>, ApiError> {
    let user = session::authenticate(state.store.as_ref(), &headers).await?;
    let request = params.into_request()?;
    let response = state.fetch.fetch(&user, &request).await?;
    Ok(Json(response))
}

async fn reorder_requirements(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReorderResponse>, ApiError> {
    let user = session::authenticate(state.store.as_ref(), &headers).await?;
    let request: ReorderRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;
    let response = state.reorder.reorder(&user, &request).await?;
    Ok(Json(response))
}
