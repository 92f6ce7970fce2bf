use async_trait::async_trait;
use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::wire::ErrorBody;
use kanban_domain::{BoardResponse, ReorderRequest, ReorderResponse, WorkspaceId};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::api::BoardApi;

/// [`BoardApi`] over HTTP with a bearer session token.
pub struct HttpBoardApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpBoardApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> KanbanResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| KanbanError::Serialization(e.to_string()));
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(error_for_status(status, message))
    }
}

/// Map a failed response onto the error taxonomy.
pub fn error_for_status(status: StatusCode, message: String) -> KanbanError {
    match status {
        StatusCode::UNAUTHORIZED => KanbanError::Unauthorized,
        StatusCode::FORBIDDEN => KanbanError::Forbidden(message),
        StatusCode::NOT_FOUND => KanbanError::NotFound(message),
        StatusCode::BAD_REQUEST => KanbanError::Validation(message),
        _ => KanbanError::Internal(format!("{}: {}", status, message)),
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn fetch_board(&self, workspace_id: WorkspaceId) -> KanbanResult<BoardResponse> {
        let response = self
            .client
            .get(self.endpoint("/api/requirements"))
            .bearer_auth(&self.token)
            .query(&[
                ("workspaceId", workspace_id.to_string()),
                ("view", "board".to_string()),
            ])
            .send()
            .await
            .map_err(|e| KanbanError::Connection(e.to_string()))?;
        Self::decode(response).await
    }

    async fn reorder(&self, request: ReorderRequest) -> KanbanResult<ReorderResponse> {
        let response = self
            .client
            .patch(self.endpoint("/api/requirements/reorder"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| KanbanError::Connection(e.to_string()))?;
        Self::decode(response).await
    }
}
