use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use kanban_core::OrderingMode;
use kanban_domain::{
    apply_drag, BoardResponse, BoardState, Card, CardId, DropTarget, MemberRole, ReorderRequest,
    ReorderUpdate, SessionUser, Stage,
};
use kanban_persistence::{CapabilityFlags, SqliteStore};
use kanban_server::{build_router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use uuid::Uuid;

struct Harness {
    _dir: TempDir,
    store: Arc<SqliteStore>,
    flags: Arc<CapabilityFlags>,
    router: Router,
    ws: Uuid,
}

const TOKEN: &str = "member-token";
const VIEWER_TOKEN: &str = "viewer-token";
const OUTSIDER_TOKEN: &str = "outsider-token";

async fn harness(up_to: Option<u32>, ordering: OrderingMode) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::new(dir.path().join("board.db")));
    store.migrate(up_to).await.unwrap();

    let ws = Uuid::new_v4();
    store.insert_workspace(ws, "Acme").await.unwrap();

    for (token, role) in [
        (TOKEN, Some(MemberRole::Member)),
        (VIEWER_TOKEN, Some(MemberRole::Viewer)),
        (OUTSIDER_TOKEN, None),
    ] {
        let user = SessionUser {
            id: Uuid::new_v4(),
            username: token.to_string(),
        };
        store.insert_user(&user).await.unwrap();
        store.insert_session(token, user.id, None).await.unwrap();
        if let Some(role) = role {
            store.insert_member(ws, user.id, role).await.unwrap();
        }
    }

    let flags = Arc::new(
        CapabilityFlags::resolve(store.as_ref(), ordering)
            .await
            .unwrap(),
    );
    let state = Arc::new(AppState::new(store.clone(), flags.clone(), 20));
    Harness {
        _dir: dir,
        store,
        flags,
        router: build_router(state),
        ws,
    }
}

impl Harness {
    async fn card(&self, title: &str, status: Stage, order: u32) -> Card {
        let card = Card::new(self.ws, title.to_string(), status, order);
        self.store.insert_card(&card).await.unwrap();
        card
    }

    async fn reorder(&self, token: &str, updates: Vec<ReorderUpdate>) -> (StatusCode, Value) {
        let body = serde_json::to_string(&ReorderRequest::new(self.ws, updates)).unwrap();
        let request = Request::builder()
            .method("PATCH")
            .uri("/api/requirements/reorder")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        send(&self.router, request).await
    }

    async fn board(&self) -> BoardResponse {
        let request = Request::builder()
            .uri(format!("/api/requirements?workspaceId={}&view=board", self.ws))
            .header("authorization", format!("Bearer {}", TOKEN))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&self.router, request).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        serde_json::from_value(body).unwrap()
    }

    async fn board_state(&self) -> BoardState {
        BoardState::from_cards(self.board().await.requirements)
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    use tower::ServiceExt;

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn update(id: CardId, status: Option<Stage>, order: u32) -> ReorderUpdate {
    ReorderUpdate { id, status, order }
}

fn find(board: &BoardResponse, id: CardId) -> &Card {
    board
        .requirements
        .iter()
        .find(|card| card.id == id)
        .unwrap()
}

#[tokio::test]
async fn test_drag_then_persist_matches_refetch() {
    let h = harness(None, OrderingMode::Auto).await;
    let a = h.card("a", Stage::Backlog, 0).await;
    let b = h.card("b", Stage::Backlog, 1).await;
    let c = h.card("c", Stage::Todo, 0).await;

    let local = h.board_state().await;
    let outcome = apply_drag(&local, c.id, DropTarget::Card(a.id)).unwrap();
    assert!(!outcome.updates.is_empty());

    let (status, body) = h.reorder(TOKEN, outcome.updates.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let server = h.board_state().await;
    for stage in Stage::ALL {
        assert_eq!(server.ids(stage), outcome.next.ids(stage), "{}", stage);
    }
    assert_eq!(server.ids(Stage::Backlog), vec![c.id, a.id, b.id]);
}

#[tokio::test]
async fn test_unknown_id_is_rejected_without_partial_write() {
    let h = harness(None, OrderingMode::Auto).await;
    let a = h.card("a", Stage::Backlog, 0).await;

    let (status, body) = h
        .reorder(
            TOKEN,
            vec![update(a.id, Some(Stage::Done), 5), update(Uuid::new_v4(), None, 0)],
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Requirement not found");

    let board = h.board().await;
    let a = find(&board, a.id);
    assert_eq!((a.status, a.order), (Stage::Backlog, 0));
}

#[tokio::test]
async fn test_repeated_id_is_not_found_without_write() {
    let h = harness(None, OrderingMode::Auto).await;
    let a = h.card("a", Stage::Backlog, 0).await;

    let (status, body) = h
        .reorder(
            TOKEN,
            vec![update(a.id, Some(Stage::Todo), 1), update(a.id, None, 2)],
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Requirement not found");

    let board = h.board().await;
    let a = find(&board, a.id);
    assert_eq!((a.status, a.order), (Stage::Backlog, 0));
}

#[tokio::test]
async fn test_schema_without_ordering_degrades_but_writes_status() {
    let h = harness(Some(1), OrderingMode::Auto).await;
    assert!(!h.flags.ordering());
    let a = h.card("a", Stage::Backlog, 0).await;
    let b = h.card("b", Stage::Todo, 0).await;

    let (status, body) = h
        .reorder(
            TOKEN,
            vec![update(a.id, Some(Stage::Done), 0), update(b.id, Some(Stage::Done), 1)],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "degraded": true }));

    let board = h.board().await;
    assert!(board.degraded);
    assert_eq!(find(&board, a.id).status, Stage::Done);
    assert_eq!(find(&board, b.id).status, Stage::Done);
    assert!(board.requirements.iter().all(|card| card.order == 0));
}

#[tokio::test]
async fn test_forced_ordering_on_old_schema_falls_back() {
    let h = harness(Some(1), OrderingMode::Enabled).await;
    assert!(h.flags.ordering());
    let a = h.card("a", Stage::Backlog, 0).await;

    let (status, body) = h
        .reorder(TOKEN, vec![update(a.id, Some(Stage::InProgress), 3)])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
    assert!(!h.flags.ordering());
    assert_eq!(find(&h.board().await, a.id).status, Stage::InProgress);
}

#[tokio::test]
async fn test_outsider_and_viewer_cannot_reorder() {
    let h = harness(None, OrderingMode::Auto).await;
    let a = h.card("a", Stage::Backlog, 0).await;

    for token in [OUTSIDER_TOKEN, VIEWER_TOKEN] {
        let (status, _) = h
            .reorder(token, vec![update(a.id, Some(Stage::Done), 0)])
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", token);
    }

    assert_eq!(find(&h.board().await, a.id).status, Stage::Backlog);
}

#[tokio::test]
async fn test_reorder_is_idempotent() {
    let h = harness(None, OrderingMode::Auto).await;
    let a = h.card("a", Stage::Backlog, 0).await;
    let b = h.card("b", Stage::Backlog, 1).await;
    let updates = vec![update(b.id, None, 0), update(a.id, None, 1)];

    let (first, _) = h.reorder(TOKEN, updates.clone()).await;
    let once = h.board_state().await;
    let (second, _) = h.reorder(TOKEN, updates).await;
    let twice = h.board_state().await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(once.ids(Stage::Backlog), twice.ids(Stage::Backlog));
    assert_eq!(twice.ids(Stage::Backlog), vec![b.id, a.id]);
}

#[tokio::test]
async fn test_deleted_card_is_not_found() {
    let h = harness(None, OrderingMode::Auto).await;
    let a = h.card("a", Stage::Backlog, 0).await;
    h.store.soft_delete(a.id).await.unwrap();

    let (status, _) = h.reorder(TOKEN, vec![update(a.id, None, 1)]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(h.board().await.requirements.is_empty());
}

#[tokio::test]
async fn test_missing_session_is_unauthorized() {
    let h = harness(None, OrderingMode::Auto).await;

    let (status, body) = h.reorder("no-such-token", vec![]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}
