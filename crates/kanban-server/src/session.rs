//! Caller identification from request headers.

use axum::http::{header, HeaderMap};
use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::SessionUser;
use kanban_persistence::SessionStore;

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "auth-token";

/// Session token from `Authorization: Bearer`, falling back to the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Resolve the caller or fail with `Unauthorized`.
pub async fn authenticate<S>(store: &S, headers: &HeaderMap) -> KanbanResult<SessionUser>
where
    S: SessionStore + ?Sized,
{
    let Some(token) = session_token(headers) else {
        return Err(KanbanError::Unauthorized);
    };

    match store.resolve_session(&token).await? {
        Some(user) => Ok(user),
        None => {
            tracing::debug!("Unknown or expired session token");
            Err(KanbanError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use kanban_persistence::InMemoryStore;
    use uuid::Uuid;

    fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(name, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn test_bearer_token() {
        let map = headers(header::AUTHORIZATION, "Bearer abc123");
        assert_eq!(session_token(&map).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_token() {
        let map = headers(header::COOKIE, "theme=dark; auth-token=xyz; other=1");
        assert_eq!(session_token(&map).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_missing_or_malformed() {
        assert_eq!(session_token(&HeaderMap::new()), None);
        assert_eq!(session_token(&headers(header::AUTHORIZATION, "Basic abc")), None);
        assert_eq!(session_token(&headers(header::AUTHORIZATION, "Bearer ")), None);
        assert_eq!(session_token(&headers(header::COOKIE, "auth-token=")), None);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let store = InMemoryStore::new();
        let user = SessionUser {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
        };
        store.add_user(user.clone());
        store.add_session("good", user.id);

        let ok = authenticate(&store, &headers(header::AUTHORIZATION, "Bearer good"))
            .await
            .unwrap();
        assert_eq!(ok, user);

        let err = authenticate(&store, &headers(header::AUTHORIZATION, "Bearer bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::Unauthorized));
    }
}
