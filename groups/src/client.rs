//! HTTP client reading group documents from a remote document service.

use std::time::Duration;

use async_trait::async_trait;
use knock_types::GroupCode;
use reqwest::StatusCode;

use crate::error::GroupError;
use crate::store::GroupStore;
use crate::types::Group;

/// Default timeout for document reads.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only [`GroupStore`] backed by a document service.
///
/// Sends `GET {base_url}/groups/{code}` and expects a JSON [`Group`] document,
/// or `404` when the group does not exist.
pub struct HttpGroupStore {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpGroupStore {
    /// Create a store client with default timeout settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a store client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    fn group_url(&self, code: &GroupCode) -> String {
        format!("{}/groups/{}", self.base_url.trim_end_matches('/'), code)
    }
}

#[async_trait]
impl GroupStore for HttpGroupStore {
    async fn get_group(&self, code: &GroupCode) -> Result<Option<Group>, GroupError> {
        let url = self.group_url(code);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                GroupError::Unreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                GroupError::Unreachable(format!("connection failed: {e}"))
            } else {
                GroupError::RequestFailed(e.to_string())
            }
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(GroupError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let group: Group = response.json().await.map_err(|e| {
            GroupError::InvalidResponse(format!("failed to parse group document: {e}"))
        })?;

        if &group.code != code {
            return Err(GroupError::InvalidResponse(format!(
                "asked for group {code}, store returned {}",
                group.code
            )));
        }
        tracing::trace!(group = %code, members = group.members.len(), "group document fetched");
        Ok(Some(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::{Json, Router};

    async fn serve() -> String {
        async fn group(Path(code): Path<String>) -> Result<Json<serde_json::Value>, AxumStatus> {
            match code.as_str() {
                "HOME01" => Ok(Json(serde_json::json!({
                    "code": "HOME01",
                    "name": "home",
                    "created_at": 1,
                    "members": {
                        "device-a": { "push_token": "tok-a", "joined_at": 1 }
                    }
                }))),
                "WRONG1" => Ok(Json(serde_json::json!({
                    "code": "HOME01", "name": "home", "created_at": 1
                }))),
                "BROKEN" => Err(AxumStatus::INTERNAL_SERVER_ERROR),
                _ => Err(AxumStatus::NOT_FOUND),
            }
        }

        let app = Router::new().route("/groups/:code", get(group));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn code(s: &str) -> GroupCode {
        GroupCode::parse(s).unwrap()
    }

    #[test]
    fn group_url_trims_trailing_slash() {
        let store = HttpGroupStore::new("http://store.local/");
        assert_eq!(store.group_url(&code("ab12cd")), "http://store.local/groups/AB12CD");
    }

    #[tokio::test]
    async fn fetches_existing_group() {
        let store = HttpGroupStore::new(serve().await);
        let group = store.get_group(&code("HOME01")).await.unwrap().unwrap();
        assert_eq!(group.name, "home");
        assert_eq!(group.members.len(), 1);
    }

    #[tokio::test]
    async fn missing_group_is_none() {
        let store = HttpGroupStore::new(serve().await);
        assert!(store.get_group(&code("NOPE00")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_request_failed() {
        let store = HttpGroupStore::new(serve().await);
        assert!(matches!(
            store.get_group(&code("BROKEN")).await,
            Err(GroupError::RequestFailed(_))
        ));
    }

    #[tokio::test]
    async fn mismatched_document_is_rejected() {
        let store = HttpGroupStore::new(serve().await);
        assert!(matches!(
            store.get_group(&code("WRONG1")).await,
            Err(GroupError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_store() {
        let store = HttpGroupStore::with_timeout("http://127.0.0.1:1", Duration::from_secs(1));
        assert!(store.get_group(&code("HOME01")).await.is_err());
    }
}
