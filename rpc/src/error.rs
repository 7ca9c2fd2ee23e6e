//! RPC error types and their HTTP mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use knock_groups::GroupError;
use knock_session::KnockError;
use knock_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Knock(#[from] KnockError),

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error("knock {0} not found")]
    UnknownKnock(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server error: {0}")]
    Server(String),
}

impl From<TypesError> for RpcError {
    fn from(e: TypesError) -> Self {
        RpcError::InvalidRequest(e.to_string())
    }
}

impl From<JsonRejection> for RpcError {
    fn from(rejection: JsonRejection) -> Self {
        RpcError::InvalidRequest(rejection.body_text())
    }
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::Knock(e) => match e {
                KnockError::NotFound(_) => StatusCode::NOT_FOUND,
                KnockError::NotMember(_) => StatusCode::FORBIDDEN,
                KnockError::NoRecipients(_) => StatusCode::BAD_REQUEST,
                KnockError::DeliveryPartialFailure { .. } => StatusCode::BAD_GATEWAY,
                KnockError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            RpcError::Group(e) => match e {
                GroupError::GroupNotFound(_) => StatusCode::NOT_FOUND,
                GroupError::AlreadyExists(_) => StatusCode::CONFLICT,
                GroupError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                GroupError::RequestFailed(_)
                | GroupError::InvalidResponse(_)
                | GroupError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            RpcError::UnknownKnock(_) => StatusCode::NOT_FOUND,
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        } else {
            tracing::debug!(status = status.as_u16(), "request rejected: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
