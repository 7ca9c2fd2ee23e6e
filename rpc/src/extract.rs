//! Request extractors.

use axum::extract::FromRequest;

use crate::error::RpcError;

/// JSON request body. Malformed or invalid bodies are rejected with the
/// same 400 `{"error": ...}` response as every other bad request.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(RpcError))]
pub struct JsonBody<T>(pub T);
