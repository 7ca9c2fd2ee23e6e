//! HTTP push gateway adapter.

use std::time::Duration;

use async_trait::async_trait;
use knock_types::{PushMessage, PushToken};
use serde::{Deserialize, Serialize};

use crate::error::PushError;
use crate::gateway::PushGateway;

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts one JSON message per device to a push endpoint.
///
/// Request body: `{"to": token, "priority": "high"|"normal", "data": message}`.
/// A `2xx` response counts as delivered unless its JSON body reports
/// `"failure" > 0`.
pub struct HttpPushGateway {
    http_client: reqwest::Client,
    endpoint_url: String,
    server_key: Option<String>,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    priority: &'static str,
    data: &'a PushMessage,
}

#[derive(Debug, Default, Deserialize)]
struct SendResponse {
    #[serde(default)]
    failure: u32,
    #[serde(default)]
    error: Option<String>,
}

impl HttpPushGateway {
    pub fn new(endpoint_url: impl Into<String>, server_key: Option<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            endpoint_url: endpoint_url.into(),
            server_key,
        }
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn send(&self, token: &PushToken, message: &PushMessage) -> Result<(), PushError> {
        let body = SendRequest {
            to: token.as_str(),
            priority: if message.is_user_visible() { "high" } else { "normal" },
            data: message,
        };

        let mut request = self.http_client.post(&self.endpoint_url).json(&body);
        if let Some(key) = &self.server_key {
            request = request.header(reqwest::header::AUTHORIZATION, format!("key={key}"));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                PushError::Unreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                PushError::Unreachable(format!("connection failed: {e}"))
            } else {
                PushError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::RequestFailed(format!("HTTP status {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| PushError::InvalidResponse(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(());
        }
        let parsed: SendResponse = serde_json::from_str(&text)
            .map_err(|e| PushError::InvalidResponse(format!("failed to parse response: {e}")))?;
        if parsed.failure > 0 {
            return Err(PushError::Rejected(
                parsed.error.unwrap_or_else(|| "delivery failed".to_string()),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}
