//! HTTP client for the chat completion endpoint
//!
//! The endpoint accepts a POST with the full message history and replies
//! with a streamed body of server-sent-event frames (see [`crate::chat::sse`]).
//! Non-2xx responses carry a JSON body `{"error": "..."}` whose message is
//! surfaced verbatim.
//!
//! No retry, no cancellation, and no read timeout are applied here: the
//! session relies on the transport's own behavior once a stream starts.
//! Only connection establishment is bounded.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{RegchatError, Result};
use crate::models::Message;

/// Request body for the completion endpoint
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [Message],
}

/// Error body shape returned by the endpoint on failure
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

/// Client for the streaming chat completion endpoint
///
/// Construct from [`ApiConfig`]; a missing credential is a configuration
/// error at construction time, not retried.
#[derive(Clone, Debug)]
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: url::Url,
    api_key: String,
}

impl CompletionClient {
    /// Builds a client from the API configuration
    ///
    /// # Errors
    ///
    /// Returns [`RegchatError::MissingCredentials`] when no API key is
    /// configured and [`RegchatError::Config`] when the endpoint URL does
    /// not parse.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RegchatError::MissingCredentials("REGCHAT_API_KEY".to_string()))?;

        let endpoint = url::Url::parse(&config.base_url)
            .map_err(|e| RegchatError::Config(format!("invalid API base URL: {}", e)))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    /// The configured endpoint URL
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Sends the message history and returns the streaming response
    ///
    /// The returned [`reqwest::Response`] has already been checked for an
    /// error status; read its body incrementally with
    /// [`bytes_stream`](reqwest::Response::bytes_stream).
    ///
    /// # Errors
    ///
    /// Returns [`RegchatError::Api`] with the endpoint's `{"error"}`
    /// message on a non-2xx status (falling back to the status line when
    /// the body is not the documented shape), or a transport error when
    /// the request itself fails.
    pub async fn stream_completion(&self, messages: &[Message]) -> Result<reqwest::Response> {
        tracing::debug!(
            "Sending completion request with {} messages to {}",
            messages.len(),
            self.endpoint
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest { messages })
            .send()
            .await
            .context("Failed to send completion request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("completion endpoint returned {}", status));
            return Err(RegchatError::Api(message).into());
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    fn config_with_key() -> ApiConfig {
        ApiConfig {
            base_url: "http://localhost:8000/v1/regulatory-chat".to_string(),
            api_key: Some("test-key".to_string()),
            connect_timeout_secs: 5,
        }
    }

    #[test]
    fn test_from_config_ok() {
        let client = CompletionClient::from_config(&config_with_key()).unwrap();
        assert_eq!(client.endpoint().path(), "/v1/regulatory-chat");
    }

    #[test]
    fn test_from_config_missing_credential() {
        let config = ApiConfig {
            api_key: None,
            ..config_with_key()
        };
        let err = CompletionClient::from_config(&config).unwrap_err();
        let err = err.downcast::<RegchatError>().unwrap();
        assert!(matches!(err, RegchatError::MissingCredentials(_)));
    }

    #[test]
    fn test_from_config_invalid_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..config_with_key()
        };
        let err = CompletionClient::from_config(&config).unwrap_err();
        let err = err.downcast::<RegchatError>().unwrap();
        assert!(matches!(err, RegchatError::Config(_)));
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![Message::user("hi")];
        let body = CompletionRequest {
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_error_body_parsing() {
        let body: ApiErrorBody = serde_json::from_str(r#"{"error":"quota exceeded"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("quota exceeded"));

        let body: ApiErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.error.is_none());
    }
}
