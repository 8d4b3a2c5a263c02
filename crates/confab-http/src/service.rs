//! reqwest implementation of [`RemoteConversationService`].

use crate::dto::{
    CreatePromptRequest, CreatePromptResponse, GeneratePromptRequest, GeneratePromptResponse,
    PromptHistoryResponse,
};
use async_trait::async_trait;
use confab_core::error::{ConfabError, Result};
use confab_core::session::{
    CreateSessionAck, CreateSessionRequest, HistoryPayload, PromptReply, RemoteConversationService,
};
use reqwest::Client;
use std::time::Duration;

/// Default backend root.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/v1";
/// Default per-request timeout. The session manager itself never times out
/// or cancels, so this is what keeps a dead backend from pinning the
/// awaiting-reply flag forever.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for [`HttpConversationService`].
#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    /// Backend base URL, e.g. `http://localhost:5000/api/v1`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Talks to the conversation backend over REST.
///
/// The client carries a cookie store so backend session credentials
/// round-trip with every call, the way a browser sends them.
pub struct HttpConversationService {
    client: Client,
    base_url: String,
}

impl HttpConversationService {
    /// Builds the service from connection settings.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: HttpServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfabError::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl RemoteConversationService for HttpConversationService {
    async fn fetch_history(&self) -> Result<HistoryPayload> {
        let url = self.endpoint("prompt/prompt-history");
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ConfabError::transport(format!("History request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ConfabError::transport(format!(
                "History request returned {}: {}",
                status, body
            )));
        }

        let payload: PromptHistoryResponse = response.json().await.map_err(|e| {
            ConfabError::unexpected_shape(format!("History response matched no accepted shape: {}", e))
        })?;
        Ok(payload.into())
    }

    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreateSessionAck> {
        let url = self.endpoint("prompt/create-prompt");
        tracing::debug!("POST {} (session {})", url, request.session_id);

        let body = CreatePromptRequest {
            session_id: request.session_id,
            prompt: request.prompt,
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ConfabError::transport(format!("Create session request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ConfabError::transport(format!(
                "Create session returned {}: {}",
                status, body
            )));
        }

        let ack: CreatePromptResponse = response.json().await.map_err(|e| {
            ConfabError::unexpected_shape(format!("Create session response was malformed: {}", e))
        })?;
        Ok(CreateSessionAck { status: ack.status })
    }

    async fn send_prompt(&self, session_id: &str, prompt: &str) -> Result<PromptReply> {
        let url = self.endpoint("prompt/generate-prompt");
        tracing::debug!("POST {} (session {})", url, session_id);

        let body = GeneratePromptRequest {
            session_id: session_id.to_string(),
            prompt: prompt.to_string(),
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ConfabError::transport(format!("Prompt request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ConfabError::transport(format!(
                "Prompt request returned {}: {}",
                status, body
            )));
        }

        let reply: GeneratePromptResponse = response.json().await.map_err(|e| {
            ConfabError::unexpected_shape(format!("Prompt response matched no accepted shape: {}", e))
        })?;
        Ok(reply.into())
    }
}
