//! Remote conversation service contract.
//!
//! Defines the async interface the session manager drives, plus the payload
//! shapes the remote is allowed to answer with and their normalization into
//! domain values. The accepted shapes of each response are enumerated
//! exhaustively; anything else must fail fast in the transport implementation
//! instead of silently defaulting.

use crate::conversation::Conversation;
use crate::error::{ConfabError, Result};
use async_trait::async_trait;

/// Request payload for creating a new remote conversation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSessionRequest {
    /// Locally generated conversation id the server should adopt.
    pub session_id: String,
    /// Optional seed prompt forwarded to the backend.
    pub prompt: Option<String>,
}

/// Acknowledgement for a create-session call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateSessionAck {
    /// Whether the backend accepted the session.
    pub status: bool,
}

/// History response: either a bare sequence of conversations or a wrapper
/// object carrying the sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryPayload {
    /// The bare sequence shape.
    Conversations(Vec<Conversation>),
    /// The `{ data: [...] }` wrapper shape.
    Enveloped { data: Vec<Conversation> },
}

impl HistoryPayload {
    /// Normalizes both accepted shapes into the conversation sequence.
    pub fn into_conversations(self) -> Vec<Conversation> {
        match self {
            Self::Conversations(list) => list,
            Self::Enveloped { data } => data,
        }
    }
}

/// The assistant's answer to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    /// Reply text.
    pub text: String,
    /// Remote-side creation time, when the backend provides one.
    pub timestamp: Option<String>,
}

/// Prompt response: either a status envelope around the reply or the bare
/// reply, depending on the integration path.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptReply {
    /// The `{ status, data: { ai } }` envelope shape.
    Enveloped { status: bool, data: AssistantReply },
    /// The bare `{ ai }` shape; it carries no status and counts as success.
    Bare(AssistantReply),
}

impl PromptReply {
    /// Normalizes both accepted shapes into the reply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfabError::Rejected`] when the envelope carries a falsy
    /// status.
    pub fn into_reply(self) -> Result<AssistantReply> {
        match self {
            Self::Enveloped { status: true, data } => Ok(data),
            Self::Enveloped { status: false, .. } => {
                Err(ConfabError::rejected("prompt was not accepted"))
            }
            Self::Bare(reply) => Ok(reply),
        }
    }
}

/// An abstract client for the remote conversation backend.
///
/// This trait decouples the session manager from the transport mechanism.
/// The HTTP implementation lives in `confab-http`; tests inject scripted
/// mocks.
///
/// # Implementation Notes
///
/// Implementations own retry and timeout policy. The session manager never
/// retries and never cancels, so a call that hangs forever holds the
/// awaiting-reply flag for its conversation until it resolves.
#[async_trait]
pub trait RemoteConversationService: Send + Sync {
    /// Fetches the full conversation history for the current user.
    ///
    /// # Returns
    ///
    /// - `Ok(HistoryPayload)`: one of the two accepted history shapes
    /// - `Err(_)`: transport failure or unrecognized response shape
    async fn fetch_history(&self) -> Result<HistoryPayload>;

    /// Creates a new conversation session on the backend.
    ///
    /// # Returns
    ///
    /// - `Ok(CreateSessionAck)`: the backend's accept/reject status
    /// - `Err(_)`: transport failure or unrecognized response shape
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreateSessionAck>;

    /// Sends a prompt to a conversation and returns the assistant's reply.
    ///
    /// # Returns
    ///
    /// - `Ok(PromptReply)`: one of the two accepted reply shapes
    /// - `Err(_)`: transport failure or unrecognized response shape
    async fn send_prompt(&self, session_id: &str, prompt: &str) -> Result<PromptReply>;
}
