//! Wire DTOs for the conversation backend.
//!
//! The backend speaks camelCase JSON with a Mongo-style `_id` on messages,
//! and two of its responses come in two shapes depending on the integration
//! path. Each accepted shape is enumerated as an untagged variant; a body
//! matching neither fails deserialization, which the service layer surfaces
//! as a shape error instead of silently defaulting.

use confab_core::conversation::{Conversation, Message, MessageRole};
use confab_core::session::{AssistantReply, HistoryPayload, PromptReply};
use serde::{Deserialize, Serialize};

/// Message role as the backend spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRoleDto {
    User,
    Assistant,
}

impl From<MessageRoleDto> for MessageRole {
    fn from(role: MessageRoleDto) -> Self {
        match role {
            MessageRoleDto::User => MessageRole::User,
            MessageRoleDto::Assistant => MessageRole::Assistant,
        }
    }
}

/// A stored message as returned by the history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub role: MessageRoleDto,
    pub content: String,
    pub timestamp: String,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        Message {
            id: dto.id,
            role: dto.role.into(),
            content: dto.content,
            timestamp: dto.timestamp,
        }
    }
}

/// A stored conversation as returned by the history endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub conversation_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub messages: Vec<MessageDto>,
}

impl From<ConversationDto> for Conversation {
    fn from(dto: ConversationDto) -> Self {
        let mut conversation = Conversation::new(dto.conversation_id, dto.user_id);
        conversation.messages = dto.messages.into_iter().map(Message::from).collect();
        conversation
    }
}

/// History response: a bare array or a `{ data: [...] }` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PromptHistoryResponse {
    Conversations(Vec<ConversationDto>),
    Enveloped { data: Vec<ConversationDto> },
}

impl From<PromptHistoryResponse> for HistoryPayload {
    fn from(response: PromptHistoryResponse) -> Self {
        match response {
            PromptHistoryResponse::Conversations(list) => {
                HistoryPayload::Conversations(list.into_iter().map(Conversation::from).collect())
            }
            PromptHistoryResponse::Enveloped { data } => HistoryPayload::Enveloped {
                data: data.into_iter().map(Conversation::from).collect(),
            },
        }
    }
}

/// Body for the create-prompt endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptRequest {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Acknowledgement from the create-prompt endpoint. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePromptResponse {
    pub status: bool,
}

/// Body for the generate-prompt endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePromptRequest {
    pub session_id: String,
    pub prompt: String,
}

/// The assistant's reply as the backend spells it.
#[derive(Debug, Clone, Deserialize)]
pub struct AiReplyDto {
    pub ai: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl From<AiReplyDto> for AssistantReply {
    fn from(dto: AiReplyDto) -> Self {
        AssistantReply {
            text: dto.ai,
            timestamp: dto.timestamp,
        }
    }
}

/// Generate response: a `{ status, data: { ai } }` envelope or the bare
/// `{ ai }` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GeneratePromptResponse {
    Enveloped { status: bool, data: AiReplyDto },
    Bare(AiReplyDto),
}

impl From<GeneratePromptResponse> for PromptReply {
    fn from(response: GeneratePromptResponse) -> Self {
        match response {
            GeneratePromptResponse::Enveloped { status, data } => PromptReply::Enveloped {
                status,
                data: data.into(),
            },
            GeneratePromptResponse::Bare(reply) => PromptReply::Bare(reply.into()),
        }
    }
}
