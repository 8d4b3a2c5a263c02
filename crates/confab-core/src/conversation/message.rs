//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles and message content.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Fixed suffix appended to assistant message ids synthesized at merge time,
/// so they can never collide with a locally generated user message id.
pub const ASSISTANT_ID_SUFFIX: &str = "-ai";

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

/// A single message in a conversation history.
///
/// Each message has a role (user or assistant), content, and a timestamp
/// indicating when it was created. Messages are immutable once appended to
/// a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque unique message identifier. Assigned locally for user messages,
    /// synthesized with [`ASSISTANT_ID_SUFFIX`] for merged assistant replies.
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
}

impl Message {
    /// Creates a user message stamped with the current time.
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Creates an assistant message.
    ///
    /// The remote-supplied timestamp is used when present; otherwise the
    /// message is stamped with the local merge time.
    pub fn assistant(
        id: impl Into<String>,
        content: impl Into<String>,
        timestamp: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: timestamp.unwrap_or_else(|| Utc::now().to_rfc3339()),
        }
    }
}
