//! Conversation domain model.
//!
//! This module contains the core Conversation entity: a named, append-only
//! message log owned by a user.

use super::message::Message;
use serde::{Deserialize, Serialize};

/// Character budget for sidebar-style previews.
const PREVIEW_CHARS: usize = 30;

/// A named conversation between the user and the assistant.
///
/// A conversation contains:
/// - A unique identifier, either server-issued or locally generated
/// - The owning user id (opaque, supplied by the collaborator)
/// - An ordered message log where insertion order is chronological order
///
/// The message log is append-only from the session manager's perspective; no
/// reordering or deletion is exposed. Every mutation produces a new
/// `Conversation` value (copy-on-write), so readers holding an earlier
/// snapshot never observe a partially updated message list. `revision`
/// increases with each committed copy, letting a rendering layer detect
/// staleness cheaply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub conversation_id: String,
    /// Owning user identifier.
    pub user_id: String,
    /// Copy-on-write version counter, bumped on every committed change.
    #[serde(default)]
    pub revision: u64,
    /// Ordered message log.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new(conversation_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            revision: 0,
            messages: Vec::new(),
        }
    }

    /// Returns a copy with `message` appended and the revision bumped.
    ///
    /// The original value is left untouched; this is the copy-on-write step
    /// every store commit goes through.
    pub fn with_message(&self, message: Message) -> Self {
        let mut messages = self.messages.clone();
        messages.push(message);
        Self {
            conversation_id: self.conversation_id.clone(),
            user_id: self.user_id.clone(),
            revision: self.revision + 1,
            messages,
        }
    }

    /// Returns the last message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Short preview of the first message for list rendering, falling back to
    /// `"New Conversation"` when there is nothing to show.
    pub fn title_preview(&self) -> String {
        self.messages
            .first()
            .map(|message| truncate_chars(&message.content, PREVIEW_CHARS))
            .filter(|preview| !preview.is_empty())
            .unwrap_or_else(|| "New Conversation".to_string())
    }

    /// Short preview of the last message for list rendering, empty when the
    /// conversation has no messages.
    pub fn last_preview(&self) -> String {
        self.messages
            .last()
            .map(|message| truncate_chars(&message.content, PREVIEW_CHARS))
            .unwrap_or_default()
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
