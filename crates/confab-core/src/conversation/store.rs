//! In-memory conversation collection.
//!
//! This module contains the keyed, display-ordered conversation store the
//! session manager mutates. It performs no network calls and holds no locks
//! of its own; the manager wraps it in an async lock so each state transition
//! is atomic with respect to snapshot readers.

use super::model::Conversation;
use crate::error::{ConfabError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Keyed collection of conversations with one optional active conversation.
///
/// Conversations are handed out behind `Arc`: a commit replaces the whole
/// value, it never mutates one in place. Display order is tracked separately
/// from the keyed map: newly created sessions go to the front
/// (most-recent-first), while history loads keep the order the remote
/// returned.
#[derive(Debug, Default)]
pub struct ConversationStore {
    /// Conversations keyed by conversation id.
    conversations: HashMap<String, Arc<Conversation>>,
    /// Conversation ids in display order.
    order: Vec<String>,
    /// Id of the active conversation, if one is selected.
    active_id: Option<String>,
}

impl ConversationStore {
    /// Creates an empty store with no active conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations.
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the store holds no conversations.
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Replaces the entire collection, used on history load.
    ///
    /// The first element of `list` becomes the active conversation; an empty
    /// `list` leaves no conversation active.
    pub fn replace_all(&mut self, list: Vec<Conversation>) {
        self.conversations.clear();
        self.order.clear();
        self.active_id = list.first().map(|c| c.conversation_id.clone());
        for conversation in list {
            let id = conversation.conversation_id.clone();
            if self
                .conversations
                .insert(id.clone(), Arc::new(conversation))
                .is_none()
            {
                self.order.push(id);
            }
        }
    }

    /// Inserts or replaces a single conversation by id.
    ///
    /// New ids enter at the front of the display order; existing ids keep
    /// their position. The active conversation is never changed here; callers
    /// opt into that separately with [`ConversationStore::set_active`].
    pub fn upsert(&mut self, conversation: Conversation) {
        let id = conversation.conversation_id.clone();
        if self
            .conversations
            .insert(id.clone(), Arc::new(conversation))
            .is_none()
        {
            self.order.insert(0, id);
        }
    }

    /// Marks `id` as the active conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfabError::UnknownConversation`] if `id` is not stored.
    pub fn set_active(&mut self, id: &str) -> Result<()> {
        if !self.conversations.contains_key(id) {
            return Err(ConfabError::unknown_conversation(id));
        }
        self.active_id = Some(id.to_string());
        Ok(())
    }

    /// Returns the conversation stored under `id`, if any.
    pub fn get(&self, id: &str) -> Option<Arc<Conversation>> {
        self.conversations.get(id).cloned()
    }

    /// Returns the active conversation, if one is selected.
    pub fn active(&self) -> Option<Arc<Conversation>> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    /// Returns the id of the active conversation, if one is selected.
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// Returns all conversations in display order.
    pub fn ordered(&self) -> Vec<Arc<Conversation>> {
        self.order
            .iter()
            .filter_map(|id| self.conversations.get(id).cloned())
            .collect()
    }
}
