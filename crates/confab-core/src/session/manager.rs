use super::remote::{CreateSessionRequest, RemoteConversationService};
use crate::conversation::{ASSISTANT_ID_SUFFIX, Conversation, ConversationStore, Message};
use crate::error::{ConfabError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Outcome of a [`SessionManager::send_message`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message went out and the assistant reply was merged in.
    Replied,
    /// Blank input or no active conversation; nothing was sent or stored.
    /// This models a disabled send button, not an error.
    Ignored,
}

/// Read-only view of the conversation state for a rendering layer.
///
/// Every conversation is behind `Arc`, so holding a snapshot never blocks the
/// manager and never observes a half-applied mutation. A snapshot is a moment
/// in time; re-read after each action to pick up new state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// All conversations in display order (most recently created first for
    /// locally created sessions, history order otherwise).
    pub conversations: Vec<Arc<Conversation>>,
    /// The active conversation, if one is selected.
    pub active_conversation: Option<Arc<Conversation>>,
    /// Ids of conversations with at least one prompt in flight.
    awaiting_reply: HashSet<String>,
}

impl SessionSnapshot {
    /// Whether `conversation_id` had a prompt in flight when the snapshot was
    /// taken.
    pub fn is_awaiting_reply(&self, conversation_id: &str) -> bool {
        self.awaiting_reply.contains(conversation_id)
    }

    /// Id of the active conversation, if one is selected.
    pub fn active_conversation_id(&self) -> Option<&str> {
        self.active_conversation
            .as_ref()
            .map(|conversation| conversation.conversation_id.as_str())
    }
}

/// Orchestrates conversation state against a remote backend.
///
/// `SessionManager` is responsible for:
/// - Loading conversation history in bulk
/// - Creating new sessions
/// - Sending user messages optimistically, before the backend confirms them
/// - Merging asynchronous assistant replies back into current state
/// - Tracking which conversation is active and which are awaiting a reply
///
/// It is the only component that mutates the [`ConversationStore`]. All three
/// network-backed actions leave prior state intact on failure; the sole
/// exception is the optimistic user message, which is deliberately never
/// rolled back when its reply fails to arrive.
///
/// Calls are not serialized: a caller may issue `send_message` again (from a
/// spawned task) while an earlier round trip is still outstanding. Each call
/// captures its target conversation id at invocation time and merges the
/// reply against the state current at completion time, so concurrent sends to
/// different conversations never interleave incorrectly. Replies to the same
/// conversation land in completion order, which may differ from send order.
pub struct SessionManager {
    /// Conversation state, mutated only through this manager.
    store: Arc<RwLock<ConversationStore>>,
    /// Count of in-flight prompts per conversation id.
    in_flight: Arc<RwLock<HashMap<String, usize>>>,
    /// Remote backend the manager drives.
    remote: Arc<dyn RemoteConversationService>,
    /// Owner recorded on locally created conversations.
    user_id: String,
    /// Source for locally generated message ids. Seeded from the clock so a
    /// fresh client keeps producing ids unlike those of earlier runs, then
    /// strictly monotonic within this instance.
    message_seq: AtomicU64,
}

impl SessionManager {
    /// Creates a manager with an empty store and no active conversation.
    ///
    /// # Arguments
    ///
    /// * `remote` - The backend used for history, session creation, and prompts
    /// * `user_id` - Owner id stamped on conversations created locally
    pub fn new(remote: Arc<dyn RemoteConversationService>, user_id: impl Into<String>) -> Self {
        Self {
            store: Arc::new(RwLock::new(ConversationStore::new())),
            in_flight: Arc::new(RwLock::new(HashMap::new())),
            remote,
            user_id: user_id.into(),
            message_seq: AtomicU64::new(chrono::Utc::now().timestamp_millis() as u64),
        }
    }

    /// Replaces the conversation state with the remote history.
    ///
    /// Both accepted history shapes are normalized before the store is
    /// touched. The first conversation of a non-empty history becomes active;
    /// an empty history leaves no conversation active.
    ///
    /// # Errors
    ///
    /// Returns the transport or shape error as-is. The store is left
    /// unchanged on failure, and nothing is retried.
    pub async fn load_history(&self) -> Result<()> {
        let payload = self.remote.fetch_history().await?;
        let conversations = payload.into_conversations();
        tracing::info!("Loaded {} conversations from history", conversations.len());

        let mut store = self.store.write().await;
        store.replace_all(conversations);
        Ok(())
    }

    /// Creates a new conversation on the backend and makes it active.
    ///
    /// The conversation id is generated locally (UUID v4) and adopted by the
    /// backend. The new conversation starts with an empty message log and is
    /// prepended to the display order.
    ///
    /// # Arguments
    ///
    /// * `seed_prompt` - Optional seed text forwarded to the backend
    ///
    /// # Returns
    ///
    /// The id of the new conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfabError::Rejected`] when the backend answers with a
    /// falsy status, or the transport error as-is. No state is mutated on
    /// failure.
    pub async fn new_session(&self, seed_prompt: Option<&str>) -> Result<String> {
        let conversation_id = Uuid::new_v4().to_string();
        let request = CreateSessionRequest {
            session_id: conversation_id.clone(),
            prompt: seed_prompt.map(str::to_string),
        };

        let ack = self.remote.create_session(request).await?;
        if !ack.status {
            tracing::warn!("Backend rejected new session {}", conversation_id);
            return Err(ConfabError::rejected("session was not accepted"));
        }

        let conversation = Conversation::new(conversation_id.clone(), self.user_id.clone());
        let mut store = self.store.write().await;
        store.upsert(conversation);
        store.set_active(&conversation_id)?;
        tracing::info!("Created conversation {}", conversation_id);

        Ok(conversation_id)
    }

    /// Sends `text` to the active conversation.
    ///
    /// The user message is committed to the store before the network call
    /// starts (the optimistic update), so snapshot readers see it
    /// immediately. The assistant reply is then merged against the
    /// conversation as it exists at completion time, not against the
    /// pre-send state, so messages sent while the call was in flight are
    /// never lost.
    ///
    /// # Returns
    ///
    /// - `Ok(SendOutcome::Ignored)`: blank input or no active conversation;
    ///   no network call was made and the store is untouched
    /// - `Ok(SendOutcome::Replied)`: the reply was merged in
    ///
    /// # Errors
    ///
    /// Returns the transport, rejection, or shape error from the round trip,
    /// or [`ConfabError::UnknownConversation`] when the conversation was
    /// dropped by a concurrent history reload before the reply landed. The
    /// optimistic user message is never rolled back; on failure the
    /// conversation simply shows no reply.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        // Optimistic append, committed before the first await on the network.
        let conversation_id = {
            let mut store = self.store.write().await;
            let Some(active) = store.active() else {
                tracing::debug!("send_message ignored: no active conversation");
                return Ok(SendOutcome::Ignored);
            };
            let message = Message::user(self.next_message_id(), text);
            store.upsert(active.with_message(message));
            active.conversation_id.clone()
        };

        self.begin_await(&conversation_id).await;
        let merged = self.deliver_prompt(&conversation_id, text).await;
        self.end_await(&conversation_id).await;

        match merged {
            Ok(()) => Ok(SendOutcome::Replied),
            Err(e) => {
                tracing::warn!("Send failed for conversation {}: {}", conversation_id, e);
                Err(e)
            }
        }
    }

    /// Marks `conversation_id` as the active conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfabError::UnknownConversation`] if the id is not stored.
    pub async fn set_active(&self, conversation_id: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.set_active(conversation_id)
    }

    /// Whether `conversation_id` has at least one prompt in flight.
    pub async fn is_awaiting_reply(&self, conversation_id: &str) -> bool {
        self.in_flight
            .read()
            .await
            .get(conversation_id)
            .is_some_and(|count| *count > 0)
    }

    /// Takes a read-only snapshot of the current state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let store = self.store.read().await;
        let in_flight = self.in_flight.read().await;
        SessionSnapshot {
            conversations: store.ordered(),
            active_conversation: store.active(),
            awaiting_reply: in_flight.keys().cloned().collect(),
        }
    }

    /// Runs the network leg of a send and merges the reply.
    async fn deliver_prompt(&self, conversation_id: &str, prompt: &str) -> Result<()> {
        let reply = self
            .remote
            .send_prompt(conversation_id, prompt)
            .await?
            .into_reply()?;

        // Merge against current state, re-read by id: the conversation may
        // have gained messages, or vanished, while the call was in flight.
        let mut store = self.store.write().await;
        let current = store
            .get(conversation_id)
            .ok_or_else(|| ConfabError::unknown_conversation(conversation_id))?;
        let message = Message::assistant(
            format!("{}{}", self.next_message_id(), ASSISTANT_ID_SUFFIX),
            reply.text,
            reply.timestamp,
        );
        store.upsert(current.with_message(message));
        tracing::debug!("Merged assistant reply into conversation {}", conversation_id);
        Ok(())
    }

    fn next_message_id(&self) -> String {
        self.message_seq.fetch_add(1, Ordering::Relaxed).to_string()
    }

    async fn begin_await(&self, conversation_id: &str) {
        let mut in_flight = self.in_flight.write().await;
        *in_flight.entry(conversation_id.to_string()).or_insert(0) += 1;
    }

    async fn end_await(&self, conversation_id: &str) {
        let mut in_flight = self.in_flight.write().await;
        if let Some(count) = in_flight.get_mut(conversation_id) {
            *count -= 1;
            if *count == 0 {
                in_flight.remove(conversation_id);
            }
        }
    }
}
