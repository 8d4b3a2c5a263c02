//! Conversation domain module.
//!
//! This module contains the conversation data model and the in-memory store
//! the session manager mutates.
//!
//! # Module Structure
//!
//! - `message`: Message types (`MessageRole`, `Message`)
//! - `model`: Core conversation model (`Conversation`)
//! - `store`: Keyed in-memory collection (`ConversationStore`)

mod message;
mod model;
mod store;

// Re-export public API
pub use message::{ASSISTANT_ID_SUFFIX, Message, MessageRole};
pub use model::Conversation;
pub use store::ConversationStore;
