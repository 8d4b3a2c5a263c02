//! Session orchestration module.
//!
//! This module contains the remote service contract and the session manager
//! that drives it.
//!
//! # Module Structure
//!
//! - `remote`: Remote service trait and response payload shapes
//! - `manager`: Conversation lifecycle management (`SessionManager`)
//!
//! # Usage
//!
//! ```ignore
//! use confab_core::session::{SessionManager, SessionSnapshot, SendOutcome};
//! use confab_core::session::{RemoteConversationService, HistoryPayload, PromptReply};
//! ```

mod manager;
mod manager_test;
mod remote;

// Re-export public API
pub use manager::{SendOutcome, SessionManager, SessionSnapshot};
pub use remote::{
    AssistantReply, CreateSessionAck, CreateSessionRequest, HistoryPayload, PromptReply,
    RemoteConversationService,
};
