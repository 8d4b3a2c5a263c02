//! Core conversation state for Confab.
//!
//! This crate holds the conversation domain model, the in-memory store, the
//! session manager that orchestrates optimistic sends and reply merges, and
//! the fenced-code classifier used at render time. Transports and rendering
//! live in sibling crates; this crate only depends on the
//! [`session::RemoteConversationService`] contract.

pub mod conversation;
pub mod error;
pub mod markup;
pub mod session;

// Re-export common error type
pub use error::ConfabError;
