//! Error types for the confab core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the conversation session core.
///
/// This provides typed, structured error variants with constructor helpers
/// and predicates so callers can react to specific failures without matching
/// on variants directly.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ConfabError {
    /// Network or HTTP-level failure talking to the remote service.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// An operation referenced a conversation id absent from the store.
    #[error("Unknown conversation: '{id}'")]
    UnknownConversation { id: String },

    /// The remote service answered with a falsy status.
    #[error("Rejected by remote: {0}")]
    Rejected(String),

    /// The remote response matched none of the accepted shapes.
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConfabError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an UnknownConversation error
    pub fn unknown_conversation(id: impl Into<String>) -> Self {
        Self::UnknownConversation { id: id.into() }
    }

    /// Creates a Rejected error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Creates an UnexpectedShape error
    pub fn unexpected_shape(message: impl Into<String>) -> Self {
        Self::UnexpectedShape(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is an UnknownConversation error
    pub fn is_unknown_conversation(&self) -> bool {
        matches!(self, Self::UnknownConversation { .. })
    }

    /// Check if this is a Rejected error
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Check if this is an UnexpectedShape error
    pub fn is_unexpected_shape(&self) -> bool {
        matches!(self, Self::UnexpectedShape(_))
    }

    /// Check if this is a Config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<serde_json::Error> for ConfabError {
    fn from(err: serde_json::Error) -> Self {
        Self::UnexpectedShape(err.to_string())
    }
}

/// A type alias for `Result<T, ConfabError>`.
pub type Result<T> = std::result::Result<T, ConfabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_helpers_match_predicates() {
        assert!(ConfabError::transport("boom").is_transport());
        assert!(ConfabError::unknown_conversation("c-1").is_unknown_conversation());
        assert!(ConfabError::rejected("no").is_rejected());
        assert!(ConfabError::unexpected_shape("what").is_unexpected_shape());
        assert!(ConfabError::config("bad").is_config());
    }

    #[test]
    fn unknown_conversation_display_names_the_id() {
        let err = ConfabError::unknown_conversation("missing-id");
        assert_eq!(err.to_string(), "Unknown conversation: 'missing-id'");
    }

    #[test]
    fn serde_json_errors_become_shape_errors() {
        let err = serde_json::from_str::<Vec<i32>>("not json").unwrap_err();
        let converted: ConfabError = err.into();
        assert!(converted.is_unexpected_shape());
    }
}
