//! HTTP transport for Confab.
//!
//! This crate implements the core's `RemoteConversationService` contract over
//! REST, translating between the backend's wire shapes and the domain model.

pub mod dto;
pub mod service;

pub use service::{HttpConversationService, HttpServiceConfig};
