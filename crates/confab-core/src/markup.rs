//! Fenced code block detection for message rendering.
//!
//! Message content may embed a triple-backtick fenced block; the render layer
//! calls [`extract_code_block`] per message to decide between a code panel and
//! plain prose. Detection is pure and deterministic, so it is safe to run on
//! every render.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Language assumed when the opening fence carries no tag.
const DEFAULT_LANGUAGE: &str = "javascript";

/// First fenced block: opening fence with an optional language tag, then a
/// lazily matched body, then the closing fence. `(?s)` lets the body span
/// lines.
static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(\w+)?\n(.*?)```").expect("fenced block pattern is valid"));

/// A fenced code block extracted from message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Language tag from the opening fence, or `"javascript"` when absent.
    pub language: String,
    /// The code body between the fences, trailing newline included.
    pub code: String,
}

/// Detects the first fenced code block in `text`.
///
/// Only the first block is considered; text before or after it is not
/// recovered here. A fence without a closing terminator is not a match,
/// so unterminated blocks yield `None` rather than a partial block.
pub fn extract_code_block(text: &str) -> Option<CodeBlock> {
    let captures = FENCED_BLOCK.captures(text)?;
    let language = captures
        .get(1)
        .map(|tag| tag.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let code = captures.get(2)?.as_str().to_string();
    Some(CodeBlock { language, code })
}
