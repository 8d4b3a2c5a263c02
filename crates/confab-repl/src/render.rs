//! Colored terminal output for conversations and messages.
//!
//! User input renders in green, assistant replies in bright blue, and any
//! message carrying a fenced code block renders as a language-tagged panel
//! instead of prose.

use colored::Colorize;
use confab_core::conversation::{Conversation, Message, MessageRole};
use confab_core::markup::{CodeBlock, extract_code_block};
use confab_core::session::SessionSnapshot;

/// Prints one message, colored by role.
pub fn print_message(message: &Message) {
    if let Some(block) = extract_code_block(&message.content) {
        print_code_panel(&block);
        return;
    }
    match message.role {
        MessageRole::User => {
            for line in message.content.lines() {
                println!("{}", format!("> {}", line).green());
            }
        }
        MessageRole::Assistant => {
            for line in message.content.lines() {
                println!("{}", line.bright_blue());
            }
        }
    }
}

/// Prints a waiting indicator for an outstanding reply.
pub fn print_thinking() {
    println!("{}", "Thinking...".bright_black());
}

/// Replays a full conversation log under a title banner.
pub fn print_conversation(conversation: &Conversation) {
    println!(
        "{}",
        format!("=== {} ===", conversation.title_preview()).bright_magenta()
    );
    for message in &conversation.messages {
        print_message(message);
    }
}

/// Prints the conversation list with 1-based indexes. The active conversation
/// is marked with `*` and shown in cyan.
pub fn print_conversation_list(snapshot: &SessionSnapshot) {
    if snapshot.conversations.is_empty() {
        println!("{}", "No conversations. Start one with /new.".bright_black());
        return;
    }
    let active_id = snapshot.active_conversation_id();
    for (index, conversation) in snapshot.conversations.iter().enumerate() {
        let is_active = active_id == Some(conversation.conversation_id.as_str());
        let marker = if is_active { "*" } else { " " };
        let title = conversation.title_preview();
        let title = if is_active {
            title.bright_cyan().to_string()
        } else {
            title
        };
        println!("{} {:>2}. {}", marker, index + 1, title);

        let last = conversation.last_preview();
        if !last.is_empty() {
            println!("       {}", last.bright_black());
        }
        if snapshot.is_awaiting_reply(&conversation.conversation_id) {
            println!("       {}", "Thinking...".bright_black());
        }
    }
}

fn print_code_panel(block: &CodeBlock) {
    println!("{}", format!("```{}", block.language).bright_black());
    print!("{}", block.code);
    if !block.code.ends_with('\n') {
        println!();
    }
    println!("{}", "```".bright_black());
}
