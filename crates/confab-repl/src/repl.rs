//! Interactive chat loop.
//!
//! The prompt never blocks on the backend: each send runs on a spawned task
//! and reports back over an mpsc channel to a printer task, so the user can
//! keep typing (or switch conversations) while a reply is outstanding.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc;

use confab_core::conversation::{Conversation, MessageRole};
use confab_core::error::ConfabError;
use confab_core::session::{SendOutcome, SessionManager};

use crate::render;

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct ReplHelper {
    commands: Vec<String>,
}

impl ReplHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/new".to_string(),
                "/open".to_string(),
                "/list".to_string(),
                "/refresh".to_string(),
                "/help".to_string(),
            ],
        }
    }
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ReplHelper {}

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Plain text for the active conversation.
    Say(String),
    /// `/new [prompt]`: create a conversation, optionally seeded.
    New { seed: Option<String> },
    /// `/open <n>`: activate the nth listed conversation (1-based).
    Open { index: usize },
    /// `/list`: show all conversations.
    List,
    /// `/refresh`: reload history from the backend.
    Refresh,
    /// `/help`: show command help.
    Help,
    /// `quit` or `exit`.
    Quit,
    /// An unrecognized or malformed slash command.
    Unknown(String),
}

/// Parses one input line. Blank lines parse to `None`.
fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "quit" || trimmed == "exit" {
        return Some(Command::Quit);
    }
    if !trimmed.starts_with('/') {
        return Some(Command::Say(trimmed.to_string()));
    }

    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };
    match name {
        "/new" => Some(Command::New {
            seed: (!rest.is_empty()).then(|| rest.to_string()),
        }),
        "/open" => match rest.parse::<usize>() {
            Ok(index) if index > 0 => Some(Command::Open { index }),
            _ => Some(Command::Unknown(trimmed.to_string())),
        },
        "/list" => Some(Command::List),
        "/refresh" => Some(Command::Refresh),
        "/help" => Some(Command::Help),
        _ => Some(Command::Unknown(trimmed.to_string())),
    }
}

/// Completion of a spawned send, delivered to the printer task.
enum SendEvent {
    /// The reply was merged; `conversation` is the post-merge state.
    Replied { conversation: Arc<Conversation> },
    /// The round trip failed. The optimistic user message stays put.
    Failed {
        conversation_id: String,
        error: ConfabError,
    },
}

/// Runs the interactive loop until the user quits.
///
/// Sends are spawned so the prompt stays responsive; completions are printed
/// by a dedicated task fed over an mpsc channel. On exit the channel is
/// dropped and the printer drains any replies still in flight.
pub async fn run(manager: Arc<SessionManager>) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::channel::<SendEvent>(32);

    // Spawn the printer for completed sends
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                SendEvent::Replied { conversation } => {
                    let reply = conversation
                        .messages
                        .iter()
                        .rev()
                        .find(|message| message.role == MessageRole::Assistant);
                    if let Some(message) = reply {
                        render::print_message(message);
                    }
                }
                SendEvent::Failed {
                    conversation_id,
                    error,
                } => {
                    eprintln!(
                        "{}",
                        format!("No reply for conversation {}: {}", conversation_id, error).red()
                    );
                }
            }
        }
    });

    // ===== REPL Setup =====
    let helper = ReplHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== Confab ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a message to chat, '/help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();

    // Show what history load (if any) brought in
    let snapshot = manager.snapshot().await;
    if !snapshot.conversations.is_empty() {
        render::print_conversation_list(&snapshot);
        if let Some(active) = &snapshot.active_conversation {
            println!();
            render::print_conversation(active);
        }
    }

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let Some(command) = parse_command(&line) else {
                    continue;
                };
                let _ = rl.add_history_entry(&line);

                match command {
                    Command::Say(text) => {
                        let snapshot = manager.snapshot().await;
                        let Some(target_id) =
                            snapshot.active_conversation_id().map(str::to_string)
                        else {
                            println!(
                                "{}",
                                "No active conversation. Start one with /new.".yellow()
                            );
                            continue;
                        };

                        println!("{}", format!("> {}", text).green());
                        render::print_thinking();

                        // Spawn the round trip so the prompt comes right back
                        let tx = event_tx.clone();
                        let sender = Arc::clone(&manager);
                        tokio::spawn(async move {
                            let event = match sender.send_message(&text).await {
                                Ok(SendOutcome::Replied) => {
                                    let snapshot = sender.snapshot().await;
                                    let merged = snapshot
                                        .conversations
                                        .iter()
                                        .find(|c| c.conversation_id == target_id);
                                    match merged {
                                        Some(conversation) => SendEvent::Replied {
                                            conversation: Arc::clone(conversation),
                                        },
                                        None => return,
                                    }
                                }
                                Ok(SendOutcome::Ignored) => return,
                                Err(error) => SendEvent::Failed {
                                    conversation_id: target_id,
                                    error,
                                },
                            };
                            let _ = tx.send(event).await;
                        });
                    }
                    Command::New { seed } => match manager.new_session(seed.as_deref()).await {
                        Ok(id) => {
                            println!(
                                "{}",
                                format!("Started conversation {}", &id[..8]).bright_green()
                            );
                        }
                        Err(e) => {
                            eprintln!(
                                "{}",
                                format!("Could not create conversation: {}", e).red()
                            );
                        }
                    },
                    Command::Open { index } => {
                        let snapshot = manager.snapshot().await;
                        let Some(conversation) = snapshot.conversations.get(index - 1) else {
                            println!(
                                "{}",
                                format!("No conversation at {}. See /list.", index).yellow()
                            );
                            continue;
                        };
                        let id = conversation.conversation_id.clone();
                        match manager.set_active(&id).await {
                            Ok(()) => {
                                let current = manager.snapshot().await;
                                if let Some(active) = &current.active_conversation {
                                    render::print_conversation(active);
                                    if current.is_awaiting_reply(&id) {
                                        render::print_thinking();
                                    }
                                }
                            }
                            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                        }
                    }
                    Command::List => {
                        render::print_conversation_list(&manager.snapshot().await);
                    }
                    Command::Refresh => match manager.load_history().await {
                        Ok(()) => {
                            let snapshot = manager.snapshot().await;
                            println!(
                                "{}",
                                format!("Loaded {} conversations.", snapshot.conversations.len())
                                    .bright_green()
                            );
                            render::print_conversation_list(&snapshot);
                        }
                        Err(e) => {
                            eprintln!("{}", format!("Could not load history: {}", e).red());
                        }
                    },
                    Command::Help => print_help(),
                    Command::Quit => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Command::Unknown(text) => {
                        println!("{}", format!("Unknown command: {}", text).bright_black());
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    // Drop the channel so the printer drains outstanding sends and stops
    drop(event_tx);
    let _ = printer.await;

    Ok(())
}

fn print_help() {
    println!("{}", "Commands:".bright_magenta());
    println!(
        "  {} {}",
        format!("{:<14}", "/new [prompt]").bright_cyan(),
        "start a conversation, optionally seeded".bright_black()
    );
    println!(
        "  {} {}",
        format!("{:<14}", "/open <n>").bright_cyan(),
        "switch to the nth listed conversation".bright_black()
    );
    println!(
        "  {} {}",
        format!("{:<14}", "/list").bright_cyan(),
        "show all conversations".bright_black()
    );
    println!(
        "  {} {}",
        format!("{:<14}", "/refresh").bright_cyan(),
        "reload history from the backend".bright_black()
    );
    println!(
        "  {} {}",
        format!("{:<14}", "/help").bright_cyan(),
        "show this help".bright_black()
    );
    println!(
        "  {} {}",
        format!("{:<14}", "quit").bright_cyan(),
        "exit".bright_black()
    );
    println!(
        "{}",
        "Anything else is sent to the active conversation.".bright_black()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_say() {
        assert_eq!(
            parse_command("hello there"),
            Some(Command::Say("hello there".to_string()))
        );
    }

    #[test]
    fn say_text_is_trimmed() {
        assert_eq!(
            parse_command("  hello  "),
            Some(Command::Say("hello".to_string()))
        );
    }

    #[test]
    fn blank_lines_parse_to_nothing() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn quit_and_exit_both_quit() {
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command("exit"), Some(Command::Quit));
    }

    #[test]
    fn new_without_a_seed() {
        assert_eq!(parse_command("/new"), Some(Command::New { seed: None }));
    }

    #[test]
    fn new_with_a_seed_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse_command("/new write a haiku about rain"),
            Some(Command::New {
                seed: Some("write a haiku about rain".to_string())
            })
        );
    }

    #[test]
    fn open_parses_a_one_based_index() {
        assert_eq!(parse_command("/open 2"), Some(Command::Open { index: 2 }));
    }

    #[test]
    fn open_rejects_zero_missing_and_garbage_indexes() {
        assert_eq!(
            parse_command("/open 0"),
            Some(Command::Unknown("/open 0".to_string()))
        );
        assert_eq!(
            parse_command("/open"),
            Some(Command::Unknown("/open".to_string()))
        );
        assert_eq!(
            parse_command("/open two"),
            Some(Command::Unknown("/open two".to_string()))
        );
    }

    #[test]
    fn bare_commands_parse() {
        assert_eq!(parse_command("/list"), Some(Command::List));
        assert_eq!(parse_command("/refresh"), Some(Command::Refresh));
        assert_eq!(parse_command("/help"), Some(Command::Help));
    }

    #[test]
    fn unrecognized_slash_commands_are_unknown() {
        assert_eq!(
            parse_command("/frobnicate now"),
            Some(Command::Unknown("/frobnicate now".to_string()))
        );
    }
}
