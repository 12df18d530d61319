//! Slash command parsing for the chat application.
//!
//! Commands are matched case-insensitively against the entire trimmed input
//! line. Anything that doesn't match — including unrecognized slash-prefixed
//! lines — is treated as a regular message and sent to the model.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    /// Clear the conversation, keeping only the system message.
    Clear,

    /// Save the current session. `new` forces a fresh session name even when
    /// a session is already bound.
    Save {
        /// Whether to create a new session rather than overwrite the bound one.
        new: bool,
    },

    /// Load a saved session from the menu.
    Load,

    /// Set a new system prompt (collected interactively).
    System,

    /// Exit the chat application.
    Quit,
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the whole trimmed line is a recognized
/// command, or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use confab::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
/// assert_eq!(parse_command("/save new"), Some(ChatCommand::Save { new: true }));
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    match input.trim().to_lowercase().as_str() {
        "/clear" => Some(ChatCommand::Clear),
        "/save" => Some(ChatCommand::Save { new: false }),
        "/save new" => Some(ChatCommand::Save { new: true }),
        "/load" => Some(ChatCommand::Load),
        "/system" => Some(ChatCommand::System),
        "/exit" | "/bye" => Some(ChatCommand::Quit),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear      Reset the conversation; only the system message remains
  /save       Save the current session (prompts for a name if unsaved)
  /save new   Save as a new session under a fresh name
  /load       Pick a saved session to load
  /system     Set a new system prompt (finish with a blank line)
  /exit, /bye Exit the chat"#
}
