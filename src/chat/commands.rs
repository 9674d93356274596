//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to manage sessions without sending messages to the backend.

/// A parsed chat command.
///
/// These commands control the client and are not sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start a new session and make it active.
    New,

    /// List all sessions.
    Sessions,

    /// Switch to the session with the given id.
    Switch(String),

    /// Delete a session by id, or the active session when `None`.
    Delete(Option<String>),

    /// Clear the active session's message history.
    Clear,

    /// Change the directory chart images are written to.
    Charts(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent to the backend as a regular message.
///
/// # Examples
///
/// ```
/// # use finchat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/new"), Some(ChatCommand::New));
/// assert!(parse_command("What did AAPL close at?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" => ChatCommand::New,
        "sessions" | "list" => ChatCommand::Sessions,
        "switch" => match argument {
            Some(id) => ChatCommand::Switch(id.to_string()),
            None => ChatCommand::Invalid("/switch requires a session id".to_string()),
        },
        "delete" => ChatCommand::Delete(argument.map(|s| s.to_string())),
        "clear" => ChatCommand::Clear,
        "charts" => match argument {
            Some(dir) => ChatCommand::Charts(dir.to_string()),
            None => ChatCommand::Invalid("/charts requires a directory".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command} (try /help)")),
    };

    Some(result)
}

/// Returns the help text describing available commands.
pub fn help_text() -> &'static str {
    "Available commands:
/new             Start a new session
/sessions        List sessions (active marked with *)
/switch <id>     Switch to a session
/delete [id]     Delete a session (default: the active one)
/clear           Clear the active session's history
/charts <dir>    Change the chart output directory
/help            Show this help
/quit            Exit"
}
