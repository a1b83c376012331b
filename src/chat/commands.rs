//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the session and is never sent to the
//! backend as a chat message.

use crate::chat::config::parse_on_off;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Upload the `.pdf` file at this path.
    Upload(String),

    /// Export the message log to this path as JSON.
    Save(String),

    /// Probe the backend's health endpoint.
    Health,

    /// Show the session id.
    Session,

    /// Show session status (phase, uploads, settings).
    Status,

    /// Cancel every request in flight.
    Cancel,

    /// Turn streamed replies on or off.
    Stream(bool),

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
/// should be submitted as a chat message.
///
/// # Examples
///
/// ```
/// # use vera::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/upload report.pdf").is_some());
/// assert!(parse_command("What does the paper conclude?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "upload" => match argument {
            Some(path) => ChatCommand::Upload(path.to_string()),
            None => ChatCommand::Invalid("/upload requires a path to a .pdf file".to_string()),
        },
        "save" => match argument {
            Some(path) => ChatCommand::Save(path.to_string()),
            None => ChatCommand::Invalid("/save requires a file path".to_string()),
        },
        "health" => ChatCommand::Health,
        "session" => ChatCommand::Session,
        "status" | "stats" => ChatCommand::Status,
        "cancel" => ChatCommand::Cancel,
        "stream" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Stream(value),
            None => ChatCommand::Invalid("/stream expects 'on' or 'off'".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "" => ChatCommand::Invalid("Empty command; try /help".to_string()),
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /upload <file.pdf>     Upload a PDF for Vera to read
  /save <file>           Export the conversation as JSON
  /health                Check that the backend is up
  /session               Show the session id
  /status                Show session status
  /cancel                Cancel requests in flight (also Ctrl+C)
  /stream on|off         Stream replies token by token
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /QUIT  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_upload() {
        assert_eq!(
            parse_command("/upload papers/attention.pdf"),
            Some(ChatCommand::Upload("papers/attention.pdf".to_string()))
        );
        assert_eq!(
            parse_command("/upload   My Paper.pdf  "),
            Some(ChatCommand::Upload("My Paper.pdf".to_string()))
        );
        assert!(matches!(
            parse_command("/upload"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_save() {
        assert_eq!(
            parse_command("/save chat.json"),
            Some(ChatCommand::Save("chat.json".to_string()))
        );
        assert!(matches!(
            parse_command("/save"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_stream_toggle() {
        assert_eq!(parse_command("/stream on"), Some(ChatCommand::Stream(true)));
        assert_eq!(parse_command("/stream off"), Some(ChatCommand::Stream(false)));
        assert!(matches!(
            parse_command("/stream maybe"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("/health"), Some(ChatCommand::Health));
        assert_eq!(parse_command("/session"), Some(ChatCommand::Session));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Status));
        assert_eq!(parse_command("/cancel"), Some(ChatCommand::Cancel));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_commands() {
        assert_eq!(
            parse_command("/model gpt"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
        assert!(matches!(parse_command("/"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello, Vera!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("and/or"), None);
    }

    #[test]
    fn help_text_lists_commands() {
        let help = help_text();
        for command in ["/upload", "/save", "/health", "/cancel", "/stream", "/quit"] {
            assert!(help.contains(command), "missing {command}");
        }
    }
}
