//! Input line parsing.
//!
//! Plain text is a broadcast message. Lines starting with `/` are commands.

use murmur_core::UserId;
use thiserror::Error;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Broadcast a message.
    Say(String),
    /// Start a session as this display name.
    Connect(String),
    /// End the session.
    Disconnect,
    /// Private message to a present user.
    Private {
        /// Recipient's user id.
        recipient_id: UserId,
        /// Message text.
        body: String,
    },
    /// Set our typing indicator.
    Typing(bool),
    /// Print the roster.
    Who,
    /// Print command help.
    Help,
    /// Disconnect and exit.
    Quit,
}

/// Input that is not a valid command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Command name not recognised.
    #[error("unknown command /{0}, try /help")]
    Unknown(String),
    /// Known command, wrong arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Command summary printed by `/help`.
pub const HELP: &str = "\
/connect <name>      join the chat
/disconnect          leave the chat
/pm <user id> <text> private message
/typing on|off       set typing indicator
/who                 list present users
/quit                leave and exit
<text>               send to everyone";

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let input = line.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let Some(cmd) = input.strip_prefix('/') else {
        return Ok(Some(Command::Say(input.to_string())));
    };

    let (name, rest) = cmd.split_once(char::is_whitespace).unwrap_or((cmd, ""));
    let rest = rest.trim();

    let command = match name {
        "connect" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("/connect <name>"));
            }
            Command::Connect(rest.to_string())
        },
        "disconnect" => Command::Disconnect,
        "pm" | "msg" => {
            let (id, body) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let body = body.trim();
            match id.parse::<UserId>() {
                Ok(recipient_id) if !body.is_empty() => {
                    Command::Private { recipient_id, body: body.to_string() }
                },
                _ => return Err(CommandError::Usage("/pm <user id> <text>")),
            }
        },
        "typing" => match rest {
            "on" => Command::Typing(true),
            "off" => Command::Typing(false),
            _ => return Err(CommandError::Usage("/typing on|off")),
        },
        "who" => Command::Who,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}
