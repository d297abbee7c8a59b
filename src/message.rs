//! Server → client line protocol
//!
//! Every server line is either a formatted chat line
//! `[HH:MM:SS] <username>: <text>` or a roster line
//! `USERLIST:<name1>, <name2>, ...`. Clients tell them apart by the prefix.

use chrono::{DateTime, Local};

use crate::types::Username;

/// Prefix of roster lines
pub const USERLIST_PREFIX: &str = "USERLIST:";

/// Separator between roster names
pub const USERLIST_SEPARATOR: &str = ", ";

/// Sent once to a client whose handshake name was rejected
pub const REJECTION_LINE: &str = "Invalid username. Disconnecting.";

/// One chat message on its way to the broadcaster
///
/// Ephemeral: built by the session read loop, formatted once, dropped.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Wall-clock time the line was read
    pub received_at: DateTime<Local>,
    /// Sender's username
    pub sender: Username,
    /// Decoded message text
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender: Username, text: String) -> Self {
        Self {
            received_at: Local::now(),
            sender,
            text,
        }
    }

    /// Format as the wire line (without terminator)
    pub fn to_line(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.received_at.format("%H:%M:%S"),
            self.sender,
            self.text
        )
    }
}

/// Build a roster line from usernames in registry order
pub fn user_list_line<'a, I>(usernames: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = usernames.into_iter().collect();
    format!("{}{}", USERLIST_PREFIX, names.join(USERLIST_SEPARATOR))
}

/// A line received from the server, classified for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Anything that is not a roster line, shown verbatim
    Chat(String),
    /// Current roster
    Roster(Vec<String>),
}

impl ServerLine {
    pub fn parse(line: &str) -> Self {
        match line.strip_prefix(USERLIST_PREFIX) {
            Some("") => ServerLine::Roster(Vec::new()),
            Some(names) => ServerLine::Roster(
                names
                    .split(USERLIST_SEPARATOR)
                    .map(str::to_string)
                    .collect(),
            ),
            None => ServerLine::Chat(line.to_string()),
        }
    }
}
