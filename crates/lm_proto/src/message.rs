//! Plaintext chat line grammar (inside the channel ciphertext).
//!
//! ```text
//! TIMESTAMP "SENDER" to "RECEIVER" "BODY"
//! 05-01-2024 10:30 "alice" to "bob" "hi"
//! ```
//!
//! TIMESTAMP is `DD-MM-YYYY HH:mm`, 24-hour, zero-padded, sender's local
//! clock. BODY is at most 150 characters and is NOT escaped; parsing is
//! therefore lazy left-to-right, exactly like the pattern
//! `^(.*?) "(.*?)" to "(.*?)" "(.*)"$` used by existing clients.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_BODY_CHARS: usize = 150;
pub const MAX_NAME_CHARS: usize = 64;
pub const TIMESTAMP_LEN: usize = 16;
/// Longest line `compose` can produce, in bytes: timestamp, two names, body
/// and the 12 bytes of quoting. Anything longer was not written by a client.
pub const MAX_LINE_BYTES: usize = TIMESTAMP_LEN + 4 * (2 * MAX_NAME_CHARS + MAX_BODY_CHARS) + 12;
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

const NAME_OPEN: &str = " \"";
const NAME_TO: &str = "\" to \"";
const BODY_OPEN: &str = "\" \"";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    #[error("Message body is empty")]
    EmptyBody,

    #[error("Message too long ({len} characters, max {MAX_BODY_CHARS})")]
    BodyTooLong { len: usize },

    #[error("Chat lines cannot contain line breaks")]
    LineBreak,

    #[error("Invalid participant name: {0:?}")]
    InvalidName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sent,
    Received,
}

/// One decrypted chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    /// Raw timestamp text as written by the sender.
    pub timestamp: String,
    pub sender: String,
    pub receiver: String,
    pub body: String,
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

impl ChatLine {
    /// Build an outgoing line, enforcing the body limits before encryption.
    pub fn compose(
        sender: &str,
        receiver: &str,
        body: &str,
        at: NaiveDateTime,
    ) -> Result<Self, ProtoError> {
        for name in [sender, receiver] {
            if name.is_empty()
                || name.chars().count() > MAX_NAME_CHARS
                || name.contains('"')
                || name.chars().any(is_line_break)
            {
                return Err(ProtoError::InvalidName(name.to_string()));
            }
        }
        if body.is_empty() {
            return Err(ProtoError::EmptyBody);
        }
        let len = body.chars().count();
        if len > MAX_BODY_CHARS {
            return Err(ProtoError::BodyTooLong { len });
        }
        if body.chars().any(is_line_break) {
            return Err(ProtoError::LineBreak);
        }

        Ok(Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            body: body.to_string(),
        })
    }

    /// Parse a decrypted line. `None` means "not a chat line", never an error.
    ///
    /// The earliest split of each lazy group also leaves the most room for
    /// the groups after it, so one forward `find` per separator reproduces
    /// the backtracking match. The only extra condition is that the body
    /// separator starts at or before the last one in the line.
    pub fn parse(line: &str) -> Option<Self> {
        if line.len() > MAX_LINE_BYTES || line.chars().any(is_line_break) {
            return None;
        }
        if !line.ends_with('"') {
            return None;
        }
        let body_end = line.len() - 1;
        let last_body_open = line[..body_end].rfind(BODY_OPEN)?;

        let ts_end = line.find(NAME_OPEN)?;
        let sender_start = ts_end + NAME_OPEN.len();
        let sender_end = sender_start + line[sender_start..].find(NAME_TO)?;
        let receiver_start = sender_end + NAME_TO.len();
        if receiver_start > last_body_open {
            return None;
        }
        let receiver_end = receiver_start + line[receiver_start..].find(BODY_OPEN)?;
        let body_start = receiver_end + BODY_OPEN.len();

        Some(Self {
            timestamp: line[..ts_end].to_string(),
            sender: line[sender_start..sender_end].to_string(),
            receiver: line[receiver_start..receiver_end].to_string(),
            body: line[body_start..body_end].to_string(),
        })
    }

    /// The timestamp as a date, when the sender wrote a well-formed one.
    pub fn sent_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }

    pub fn direction(&self, me: &str) -> Direction {
        if self.sender == me {
            Direction::Sent
        } else {
            Direction::Received
        }
    }

    /// True when the line is between exactly `a` and `b`, in either direction.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.sender == a && self.receiver == b) || (self.sender == b && self.receiver == a)
    }
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" to \"{}\" \"{}\"",
            self.timestamp, self.sender, self.receiver, self.body
        )
    }
}
