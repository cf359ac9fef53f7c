//! Chat message model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

use super::account::AccountId;
use super::matches::MatchId;

/// A unique identifier for a message, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Create a new unique message ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A chat message inside a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub match_id: MatchId,
    pub sender_id: AccountId,
    pub text: Option<String>,
    pub image_url: Option<String>,
    /// Send timestamp (Unix ms)
    pub sent_at: i64,
    /// Flipped once the recipient has read the message
    pub seen: bool,
}

impl Message {
    /// Build a new unseen message. At least one of `text` or `image_url` is required.
    pub fn new(
        match_id: MatchId,
        sender_id: AccountId,
        text: Option<String>,
        image_url: Option<String>,
    ) -> Result<Self> {
        Self::with_id(MessageId::new(), match_id, sender_id, text, image_url)
    }

    /// Same as [`Message::new`] with a pre-generated id (used when an image is
    /// uploaded under the message id before the message is stored).
    pub fn with_id(
        id: MessageId,
        match_id: MatchId,
        sender_id: AccountId,
        text: Option<String>,
        image_url: Option<String>,
    ) -> Result<Self> {
        let text = normalize_text_option(text);
        let image_url = normalize_text_option(image_url);
        if text.is_none() && image_url.is_none() {
            return Err(Error::InvalidInput(
                "Message needs text or an image".to_string(),
            ));
        }

        Ok(Self {
            id,
            match_id,
            sender_id,
            text,
            image_url,
            sent_at: chrono::Utc::now().timestamp_millis(),
            seen: false,
        })
    }

    /// Short single-line preview for conversation lists.
    #[must_use]
    pub fn preview(&self, max_len: usize) -> String {
        match &self.text {
            Some(text) => text
                .lines()
                .next()
                .unwrap_or("")
                .chars()
                .take(max_len)
                .collect(),
            None => "[photo]".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_id() -> MatchId {
        MatchId::for_pair(&AccountId::new("a").unwrap(), &AccountId::new("b").unwrap()).unwrap()
    }

    #[test]
    fn test_message_id_parse() {
        let id = MessageId::new();
        let parsed: MessageId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_message_requires_content() {
        let sender = AccountId::new("a").unwrap();
        assert!(Message::new(match_id(), sender.clone(), Some("  ".to_string()), None).is_err());
        assert!(Message::new(match_id(), sender, None, Some("https://x/y.jpg".to_string())).is_ok());
    }

    #[test]
    fn test_message_new_is_unseen_and_trimmed() {
        let message = Message::new(
            match_id(),
            AccountId::new("a").unwrap(),
            Some("  hi there ".to_string()),
            None,
        )
        .unwrap();
        assert!(!message.seen);
        assert_eq!(message.text.as_deref(), Some("hi there"));
        assert_eq!(message.preview(2), "hi");
    }
}
