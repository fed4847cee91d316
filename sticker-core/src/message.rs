//! Support messages left by visitors.
//!
//! The message board itself lives behind the [`MessageBoard`] trait; this
//! module owns the client-side validation and an in-memory board used by
//! tests and offline hosts.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::lifecycle::current_timestamp_ms;

/// Maximum message body length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 300;

/// Maximum nickname length, in characters.
pub const MAX_NICKNAME_CHARS: usize = 40;

/// A message as typed into the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDraft {
    /// Author nickname.
    pub nickname: String,
    /// Message body.
    pub body: String,
    /// Overlay the author used, if any.
    pub overlay: Option<String>,
}

impl MessageDraft {
    /// Create a draft without an overlay reference.
    #[must_use]
    pub fn new(nickname: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            body: body.into(),
            overlay: None,
        }
    }

    /// Attach the overlay the author picked.
    #[must_use]
    pub fn with_overlay(mut self, overlay: impl Into<String>) -> Self {
        self.overlay = Some(overlay.into());
        self
    }

    /// Characters left before the body limit; negative when over.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn remaining_chars(&self) -> i64 {
        MAX_MESSAGE_CHARS as i64 - self.body.chars().count() as i64
    }

    /// Validate and normalise the draft.
    ///
    /// Nickname and body are trimmed; both must be non-empty and within their
    /// character limits.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMessage`] naming the offending field.
    pub fn validate(&self) -> CoreResult<Self> {
        let nickname = self.nickname.trim();
        let body = self.body.trim();

        if nickname.is_empty() {
            return Err(CoreError::InvalidMessage("nickname is required".into()));
        }
        if nickname.chars().count() > MAX_NICKNAME_CHARS {
            return Err(CoreError::InvalidMessage(format!(
                "nickname exceeds {MAX_NICKNAME_CHARS} characters"
            )));
        }
        if body.is_empty() {
            return Err(CoreError::InvalidMessage("message is required".into()));
        }
        if body.chars().count() > MAX_MESSAGE_CHARS {
            return Err(CoreError::InvalidMessage(format!(
                "message exceeds {MAX_MESSAGE_CHARS} characters"
            )));
        }

        Ok(Self {
            nickname: nickname.to_string(),
            body: body.to_string(),
            overlay: self
                .overlay
                .as_deref()
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string),
        })
    }
}

/// A stored support message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportMessage {
    /// Record id.
    pub id: Uuid,
    /// Author nickname.
    pub nickname: String,
    /// Message body.
    pub body: String,
    /// Overlay the author used, if any.
    pub overlay: Option<String>,
    /// Creation time in milliseconds since epoch.
    pub timestamp_ms: u64,
}

/// Create/list collaborator for support messages.
pub trait MessageBoard {
    /// Validate and store a draft.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMessage`] for drafts that fail validation,
    /// or [`CoreError::Collaborator`] if the backing store fails.
    fn submit(&self, draft: &MessageDraft) -> CoreResult<SupportMessage>;

    /// All messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Collaborator`] if the backing store fails.
    fn list(&self) -> CoreResult<Vec<SupportMessage>>;
}

/// Process-local message board.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageBoard {
    messages: Arc<RwLock<Vec<SupportMessage>>>,
}

impl InMemoryMessageBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the board is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageBoard for InMemoryMessageBoard {
    fn submit(&self, draft: &MessageDraft) -> CoreResult<SupportMessage> {
        let clean = draft.validate()?;
        let message = SupportMessage {
            id: Uuid::new_v4(),
            nickname: clean.nickname,
            body: clean.body,
            overlay: clean.overlay,
            timestamp_ms: current_timestamp_ms(),
        };
        self.messages
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(message.clone());
        tracing::info!(id = %message.id, "Support message stored");
        Ok(message)
    }

    fn list(&self) -> CoreResult<Vec<SupportMessage>> {
        let messages = self
            .messages
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // Insertion order breaks timestamp ties.
        Ok(messages.iter().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_trims_and_lists_newest_first() {
        let board = InMemoryMessageBoard::new();
        board
            .submit(&MessageDraft::new("  anon ", "first"))
            .expect("first");
        board
            .submit(&MessageDraft::new("kim", "second").with_overlay("asset03.png"))
            .expect("second");

        let listed = board.list().expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].body, "second");
        assert_eq!(listed[0].overlay.as_deref(), Some("asset03.png"));
        assert_eq!(listed[1].nickname, "anon");
    }

    #[test]
    fn empty_fields_are_rejected() {
        let board = InMemoryMessageBoard::new();
        assert!(board.submit(&MessageDraft::new("  ", "hi")).is_err());
        assert!(board.submit(&MessageDraft::new("me", "\n\t")).is_err());
        assert!(board.is_empty());
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let body: String = "무".repeat(MAX_MESSAGE_CHARS);
        let draft = MessageDraft::new("me", body.clone());
        assert_eq!(draft.remaining_chars(), 0);
        assert!(draft.validate().is_ok());

        let too_long = MessageDraft::new("me", format!("{body}!"));
        assert_eq!(too_long.remaining_chars(), -1);
        assert!(matches!(
            too_long.validate(),
            Err(CoreError::InvalidMessage(_))
        ));
    }
}
