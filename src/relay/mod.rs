//! Relay session management
//!
//! Holds the one pending item per user between the moment it arrives in
//! the private chat and the moment the user names a destination, and
//! drives the single delivery attempt through the gateway.

// Allow non_std_lazy_statics because we use lazy_regex! macro which uses once_cell internally
// This is intentional and safe - lazy_regex! validates regex at compile time
#![allow(clippy::non_std_lazy_statics)]

pub mod gateway;

use crate::relay::gateway::{dispatch, MediaGateway};
use lazy_regex::lazy_regex;
use moka::future::Cache;
use teloxide::types::{FileId, Message, UserId};
use tracing::{error, info};

/// Upper bound on concurrently tracked sessions
const MAX_TRACKED_SESSIONS: u64 = 10_000;

/// Match a body wrapped in exactly one pair of double quotes.
/// `(?s)` lets the interior span multiple lines.
static RE_QUOTED: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r#"(?s)^"(.+)"$"#);

/// One item captured from a private chat, waiting for a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayItem {
    /// Photo, highest-resolution variant of the message
    Photo {
        /// Telegram file identifier
        file: FileId,
        /// Caption attached to the photo, if any
        caption: Option<String>,
    },
    /// Generic file attachment
    Document {
        /// Telegram file identifier
        file: FileId,
        /// Caption attached to the document, if any
        caption: Option<String>,
    },
    /// Video clip
    Video {
        /// Telegram file identifier
        file: FileId,
        /// Caption attached to the video, if any
        caption: Option<String>,
    },
    /// Audio track
    Audio {
        /// Telegram file identifier
        file: FileId,
        /// Caption attached to the audio, if any
        caption: Option<String>,
    },
    /// Sticker (Telegram does not allow captions here)
    Sticker {
        /// Telegram file identifier
        file: FileId,
    },
    /// Animation / GIF
    Animation {
        /// Telegram file identifier
        file: FileId,
        /// Caption attached to the animation, if any
        caption: Option<String>,
    },
    /// Plain text captured from a quoted message
    Text {
        /// Literal body with the outer quotes stripped
        body: String,
    },
}

impl RelayItem {
    /// Human-readable kind label used in acknowledgments
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Photo { .. } => "Photo",
            Self::Document { .. } => "Document",
            Self::Video { .. } => "Video",
            Self::Audio { .. } => "Audio",
            Self::Sticker { .. } => "Sticker",
            Self::Animation { .. } => "Animation",
            Self::Text { .. } => "Text message",
        }
    }

    /// Classifies a Telegram message as a relayable media item
    ///
    /// For photos the highest-resolution variant is taken. Returns
    /// `None` for text messages and for media kinds the bot does not
    /// relay (those are handled separately).
    #[must_use]
    pub fn from_message(msg: &Message) -> Option<Self> {
        let caption = msg.caption().map(ToString::to_string);

        if let Some(photos) = msg.photo() {
            let photo = photos.last()?;
            return Some(Self::Photo {
                file: photo.file.id.clone(),
                caption,
            });
        }
        if let Some(doc) = msg.document() {
            return Some(Self::Document {
                file: doc.file.id.clone(),
                caption,
            });
        }
        if let Some(video) = msg.video() {
            return Some(Self::Video {
                file: video.file.id.clone(),
                caption,
            });
        }
        if let Some(audio) = msg.audio() {
            return Some(Self::Audio {
                file: audio.file.id.clone(),
                caption,
            });
        }
        if let Some(sticker) = msg.sticker() {
            return Some(Self::Sticker {
                file: sticker.file.id.clone(),
            });
        }
        if let Some(animation) = msg.animation() {
            return Some(Self::Animation {
                file: animation.file.id.clone(),
                caption,
            });
        }

        None
    }
}

/// Whether the message carries media the bot recognizes but does not relay
///
/// Voice messages and video notes get an explicit rejection instead of
/// silence, so the user knows the item was seen.
#[must_use]
pub fn is_unsupported_media(msg: &Message) -> bool {
    msg.voice().is_some() || msg.video_note().is_some()
}

/// Extracts the body of a quoted text message
///
/// The input must be wrapped in exactly one leading and one trailing
/// double quote with at least one interior character. Exactly that
/// outer pair is stripped; interior quotes and newlines survive.
#[must_use]
pub fn parse_quoted(text: &str) -> Option<&str> {
    RE_QUOTED
        .captures(text.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Result of a relay attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The item reached the destination
    Delivered,
    /// No item was stored for this user
    NothingPending,
    /// The gateway rejected the delivery; carries its error description
    Failed(String),
}

/// Per-user store of pending items plus the single-attempt relay logic
///
/// Each user holds at most one item. Storing again overwrites, and the
/// item is removed after every relay attempt regardless of outcome.
/// Entries never expire on their own; only delivery, failure, or an
/// explicit cancel removes them.
#[derive(Clone)]
pub struct RelaySessionManager {
    /// Moka cache storing user_id -> pending item mappings
    sessions: Cache<UserId, RelayItem>,
}

impl RelaySessionManager {
    /// Creates a manager bounded at [`MAX_TRACKED_SESSIONS`] entries
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_TRACKED_SESSIONS)
    }

    /// Creates a manager with an explicit capacity bound
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            sessions: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// Stores an item for the user, replacing any pending one
    pub async fn begin(&self, user: UserId, item: RelayItem) {
        self.sessions.insert(user, item).await;
    }

    /// Returns the user's pending item without removing it
    pub async fn pending(&self, user: UserId) -> Option<RelayItem> {
        self.sessions.get(&user).await
    }

    /// Drops the user's pending item
    ///
    /// Returns `true` if an item existed. Callers reply the same way
    /// either way, so cancelling twice is harmless.
    pub async fn cancel(&self, user: UserId) -> bool {
        let existed = self.sessions.get(&user).await.is_some();
        self.sessions.invalidate(&user).await;
        existed
    }

    /// Attempts to deliver the user's pending item to `destination`
    ///
    /// The destination is trimmed and otherwise passed through verbatim.
    /// The stored item is removed before the gateway call, so each item
    /// gets exactly one attempt; a failed delivery is reported, not
    /// retried.
    pub async fn relay(
        &self,
        gateway: &dyn MediaGateway,
        user: UserId,
        destination: &str,
    ) -> RelayOutcome {
        let destination = destination.trim();

        let Some(item) = self.sessions.get(&user).await else {
            return RelayOutcome::NothingPending;
        };
        self.sessions.invalidate(&user).await;

        match dispatch(gateway, destination, &item).await {
            Ok(()) => {
                info!(
                    user_id = user.0,
                    kind = item.kind_name(),
                    destination,
                    "Relayed item to destination"
                );
                RelayOutcome::Delivered
            }
            Err(e) => {
                error!(
                    user_id = user.0,
                    kind = item.kind_name(),
                    destination,
                    error = %e,
                    "Failed to relay item"
                );
                RelayOutcome::Failed(e.to_string())
            }
        }
    }
}

impl Default for RelaySessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_item(body: &str) -> RelayItem {
        RelayItem::Text {
            body: body.to_string(),
        }
    }

    #[test]
    fn test_parse_quoted_strips_one_pair() {
        assert_eq!(parse_quoted("\"hello\""), Some("hello"));
        assert_eq!(parse_quoted("  \"hello\"  "), Some("hello"));
    }

    #[test]
    fn test_parse_quoted_keeps_interior_quotes() {
        assert_eq!(
            parse_quoted("\"she said \"hi\" twice\""),
            Some("she said \"hi\" twice")
        );
        assert_eq!(parse_quoted("\"\"nested\"\""), Some("\"nested\""));
    }

    #[test]
    fn test_parse_quoted_spans_lines() {
        assert_eq!(parse_quoted("\"line one\nline two\""), Some("line one\nline two"));
    }

    #[test]
    fn test_parse_quoted_rejects_unquoted() {
        assert_eq!(parse_quoted("hello"), None);
        assert_eq!(parse_quoted("\"unterminated"), None);
        assert_eq!(parse_quoted("trailing\""), None);
        // An empty interior does not count
        assert_eq!(parse_quoted("\"\""), None);
        assert_eq!(parse_quoted(""), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(text_item("x").kind_name(), "Text message");
        assert_eq!(
            RelayItem::Sticker {
                file: FileId("f".to_string())
            }
            .kind_name(),
            "Sticker"
        );
    }

    #[tokio::test]
    async fn test_begin_and_pending() {
        let manager = RelaySessionManager::new();
        let user = UserId(1);

        assert_eq!(manager.pending(user).await, None);

        manager.begin(user, text_item("hello")).await;
        assert_eq!(manager.pending(user).await, Some(text_item("hello")));
    }

    #[tokio::test]
    async fn test_begin_overwrites() {
        let manager = RelaySessionManager::new();
        let user = UserId(1);

        manager.begin(user, text_item("first")).await;
        manager.begin(user, text_item("second")).await;

        assert_eq!(manager.pending(user).await, Some(text_item("second")));
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let manager = RelaySessionManager::new();

        manager.begin(UserId(1), text_item("mine")).await;

        assert_eq!(manager.pending(UserId(2)).await, None);
        assert_eq!(manager.pending(UserId(1)).await, Some(text_item("mine")));
    }

    #[tokio::test]
    async fn test_cancel_removes_item() {
        let manager = RelaySessionManager::new();
        let user = UserId(1);

        assert!(!manager.cancel(user).await);

        manager.begin(user, text_item("hello")).await;
        assert!(manager.cancel(user).await);
        assert_eq!(manager.pending(user).await, None);

        // Second cancel is a no-op
        assert!(!manager.cancel(user).await);
    }
}
