//! Delivery boundary between the relay logic and Telegram
//!
//! The session manager talks to a [`MediaGateway`] trait object, so the
//! relay logic is testable without network access and the kind-to-call
//! mapping lives in exactly one place.

use crate::relay::RelayItem;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile, Recipient};
use thiserror::Error;

/// Error returned by a gateway send primitive
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Telegram Bot API rejection
    #[error("{0}")]
    Api(#[from] teloxide::RequestError),
    /// Delivery failure described as plain text
    #[error("{0}")]
    Delivery(String),
}

/// One send primitive per relayable kind
///
/// Destinations are the verbatim strings users type, either an
/// `@username` handle or a numeric chat ID. Implementations decide how
/// to interpret them.
#[async_trait]
pub trait MediaGateway: Send + Sync {
    /// Sends a photo by file id, with an optional caption
    async fn send_photo(
        &self,
        destination: &str,
        file: &FileId,
        caption: Option<&str>,
    ) -> Result<(), GatewayError>;

    /// Sends a document by file id, with an optional caption
    async fn send_document(
        &self,
        destination: &str,
        file: &FileId,
        caption: Option<&str>,
    ) -> Result<(), GatewayError>;

    /// Sends a video by file id, with an optional caption
    async fn send_video(
        &self,
        destination: &str,
        file: &FileId,
        caption: Option<&str>,
    ) -> Result<(), GatewayError>;

    /// Sends an audio track by file id, with an optional caption
    async fn send_audio(
        &self,
        destination: &str,
        file: &FileId,
        caption: Option<&str>,
    ) -> Result<(), GatewayError>;

    /// Sends a sticker by file id
    async fn send_sticker(&self, destination: &str, file: &FileId) -> Result<(), GatewayError>;

    /// Sends an animation by file id, with an optional caption
    async fn send_animation(
        &self,
        destination: &str,
        file: &FileId,
        caption: Option<&str>,
    ) -> Result<(), GatewayError>;

    /// Sends a plain text message
    async fn send_text(&self, destination: &str, body: &str) -> Result<(), GatewayError>;
}

/// Routes a stored item to the matching gateway primitive
///
/// This is the only place the item kinds fan out into send calls.
///
/// # Errors
///
/// Propagates the gateway's error unchanged.
pub async fn dispatch(
    gateway: &dyn MediaGateway,
    destination: &str,
    item: &RelayItem,
) -> Result<(), GatewayError> {
    match item {
        RelayItem::Photo { file, caption } => {
            gateway.send_photo(destination, file, caption.as_deref()).await
        }
        RelayItem::Document { file, caption } => {
            gateway
                .send_document(destination, file, caption.as_deref())
                .await
        }
        RelayItem::Video { file, caption } => {
            gateway.send_video(destination, file, caption.as_deref()).await
        }
        RelayItem::Audio { file, caption } => {
            gateway.send_audio(destination, file, caption.as_deref()).await
        }
        RelayItem::Sticker { file } => gateway.send_sticker(destination, file).await,
        RelayItem::Animation { file, caption } => {
            gateway
                .send_animation(destination, file, caption.as_deref())
                .await
        }
        RelayItem::Text { body } => gateway.send_text(destination, body).await,
    }
}

/// Production gateway backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    /// Wraps a bot handle
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Maps a user-typed destination to a Telegram recipient
///
/// Numeric strings (including negative group IDs) address chats by ID;
/// everything else is passed through as a channel/group username for
/// Telegram itself to validate.
fn recipient(destination: &str) -> Recipient {
    destination.parse::<i64>().map_or_else(
        |_| Recipient::ChannelUsername(destination.to_string()),
        |id| Recipient::Id(ChatId(id)),
    )
}

#[async_trait]
impl MediaGateway for TelegramGateway {
    async fn send_photo(
        &self,
        destination: &str,
        file: &FileId,
        caption: Option<&str>,
    ) -> Result<(), GatewayError> {
        let mut req = self
            .bot
            .send_photo(recipient(destination), InputFile::file_id(file.clone()));
        if let Some(caption) = caption {
            req = req.caption(caption.to_string());
        }
        req.await?;
        Ok(())
    }

    async fn send_document(
        &self,
        destination: &str,
        file: &FileId,
        caption: Option<&str>,
    ) -> Result<(), GatewayError> {
        let mut req = self
            .bot
            .send_document(recipient(destination), InputFile::file_id(file.clone()));
        if let Some(caption) = caption {
            req = req.caption(caption.to_string());
        }
        req.await?;
        Ok(())
    }

    async fn send_video(
        &self,
        destination: &str,
        file: &FileId,
        caption: Option<&str>,
    ) -> Result<(), GatewayError> {
        let mut req = self
            .bot
            .send_video(recipient(destination), InputFile::file_id(file.clone()));
        if let Some(caption) = caption {
            req = req.caption(caption.to_string());
        }
        req.await?;
        Ok(())
    }

    async fn send_audio(
        &self,
        destination: &str,
        file: &FileId,
        caption: Option<&str>,
    ) -> Result<(), GatewayError> {
        let mut req = self
            .bot
            .send_audio(recipient(destination), InputFile::file_id(file.clone()));
        if let Some(caption) = caption {
            req = req.caption(caption.to_string());
        }
        req.await?;
        Ok(())
    }

    async fn send_sticker(&self, destination: &str, file: &FileId) -> Result<(), GatewayError> {
        self.bot
            .send_sticker(recipient(destination), InputFile::file_id(file.clone()))
            .await?;
        Ok(())
    }

    async fn send_animation(
        &self,
        destination: &str,
        file: &FileId,
        caption: Option<&str>,
    ) -> Result<(), GatewayError> {
        let mut req = self
            .bot
            .send_animation(recipient(destination), InputFile::file_id(file.clone()));
        if let Some(caption) = caption {
            req = req.caption(caption.to_string());
        }
        req.await?;
        Ok(())
    }

    async fn send_text(&self, destination: &str, body: &str) -> Result<(), GatewayError> {
        self.bot
            .send_message(recipient(destination), body.to_string())
            .await?;
        Ok(())
    }
}
