//! Conversation handlers for the relay dialogue
//!
//! Each handler maps one kind of incoming update onto the two-state
//! relay conversation: capture an item, then capture a destination.

use crate::bot::replies;
use crate::bot::state::State;
use crate::config::Settings;
use crate::relay::gateway::TelegramGateway;
use crate::relay::{parse_quoted, RelayItem, RelayOutcome, RelaySessionManager};
use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::info;

/// Type alias for dialogue
pub type RelayDialogue = Dialogue<State, InMemStorage<State>>;

fn sender_id(msg: &Message) -> Option<UserId> {
    msg.from.as_ref().map(|u| u.id)
}

/// Send the welcome message
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn start(bot: Bot, msg: Message, settings: Arc<Settings>) -> Result<()> {
    bot.send_message(msg.chat.id, settings.profile.welcome_text.clone())
        .await?;
    Ok(())
}

/// Send the usage instructions
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn help(bot: Bot, msg: Message, settings: Arc<Settings>) -> Result<()> {
    bot.send_message(msg.chat.id, settings.profile.help_text.clone())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Abort the conversation, dropping any pending item
///
/// The reply is identical whether or not an item existed, so repeated
/// cancels are harmless.
///
/// # Errors
///
/// Returns an error if the state cannot be updated or the reply fails.
pub async fn cancel(
    bot: Bot,
    msg: Message,
    dialogue: RelayDialogue,
    manager: Arc<RelaySessionManager>,
    settings: Arc<Settings>,
) -> Result<()> {
    if let Some(user) = sender_id(&msg) {
        let existed = manager.cancel(user).await;
        info!(user_id = user.0, had_pending = existed, "Relay cancelled");
    }

    dialogue.update(State::Idle).await?;
    bot.send_message(msg.chat.id, replies::cancelled(&settings.profile))
        .await?;
    Ok(())
}

/// Store a captured item and ask for a destination
///
/// Accepted from either state: a new item replaces any pending one and
/// the destination prompt is repeated.
///
/// # Errors
///
/// Returns an error if the state cannot be updated or the reply fails.
pub async fn receive_item(
    bot: Bot,
    msg: Message,
    dialogue: RelayDialogue,
    item: RelayItem,
    manager: Arc<RelaySessionManager>,
    settings: Arc<Settings>,
) -> Result<()> {
    let Some(user) = sender_id(&msg) else {
        return Ok(());
    };

    info!(user_id = user.0, kind = item.kind_name(), "Captured item");

    let ack = replies::received_ack(&item, &settings.profile);
    manager.begin(user, item).await;
    dialogue.update(State::AwaitingDestination).await?;

    bot.send_message(msg.chat.id, ack).await?;
    Ok(())
}

/// Reject media the bot recognizes but cannot relay
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn unsupported_media(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, replies::UNSUPPORTED_MEDIA)
        .await?;
    Ok(())
}

/// Handle plain text while idle
///
/// Only bodies wrapped in double quotes are captured; everything else
/// is ignored without a reply.
///
/// # Errors
///
/// Returns an error if the capture path fails.
pub async fn receive_idle_text(
    bot: Bot,
    msg: Message,
    dialogue: RelayDialogue,
    manager: Arc<RelaySessionManager>,
    settings: Arc<Settings>,
) -> Result<()> {
    let Some(body) = msg.text().and_then(parse_quoted) else {
        return Ok(());
    };

    let item = RelayItem::Text {
        body: body.to_string(),
    };
    receive_item(bot, msg, dialogue, item, manager, settings).await
}

/// Treat the message text as the destination and attempt delivery
///
/// Whatever the outcome, the dialogue returns to idle and the item is
/// gone; each capture gets exactly one delivery attempt.
///
/// # Errors
///
/// Returns an error if the state cannot be updated or the reply fails.
pub async fn receive_destination(
    bot: Bot,
    msg: Message,
    dialogue: RelayDialogue,
    manager: Arc<RelaySessionManager>,
    gateway: Arc<TelegramGateway>,
    settings: Arc<Settings>,
) -> Result<()> {
    let Some(user) = sender_id(&msg) else {
        return Ok(());
    };
    let Some(destination) = msg.text() else {
        return Ok(());
    };

    let outcome = manager.relay(gateway.as_ref(), user, destination).await;
    dialogue.update(State::Idle).await?;

    let reply = match outcome {
        RelayOutcome::Delivered => replies::DELIVERED.to_string(),
        RelayOutcome::NothingPending => replies::NO_PENDING_ITEM.to_string(),
        RelayOutcome::Failed(error) => replies::delivery_failed(&error, &settings.profile),
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
