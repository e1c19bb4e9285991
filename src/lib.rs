//! Telegram bot that relays one media or text item per conversation
//! from a user's private chat to a group the user names afterward.

/// Telegram handlers, dialogue state, and reply texts
pub mod bot;
/// Configuration and settings management
pub mod config;
/// Liveness HTTP endpoint
pub mod health;
/// Relay session management and the delivery gateway
pub mod relay;
