//! Fixed user-facing reply texts
//!
//! All copy lives here so handlers stay free of string literals and the
//! command names can be interpolated from the active profile.

use crate::config::RelayProfile;
use crate::relay::RelayItem;

/// Reply for recognized-but-unrelayable media (voice, video notes)
pub const UNSUPPORTED_MEDIA: &str = "Unsupported media type!";

/// Reply when a destination arrives with nothing stored
pub const NO_PENDING_ITEM: &str = "No media found. Please send media first.";

/// Reply after a successful relay
pub const DELIVERED: &str = "✅ Media sent successfully to the group!";

/// Acknowledgment for a captured item, prompting for a destination
#[must_use]
pub fn received_ack(item: &RelayItem, profile: &RelayProfile) -> String {
    let emoji = if matches!(item, RelayItem::Text { .. }) {
        "💬"
    } else {
        "📤"
    };
    format!(
        "{emoji} {} received!\n\n\
         Now send me the group username (e.g., @groupname) or group chat ID \
         where you want to send this.\n\n\
         Use /{} to abort.\n\
         Use /{} for command usage guidance.",
        item.kind_name(),
        profile.cancel_command,
        profile.help_command,
    )
}

/// Failure reply embedding the gateway's error description
#[must_use]
pub fn delivery_failed(error: &str, profile: &RelayProfile) -> String {
    format!(
        "❌ Failed to send media!\n\n\
         Error: {error}\n\n\
         Make sure:\n\
         1. The bot is added to the group\n\
         2. The bot has permission to send messages\n\
         3. The username/ID is correct\n\n\
         Need help finding group info? Use /{}",
        profile.help_command,
    )
}

/// Cancellation acknowledgment, sent whether or not an item was pending
#[must_use]
pub fn cancelled(profile: &RelayProfile) -> String {
    format!(
        "❌ Operation cancelled.\n\n\
         Send new media to start again or use /{} for instructions.",
        profile.help_command,
    )
}
