//! Configuration and settings management
//!
//! Loads settings from environment variables and defines the relay
//! command profile.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token (required, no fallback)
    pub telegram_token: String,

    /// Port for the liveness HTTP endpoint
    #[serde(default = "default_port")]
    pub port: u16,

    /// Command names and fixed texts for this deployment
    #[serde(default)]
    pub profile: RelayProfile,
}

const fn default_port() -> u16 {
    10000
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_relay_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or `TELEGRAM_TOKEN` is unset.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of APP)
            // Eg.. `APP_PORT=9000 ./target/app` would set the `port` key
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Also add settings from environment variables directly (without prefix)
            // Note: Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }
}

/// Commands recognized by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    /// Show the welcome message
    Start,
    /// Show usage instructions
    Help,
    /// Abort the pending relay
    Cancel,
}

/// Per-deployment command names and fixed texts
///
/// Deployments of this bot differ only in what the commands are called
/// and what the welcome/help screens say, so those are configuration
/// rather than code.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RelayProfile {
    /// Name of the welcome command, without the leading slash
    pub start_command: String,
    /// Name of the help command, without the leading slash
    pub help_command: String,
    /// Name of the cancel command, without the leading slash
    pub cancel_command: String,
    /// Text sent in response to the welcome command
    pub welcome_text: String,
    /// Text sent in response to the help command (Telegram HTML)
    pub help_text: String,
}

impl Default for RelayProfile {
    fn default() -> Self {
        Self {
            start_command: "start".to_string(),
            help_command: "help".to_string(),
            cancel_command: "cancel".to_string(),
            welcome_text: default_welcome_text(),
            help_text: default_help_text(),
        }
    }
}

fn default_welcome_text() -> String {
    "👋 Hello World!\n\n\
     I can help you send media from personal chat to any group.\n\n\
     📷 Photos\n\
     🎥 Videos\n\
     📄 Documents\n\
     🎵 Audio\n\
     😀 Stickers\n\
     🎞 GIFs/Animations\n\
     💬 Text (in double quotes)\n\n\
     Use /help to learn how to use the bot."
        .to_string()
}

fn default_help_text() -> String {
    "<b>Step 1: Send Media</b>\n\
     • 📷 Photo/Video\n\
     • 📄 File/Audio\n\
     • 😀 Sticker/GIF\n\
     • 💬 Text message (must be in double quotes)\n\n\
     <b>Step 2: Provide Group Info</b>\n\
     After sending media, send destination group.\n\
     You can provide:\n\
     • Group username (e.g, <code>@mygroup</code>)\n\
     • Group chat ID (e.g, <code>-1001234567890</code>)\n\
     ━━━━━━━━━━━━━━━━━━━━\n\n\
     <b>📝 Text Messages</b>\n\
     To send text messages, enclose them in double quotes:\n\n\
     ✅ Correct: <code>\"Hello Root\"</code>\n\
     ❌ Wrong: <code>Hello Root</code>\n\n\
     ━━━━━━━━━━━━━━━━━━━━\n\
     <b>⚙️ Commands</b>\n\n\
     /start - Start the bot\n\
     /help - Show this help message\n\
     /cancel - Cancel current operation\n\
     ━━━━━━━━━━━━━━━━━━━━"
        .to_string()
}

impl RelayProfile {
    /// Parses a message body as a bot command
    ///
    /// Accepts `/name` and `/name@botusername` forms, case-insensitive,
    /// with trailing arguments ignored. Returns `None` for anything
    /// that is not one of the profile's three commands.
    #[must_use]
    pub fn parse_command(&self, text: &str) -> Option<RelayCommand> {
        let first = text.trim().split_whitespace().next()?;
        let body = first.strip_prefix('/')?;
        // Commands in groups arrive as /name@botusername
        let name = body.split('@').next()?;

        if name.eq_ignore_ascii_case(&self.start_command) {
            Some(RelayCommand::Start)
        } else if name.eq_ignore_ascii_case(&self.help_command) {
            Some(RelayCommand::Help)
        } else if name.eq_ignore_ascii_case(&self.cancel_command) {
            Some(RelayCommand::Cancel)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Tests run sequentially to avoid environment variable race conditions
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        // 1. Missing token is a hard error
        env::remove_var("TELEGRAM_TOKEN");
        assert!(Settings::new().is_err());

        // 2. Standard loading with port default
        env::set_var("TELEGRAM_TOKEN", "dummy_token");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.port, 10000);
        assert_eq!(settings.profile.start_command, "start");

        // 3. PORT override from plain env
        env::set_var("PORT", "8080");

        let settings = Settings::new()?;
        assert_eq!(settings.port, 8080);

        env::remove_var("PORT");
        env::remove_var("TELEGRAM_TOKEN");
        Ok(())
    }

    #[test]
    fn test_parse_command_basic() {
        let profile = RelayProfile::default();

        assert_eq!(profile.parse_command("/start"), Some(RelayCommand::Start));
        assert_eq!(profile.parse_command("/help"), Some(RelayCommand::Help));
        assert_eq!(profile.parse_command("/cancel"), Some(RelayCommand::Cancel));
    }

    #[test]
    fn test_parse_command_mention_suffix() {
        let profile = RelayProfile::default();

        assert_eq!(
            profile.parse_command("/cancel@MediaRelayBot"),
            Some(RelayCommand::Cancel)
        );
        assert_eq!(
            profile.parse_command("/HELP@somebot extra args"),
            Some(RelayCommand::Help)
        );
    }

    #[test]
    fn test_parse_command_rejects_non_commands() {
        let profile = RelayProfile::default();

        assert_eq!(profile.parse_command("start"), None);
        assert_eq!(profile.parse_command("/unknown"), None);
        assert_eq!(profile.parse_command(""), None);
        assert_eq!(profile.parse_command("   "), None);
        assert_eq!(profile.parse_command("hello /start"), None);
    }

    #[test]
    fn test_parse_command_custom_names() {
        let profile = RelayProfile {
            start_command: "begin".to_string(),
            cancel_command: "abort".to_string(),
            ..RelayProfile::default()
        };

        assert_eq!(profile.parse_command("/begin"), Some(RelayCommand::Start));
        assert_eq!(profile.parse_command("/abort"), Some(RelayCommand::Cancel));
        assert_eq!(profile.parse_command("/start"), None);
    }
}
