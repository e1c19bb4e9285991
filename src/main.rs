use dotenvy::dotenv;
use media_relay_bot::bot::handlers;
use media_relay_bot::bot::state::State;
use media_relay_bot::config::{RelayCommand, Settings};
use media_relay_bot::health;
use media_relay_bot::relay::gateway::TelegramGateway;
use media_relay_bot::relay::{self, RelayItem, RelaySessionManager};
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
struct RedactionPatterns {
    token1: Regex,
    token2: Regex,
    token3: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token1: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token2: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token3: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token1
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .token2
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .token3
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // We return the original buffer length to satisfy the contract,
        // even if the redacted string length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    // Setup logging with redaction
    init_logging(patterns);

    info!("Starting Media Relay Bot...");

    // Load settings
    let settings = init_settings();

    // Liveness probe for the hosting platform; the bot works without it
    let port = settings.port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            error!("Health endpoint failed: {}", e);
        }
    });

    // Initialize Bot
    let bot = Bot::new(settings.telegram_token.clone());

    let manager = Arc::new(RelaySessionManager::new());
    let gateway = Arc::new(TelegramGateway::new(bot.clone()));

    // Initialize bot state
    let bot_state = init_bot_state();

    // Setup handlers
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![settings, manager, gateway, bot_state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_bot_state() -> Arc<InMemStorage<State>> {
    InMemStorage::<State>::new()
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<State>, State>()
        .branch(
            // Commands win over everything, in any state
            dptree::filter_map(|msg: Message, settings: Arc<Settings>| {
                msg.text().and_then(|text| settings.profile.parse_command(text))
            })
            .endpoint(handle_command),
        )
        .branch(
            // A relayable item is accepted from any state; a new one
            // replaces whatever was pending
            dptree::filter_map(|msg: Message| RelayItem::from_message(&msg))
                .endpoint(handle_item),
        )
        .branch(
            dptree::case![State::Idle]
                .branch(
                    dptree::filter(|msg: Message| relay::is_unsupported_media(&msg))
                        .endpoint(handle_unsupported_media),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.text().is_some())
                        .endpoint(handle_idle_text),
                ),
        )
        .branch(
            dptree::case![State::AwaitingDestination].branch(
                dptree::filter(|msg: Message| msg.text().is_some())
                    .endpoint(handle_destination),
            ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: RelayCommand,
    dialogue: Dialogue<State, InMemStorage<State>>,
    manager: Arc<RelaySessionManager>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        RelayCommand::Start => handlers::start(bot, msg, settings).await,
        RelayCommand::Help => handlers::help(bot, msg, settings).await,
        RelayCommand::Cancel => handlers::cancel(bot, msg, dialogue, manager, settings).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_item(
    bot: Bot,
    msg: Message,
    item: RelayItem,
    dialogue: Dialogue<State, InMemStorage<State>>,
    manager: Arc<RelaySessionManager>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::receive_item(bot, msg, dialogue, item, manager, settings).await {
        error!("Item handler error: {}", e);
    }
    respond(())
}

async fn handle_unsupported_media(bot: Bot, msg: Message) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::unsupported_media(bot, msg).await {
        error!("Unsupported media handler error: {}", e);
    }
    respond(())
}

async fn handle_idle_text(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    manager: Arc<RelaySessionManager>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::receive_idle_text(bot, msg, dialogue, manager, settings).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_destination(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    manager: Arc<RelaySessionManager>,
    gateway: Arc<TelegramGateway>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) =
        handlers::receive_destination(bot, msg, dialogue, manager, gateway, settings).await
    {
        error!("Destination handler error: {}", e);
    }
    respond(())
}
