// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `agrobot shell` command implementation.
//!
//! Talks to the bot from a terminal. A [`ConsoleChannel`] stands in for a
//! messaging platform: typed lines become text events, `#N` presses the
//! Nth choice or card button of the last message that offered any, and
//! `/loc <lat> <long>` shares a location.

use std::sync::{Arc, Mutex};

use agrobot_agent::{AgentLoop, Dialogue, GET_STARTED, InMemorySessionStore, shutdown};
use agrobot_config::model::AgrobotConfig;
use agrobot_core::{
    AdapterType, AgrobotError, CardButton, CatalogStore, ChannelAdapter, EventKind, GeoPoint,
    HealthStatus, InboundEvent, MessageBody, MessageId, OutboundMessage, PluginAdapter,
    UserProfile,
};
use agrobot_storage::SqliteCatalog;
use async_trait::async_trait;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const CHANNEL_NAME: &str = "console";
const SENDER_ID: &str = "console";

/// Something the user can pick with `#N`.
#[derive(Debug, Clone, PartialEq)]
enum Selectable {
    Reply { title: String, payload: String },
    Button { title: String, payload: String },
}

impl Selectable {
    fn to_event(&self) -> EventKind {
        match self {
            Self::Reply { title, payload } => EventKind::QuickReply {
                payload: payload.clone(),
                title: title.clone(),
            },
            Self::Button { title, payload } => EventKind::Postback {
                payload: payload.clone(),
                title: title.clone(),
            },
        }
    }
}

/// What one typed line means.
#[derive(Debug, Clone, PartialEq)]
enum Input {
    Event(EventKind),
    Quit,
    Help,
    Empty,
    Invalid(String),
}

fn parse_line(line: &str, options: &[Selectable]) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    if let Some(index) = line.strip_prefix('#') {
        return match index.trim().parse::<usize>() {
            Ok(n) if n >= 1 && n <= options.len() => Input::Event(options[n - 1].to_event()),
            _ if options.is_empty() => Input::Invalid("nothing to choose from yet".into()),
            _ => Input::Invalid(format!("pick a number between 1 and {}", options.len())),
        };
    }

    let mut words = line.split_whitespace();
    match words.next() {
        Some("/quit" | "/exit") => Input::Quit,
        Some("/help") => Input::Help,
        Some("/start") => Input::Event(EventKind::Postback {
            payload: GET_STARTED.to_string(),
            title: "Get Started".to_string(),
        }),
        Some("/loc") => {
            let coords: Vec<f64> = words
                .map(str::parse)
                .collect::<Result<_, _>>()
                .unwrap_or_default();
            match coords[..] {
                [latitude, longitude] => {
                    let point = GeoPoint::new(latitude, longitude);
                    if point.is_valid() {
                        Input::Event(EventKind::Location(point))
                    } else {
                        Input::Invalid("coordinates out of range".into())
                    }
                }
                _ => Input::Invalid("usage: /loc <latitude> <longitude>".into()),
            }
        }
        Some(command) if command.starts_with('/') => {
            Input::Invalid(format!("unknown command {command}, try /help"))
        }
        _ => Input::Event(EventKind::Text(line.to_string())),
    }
}

/// Choices a message offers, in the numbering shown to the user.
fn selectables(body: &MessageBody) -> Vec<Selectable> {
    match body {
        MessageBody::QuickChoices { choices, .. } => choices
            .iter()
            .map(|c| Selectable::Reply {
                title: c.title.clone(),
                payload: c.payload.clone(),
            })
            .collect(),
        MessageBody::Cards(cards) => cards
            .iter()
            .flat_map(|card| &card.buttons)
            .filter_map(|button| match button {
                CardButton::Postback { title, payload } => Some(Selectable::Button {
                    title: title.clone(),
                    payload: payload.clone(),
                }),
                CardButton::PhoneNumber { .. } => None,
            })
            .collect(),
        MessageBody::Text(_) | MessageBody::LocationRequest { .. } => Vec::new(),
    }
}

fn render(bot_name: &str, body: &MessageBody) -> String {
    let speaker = format!("{}>", bot_name.to_lowercase()).green().bold();
    let mut out = String::new();
    match body {
        MessageBody::Text(text) => out.push_str(&format!("{speaker} {text}")),
        MessageBody::QuickChoices { text, choices } => {
            out.push_str(&format!("{speaker} {text}\n"));
            let row: Vec<String> = choices
                .iter()
                .enumerate()
                .map(|(i, c)| format!("[{}] {}", i + 1, c.title))
                .collect();
            out.push_str(&format!("    {}", row.join("  ").cyan()));
        }
        MessageBody::LocationRequest { text } => {
            out.push_str(&format!("{speaker} {text}\n"));
            out.push_str(&format!("    {}", "(share a place with /loc <lat> <long>)".dimmed()));
        }
        MessageBody::Cards(cards) => {
            let mut n = 0;
            for card in cards {
                out.push_str(&format!("    {}\n", card.title.bold()));
                if let Some(subtitle) = &card.subtitle {
                    out.push_str(&format!("      {subtitle}\n"));
                }
                if let Some(image) = &card.image_url {
                    out.push_str(&format!("      {}\n", image.dimmed()));
                }
                for button in &card.buttons {
                    match button {
                        CardButton::Postback { title, .. } => {
                            n += 1;
                            out.push_str(&format!("      {}\n", format!("[{n}] {title}").cyan()));
                        }
                        CardButton::PhoneNumber { title, number } => {
                            out.push_str(&format!("      {title}: {number}\n"));
                        }
                    }
                }
            }
            out.truncate(out.trim_end().len());
        }
    }
    out
}

fn print_help() {
    println!("  {}", "commands".bold());
    println!("    {:<22} say something to the bot", "<text>");
    println!("    {:<22} pick choice or button N", "#N");
    println!("    {:<22} share a location", "/loc <lat> <long>");
    println!("    {:<22} press \"Get Started\"", "/start");
    println!("    {:<22} leave the shell", "/quit");
}

/// A terminal standing in for a messaging platform, with one user.
pub struct ConsoleChannel {
    bot_name: String,
    profile: UserProfile,
    lines: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    options: Mutex<Vec<Selectable>>,
}

impl ConsoleChannel {
    pub fn new(bot_name: &str, profile: UserProfile) -> Self {
        Self {
            bot_name: bot_name.to_string(),
            profile,
            lines: tokio::sync::Mutex::new(None),
            options: Mutex::new(Vec::new()),
        }
    }

    fn current_options(&self) -> Vec<Selectable> {
        self.options
            .lock()
            .map(|options| options.clone())
            .unwrap_or_default()
    }
}

/// Reads lines on a dedicated thread, since rustyline blocks.
fn spawn_reader(tx: mpsc::UnboundedSender<String>) -> Result<(), AgrobotError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| AgrobotError::Internal(format!("failed to initialize readline: {e}")))?;
    std::thread::Builder::new()
        .name("console-input".into())
        .spawn(move || {
            let prompt = format!("{}> ", "you".yellow());
            loop {
                match rl.readline(&prompt) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            let _ = rl.add_history_entry(&line);
                        }
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                    Err(e) => {
                        eprintln!("{}: {e}", "error".red());
                        break;
                    }
                }
            }
            debug!("console input closed");
        })
        .map_err(|e| AgrobotError::Internal(format!("failed to spawn console reader: {e}")))?;
    Ok(())
}

#[async_trait]
impl PluginAdapter for ConsoleChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, AgrobotError> {
        // A held lock means receive() is waiting on input.
        match self.lines.try_lock() {
            Ok(lines) if lines.is_none() => Ok(HealthStatus::Unhealthy("not connected".into())),
            _ => Ok(HealthStatus::Healthy),
        }
    }

    async fn shutdown(&self) -> Result<(), AgrobotError> {
        self.lines.lock().await.take();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for ConsoleChannel {
    async fn connect(&mut self) -> Result<(), AgrobotError> {
        let (tx, rx) = mpsc::unbounded_channel();
        spawn_reader(tx)?;
        *self.lines.get_mut() = Some(rx);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, AgrobotError> {
        let offered = selectables(&msg.body);
        if !offered.is_empty() {
            if let Ok(mut options) = self.options.lock() {
                *options = offered;
            }
        }
        println!("{}", render(&self.bot_name, &msg.body));
        Ok(MessageId(uuid::Uuid::new_v4().to_string()))
    }

    async fn receive(&self) -> Result<InboundEvent, AgrobotError> {
        let mut guard = self.lines.lock().await;
        let rx = guard
            .as_mut()
            .ok_or_else(|| AgrobotError::channel("console not connected"))?;
        loop {
            let Some(line) = rx.recv().await else {
                return Err(AgrobotError::channel("console input closed"));
            };
            match parse_line(&line, &self.current_options()) {
                Input::Event(kind) => return Ok(InboundEvent::new(CHANNEL_NAME, SENDER_ID, kind)),
                Input::Quit => return Err(AgrobotError::channel("console closed by user")),
                Input::Help => print_help(),
                Input::Invalid(message) => eprintln!("  {}", message.yellow()),
                Input::Empty => {}
            }
        }
    }

    async fn fetch_profile(&self, _sender_id: &str) -> Result<UserProfile, AgrobotError> {
        Ok(self.profile.clone())
    }
}

/// Runs the `agrobot shell` interactive session.
pub async fn run_shell(config: AgrobotConfig) -> Result<(), AgrobotError> {
    let catalog = Arc::new(SqliteCatalog::new(config.storage.clone()));
    catalog.initialize().await?;
    match catalog.health_check().await? {
        HealthStatus::Healthy => {}
        HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => {
            warn!(reason = reason.as_str(), "catalog is not ready");
            eprintln!(
                "{}: {reason} (load one with `agrobot seed --data <dir>`)",
                "warning".yellow()
            );
        }
    }

    let profile = UserProfile {
        first_name: std::env::var("USER").unwrap_or_else(|_| "Friend".to_string()),
        ..UserProfile::default()
    };
    let mut console = ConsoleChannel::new(&config.agent.name, profile);
    console.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(console);

    let store: Arc<dyn CatalogStore> = catalog.clone();
    let dialogue = Arc::new(Dialogue::new(store, &config));
    let agent = AgentLoop::new(
        Arc::clone(&channel),
        dialogue,
        Arc::new(InMemorySessionStore::new()),
    );

    println!("{}", format!("{} shell", config.agent.name.to_lowercase()).bold().green());
    println!("Say hi to start, {} for commands, {} to exit.\n", "/help".yellow(), "/quit".yellow());

    let cancel = shutdown::install_signal_handler();
    agent.run(cancel).await?;

    channel.shutdown().await?;
    catalog.shutdown().await?;
    println!("{}", "bye".dimmed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use agrobot_core::{Card, QuickChoice};

    use super::*;

    fn options() -> Vec<Selectable> {
        selectables(&MessageBody::QuickChoices {
            text: "Buy or sell?".into(),
            choices: vec![QuickChoice::new("Buy", "BUY"), QuickChoice::new("Sell", "SELL")],
        })
    }

    #[test]
    fn plain_text_becomes_a_text_event() {
        assert_eq!(
            parse_line("  50 crates ", &[]),
            Input::Event(EventKind::Text("50 crates".into()))
        );
        assert_eq!(parse_line("   ", &[]), Input::Empty);
    }

    #[test]
    fn numbers_pick_from_the_last_choices() {
        assert_eq!(
            parse_line("#2", &options()),
            Input::Event(EventKind::QuickReply {
                payload: "SELL".into(),
                title: "Sell".into()
            })
        );
        assert!(matches!(parse_line("#3", &options()), Input::Invalid(_)));
        assert!(matches!(parse_line("#0", &options()), Input::Invalid(_)));
        assert!(matches!(parse_line("#1", &[]), Input::Invalid(_)));
    }

    #[test]
    fn card_buttons_are_numbered_across_cards_skipping_calls() {
        let cards = MessageBody::Cards(vec![
            Card {
                title: "Asha Farmer".into(),
                subtitle: None,
                image_url: None,
                buttons: vec![
                    CardButton::PhoneNumber {
                        title: "Call".into(),
                        number: "+254700000001".into(),
                    },
                    CardButton::Postback {
                        title: "Connect".into(),
                        payload: "CONNECT_1".into(),
                    },
                ],
            },
            Card {
                title: "Baraka Farmer".into(),
                subtitle: None,
                image_url: None,
                buttons: vec![CardButton::Postback {
                    title: "Connect".into(),
                    payload: "CONNECT_2".into(),
                }],
            },
        ]);
        let options = selectables(&cards);
        assert_eq!(options.len(), 2);
        assert_eq!(
            parse_line("#2", &options),
            Input::Event(EventKind::Postback {
                payload: "CONNECT_2".into(),
                title: "Connect".into()
            })
        );

        let shown = render("Agrobot", &cards);
        assert!(shown.contains("[1] Connect"));
        assert!(shown.contains("[2] Connect"));
        assert!(shown.contains("+254700000001"));
    }

    #[test]
    fn commands() {
        assert_eq!(parse_line("/quit", &[]), Input::Quit);
        assert_eq!(parse_line("/exit", &[]), Input::Quit);
        assert_eq!(parse_line("/help", &[]), Input::Help);
        assert_eq!(
            parse_line("/start", &[]),
            Input::Event(EventKind::Postback {
                payload: GET_STARTED.into(),
                title: "Get Started".into()
            })
        );
        assert!(matches!(parse_line("/frobnicate", &[]), Input::Invalid(_)));
    }

    #[test]
    fn locations_need_two_valid_coordinates() {
        assert_eq!(
            parse_line("/loc -1.2864 36.8172", &[]),
            Input::Event(EventKind::Location(GeoPoint::new(-1.2864, 36.8172)))
        );
        assert!(matches!(parse_line("/loc -1.28", &[]), Input::Invalid(_)));
        assert!(matches!(parse_line("/loc 95 10", &[]), Input::Invalid(_)));
    }

    #[tokio::test]
    async fn sending_choices_updates_what_numbers_pick() {
        let console = ConsoleChannel::new("Agrobot", UserProfile::default());
        console
            .send(OutboundMessage {
                recipient: SENDER_ID.into(),
                body: MessageBody::QuickChoices {
                    text: "Buy or sell?".into(),
                    choices: vec![QuickChoice::new("Buy", "BUY")],
                },
            })
            .await
            .unwrap();
        console
            .send(OutboundMessage::text(SENDER_ID, "plain text keeps the choices"))
            .await
            .unwrap();
        assert_eq!(console.current_options().len(), 1);
    }

    #[tokio::test]
    async fn receive_before_connect_is_a_channel_error() {
        let console = ConsoleChannel::new("Agrobot", UserProfile::default());
        let err = console.receive().await.unwrap_err();
        assert!(matches!(err, AgrobotError::Channel { .. }));
    }
}
