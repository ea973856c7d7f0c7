// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent loop and dialogue for the Agrobot offer bot.
//!
//! The [`AgentLoop`] is the central coordinator that:
//! - Receives events from a channel adapter
//! - Queues them per sender so one user's turns never interleave
//! - Runs different users' turns in parallel
//! - Sends each turn's replies before committing its session
//! - Drains in-flight turns on shutdown

pub mod dialogue;
pub mod keywords;
pub mod prompts;
pub mod render;
pub mod session;
pub mod shutdown;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use agrobot_core::{AgrobotError, ChannelAdapter, InboundEvent, OutboundMessage};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

pub use dialogue::{Dialogue, GET_STARTED, Turn};
pub use prompts::Phrasing;
pub use session::{InMemorySessionStore, Session, SessionStore};
pub use state::{DialogueState, OfferDraft, Placement};

/// How long a per-user worker waits for the next event before exiting.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// How long shutdown waits for in-flight turns.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

type Queues = DashMap<String, mpsc::UnboundedSender<InboundEvent>>;

/// Receives events from a channel and runs dialogue turns.
///
/// Each sender gets a worker task fed by an unbounded queue. The worker
/// handles that sender's events one at a time and exits after sitting idle.
pub struct AgentLoop {
    channel: Arc<dyn ChannelAdapter>,
    runner: TurnRunner,
    queues: Arc<Queues>,
    tracker: TaskTracker,
    idle_timeout: Duration,
}

impl AgentLoop {
    /// Creates an agent loop over an already connected channel.
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        dialogue: Arc<Dialogue>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        info!(channel = channel.name(), "agent loop initialized");
        Self {
            runner: TurnRunner {
                channel: Arc::clone(&channel),
                dialogue,
                sessions,
            },
            channel,
            queues: Arc::new(DashMap::new()),
            tracker: TaskTracker::new(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Overrides how long an idle per-user worker is kept alive.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Runs the main agent loop until the channel closes or `cancel` fires.
    ///
    /// The loop:
    /// 1. Waits for inbound events from the channel
    /// 2. Hands each event to its sender's worker
    /// 3. On shutdown, lets workers finish queued events before returning
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), AgrobotError> {
        info!("agent loop running");

        loop {
            tokio::select! {
                event = self.channel.receive() => {
                    match event {
                        Ok(event) => self.dispatch(event),
                        Err(AgrobotError::Channel { message, .. }) => {
                            info!(reason = message.as_str(), "channel closed, stopping agent loop");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        // Dropping the senders lets each worker finish its queue and exit.
        self.queues.clear();
        shutdown::drain_turns(&self.tracker, DRAIN_TIMEOUT).await;

        info!("agent loop stopped");
        Ok(())
    }

    /// Runs one turn inline, bypassing the per-user queues.
    ///
    /// Callers must not run two turns for the same sender at once.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<(), AgrobotError> {
        self.runner.run_turn(event).await
    }

    /// Number of senders with a live worker.
    pub fn active_conversations(&self) -> usize {
        self.queues.len()
    }

    fn dispatch(&self, event: InboundEvent) {
        let sender_id = event.sender_id.clone();
        debug!(
            sender_id = sender_id.as_str(),
            event = event.kind.label(),
            "dispatching inbound event"
        );

        match self.queues.entry(sender_id.clone()) {
            Entry::Occupied(mut entry) => {
                // A send only fails if the worker is gone without having
                // deregistered itself, so start a replacement.
                if let Err(mpsc::error::SendError(event)) = entry.get().send(event) {
                    warn!(sender_id = sender_id.as_str(), "worker vanished, restarting");
                    let (tx, rx) = mpsc::unbounded_channel();
                    let _ = tx.send(event);
                    entry.insert(tx);
                    self.spawn_worker(sender_id, rx);
                }
            }
            Entry::Vacant(entry) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let _ = tx.send(event);
                entry.insert(tx);
                self.spawn_worker(sender_id, rx);
            }
        }
    }

    fn spawn_worker(&self, sender_id: String, mut rx: mpsc::UnboundedReceiver<InboundEvent>) {
        let runner = self.runner.clone();
        let queues = Arc::clone(&self.queues);
        let idle_timeout = self.idle_timeout;

        self.tracker.spawn(async move {
            debug!(sender_id = sender_id.as_str(), "conversation worker started");
            loop {
                match tokio::time::timeout(idle_timeout, rx.recv()).await {
                    Ok(Some(event)) => {
                        if let Err(e) = runner.run_turn(event).await {
                            error!(
                                sender_id = sender_id.as_str(),
                                error = %e,
                                "failed to complete turn"
                            );
                        }
                    }
                    Ok(None) => break,
                    Err(_) => {
                        // Deregister only if nothing arrived meanwhile; the
                        // map entry lock orders this against `dispatch`.
                        if queues.remove_if(&sender_id, |_, _| rx.is_empty()).is_some() {
                            break;
                        }
                    }
                }
            }
            debug!(sender_id = sender_id.as_str(), "conversation worker stopped");
        });
    }
}

/// Everything one turn touches.
#[derive(Clone)]
struct TurnRunner {
    channel: Arc<dyn ChannelAdapter>,
    dialogue: Arc<Dialogue>,
    sessions: Arc<dyn SessionStore>,
}

impl TurnRunner {
    /// Load the session, run the dialogue, send replies, then commit.
    ///
    /// A failed send leaves the stored session untouched so the user is
    /// asked the same question again on their next message. Turns that
    /// stored an offer commit before sending, so a repeated answer cannot
    /// list the offer twice.
    async fn run_turn(&self, event: InboundEvent) -> Result<(), AgrobotError> {
        let sender_id = event.sender_id.clone();

        let current = match self.sessions.load(&sender_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!(sender_id = sender_id.as_str(), error = %e, "session load failed");
                None
            }
        };

        let turn = self
            .dialogue
            .handle(self.channel.as_ref(), current, &event)
            .await;

        let pending = if turn.persisted {
            self.commit(&sender_id, turn.session).await?;
            None
        } else {
            Some(turn.session)
        };

        for body in turn.replies {
            self.channel
                .send(OutboundMessage {
                    recipient: sender_id.clone(),
                    body,
                })
                .await?;
        }

        match pending {
            Some(session) => self.commit(&sender_id, session).await,
            None => Ok(()),
        }
    }

    async fn commit(&self, sender_id: &str, session: Option<Session>) -> Result<(), AgrobotError> {
        match session {
            Some(session) => self.sessions.save(sender_id, session).await,
            None => self.sessions.remove(sender_id).await,
        }
    }
}
