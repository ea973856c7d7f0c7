// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete agent stack with a mock channel, a
//! seeded temp SQLite catalog and an in-memory session store. Provides
//! `send()` and its shorthands to drive single turns in tests, and exposes
//! the [`AgentLoop`] for tests that go through the per-user queues.

use std::sync::Arc;

use agrobot_agent::{AgentLoop, Dialogue, InMemorySessionStore, Phrasing, Session, SessionStore};
use agrobot_config::model::{AgrobotConfig, MatchingConfig, StorageConfig};
use agrobot_core::{
    AgrobotError, CatalogStore, EventKind, GeoPoint, InboundEvent, MessageBody,
};
use agrobot_storage::SqliteCatalog;

use crate::fixtures::{SeededCatalog, seed_catalog};
use crate::mock_channel::MockChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: AgrobotConfig,
    phrasing: Phrasing,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: AgrobotConfig::default(),
            phrasing: Phrasing::First,
        }
    }

    /// Replace the counter-offer filters.
    pub fn with_matching(mut self, matching: MatchingConfig) -> Self {
        self.config.matching = matching;
        self
    }

    /// Set the re-ask bound for one question.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.dialogue.max_attempts = max_attempts;
        self
    }

    /// Set the product image base URL.
    pub fn with_image_base_url(mut self, url: &str) -> Self {
        self.config.dialogue.image_base_url = Some(url.to_string());
        self
    }

    /// Use random phrasing instead of always the first option.
    pub fn with_random_phrasing(mut self) -> Self {
        self.phrasing = Phrasing::Random;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(mut self) -> Result<TestHarness, AgrobotError> {
        // Create temp directory for SQLite
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| AgrobotError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        self.config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let catalog = Arc::new(SqliteCatalog::new(self.config.storage.clone()));
        catalog.initialize().await?;
        let seeded = seed_catalog(&catalog).await?;

        let store: Arc<dyn CatalogStore> = catalog.clone();
        let dialogue =
            Arc::new(Dialogue::new(store, &self.config).with_phrasing(self.phrasing));
        let sessions = Arc::new(InMemorySessionStore::new());
        let channel = Arc::new(MockChannel::new());
        let agent = Arc::new(AgentLoop::new(
            channel.clone(),
            Arc::clone(&dialogue),
            sessions.clone(),
        ));

        Ok(TestHarness {
            channel,
            catalog,
            sessions,
            dialogue,
            agent,
            seeded,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock channel and temp storage.
pub struct TestHarness {
    /// The mock channel adapter.
    pub channel: Arc<MockChannel>,
    /// SQLite catalog (temp DB, cleaned up on drop).
    pub catalog: Arc<SqliteCatalog>,
    /// Session store shared with the agent loop.
    pub sessions: Arc<InMemorySessionStore>,
    pub dialogue: Arc<Dialogue>,
    pub agent: Arc<AgentLoop>,
    /// Records seeded into the catalog.
    pub seeded: SeededCatalog,
    pub config: AgrobotConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one turn for `sender` and return the replies it produced.
    pub async fn send(&self, sender: &str, kind: EventKind) -> Result<Vec<MessageBody>, AgrobotError> {
        let before = self.channel.sent_to(sender).await.len();
        self.agent
            .handle_event(InboundEvent::new("mock", sender, kind))
            .await?;
        let mut sent = self.channel.sent_to(sender).await;
        Ok(sent.split_off(before.min(sent.len())))
    }

    pub async fn text(&self, sender: &str, text: &str) -> Result<Vec<MessageBody>, AgrobotError> {
        self.send(sender, EventKind::Text(text.to_string())).await
    }

    pub async fn quick_reply(
        &self,
        sender: &str,
        payload: &str,
    ) -> Result<Vec<MessageBody>, AgrobotError> {
        self.send(
            sender,
            EventKind::QuickReply {
                payload: payload.to_string(),
                title: payload.to_string(),
            },
        )
        .await
    }

    pub async fn postback(
        &self,
        sender: &str,
        payload: &str,
    ) -> Result<Vec<MessageBody>, AgrobotError> {
        self.send(
            sender,
            EventKind::Postback {
                payload: payload.to_string(),
                title: payload.to_string(),
            },
        )
        .await
    }

    pub async fn share_location(
        &self,
        sender: &str,
        point: GeoPoint,
    ) -> Result<Vec<MessageBody>, AgrobotError> {
        self.send(sender, EventKind::Location(point)).await
    }

    /// The stored session for `sender`, if a conversation is live.
    pub async fn session(&self, sender: &str) -> Option<Session> {
        self.sessions.load(sender).await.ok().flatten()
    }

    /// Drive `sender` from greeting to the price question: 50 kilograms of
    /// tomatoes at Wakulima Market, in the direction given as a payload.
    pub async fn walk_to_price(&self, sender: &str, direction: &str) -> Result<(), AgrobotError> {
        self.text(sender, "hi").await?;
        self.quick_reply(sender, direction).await?;
        self.text(sender, "tomatoes").await?;
        self.postback(sender, &self.seeded.tomato.code).await?;
        self.quick_reply(sender, &self.seeded.kilogram.code).await?;
        self.text(sender, "50").await?;
        self.share_location(sender, crate::fixtures::NAIROBI_CBD).await?;
        self.quick_reply(sender, &self.seeded.wakulima.code).await?;
        Ok(())
    }
}

/// Text of every reply, skipping card lists.
pub fn texts(replies: &[MessageBody]) -> Vec<&str> {
    replies.iter().filter_map(MessageBody::text).collect()
}
