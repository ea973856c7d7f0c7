// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user conversation state and where it is kept between turns.
//!
//! One [`Session`] exists per transport sender id. A turn loads it, works
//! on a copy, and writes the copy back only when the turn finishes.

use async_trait::async_trait;
use dashmap::DashMap;

use agrobot_core::{AgrobotError, GeoPoint, Location, Offer, Product, User, UserProfile};

use crate::state::{DialogueState, OfferDraft};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub state: DialogueState,
    pub draft: OfferDraft,
    /// The registered user behind this conversation, once known.
    pub user: Option<User>,
    /// Transport profile, fetched on the first greeting.
    pub profile: Option<UserProfile>,
    /// Phone number collected during onboarding, awaiting the email.
    pub phone: Option<String>,
    /// Products offered for selection.
    pub products: Vec<Product>,
    /// Places offered for selection.
    pub locations: Vec<Location>,
    /// The point shared while picking a place.
    pub shared_point: Option<GeoPoint>,
    /// Counter-offers presented to the user.
    pub offers: Vec<Offer>,
    /// Failed answers to the current question.
    pub attempts: u32,
}

impl Session {
    pub fn new(user: Option<User>, profile: Option<UserProfile>) -> Self {
        Self {
            user,
            profile,
            ..Self::default()
        }
    }

    /// Move to `state`, clearing the attempt counter.
    pub fn enter(&mut self, state: DialogueState) {
        self.state = state;
        self.attempts = 0;
    }
}

/// Storage for in-flight sessions, keyed by sender id.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn load(&self, sender_id: &str) -> Result<Option<Session>, AgrobotError>;

    async fn save(&self, sender_id: &str, session: Session) -> Result<(), AgrobotError>;

    async fn remove(&self, sender_id: &str) -> Result<(), AgrobotError>;
}

/// Process-lifetime session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, sender_id: &str) -> Result<Option<Session>, AgrobotError> {
        Ok(self.sessions.get(sender_id).map(|s| s.value().clone()))
    }

    async fn save(&self, sender_id: &str, session: Session) -> Result<(), AgrobotError> {
        self.sessions.insert(sender_id.to_string(), session);
        Ok(())
    }

    async fn remove(&self, sender_id: &str) -> Result<(), AgrobotError> {
        self.sessions.remove(sender_id);
        Ok(())
    }
}
