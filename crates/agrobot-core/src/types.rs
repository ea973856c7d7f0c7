// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport and adapter types shared across the Agrobot workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::geo::GeoPoint;

/// Unique identifier for a delivered outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Catalog,
}

// --- Inbound events ---

/// One event delivered by a messaging transport.
///
/// `sender_id` is the opaque, transport-scoped identity of the user. All
/// dialogue state is keyed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub id: String,
    pub channel: String,
    pub sender_id: String,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

impl InboundEvent {
    /// Build an event stamped with a fresh id and the current time.
    pub fn new(channel: impl Into<String>, sender_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel: channel.into(),
            sender_id: sender_id.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// The shape of an inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Free text typed by the user.
    Text(String),
    /// A quick-choice selection.
    QuickReply { payload: String, title: String },
    /// A button press on a card or a platform action such as "Get Started".
    Postback { payload: String, title: String },
    /// A shared location attachment.
    Location(GeoPoint),
}

impl EventKind {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::QuickReply { .. } => "quick_reply",
            Self::Postback { .. } => "postback",
            Self::Location(_) => "location",
        }
    }
}

// --- Outbound messages ---

/// A message addressed to one user.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub recipient: String,
    pub body: MessageBody,
}

impl OutboundMessage {
    pub fn text(recipient: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            body: MessageBody::Text(text.into()),
        }
    }
}

/// What the transport should render.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Text(String),
    /// Text followed by a bounded set of quick-choice buttons.
    QuickChoices {
        text: String,
        choices: Vec<QuickChoice>,
    },
    /// Text with a "share location" button.
    LocationRequest { text: String },
    /// A horizontally scrolling list of rich cards.
    Cards(Vec<Card>),
}

impl MessageBody {
    /// The human-readable text of the message, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::QuickChoices { text, .. } | Self::LocationRequest { text } => {
                Some(text)
            }
            Self::Cards(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickChoice {
    pub title: String,
    pub payload: String,
}

impl QuickChoice {
    pub fn new(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            payload: payload.into(),
        }
    }
}

/// A rich card with optional image and action buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub buttons: Vec<CardButton>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardButton {
    /// Sends a postback event carrying `payload` when pressed.
    Postback { title: String, payload: String },
    /// Dials `number` when pressed.
    PhoneNumber { title: String, number: String },
}

/// Profile details a transport exposes for the user behind a sender id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub picture_url: Option<String>,
    pub locale: Option<String>,
    pub gender: Option<String>,
}
