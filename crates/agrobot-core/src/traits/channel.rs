// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging transports.

use async_trait::async_trait;

use crate::error::AgrobotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundEvent, MessageId, OutboundMessage, UserProfile};

/// Adapter for a bidirectional messaging transport.
///
/// The transport classifies inbound events, renders outbound text, quick
/// choices and cards, and exposes the profile of the user behind a sender id.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), AgrobotError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, AgrobotError>;

    /// Receives the next inbound event from the channel.
    ///
    /// Returns a [`AgrobotError::Channel`] once the transport is closed.
    async fn receive(&self) -> Result<InboundEvent, AgrobotError>;

    /// Fetches the profile of the user behind `sender_id`.
    async fn fetch_profile(&self, sender_id: &str) -> Result<UserProfile, AgrobotError>;
}
