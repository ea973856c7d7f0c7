// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Agrobot.
//!
//! This crate provides the adapter traits, the error type, and the domain
//! records (catalog entities, users, offers) shared by every other crate in
//! the workspace.

pub mod error;
pub mod geo;
pub mod query;
pub mod records;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AgrobotError;
pub use geo::GeoPoint;
pub use query::{NameQuery, OfferFilter, OfferQuery};
pub use records::{
    Direction, Location, Measurement, NewOffer, NewUser, Offer, PhoneticCodes, Product, RecordId,
    User,
};
pub use types::{
    AdapterType, Card, CardButton, EventKind, HealthStatus, InboundEvent, MessageBody, MessageId,
    OutboundMessage, QuickChoice, UserProfile,
};

pub use traits::{CatalogStore, ChannelAdapter, PluginAdapter};
