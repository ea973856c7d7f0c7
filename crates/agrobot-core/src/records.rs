// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog and transactional records.
//!
//! Products, measurements and locations are catalog entities written only by
//! the seeding job. Users and offers are created by the dialogue.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::geo::GeoPoint;

/// Row identifier assigned by the catalog store.
pub type RecordId = i64;

/// Whether an offer wants to buy or to sell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// The counterparty's direction.
    pub fn inverse(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Lowercase verb used in prose ("buy", "sell").
    pub fn verb(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    /// Capitalized label used on buttons.
    pub fn label(self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }

    /// Parse a structured payload such as `"BUY"`.
    pub fn from_payload(payload: &str) -> Option<Self> {
        Self::from_str(payload.trim()).ok()
    }
}

/// The two phonetic encodings stored on every searchable catalog record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneticCodes {
    /// Coarse consonant skeleton (Soundex).
    pub soundex: String,
    /// Finer pronunciation code (Metaphone).
    pub metaphone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Transport-scoped subject id; unique.
    pub subject_id: String,
    /// Application-scoped id some transports expose next to the subject id.
    pub app_subject_id: Option<String>,
    pub picture_url: Option<String>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Fields required to register a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub subject_id: String,
    pub app_subject_id: Option<String>,
    pub picture_url: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub singular: String,
    pub plural: String,
    pub phonetic: PhoneticCodes,
    /// Compatible units in presentation order.
    pub measurement_ids: Vec<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: RecordId,
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
    pub singular: String,
    pub plural: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: RecordId,
    pub code: String,
    pub name: String,
    pub alternate_names: Vec<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub phonetic: PhoneticCodes,
    pub point: GeoPoint,
}

/// A stored buy or sell intent.
///
/// Origin and destination are independent fields; the dialogue currently
/// sets both to the same place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: RecordId,
    pub direction: Direction,
    pub product_id: RecordId,
    pub measurement_id: RecordId,
    pub quantity: u32,
    pub price: f64,
    pub origin_location_id: RecordId,
    pub origin_point: GeoPoint,
    pub destination_location_id: RecordId,
    pub destination_point: GeoPoint,
    pub user_id: RecordId,
    pub matched: bool,
    pub options: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Fields required to persist an offer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub direction: Direction,
    pub product_id: RecordId,
    pub measurement_id: RecordId,
    pub quantity: u32,
    pub price: f64,
    pub origin_location_id: RecordId,
    pub origin_point: GeoPoint,
    pub destination_location_id: RecordId,
    pub destination_point: GeoPoint,
    pub user_id: RecordId,
    pub options: serde_json::Value,
}

impl NewOffer {
    /// Checks the record-level invariants before it reaches the store.
    pub fn validate(&self) -> Result<(), String> {
        if self.quantity == 0 {
            return Err("quantity must be positive".into());
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err("price must be positive".into());
        }
        if !self.origin_point.is_valid() || !self.destination_point.is_valid() {
            return Err("offer points must be valid coordinates".into());
        }
        Ok(())
    }
}
