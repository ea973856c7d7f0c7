// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write models for catalog seeding.
//!
//! Read models live in `agrobot-core` so they can cross the
//! [`agrobot_core::CatalogStore`] boundary.

use agrobot_core::{GeoPoint, PhoneticCodes};

pub use agrobot_core::{Location, Measurement, NewOffer, NewUser, Offer, Product, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeasurement {
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
    pub singular: String,
    pub plural: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub singular: String,
    pub plural: String,
    pub phonetic: PhoneticCodes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub code: String,
    pub name: String,
    pub alternate_names: Vec<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub phonetic: PhoneticCodes,
    pub point: GeoPoint,
}
