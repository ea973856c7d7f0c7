// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog store trait: products, measurements, locations, users and offers.

use async_trait::async_trait;

use crate::error::AgrobotError;
use crate::geo::GeoPoint;
use crate::query::{NameQuery, OfferQuery};
use crate::records::{Location, Measurement, NewOffer, NewUser, Offer, Product, RecordId, User};
use crate::traits::adapter::PluginAdapter;

/// Record store consulted by the resolver, the matching engine and the dialogue.
///
/// Catalog entities are read-only here. Users and offers are inserted by the
/// dialogue. Unique violations surface as [`AgrobotError::Conflict`].
#[async_trait]
pub trait CatalogStore: PluginAdapter {
    /// Opens the backing store and applies pending migrations.
    async fn initialize(&self) -> Result<(), AgrobotError>;

    // --- Products ---

    /// Products matching `query`, at most `query.limit`, in store order.
    async fn find_products(&self, query: &NameQuery) -> Result<Vec<Product>, AgrobotError>;

    async fn find_product(&self, id: RecordId) -> Result<Option<Product>, AgrobotError>;

    async fn find_product_by_code(&self, code: &str) -> Result<Option<Product>, AgrobotError>;

    // --- Measurements ---

    /// Measurements with the given ids, in the order of `ids`. Unknown ids are skipped.
    async fn find_measurements(&self, ids: &[RecordId]) -> Result<Vec<Measurement>, AgrobotError>;

    async fn find_measurement(&self, id: RecordId) -> Result<Option<Measurement>, AgrobotError>;

    async fn find_measurement_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Measurement>, AgrobotError>;

    // --- Locations ---

    /// Locations within `radius_m` meters of `point`, nearest first.
    async fn find_locations_near(
        &self,
        point: GeoPoint,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<Location>, AgrobotError>;

    async fn find_location(&self, id: RecordId) -> Result<Option<Location>, AgrobotError>;

    async fn find_location_by_code(&self, code: &str) -> Result<Option<Location>, AgrobotError>;

    // --- Users ---

    async fn find_user(&self, id: RecordId) -> Result<Option<User>, AgrobotError>;

    async fn find_user_by_subject(&self, subject_id: &str) -> Result<Option<User>, AgrobotError>;

    async fn insert_user(&self, user: &NewUser) -> Result<User, AgrobotError>;

    // --- Offers ---

    async fn insert_offer(&self, offer: &NewOffer) -> Result<Offer, AgrobotError>;

    async fn find_offer(&self, id: RecordId) -> Result<Option<Offer>, AgrobotError>;

    /// Offers accepted by `query`, at most `query.limit`. No match is an empty vec.
    async fn find_offers(&self, query: &OfferQuery) -> Result<Vec<Offer>, AgrobotError>;
}
