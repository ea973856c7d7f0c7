// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free text and coordinates to catalog entities.

use std::sync::Arc;

use agrobot_config::model::DialogueConfig;
use agrobot_core::{
    AgrobotError, CatalogStore, GeoPoint, Location, Measurement, NameQuery, Product,
};
use tracing::{debug, warn};

use crate::normalize::normalize_query;
use crate::phonetic::phonetic_codes;

/// Result caps and search radius for resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverLimits {
    pub product_limit: usize,
    pub location_radius_m: f64,
    pub location_limit: usize,
}

impl Default for ResolverLimits {
    fn default() -> Self {
        Self {
            product_limit: 8,
            location_radius_m: 5_000.0,
            location_limit: 8,
        }
    }
}

impl From<&DialogueConfig> for ResolverLimits {
    fn from(config: &DialogueConfig) -> Self {
        Self {
            product_limit: config.product_limit,
            location_radius_m: config.location_radius_m,
            location_limit: config.location_limit,
        }
    }
}

/// Resolves user answers against the catalog.
///
/// Product text matches on exact name, singular or plural (ignoring case),
/// or on either phonetic code. Results keep the store's ordering and are
/// capped at [`ResolverLimits::product_limit`].
#[derive(Clone)]
pub struct EntityResolver {
    catalog: Arc<dyn CatalogStore>,
    limits: ResolverLimits,
}

impl EntityResolver {
    pub fn new(catalog: Arc<dyn CatalogStore>, limits: ResolverLimits) -> Self {
        Self { catalog, limits }
    }

    /// Build the catalog query for `text`, or `None` if nothing is searchable.
    pub fn name_query(&self, text: &str) -> Option<NameQuery> {
        let text = normalize_query(text)?;
        let phonetic = phonetic_codes(&text);
        Some(NameQuery {
            text,
            phonetic,
            limit: self.limits.product_limit,
        })
    }

    /// Candidate products for a free-text answer. Empty text matches nothing.
    pub async fn resolve_products(&self, text: &str) -> Result<Vec<Product>, AgrobotError> {
        let Some(query) = self.name_query(text) else {
            debug!("empty product query");
            return Ok(Vec::new());
        };
        let products = self.catalog.find_products(&query).await?;
        debug!(
            query = %query.text,
            soundex = %query.phonetic.soundex,
            metaphone = %query.phonetic.metaphone,
            count = products.len(),
            "resolved products"
        );
        Ok(products)
    }

    /// Authoritative re-read of a selected product.
    pub async fn product_by_code(&self, code: &str) -> Result<Option<Product>, AgrobotError> {
        self.catalog.find_product_by_code(code).await
    }

    /// Compatible measurements of `product`, in the product's order.
    pub async fn measurements_for(
        &self,
        product: &Product,
    ) -> Result<Vec<Measurement>, AgrobotError> {
        self.catalog.find_measurements(&product.measurement_ids).await
    }

    /// Locations near a shared point, nearest first.
    pub async fn nearby_locations(&self, point: GeoPoint) -> Result<Vec<Location>, AgrobotError> {
        if !point.is_valid() {
            warn!(%point, "ignoring invalid coordinates");
            return Ok(Vec::new());
        }
        let locations = self
            .catalog
            .find_locations_near(point, self.limits.location_radius_m, self.limits.location_limit)
            .await?;
        debug!(%point, count = locations.len(), "resolved nearby locations");
        Ok(locations)
    }

    pub async fn location_by_code(&self, code: &str) -> Result<Option<Location>, AgrobotError> {
        self.catalog.find_location_by_code(code).await
    }
}
