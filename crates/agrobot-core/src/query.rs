// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query descriptions passed to a [`crate::CatalogStore`].

use crate::geo::GeoPoint;
use crate::records::{Direction, Offer, PhoneticCodes, RecordId};

/// A name lookup against the product catalog.
///
/// A record matches when its name, singular form or plural form equals
/// `text` ignoring case, or when either stored phonetic code equals the
/// corresponding code in `phonetic`. Values are always bound as parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameQuery {
    /// Normalized, lowercase query text. Never empty.
    pub text: String,
    pub phonetic: PhoneticCodes,
    pub limit: usize,
}

/// Search for counter-offers.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferQuery {
    pub direction: Direction,
    pub product_id: RecordId,
    pub filters: Vec<OfferFilter>,
    pub limit: usize,
}

impl OfferQuery {
    pub fn new(direction: Direction, product_id: RecordId, limit: usize) -> Self {
        Self {
            direction,
            product_id,
            filters: Vec::new(),
            limit,
        }
    }

    pub fn with_filter(mut self, filter: OfferFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// True when `offer` satisfies direction, product and every filter.
    pub fn accepts(&self, offer: &Offer) -> bool {
        offer.direction == self.direction
            && offer.product_id == self.product_id
            && self.filters.iter().all(|f| f.accepts(offer))
    }

    /// Whether any filter needs a distance computation.
    pub fn has_geo_filter(&self) -> bool {
        self.filters.iter().any(OfferFilter::is_geo)
    }
}

/// An independently toggleable compatibility predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum OfferFilter {
    /// Price within the inclusive bounds that are set.
    PriceBand { min: Option<f64>, max: Option<f64> },
    /// Quantity within the inclusive bounds.
    QuantityBand { min: f64, max: f64 },
    /// Same unit of measurement.
    SameMeasurement(RecordId),
    /// Origin point within `radius_m` meters of `point`.
    OriginNear { point: GeoPoint, radius_m: f64 },
    /// Destination point within `radius_m` meters of `point`.
    DestinationNear { point: GeoPoint, radius_m: f64 },
    /// Not owned by this user.
    ExcludeUser(RecordId),
}

impl OfferFilter {
    pub fn accepts(&self, offer: &Offer) -> bool {
        match self {
            Self::PriceBand { min, max } => {
                min.is_none_or(|min| offer.price >= min) && max.is_none_or(|max| offer.price <= max)
            }
            Self::QuantityBand { min, max } => {
                let qty = f64::from(offer.quantity);
                qty >= *min && qty <= *max
            }
            Self::SameMeasurement(id) => offer.measurement_id == *id,
            Self::OriginNear { point, radius_m } => {
                point.distance_m(&offer.origin_point) <= *radius_m
            }
            Self::DestinationNear { point, radius_m } => {
                point.distance_m(&offer.destination_point) <= *radius_m
            }
            Self::ExcludeUser(id) => offer.user_id != *id,
        }
    }

    pub fn is_geo(&self) -> bool {
        matches!(self, Self::OriginNear { .. } | Self::DestinationNear { .. })
    }
}
