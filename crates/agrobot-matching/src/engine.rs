// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counter-offer search.

use std::sync::Arc;

use agrobot_config::model::MatchingConfig;
use agrobot_core::{AgrobotError, CatalogStore, Direction, Offer, OfferFilter, OfferQuery};
use tracing::debug;

/// Finds stored offers that could settle a newly persisted one.
///
/// A candidate always has the inverse direction and the same product.
/// Every other compatibility rule is an [`OfferFilter`] enabled from
/// [`MatchingConfig`], so rules can be switched on one at a time without
/// touching the call site.
#[derive(Clone)]
pub struct MatchingEngine {
    catalog: Arc<dyn CatalogStore>,
    config: MatchingConfig,
}

impl MatchingEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>, config: MatchingConfig) -> Self {
        Self { catalog, config }
    }

    /// Candidate counter-offers, oldest first. No match is an empty list.
    pub async fn find_matches(&self, offer: &Offer) -> Result<Vec<Offer>, AgrobotError> {
        let query = counter_offer_query(offer, &self.config);
        let matches = self.catalog.find_offers(&query).await?;
        debug!(
            offer_id = offer.id,
            direction = %query.direction,
            product_id = query.product_id,
            filters = query.filters.len(),
            count = matches.len(),
            "searched counter-offers"
        );
        Ok(matches)
    }
}

/// The query used to search counter-offers for `offer` under `cfg`.
pub fn counter_offer_query(offer: &Offer, cfg: &MatchingConfig) -> OfferQuery {
    let mut query = OfferQuery::new(offer.direction.inverse(), offer.product_id, cfg.limit);

    if let Some(tol) = cfg.price_tolerance {
        // A buyer accepts sellers up to the tolerance above their price,
        // a seller accepts buyers down to the tolerance below theirs.
        query = query.with_filter(match offer.direction {
            Direction::Buy => OfferFilter::PriceBand {
                min: None,
                max: Some(offer.price * (1.0 + tol)),
            },
            Direction::Sell => OfferFilter::PriceBand {
                min: Some(offer.price * (1.0 - tol)),
                max: None,
            },
        });
    }

    if let Some(tol) = cfg.quantity_tolerance {
        let qty = f64::from(offer.quantity);
        query = query.with_filter(OfferFilter::QuantityBand {
            min: qty * (1.0 - tol),
            max: qty * (1.0 + tol),
        });
    }

    if cfg.same_measurement {
        query = query.with_filter(OfferFilter::SameMeasurement(offer.measurement_id));
    }

    if let Some(radius_m) = cfg.proximity_radius_m {
        query = query
            .with_filter(OfferFilter::OriginNear {
                point: offer.origin_point,
                radius_m,
            })
            .with_filter(OfferFilter::DestinationNear {
                point: offer.destination_point,
                radius_m,
            });
    }

    if cfg.exclude_self {
        query = query.with_filter(OfferFilter::ExcludeUser(offer.user_id));
    }

    query
}
