// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialogue states and the offer collected along the way.

use agrobot_core::{Direction, GeoPoint, Location, Measurement, NewOffer, Product, RecordId};

/// Position of a conversation in the offer dialogue.
///
/// Every state except `Persisting` and `Matching` waits for one specific
/// kind of answer. Those two only exist while a turn is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DialogueState {
    /// No conversation in progress.
    #[default]
    Idle,
    /// Waiting for buy or sell.
    AskDirection,
    /// Waiting for product text.
    AskProduct,
    /// Nothing matched the product text; waiting for yes or no.
    AskProductRetry,
    /// Waiting for a product card selection.
    ChooseProduct,
    /// Waiting for a measurement quick reply.
    AskMeasurement,
    /// Waiting for a whole number.
    AskQuantity,
    /// Waiting for a location share.
    AskLocation,
    /// Waiting for a nearby place quick reply.
    AskLocationRefine,
    /// Waiting for a decimal price.
    AskPrice,
    /// Onboarding: waiting for a phone number.
    AskPhone,
    /// Onboarding: waiting for an email address.
    AskEmail,
    Persisting,
    Matching,
    /// Waiting for an offer card selection.
    Presenting,
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DialogueState::Idle => "idle",
            DialogueState::AskDirection => "ask_direction",
            DialogueState::AskProduct => "ask_product",
            DialogueState::AskProductRetry => "ask_product_retry",
            DialogueState::ChooseProduct => "choose_product",
            DialogueState::AskMeasurement => "ask_measurement",
            DialogueState::AskQuantity => "ask_quantity",
            DialogueState::AskLocation => "ask_location",
            DialogueState::AskLocationRefine => "ask_location_refine",
            DialogueState::AskPrice => "ask_price",
            DialogueState::AskPhone => "ask_phone",
            DialogueState::AskEmail => "ask_email",
            DialogueState::Persisting => "persisting",
            DialogueState::Matching => "matching",
            DialogueState::Presenting => "presenting",
        };
        f.write_str(name)
    }
}

/// A resolved place and the exact point the user shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub location: Location,
    pub point: GeoPoint,
}

/// Offer fields collected so far. Unanswered fields are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferDraft {
    pub direction: Option<Direction>,
    pub product: Option<Product>,
    pub measurement: Option<Measurement>,
    pub quantity: Option<u32>,
    pub price: Option<f64>,
    pub origin: Option<Placement>,
    pub destination: Option<Placement>,
}

impl OfferDraft {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            ..Self::default()
        }
    }

    /// Set origin and destination. Offers are single-leg for now, so both
    /// start out as the same place.
    pub fn place(&mut self, location: Location, point: GeoPoint) {
        let placement = Placement { location, point };
        self.origin = Some(placement.clone());
        self.destination = Some(placement);
    }

    /// The offer to store for `user_id`, or `None` while any field is missing.
    pub fn to_new_offer(&self, user_id: RecordId) -> Option<NewOffer> {
        let origin = self.origin.as_ref()?;
        let destination = self.destination.as_ref()?;
        Some(NewOffer {
            direction: self.direction?,
            product_id: self.product.as_ref()?.id,
            measurement_id: self.measurement.as_ref()?.id,
            quantity: self.quantity?,
            price: self.price?,
            origin_location_id: origin.location.id,
            origin_point: origin.point,
            destination_location_id: destination.location.id,
            destination_point: destination.point,
            user_id,
            options: serde_json::json!({}),
        })
    }
}

#[cfg(test)]
mod tests {
    use agrobot_core::PhoneticCodes;

    use super::*;

    fn complete() -> OfferDraft {
        let mut draft = OfferDraft::new(Direction::Buy);
        draft.product = Some(Product {
            id: 1,
            code: "PRODUCT_TOMATO".into(),
            name: "Tomato".into(),
            category: None,
            singular: "Tomato".into(),
            plural: "Tomatoes".into(),
            phonetic: PhoneticCodes::default(),
            measurement_ids: vec![2],
        });
        draft.measurement = Some(Measurement {
            id: 2,
            code: "MEASUREMENT_KILOGRAM".into(),
            name: "Kilogram".into(),
            symbol: Some("kg".into()),
            singular: "Kilogram".into(),
            plural: "Kilograms".into(),
        });
        draft.quantity = Some(50);
        draft.price = Some(25.0);
        draft.place(
            Location {
                id: 3,
                code: "LOC_CBD".into(),
                name: "CBD".into(),
                alternate_names: Vec::new(),
                city: None,
                region: None,
                country: None,
                phonetic: PhoneticCodes::default(),
                point: GeoPoint::new(-1.2864, 36.8172),
            },
            GeoPoint::new(-1.2921, 36.8219),
        );
        draft
    }

    #[test]
    fn complete_draft_builds_offer() {
        let offer = complete().to_new_offer(9).unwrap();
        assert_eq!(offer.direction, Direction::Buy);
        assert_eq!(offer.quantity, 50);
        assert_eq!(offer.origin_location_id, 3);
        assert_eq!(offer.origin_point, offer.destination_point);
        assert_eq!(offer.origin_point, GeoPoint::new(-1.2921, 36.8219));
        assert_eq!(offer.user_id, 9);
        assert!(offer.validate().is_ok());
    }

    #[test]
    fn missing_field_yields_none() {
        let mut draft = complete();
        draft.price = None;
        assert!(draft.to_new_offer(9).is_none());
        let mut draft = complete();
        draft.destination = None;
        assert!(draft.to_new_offer(9).is_none());
    }

    #[test]
    fn state_names() {
        assert_eq!(DialogueState::AskLocationRefine.to_string(), "ask_location_refine");
        assert_eq!(DialogueState::default(), DialogueState::Idle);
    }
}
