// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Card rendering for product and counter-offer lists.
//!
//! Offer cards need the offer owner, product, measurement and origin place.
//! Those lookups run concurrently, both within one card and across cards,
//! and are joined before anything is sent. A card whose lookups fail or
//! come back empty is left out instead of failing the whole list.

use agrobot_core::{
    AgrobotError, Card, CardButton, CatalogStore, Direction, Location, Measurement, Offer,
    Product, RecordId, User,
};
use futures::future::join_all;
use tracing::warn;

const CONNECT_PREFIX: &str = "CONNECT_";

/// Postback payload carried by an offer card's connect button.
pub fn connect_payload(offer_id: RecordId) -> String {
    format!("{CONNECT_PREFIX}{offer_id}")
}

/// Offer id from a connect button payload.
pub fn parse_connect(payload: &str) -> Option<RecordId> {
    payload.strip_prefix(CONNECT_PREFIX)?.parse().ok()
}

/// One card per product. The button payload is the product code.
pub fn product_cards(
    products: &[Product],
    direction: Direction,
    image_base_url: Option<&str>,
) -> Vec<Card> {
    products
        .iter()
        .map(|product| Card {
            title: product.name.clone(),
            subtitle: product.category.clone(),
            image_url: image_base_url.map(|base| {
                format!(
                    "{}/images/products/{}.jpg",
                    base.trim_end_matches('/'),
                    product.code
                )
            }),
            buttons: vec![CardButton::Postback {
                title: format!("{} {}", direction.label(), product.name.to_lowercase()),
                payload: product.code.clone(),
            }],
        })
        .collect()
}

/// One card per counter-offer, in input order, skipping offers whose
/// related records cannot be loaded.
pub async fn offer_cards(catalog: &dyn CatalogStore, offers: &[Offer]) -> Vec<Card> {
    join_all(offers.iter().map(|offer| offer_card(catalog, offer)))
        .await
        .into_iter()
        .flatten()
        .collect()
}

async fn offer_card(catalog: &dyn CatalogStore, offer: &Offer) -> Option<Card> {
    let (user, product, measurement, location) = futures::join!(
        catalog.find_user(offer.user_id),
        catalog.find_product(offer.product_id),
        catalog.find_measurement(offer.measurement_id),
        catalog.find_location(offer.origin_location_id),
    );

    let user = required(offer.id, "user", user)?;
    let product = required(offer.id, "product", product)?;
    let measurement = required(offer.id, "measurement", measurement)?;
    let location = required(offer.id, "location", location)?;

    Some(build_offer_card(offer, &user, &product, &measurement, &location))
}

fn required<T>(
    offer_id: RecordId,
    what: &'static str,
    lookup: Result<Option<T>, AgrobotError>,
) -> Option<T> {
    match lookup {
        Ok(Some(record)) => Some(record),
        Ok(None) => {
            warn!(offer_id, missing = what, "offer card skipped");
            None
        }
        Err(e) => {
            warn!(offer_id, lookup = what, error = %e, "offer card lookup failed");
            None
        }
    }
}

fn build_offer_card(
    offer: &Offer,
    user: &User,
    product: &Product,
    measurement: &Measurement,
    location: &Location,
) -> Card {
    let mut buttons = Vec::with_capacity(2);
    if let Some(phone) = &user.phone {
        buttons.push(CardButton::PhoneNumber {
            title: "Call".into(),
            number: phone.clone(),
        });
    }
    buttons.push(CardButton::Postback {
        title: "Connect".into(),
        payload: connect_payload(offer.id),
    });

    Card {
        title: user.full_name(),
        subtitle: Some(format!(
            "Wants to {} {} {} of {} in {}.",
            offer.direction.verb(),
            offer.quantity,
            measurement.plural.to_lowercase(),
            product.plural.to_lowercase(),
            location.name
        )),
        image_url: user.picture_url.clone(),
        buttons,
    }
}

#[cfg(test)]
mod tests {
    use agrobot_core::{GeoPoint, PhoneticCodes};
    use chrono::Utc;

    use super::*;

    fn tomato() -> Product {
        Product {
            id: 1,
            code: "PRODUCT_TOMATO".into(),
            name: "Tomato".into(),
            category: Some("Vegetables".into()),
            singular: "Tomato".into(),
            plural: "Tomatoes".into(),
            phonetic: PhoneticCodes::default(),
            measurement_ids: vec![1],
        }
    }

    #[test]
    fn connect_payloads() {
        assert_eq!(connect_payload(42), "CONNECT_42");
        assert_eq!(parse_connect("CONNECT_42"), Some(42));
        assert_eq!(parse_connect("CONNECT_x"), None);
        assert_eq!(parse_connect("PRODUCT_TOMATO"), None);
    }

    #[test]
    fn product_card_shape() {
        let cards = product_cards(&[tomato()], Direction::Sell, Some("https://cdn.test/"));
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.title, "Tomato");
        assert_eq!(
            card.image_url.as_deref(),
            Some("https://cdn.test/images/products/PRODUCT_TOMATO.jpg")
        );
        assert_eq!(
            card.buttons,
            vec![CardButton::Postback {
                title: "Sell tomato".into(),
                payload: "PRODUCT_TOMATO".into(),
            }]
        );

        let bare = product_cards(&[tomato()], Direction::Buy, None);
        assert!(bare[0].image_url.is_none());
    }

    #[test]
    fn offer_card_text() {
        let point = GeoPoint::new(-1.28, 36.82);
        let offer = Offer {
            id: 7,
            direction: Direction::Sell,
            product_id: 1,
            measurement_id: 1,
            quantity: 40,
            price: 20.0,
            origin_location_id: 1,
            origin_point: point,
            destination_location_id: 1,
            destination_point: point,
            user_id: 3,
            matched: false,
            options: serde_json::json!({}),
            created_at: Utc::now(),
        };
        let user = User {
            id: 3,
            first_name: "Amina".into(),
            last_name: "Otieno".into(),
            phone: Some("+254700000001".into()),
            email: None,
            subject_id: "s3".into(),
            app_subject_id: None,
            picture_url: Some("https://pics.test/a.jpg".into()),
            gender: None,
            created_at: Utc::now(),
        };
        let measurement = Measurement {
            id: 1,
            code: "MEASUREMENT_KILOGRAM".into(),
            name: "Kilogram".into(),
            symbol: Some("kg".into()),
            singular: "Kilogram".into(),
            plural: "Kilograms".into(),
        };
        let location = Location {
            id: 1,
            code: "LOC_WAKULIMA".into(),
            name: "Wakulima Market".into(),
            alternate_names: Vec::new(),
            city: None,
            region: None,
            country: None,
            phonetic: PhoneticCodes::default(),
            point,
        };

        let card = build_offer_card(&offer, &user, &tomato(), &measurement, &location);
        assert_eq!(card.title, "Amina Otieno");
        assert_eq!(
            card.subtitle.as_deref(),
            Some("Wants to sell 40 kilograms of tomatoes in Wakulima Market.")
        );
        assert_eq!(card.buttons.len(), 2);
        assert!(matches!(&card.buttons[0], CardButton::PhoneNumber { number, .. } if number == "+254700000001"));

        let no_phone = User { phone: None, ..user };
        let card = build_offer_card(&offer, &no_phone, &tomato(), &measurement, &location);
        assert_eq!(
            card.buttons,
            vec![CardButton::Postback {
                title: "Connect".into(),
                payload: "CONNECT_7".into(),
            }]
        );
    }
}
