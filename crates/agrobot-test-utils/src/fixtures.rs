// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A small Nairobi produce catalog for dialogue tests.
//!
//! Tomatoes and onions come by the kilogram or the crate; cabbages only by
//! the head. Two markets sit near the CBD and one place far away in Kisumu.

use agrobot_core::{
    AgrobotError, CatalogStore, Direction, GeoPoint, Location, Measurement, NewOffer, NewUser,
    Offer, Product, User,
};
use agrobot_resolver::phonetic_codes;
use agrobot_storage::{NewLocation, NewMeasurement, NewProduct, SqliteCatalog};

/// A point in the Nairobi CBD, within reach of both seeded markets.
pub const NAIROBI_CBD: GeoPoint = GeoPoint {
    latitude: -1.2864,
    longitude: 36.8172,
};

/// A point in the Indian Ocean with no seeded place nearby.
pub const OPEN_SEA: GeoPoint = GeoPoint {
    latitude: -10.0,
    longitude: 60.0,
};

/// Records created by [`seed_catalog`], re-read after linking.
#[derive(Debug, Clone)]
pub struct SeededCatalog {
    pub tomato: Product,
    pub onion: Product,
    pub cabbage: Product,
    pub kilogram: Measurement,
    pub crate_: Measurement,
    pub head: Measurement,
    pub wakulima: Location,
    pub kenyatta: Location,
    pub kisumu: Location,
}

/// Seed measurements, products, product links and locations.
pub async fn seed_catalog(catalog: &SqliteCatalog) -> Result<SeededCatalog, AgrobotError> {
    let kilogram = measurement(catalog, "MEASUREMENT_KILOGRAM", "Kilogram", Some("kg")).await?;
    let crate_ = measurement(catalog, "MEASUREMENT_CRATE", "Crate", None).await?;
    let head = measurement(catalog, "MEASUREMENT_HEAD", "Head", None).await?;

    let tomato = product(catalog, "PRODUCT_TOMATO", "Tomato", "Tomatoes", &[&kilogram, &crate_]).await?;
    let onion = product(catalog, "PRODUCT_ONION", "Onion", "Onions", &[&kilogram, &crate_]).await?;
    let cabbage = product(catalog, "PRODUCT_CABBAGE", "Cabbage", "Cabbages", &[&head]).await?;

    let wakulima = location(catalog, "LOC_WAKULIMA", "Wakulima Market", "Nairobi", -1.2833, 36.8300).await?;
    let kenyatta = location(catalog, "LOC_KENYATTA", "Kenyatta Market", "Nairobi", -1.3045, 36.7920).await?;
    let kisumu = location(catalog, "LOC_KIBUYE", "Kibuye Market", "Kisumu", -0.0917, 34.7680).await?;

    Ok(SeededCatalog {
        tomato,
        onion,
        cabbage,
        kilogram,
        crate_,
        head,
        wakulima,
        kenyatta,
        kisumu,
    })
}

/// Register a user directly in the store.
pub async fn register_user(
    catalog: &SqliteCatalog,
    subject_id: &str,
    first_name: &str,
    phone: &str,
) -> Result<User, AgrobotError> {
    catalog
        .insert_user(&NewUser {
            first_name: first_name.to_string(),
            last_name: "Farmer".to_string(),
            phone: phone.to_string(),
            email: format!("{subject_id}@example.com"),
            subject_id: subject_id.to_string(),
            app_subject_id: None,
            picture_url: Some(format!("https://pictures.example.com/{subject_id}.jpg")),
            gender: None,
        })
        .await
}

/// Store an offer for `user` at `place` without going through the dialogue.
#[allow(clippy::too_many_arguments)]
pub async fn place_offer(
    catalog: &SqliteCatalog,
    user: &User,
    direction: Direction,
    product: &Product,
    measurement: &Measurement,
    quantity: u32,
    price: f64,
    place: &Location,
) -> Result<Offer, AgrobotError> {
    catalog
        .insert_offer(&NewOffer {
            direction,
            product_id: product.id,
            measurement_id: measurement.id,
            quantity,
            price,
            origin_location_id: place.id,
            origin_point: place.point,
            destination_location_id: place.id,
            destination_point: place.point,
            user_id: user.id,
            options: serde_json::json!({}),
        })
        .await
}

async fn measurement(
    catalog: &SqliteCatalog,
    code: &str,
    name: &str,
    symbol: Option<&str>,
) -> Result<Measurement, AgrobotError> {
    let (measurement, _) = catalog
        .upsert_measurement(&NewMeasurement {
            code: code.to_string(),
            name: name.to_string(),
            symbol: symbol.map(str::to_string),
            singular: name.to_string(),
            plural: format!("{name}s"),
        })
        .await?;
    Ok(measurement)
}

async fn product(
    catalog: &SqliteCatalog,
    code: &str,
    singular: &str,
    plural: &str,
    measurements: &[&Measurement],
) -> Result<Product, AgrobotError> {
    let (product, _) = catalog
        .upsert_product(&NewProduct {
            code: code.to_string(),
            name: singular.to_string(),
            category: Some("Vegetables".to_string()),
            singular: singular.to_string(),
            plural: plural.to_string(),
            phonetic: phonetic_codes(singular),
        })
        .await?;
    for measurement in measurements {
        catalog.link_measurement(product.id, measurement.id).await?;
    }
    catalog
        .find_product(product.id)
        .await?
        .ok_or_else(|| AgrobotError::Internal(format!("seeded product {code} vanished")))
}

async fn location(
    catalog: &SqliteCatalog,
    code: &str,
    name: &str,
    city: &str,
    latitude: f64,
    longitude: f64,
) -> Result<Location, AgrobotError> {
    let (location, _) = catalog
        .upsert_location(&NewLocation {
            code: code.to_string(),
            name: name.to_string(),
            alternate_names: Vec::new(),
            city: Some(city.to_string()),
            region: None,
            country: Some("Kenya".to_string()),
            phonetic: phonetic_codes(name),
            point: GeoPoint::new(latitude, longitude),
        })
        .await?;
    Ok(location)
}
