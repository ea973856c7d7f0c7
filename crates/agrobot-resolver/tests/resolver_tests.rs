// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolver behavior against a real SQLite catalog.

use std::sync::Arc;

use agrobot_config::model::StorageConfig;
use agrobot_core::GeoPoint;
use agrobot_resolver::{EntityResolver, ResolverLimits, phonetic_codes};
use agrobot_storage::{Database, NewLocation, NewMeasurement, NewProduct, SqliteCatalog};

async fn catalog() -> Arc<SqliteCatalog> {
    let db = Database::open_in_memory().await.unwrap();
    Arc::new(SqliteCatalog::from_database(StorageConfig::default(), db))
}

fn product(code: &str, singular: &str, plural: &str) -> NewProduct {
    NewProduct {
        code: code.into(),
        name: singular.into(),
        category: Some("Vegetable".into()),
        singular: singular.into(),
        plural: plural.into(),
        phonetic: phonetic_codes(singular),
    }
}

async fn seeded() -> (Arc<SqliteCatalog>, EntityResolver) {
    let catalog = catalog().await;
    for (code, singular, plural) in [
        ("PRODUCT_TOMATO", "Tomato", "Tomatoes"),
        ("PRODUCT_ONION", "Onion", "Onions"),
        ("PRODUCT_CABBAGE", "Cabbage", "Cabbages"),
    ] {
        catalog
            .upsert_product(&product(code, singular, plural))
            .await
            .unwrap();
    }
    let resolver = EntityResolver::new(catalog.clone(), ResolverLimits::default());
    (catalog, resolver)
}

#[tokio::test]
async fn exact_plural_resolves() {
    let (_, resolver) = seeded().await;
    let found = resolver.resolve_products("tomatoes").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Tomato");
    assert_eq!(found[0].plural, "Tomatoes");
}

#[tokio::test]
async fn exact_match_ignores_case_and_spacing() {
    let (_, resolver) = seeded().await;
    let found = resolver.resolve_products("  ONION ").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].code, "PRODUCT_ONION");
}

#[tokio::test]
async fn misspelling_resolves_phonetically() {
    let (_, resolver) = seeded().await;
    let found = resolver.resolve_products("tamato").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].code, "PRODUCT_TOMATO");
}

#[tokio::test]
async fn empty_and_metacharacter_queries_match_nothing() {
    let (_, resolver) = seeded().await;
    assert!(resolver.resolve_products("").await.unwrap().is_empty());
    assert!(resolver.resolve_products("   ").await.unwrap().is_empty());
    assert!(resolver.resolve_products(".*").await.unwrap().is_empty());
    assert!(resolver.resolve_products("%").await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_product_is_empty_not_an_error() {
    let (_, resolver) = seeded().await;
    assert!(resolver.resolve_products("avocado").await.unwrap().is_empty());
}

#[tokio::test]
async fn results_are_capped() {
    let catalog = catalog().await;
    for i in 0..12 {
        catalog
            .upsert_product(&product(&format!("PRODUCT_TOMATO_{i}"), "Tomato", "Tomatoes"))
            .await
            .unwrap();
    }
    let resolver = EntityResolver::new(catalog, ResolverLimits::default());
    assert_eq!(resolver.resolve_products("tomato").await.unwrap().len(), 8);
}

#[tokio::test]
async fn reseeding_keeps_phonetic_codes() {
    let (catalog, resolver) = seeded().await;
    let before = resolver.product_by_code("PRODUCT_TOMATO").await.unwrap().unwrap();
    catalog
        .upsert_product(&product("PRODUCT_TOMATO", "Tomato", "Tomatoes"))
        .await
        .unwrap();
    let after = resolver.product_by_code("PRODUCT_TOMATO").await.unwrap().unwrap();
    assert_eq!(before.phonetic, after.phonetic);
    assert_eq!(after.phonetic, phonetic_codes("Tomato"));
}

#[tokio::test]
async fn measurements_follow_product_order() {
    let (catalog, resolver) = seeded().await;
    let mut ids = Vec::new();
    for (code, name) in [("MEASUREMENT_CRATE", "Crate"), ("MEASUREMENT_KILOGRAM", "Kilogram")] {
        let (m, _) = catalog
            .upsert_measurement(&NewMeasurement {
                code: code.into(),
                name: name.into(),
                symbol: None,
                singular: name.into(),
                plural: format!("{name}s"),
            })
            .await
            .unwrap();
        ids.push(m.id);
    }
    let tomato = resolver.product_by_code("PRODUCT_TOMATO").await.unwrap().unwrap();
    catalog.link_measurement(tomato.id, ids[1]).await.unwrap();
    catalog.link_measurement(tomato.id, ids[0]).await.unwrap();

    let tomato = resolver.product_by_code("PRODUCT_TOMATO").await.unwrap().unwrap();
    let names: Vec<_> = resolver
        .measurements_for(&tomato)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, ["Kilogram", "Crate"]);
}

#[tokio::test]
async fn nearby_locations_within_radius() {
    let catalog = catalog().await;
    for (code, name, lat, long) in [
        ("LOC_CBD", "Nairobi CBD", -1.2864, 36.8172),
        ("LOC_THIKA", "Thika", -1.0333, 37.0693),
    ] {
        catalog
            .upsert_location(&NewLocation {
                code: code.into(),
                name: name.into(),
                alternate_names: Vec::new(),
                city: None,
                region: None,
                country: Some("Kenya".into()),
                phonetic: phonetic_codes(name),
                point: GeoPoint::new(lat, long),
            })
            .await
            .unwrap();
    }
    let resolver = EntityResolver::new(catalog, ResolverLimits::default());

    let found = resolver
        .nearby_locations(GeoPoint::new(-1.2921, 36.8219))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].code, "LOC_CBD");
    assert!(resolver.location_by_code("LOC_THIKA").await.unwrap().is_some());

    let invalid = resolver
        .nearby_locations(GeoPoint::new(123.0, 36.8))
        .await
        .unwrap();
    assert!(invalid.is_empty());
}
