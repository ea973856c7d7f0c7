// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `agrobot seed` command implementation.
//!
//! Loads the static catalog from a data directory holding
//! `measurements.json`, `products.json`, `locations.json` and
//! `product_measurements.json`, computes phonetic codes for every product
//! and location name, and links each product to its listed measurements
//! plus the configured default measurement.
//!
//! Re-running against the same data changes nothing: records are keyed on
//! their code and phonetic codes come out identical.

use std::collections::HashMap;
use std::path::Path;

use agrobot_config::model::AgrobotConfig;
use agrobot_core::{AgrobotError, CatalogStore, GeoPoint, PluginAdapter, RecordId};
use agrobot_resolver::phonetic_codes;
use agrobot_storage::{NewLocation, NewMeasurement, NewProduct, SqliteCatalog};
use colored::Colorize;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementRecord {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub singular: Option<String>,
    #[serde(default)]
    pub plural: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub code: String,
    pub name: String,
    /// Category tag such as "Vegetables".
    #[serde(rename = "type", default)]
    pub category: Option<String>,
    #[serde(default)]
    pub singular: Option<String>,
    #[serde(default)]
    pub plural: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationRecord {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub other_names: Vec<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductMeasurementRecord {
    pub product_code: String,
    pub measurement_code: String,
}

/// Everything in one data directory.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub measurements: Vec<MeasurementRecord>,
    pub products: Vec<ProductRecord>,
    pub locations: Vec<LocationRecord>,
    pub product_measurements: Vec<ProductMeasurementRecord>,
}

impl SeedData {
    /// Read all four files from `dir`. A missing `product_measurements.json`
    /// is treated as empty.
    pub fn load(dir: &Path) -> Result<Self, AgrobotError> {
        let links = dir.join("product_measurements.json");
        Ok(Self {
            measurements: read_json(&dir.join("measurements.json"))?,
            products: read_json(&dir.join("products.json"))?,
            locations: read_json(&dir.join("locations.json"))?,
            product_measurements: if links.exists() {
                read_json(&links)?
            } else {
                Vec::new()
            },
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AgrobotError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AgrobotError::Internal(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| AgrobotError::Internal(format!("invalid data in {}: {e}", path.display())))
}

/// Created versus already-present counts per record kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub measurements: (usize, usize),
    pub products: (usize, usize),
    pub locations: (usize, usize),
    pub links: (usize, usize),
}

/// Run the `agrobot seed` command.
pub async fn run_seed(config: &AgrobotConfig, data_dir: &Path) -> Result<(), AgrobotError> {
    let data = SeedData::load(data_dir)?;
    info!(
        dir = %data_dir.display(),
        measurements = data.measurements.len(),
        products = data.products.len(),
        locations = data.locations.len(),
        "seed data loaded"
    );

    let catalog = SqliteCatalog::new(config.storage.clone());
    catalog.initialize().await?;
    let report = seed(&catalog, &data, config.seed.default_measurement.as_deref()).await?;
    catalog.shutdown().await?;

    println!();
    println!("  {}", "agrobot seed".bold());
    println!("  {}", "-".repeat(40));
    for (name, (created, existing)) in [
        ("measurements", report.measurements),
        ("products", report.products),
        ("locations", report.locations),
        ("product links", report.links),
    ] {
        println!(
            "    {:<16} {} new, {} already present",
            name,
            created.to_string().green(),
            existing
        );
    }
    println!();
    Ok(())
}

/// Write `data` into `catalog`.
pub async fn seed(
    catalog: &SqliteCatalog,
    data: &SeedData,
    default_measurement: Option<&str>,
) -> Result<SeedReport, AgrobotError> {
    let mut report = SeedReport::default();

    let mut measurement_ids: HashMap<String, RecordId> = HashMap::new();
    for record in &data.measurements {
        let (measurement, created) = catalog
            .upsert_measurement(&NewMeasurement {
                code: record.code.clone(),
                name: record.name.clone(),
                symbol: record.symbol.clone(),
                singular: record.singular.clone().unwrap_or_else(|| record.name.clone()),
                plural: record
                    .plural
                    .clone()
                    .unwrap_or_else(|| format!("{}s", record.name)),
            })
            .await?;
        tally(&mut report.measurements, created);
        measurement_ids.insert(measurement.code, measurement.id);
    }

    let mut product_ids: HashMap<String, RecordId> = HashMap::new();
    for record in &data.products {
        let (product, created) = catalog
            .upsert_product(&NewProduct {
                code: record.code.clone(),
                name: record.name.clone(),
                category: record.category.clone(),
                singular: record.singular.clone().unwrap_or_else(|| record.name.clone()),
                plural: record
                    .plural
                    .clone()
                    .unwrap_or_else(|| format!("{}s", record.name)),
                phonetic: phonetic_codes(&record.name),
            })
            .await?;
        tally(&mut report.products, created);
        product_ids.insert(product.code, product.id);
    }

    for record in &data.locations {
        let point = GeoPoint::new(record.latitude, record.longitude);
        if !point.is_valid() {
            warn!(code = record.code.as_str(), "skipping location with invalid coordinates");
            continue;
        }
        let (_, created) = catalog
            .upsert_location(&NewLocation {
                code: record.code.clone(),
                name: record.name.clone(),
                alternate_names: record.other_names.clone(),
                city: record.city.clone(),
                region: record.region.clone(),
                country: record.country.clone(),
                phonetic: phonetic_codes(&record.name),
                point,
            })
            .await?;
        tally(&mut report.locations, created);
    }

    let default_id = match default_measurement {
        Some(code) => match measurement_ids.get(code).copied() {
            Some(id) => Some(id),
            None => catalog.find_measurement_by_code(code).await?.map(|m| m.id),
        },
        None => None,
    };
    if default_measurement.is_some() && default_id.is_none() {
        warn!(code = default_measurement, "default measurement not found, not linking it");
    }

    for link in &data.product_measurements {
        let (Some(&product_id), Some(&measurement_id)) = (
            product_ids.get(&link.product_code),
            measurement_ids.get(&link.measurement_code),
        ) else {
            warn!(
                product = link.product_code.as_str(),
                measurement = link.measurement_code.as_str(),
                "skipping link to unknown code"
            );
            continue;
        };
        let created = catalog.link_measurement(product_id, measurement_id).await?;
        tally(&mut report.links, created);
    }

    if let Some(default_id) = default_id {
        for &product_id in product_ids.values() {
            let created = catalog.link_measurement(product_id, default_id).await?;
            tally(&mut report.links, created);
        }
    }

    debug!(?report, "seeding complete");
    Ok(report)
}

fn tally(counts: &mut (usize, usize), created: bool) {
    if created {
        counts.0 += 1;
    } else {
        counts.1 += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use agrobot_config::model::StorageConfig;
    use agrobot_core::NameQuery;
    use agrobot_storage::Database;

    use super::*;

    fn data_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
    }

    async fn catalog() -> SqliteCatalog {
        let db = Database::open_in_memory().await.unwrap();
        SqliteCatalog::from_database(StorageConfig::default(), db)
    }

    #[test]
    fn bundled_data_parses() {
        let data = SeedData::load(&data_dir()).unwrap();
        assert!(!data.measurements.is_empty());
        assert!(!data.products.is_empty());
        assert!(!data.locations.is_empty());
        assert!(!data.product_measurements.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = SeedData::load(Path::new("/nonexistent/agrobot-data")).unwrap_err();
        assert!(err.to_string().contains("measurements.json"));
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let data = SeedData::load(&data_dir()).unwrap();
        let catalog = catalog().await;

        let first = seed(&catalog, &data, Some("MEASUREMENT_KILOGRAM")).await.unwrap();
        assert_eq!(first.products.0, data.products.len());
        assert_eq!(first.products.1, 0);

        let before = catalog.find_product_by_code("PRODUCT_TOMATO").await.unwrap().unwrap();
        let second = seed(&catalog, &data, Some("MEASUREMENT_KILOGRAM")).await.unwrap();
        assert_eq!(second.products, (0, data.products.len()));
        assert_eq!(second.measurements, (0, data.measurements.len()));
        assert_eq!(second.links.0, 0);

        let after = catalog.find_product_by_code("PRODUCT_TOMATO").await.unwrap().unwrap();
        assert_eq!(before, after);
        assert_eq!(after.phonetic, phonetic_codes("Tomato"));
    }

    #[tokio::test]
    async fn default_measurement_is_linked_to_every_product() {
        let data = SeedData::load(&data_dir()).unwrap();
        let catalog = catalog().await;
        seed(&catalog, &data, Some("MEASUREMENT_KILOGRAM")).await.unwrap();

        let kilogram = catalog
            .find_measurement_by_code("MEASUREMENT_KILOGRAM")
            .await
            .unwrap()
            .unwrap();
        for record in &data.products {
            let product = catalog.find_product_by_code(&record.code).await.unwrap().unwrap();
            assert!(
                product.measurement_ids.contains(&kilogram.id),
                "{} is missing the default measurement",
                record.code
            );
        }
    }

    #[tokio::test]
    async fn seeded_products_are_searchable() {
        let data = SeedData::load(&data_dir()).unwrap();
        let catalog = catalog().await;
        seed(&catalog, &data, None).await.unwrap();

        let found = catalog
            .find_products(&NameQuery {
                text: "tomatoes".into(),
                phonetic: phonetic_codes("tomatoes"),
                limit: 8,
            })
            .await
            .unwrap();
        assert_eq!(found[0].code, "PRODUCT_TOMATO");
    }

    #[tokio::test]
    async fn unknown_link_codes_are_skipped() {
        let catalog = catalog().await;
        let data = SeedData {
            measurements: vec![MeasurementRecord {
                code: "MEASUREMENT_CRATE".into(),
                name: "Crate".into(),
                symbol: None,
                singular: None,
                plural: None,
            }],
            products: vec![ProductRecord {
                code: "PRODUCT_KALE".into(),
                name: "Kale".into(),
                category: Some("Vegetables".into()),
                singular: None,
                plural: Some("Kale".into()),
            }],
            locations: Vec::new(),
            product_measurements: vec![
                ProductMeasurementRecord {
                    product_code: "PRODUCT_KALE".into(),
                    measurement_code: "MEASUREMENT_SACK".into(),
                },
                ProductMeasurementRecord {
                    product_code: "PRODUCT_KALE".into(),
                    measurement_code: "MEASUREMENT_CRATE".into(),
                },
            ],
        };
        let report = seed(&catalog, &data, Some("MEASUREMENT_KILOGRAM")).await.unwrap();
        assert_eq!(report.links, (1, 0));

        let kale = catalog.find_product_by_code("PRODUCT_KALE").await.unwrap().unwrap();
        assert_eq!(kale.plural, "Kale");
        assert_eq!(kale.measurement_ids.len(), 1);
    }
}
