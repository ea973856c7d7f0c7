// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the CatalogStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use agrobot_config::model::StorageConfig;
use agrobot_core::{
    AdapterType, AgrobotError, CatalogStore, GeoPoint, HealthStatus, Location, Measurement,
    NameQuery, NewOffer, NewUser, Offer, OfferQuery, PluginAdapter, Product, RecordId, User,
};

use crate::database::{Database, map_tr_err};
use crate::models::{NewLocation, NewMeasurement, NewProduct};
use crate::queries;

/// SQLite-backed catalog store.
///
/// The database is opened lazily by [`CatalogStore::initialize`].
pub struct SqliteCatalog {
    config: StorageConfig,
    db: OnceCell<Database>,
}

/// Row counts reported by [`SqliteCatalog::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub products: u64,
    pub measurements: u64,
    pub locations: u64,
    pub offers: u64,
}

impl SqliteCatalog {
    /// Create a catalog for the configured database file. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database.
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::from(db),
        }
    }

    fn db(&self) -> Result<&Database, AgrobotError> {
        self.db.get().ok_or_else(|| AgrobotError::Storage {
            source: "catalog not initialized -- call initialize() first".into(),
        })
    }

    // --- Seeding ---

    pub async fn upsert_measurement(
        &self,
        new: &NewMeasurement,
    ) -> Result<(Measurement, bool), AgrobotError> {
        queries::measurements::upsert_measurement(self.db()?, new).await
    }

    pub async fn upsert_product(&self, new: &NewProduct) -> Result<(Product, bool), AgrobotError> {
        queries::products::upsert_product(self.db()?, new).await
    }

    pub async fn upsert_location(
        &self,
        new: &NewLocation,
    ) -> Result<(Location, bool), AgrobotError> {
        queries::locations::upsert_location(self.db()?, new).await
    }

    pub async fn link_measurement(
        &self,
        product_id: RecordId,
        measurement_id: RecordId,
    ) -> Result<bool, AgrobotError> {
        queries::products::link_measurement(self.db()?, product_id, measurement_id).await
    }

    pub async fn stats(&self) -> Result<CatalogStats, AgrobotError> {
        let db = self.db()?;
        Ok(CatalogStats {
            products: queries::products::count_products(db).await?,
            measurements: queries::measurements::count_measurements(db).await?,
            locations: queries::locations::count_locations(db).await?,
            offers: queries::offers::count_offers(db).await?,
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteCatalog {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Catalog
    }

    async fn health_check(&self) -> Result<HealthStatus, AgrobotError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        if queries::products::count_products(db).await? == 0 {
            return Ok(HealthStatus::Degraded("catalog has no products".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AgrobotError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn initialize(&self) -> Result<(), AgrobotError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| AgrobotError::Storage {
            source: "catalog already initialized".into(),
        })?;
        info!(path = %self.config.database_path, "SQLite catalog initialized");
        Ok(())
    }

    async fn find_products(&self, query: &NameQuery) -> Result<Vec<Product>, AgrobotError> {
        queries::products::search_products(self.db()?, query).await
    }

    async fn find_product(&self, id: RecordId) -> Result<Option<Product>, AgrobotError> {
        queries::products::get_product(self.db()?, id).await
    }

    async fn find_product_by_code(&self, code: &str) -> Result<Option<Product>, AgrobotError> {
        queries::products::get_product_by_code(self.db()?, code).await
    }

    async fn find_measurements(&self, ids: &[RecordId]) -> Result<Vec<Measurement>, AgrobotError> {
        queries::measurements::list_measurements(self.db()?, ids).await
    }

    async fn find_measurement(&self, id: RecordId) -> Result<Option<Measurement>, AgrobotError> {
        queries::measurements::get_measurement(self.db()?, id).await
    }

    async fn find_measurement_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Measurement>, AgrobotError> {
        queries::measurements::get_measurement_by_code(self.db()?, code).await
    }

    async fn find_locations_near(
        &self,
        point: GeoPoint,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<Location>, AgrobotError> {
        queries::locations::nearby_locations(self.db()?, point, radius_m, limit).await
    }

    async fn find_location(&self, id: RecordId) -> Result<Option<Location>, AgrobotError> {
        queries::locations::get_location(self.db()?, id).await
    }

    async fn find_location_by_code(&self, code: &str) -> Result<Option<Location>, AgrobotError> {
        queries::locations::get_location_by_code(self.db()?, code).await
    }

    async fn find_user(&self, id: RecordId) -> Result<Option<User>, AgrobotError> {
        queries::users::get_user(self.db()?, id).await
    }

    async fn find_user_by_subject(&self, subject_id: &str) -> Result<Option<User>, AgrobotError> {
        queries::users::get_user_by_subject(self.db()?, subject_id).await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, AgrobotError> {
        let user = queries::users::create_user(self.db()?, user).await?;
        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    async fn insert_offer(&self, offer: &NewOffer) -> Result<Offer, AgrobotError> {
        let offer = queries::offers::create_offer(self.db()?, offer).await?;
        info!(
            offer_id = offer.id,
            direction = %offer.direction,
            product_id = offer.product_id,
            "offer stored"
        );
        Ok(offer)
    }

    async fn find_offer(&self, id: RecordId) -> Result<Option<Offer>, AgrobotError> {
        queries::offers::get_offer(self.db()?, id).await
    }

    async fn find_offers(&self, query: &OfferQuery) -> Result<Vec<Offer>, AgrobotError> {
        queries::offers::search_offers(self.db()?, query).await
    }
}

#[cfg(test)]
mod tests {
    use agrobot_core::{Direction, OfferFilter, PhoneticCodes};

    use super::*;

    struct Fixture {
        catalog: SqliteCatalog,
        product: Product,
        other_product: Product,
        kilogram: Measurement,
        crate_: Measurement,
        market: Location,
        user_a: User,
        user_b: User,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("catalog.db").display().to_string(),
            wal_mode: true,
        };
        let catalog = SqliteCatalog::new(config);
        catalog.initialize().await.unwrap();

        let measurement = |code: &str, name: &str| NewMeasurement {
            code: code.into(),
            name: name.into(),
            symbol: None,
            singular: name.into(),
            plural: format!("{name}s"),
        };
        let (kilogram, _) = catalog
            .upsert_measurement(&measurement("MEASUREMENT_KILOGRAM", "Kilogram"))
            .await
            .unwrap();
        let (crate_, _) = catalog
            .upsert_measurement(&measurement("MEASUREMENT_CRATE", "Crate"))
            .await
            .unwrap();

        let product = |code: &str, name: &str| NewProduct {
            code: code.into(),
            name: name.into(),
            category: None,
            singular: name.into(),
            plural: format!("{name}s"),
            phonetic: PhoneticCodes::default(),
        };
        let (tomato, _) = catalog
            .upsert_product(&product("PRODUCT_TOMATO", "Tomato"))
            .await
            .unwrap();
        let (onion, _) = catalog
            .upsert_product(&product("PRODUCT_ONION", "Onion"))
            .await
            .unwrap();

        let (market, _) = catalog
            .upsert_location(&NewLocation {
                code: "LOC_WAKULIMA".into(),
                name: "Wakulima Market".into(),
                alternate_names: vec!["Marikiti".into()],
                city: Some("Nairobi".into()),
                region: None,
                country: Some("Kenya".into()),
                phonetic: PhoneticCodes::default(),
                point: GeoPoint::new(-1.2864, 36.8294),
            })
            .await
            .unwrap();

        let user = |subject: &str, phone: &str| NewUser {
            first_name: "Test".into(),
            last_name: subject.into(),
            phone: phone.into(),
            email: format!("{subject}@example.com"),
            subject_id: subject.into(),
            app_subject_id: None,
            picture_url: None,
            gender: None,
        };
        let user_a = catalog.insert_user(&user("a", "0711")).await.unwrap();
        let user_b = catalog.insert_user(&user("b", "0722")).await.unwrap();

        Fixture {
            catalog,
            product: tomato,
            other_product: onion,
            kilogram,
            crate_,
            market,
            user_a,
            user_b,
            _dir: dir,
        }
    }

    fn offer(f: &Fixture, direction: Direction, user: &User, price: f64, quantity: u32) -> NewOffer {
        NewOffer {
            direction,
            product_id: f.product.id,
            measurement_id: f.kilogram.id,
            quantity,
            price,
            origin_location_id: f.market.id,
            origin_point: f.market.point,
            destination_location_id: f.market.id,
            destination_point: f.market.point,
            user_id: user.id,
            options: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn uninitialized_catalog_reports_errors() {
        let catalog = SqliteCatalog::new(StorageConfig::default());
        assert!(matches!(
            catalog.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
        assert!(catalog.find_product(1).await.is_err());
    }

    #[tokio::test]
    async fn health_and_stats() {
        let f = fixture().await;
        assert_eq!(f.catalog.health_check().await.unwrap(), HealthStatus::Healthy);
        let stats = f.catalog.stats().await.unwrap();
        assert_eq!(
            stats,
            CatalogStats {
                products: 2,
                measurements: 2,
                locations: 1,
                offers: 0,
            }
        );
        f.catalog.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn offer_round_trip() {
        let f = fixture().await;
        let stored = f
            .catalog
            .insert_offer(&offer(&f, Direction::Buy, &f.user_a, 25.0, 50))
            .await
            .unwrap();
        assert_eq!(stored.direction, Direction::Buy);
        assert!(!stored.matched);
        assert_eq!(stored.options, serde_json::json!({}));
        assert_eq!(f.catalog.find_offer(stored.id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn invalid_offer_is_rejected_before_storage() {
        let f = fixture().await;
        let mut bad = offer(&f, Direction::Buy, &f.user_a, 25.0, 50);
        bad.quantity = 0;
        assert!(f.catalog.insert_offer(&bad).await.is_err());
        assert_eq!(f.catalog.stats().await.unwrap().offers, 0);
    }

    #[tokio::test]
    async fn search_filters_direction_and_product() {
        let f = fixture().await;
        let sell = f
            .catalog
            .insert_offer(&offer(&f, Direction::Sell, &f.user_b, 20.0, 40))
            .await
            .unwrap();
        f.catalog
            .insert_offer(&offer(&f, Direction::Buy, &f.user_b, 20.0, 40))
            .await
            .unwrap();
        let mut onion = offer(&f, Direction::Sell, &f.user_b, 20.0, 40);
        onion.product_id = f.other_product.id;
        f.catalog.insert_offer(&onion).await.unwrap();

        let found = f
            .catalog
            .find_offers(&OfferQuery::new(Direction::Sell, f.product.id, 8))
            .await
            .unwrap();
        assert_eq!(found, vec![sell]);
    }

    #[tokio::test]
    async fn search_applies_optional_filters() {
        let f = fixture().await;
        let cheap = f
            .catalog
            .insert_offer(&offer(&f, Direction::Sell, &f.user_b, 20.0, 50))
            .await
            .unwrap();
        f.catalog
            .insert_offer(&offer(&f, Direction::Sell, &f.user_b, 40.0, 50))
            .await
            .unwrap();
        let mut crated = offer(&f, Direction::Sell, &f.user_b, 20.0, 50);
        crated.measurement_id = f.crate_.id;
        f.catalog.insert_offer(&crated).await.unwrap();
        let own = f
            .catalog
            .insert_offer(&offer(&f, Direction::Sell, &f.user_a, 20.0, 50))
            .await
            .unwrap();

        let query = OfferQuery::new(Direction::Sell, f.product.id, 8)
            .with_filter(OfferFilter::PriceBand {
                min: None,
                max: Some(31.25),
            })
            .with_filter(OfferFilter::QuantityBand {
                min: 37.5,
                max: 62.5,
            })
            .with_filter(OfferFilter::SameMeasurement(f.kilogram.id));
        let found = f.catalog.find_offers(&query).await.unwrap();
        assert_eq!(found, vec![cheap.clone(), own]);

        let found = f
            .catalog
            .find_offers(&query.clone().with_filter(OfferFilter::ExcludeUser(f.user_a.id)))
            .await
            .unwrap();
        assert_eq!(found, vec![cheap.clone()]);

        let near = query.clone().with_filter(OfferFilter::OriginNear {
            point: GeoPoint::new(-1.2921, 36.8219),
            radius_m: 5_000.0,
        });
        assert_eq!(f.catalog.find_offers(&near).await.unwrap().len(), 2);

        let far = query.with_filter(OfferFilter::DestinationNear {
            point: GeoPoint::new(-0.0917, 34.7680),
            radius_m: 5_000.0,
        });
        assert!(f.catalog.find_offers(&far).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_respects_limit_with_geo_filters() {
        let f = fixture().await;
        for _ in 0..10 {
            f.catalog
                .insert_offer(&offer(&f, Direction::Sell, &f.user_b, 20.0, 50))
                .await
                .unwrap();
        }
        let query = OfferQuery::new(Direction::Sell, f.product.id, 8).with_filter(
            OfferFilter::OriginNear {
                point: f.market.point,
                radius_m: 100.0,
            },
        );
        assert_eq!(f.catalog.find_offers(&query).await.unwrap().len(), 8);
        let plain = OfferQuery::new(Direction::Sell, f.product.id, 8);
        assert_eq!(f.catalog.find_offers(&plain).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn empty_search_is_not_an_error() {
        let f = fixture().await;
        let found = f
            .catalog
            .find_offers(&OfferQuery::new(Direction::Buy, f.product.id, 8))
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
