// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product search, lookups and seeding.

use agrobot_core::{AgrobotError, NameQuery, PhoneticCodes, Product, RecordId};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::NewProduct;
use crate::queries::{code_param, sql_limit};

const COLUMNS: &str = "id, code, name, category, singular, plural, soundex, metaphone";

/// Row without its measurement relation, filled in by [`attach_measurements`].
fn from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        singular: row.get(4)?,
        plural: row.get(5)?,
        phonetic: PhoneticCodes {
            soundex: row.get(6)?,
            metaphone: row.get(7)?,
        },
        measurement_ids: Vec::new(),
    })
}

fn attach_measurements(conn: &Connection, product: &mut Product) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        "SELECT measurement_id FROM product_measurements
         WHERE product_id = ?1 ORDER BY position, measurement_id",
    )?;
    product.measurement_ids = stmt
        .query_map(params![product.id], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(())
}

fn get_one(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> rusqlite::Result<Option<Product>> {
    let product = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM products WHERE {column} = ?1"),
            [value],
            from_row,
        )
        .optional()?;
    match product {
        Some(mut product) => {
            attach_measurements(conn, &mut product)?;
            Ok(Some(product))
        }
        None => Ok(None),
    }
}

/// Products whose name, singular or plural equals the query text ignoring
/// case, or whose Soundex or Metaphone code equals the query's.
pub async fn search_products(
    db: &Database,
    query: &NameQuery,
) -> Result<Vec<Product>, AgrobotError> {
    let text = query.text.to_lowercase();
    let soundex = code_param(&query.phonetic.soundex);
    let metaphone = code_param(&query.phonetic.metaphone);
    let limit = sql_limit(query.limit);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {COLUMNS} FROM products
                 WHERE lower(name) = ?1 OR lower(singular) = ?1 OR lower(plural) = ?1
                    OR soundex = ?2 OR metaphone = ?3
                 ORDER BY id LIMIT ?4"
            ))?;
            let mut products = stmt
                .query_map(params![text, soundex, metaphone, limit], from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for product in &mut products {
                attach_measurements(conn, product)?;
            }
            Ok(products)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_product(db: &Database, id: RecordId) -> Result<Option<Product>, AgrobotError> {
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> { get_one(conn, "id", &id) })
        .await
        .map_err(map_tr_err)
}

pub async fn get_product_by_code(
    db: &Database,
    code: &str,
) -> Result<Option<Product>, AgrobotError> {
    let code = code.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> { get_one(conn, "code", &code) })
        .await
        .map_err(map_tr_err)
}

/// Insert a product, or return the existing one with the same code.
///
/// Phonetic codes of an existing product are rewritten only when they
/// differ from the given ones.
pub async fn upsert_product(
    db: &Database,
    new: &NewProduct,
) -> Result<(Product, bool), AgrobotError> {
    let new = new.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            if let Some(mut product) = get_one(conn, "code", &new.code)? {
                if product.phonetic != new.phonetic {
                    conn.execute(
                        "UPDATE products SET soundex = ?1, metaphone = ?2 WHERE id = ?3",
                        params![new.phonetic.soundex, new.phonetic.metaphone, product.id],
                    )?;
                    product.phonetic = new.phonetic;
                }
                return Ok((product, false));
            }

            conn.execute(
                "INSERT INTO products (code, name, category, singular, plural, soundex, metaphone)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.code,
                    new.name,
                    new.category,
                    new.singular,
                    new.plural,
                    new.phonetic.soundex,
                    new.phonetic.metaphone,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let product = get_one(conn, "id", &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            Ok((product, true))
        })
        .await
        .map_err(map_tr_err)
}

/// Link a compatible measurement to a product. Existing links are kept.
pub async fn link_measurement(
    db: &Database,
    product_id: RecordId,
    measurement_id: RecordId,
) -> Result<bool, AgrobotError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let linked = conn.execute(
                "INSERT INTO product_measurements (product_id, measurement_id, position)
                 SELECT ?1, ?2, COALESCE(MAX(position) + 1, 0)
                 FROM product_measurements WHERE product_id = ?1
                 ON CONFLICT(product_id, measurement_id) DO NOTHING",
                params![product_id, measurement_id],
            )?;
            Ok(linked > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_products(db: &Database) -> Result<u64, AgrobotError> {
    db.connection()
        .call(|conn| -> Result<u64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM products", [], |row| {
                row.get::<_, i64>(0).map(|n| n.max(0) as u64)
            })
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMeasurement;
    use crate::queries::measurements::upsert_measurement;

    fn tomato() -> NewProduct {
        NewProduct {
            code: "PRODUCT_TOMATO".into(),
            name: "Tomato".into(),
            category: Some("Vegetable".into()),
            singular: "Tomato".into(),
            plural: "Tomatoes".into(),
            phonetic: PhoneticCodes {
                soundex: "T530".into(),
                metaphone: "TMT".into(),
            },
        }
    }

    fn query(text: &str, soundex: &str, metaphone: &str, limit: usize) -> NameQuery {
        NameQuery {
            text: text.into(),
            phonetic: PhoneticCodes {
                soundex: soundex.into(),
                metaphone: metaphone.into(),
            },
            limit,
        }
    }

    #[tokio::test]
    async fn search_matches_plural_ignoring_case() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_product(&db, &tomato()).await.unwrap();

        let found = search_products(&db, &query("TOMATOES", "T532", "TMTS", 8))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Tomato");
    }

    #[tokio::test]
    async fn search_matches_either_phonetic_code() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_product(&db, &tomato()).await.unwrap();

        let by_soundex = search_products(&db, &query("tamata", "T530", "TMT", 8))
            .await
            .unwrap();
        assert_eq!(by_soundex.len(), 1);

        let by_metaphone = search_products(&db, &query("tomatoe", "T530", "TMT", 8))
            .await
            .unwrap();
        assert_eq!(by_metaphone.len(), 1);

        let miss = search_products(&db, &query("onion", "O550", "ONN", 8))
            .await
            .unwrap();
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn empty_codes_never_match() {
        let db = Database::open_in_memory().await.unwrap();
        let mut blank = tomato();
        blank.code = "PRODUCT_BLANK".into();
        blank.name = "123".into();
        blank.singular = "123".into();
        blank.plural = "123s".into();
        blank.phonetic = PhoneticCodes::default();
        upsert_product(&db, &blank).await.unwrap();

        let found = search_products(&db, &query("456", "", "", 8)).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let db = Database::open_in_memory().await.unwrap();
        for i in 0..12 {
            let mut p = tomato();
            p.code = format!("PRODUCT_TOMATO_{i}");
            upsert_product(&db, &p).await.unwrap();
        }
        let found = search_products(&db, &query("tomato", "T530", "TMT", 8))
            .await
            .unwrap();
        assert_eq!(found.len(), 8);
        assert_eq!(count_products(&db).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn upsert_and_links_are_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let (product, inserted) = upsert_product(&db, &tomato()).await.unwrap();
        assert!(inserted);
        let (again, inserted) = upsert_product(&db, &tomato()).await.unwrap();
        assert!(!inserted);
        assert_eq!(product.id, again.id);

        let mut measurement_ids = Vec::new();
        for (code, name) in [("MEASUREMENT_CRATE", "Crate"), ("MEASUREMENT_KILOGRAM", "Kilogram")] {
            let (m, _) = upsert_measurement(
                &db,
                &NewMeasurement {
                    code: code.into(),
                    name: name.into(),
                    symbol: None,
                    singular: name.into(),
                    plural: format!("{name}s"),
                },
            )
            .await
            .unwrap();
            assert!(link_measurement(&db, product.id, m.id).await.unwrap());
            measurement_ids.push(m.id);
        }
        assert!(!link_measurement(&db, product.id, measurement_ids[0]).await.unwrap());

        let reloaded = get_product_by_code(&db, "PRODUCT_TOMATO")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.measurement_ids, measurement_ids);
        assert_eq!(
            get_product(&db, product.id).await.unwrap().map(|p| p.code),
            Some("PRODUCT_TOMATO".to_string())
        );
    }
}
