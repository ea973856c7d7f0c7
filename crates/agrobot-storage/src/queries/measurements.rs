// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Measurement lookups and seeding.

use agrobot_core::{AgrobotError, Measurement, RecordId};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::NewMeasurement;

const COLUMNS: &str = "id, code, name, symbol, singular, plural";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Measurement> {
    Ok(Measurement {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        symbol: row.get(3)?,
        singular: row.get(4)?,
        plural: row.get(5)?,
    })
}

pub async fn get_measurement(
    db: &Database,
    id: RecordId,
) -> Result<Option<Measurement>, AgrobotError> {
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM measurements WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_measurement_by_code(
    db: &Database,
    code: &str,
) -> Result<Option<Measurement>, AgrobotError> {
    let code = code.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM measurements WHERE code = ?1"),
                params![code],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch measurements in the order of `ids`, skipping unknown ids.
pub async fn list_measurements(
    db: &Database,
    ids: &[RecordId],
) -> Result<Vec<Measurement>, AgrobotError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt =
                conn.prepare_cached(&format!("SELECT {COLUMNS} FROM measurements WHERE id = ?1"))?;
            let mut found = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(m) = stmt.query_row(params![id], from_row).optional()? {
                    found.push(m);
                }
            }
            Ok(found)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a measurement, or return the existing one with the same code.
pub async fn upsert_measurement(
    db: &Database,
    new: &NewMeasurement,
) -> Result<(Measurement, bool), AgrobotError> {
    let new = new.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let inserted = conn.execute(
                "INSERT INTO measurements (code, name, symbol, singular, plural)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(code) DO NOTHING",
                params![new.code, new.name, new.symbol, new.singular, new.plural],
            )? > 0;
            let measurement = conn.query_row(
                &format!("SELECT {COLUMNS} FROM measurements WHERE code = ?1"),
                params![new.code],
                from_row,
            )?;
            Ok((measurement, inserted))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_measurements(db: &Database) -> Result<u64, AgrobotError> {
    db.connection()
        .call(|conn| -> Result<u64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM measurements", [], |row| {
                row.get::<_, i64>(0).map(|n| n.max(0) as u64)
            })
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kilogram() -> NewMeasurement {
        NewMeasurement {
            code: "MEASUREMENT_KILOGRAM".into(),
            name: "Kilogram".into(),
            symbol: Some("kg".into()),
            singular: "Kilogram".into(),
            plural: "Kilograms".into(),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_by_code() {
        let db = Database::open_in_memory().await.unwrap();
        let (first, inserted) = upsert_measurement(&db, &kilogram()).await.unwrap();
        assert!(inserted);
        let (second, inserted) = upsert_measurement(&db, &kilogram()).await.unwrap();
        assert!(!inserted);
        assert_eq!(first.id, second.id);
        assert_eq!(count_measurements(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_preserves_requested_order_and_skips_unknown() {
        let db = Database::open_in_memory().await.unwrap();
        let (kg, _) = upsert_measurement(&db, &kilogram()).await.unwrap();
        let (crate_, _) = upsert_measurement(
            &db,
            &NewMeasurement {
                code: "MEASUREMENT_CRATE".into(),
                name: "Crate".into(),
                symbol: None,
                singular: "Crate".into(),
                plural: "Crates".into(),
            },
        )
        .await
        .unwrap();

        let listed = list_measurements(&db, &[crate_.id, 999, kg.id]).await.unwrap();
        let codes: Vec<_> = listed.iter().map(|m| m.code.as_str()).collect();
        assert_eq!(codes, ["MEASUREMENT_CRATE", "MEASUREMENT_KILOGRAM"]);

        assert_eq!(
            get_measurement_by_code(&db, "MEASUREMENT_CRATE")
                .await
                .unwrap()
                .map(|m| m.id),
            Some(crate_.id)
        );
        assert!(get_measurement(&db, 999).await.unwrap().is_none());
    }
}
