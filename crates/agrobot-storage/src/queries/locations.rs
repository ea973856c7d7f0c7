// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Location lookups by proximity, id and code.
//!
//! Proximity uses a bounding-box prefilter in SQL, then exact haversine
//! distances in Rust.

use agrobot_core::{AgrobotError, GeoPoint, Location, PhoneticCodes, RecordId};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::NewLocation;
use crate::queries::parse_json;

const COLUMNS: &str =
    "id, code, name, alternate_names, city, region, country, soundex, metaphone, latitude, longitude";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    let alternate_names: String = row.get(3)?;
    Ok(Location {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        alternate_names: parse_json(3, &alternate_names)?,
        city: row.get(4)?,
        region: row.get(5)?,
        country: row.get(6)?,
        phonetic: PhoneticCodes {
            soundex: row.get(7)?,
            metaphone: row.get(8)?,
        },
        point: GeoPoint::new(row.get(9)?, row.get(10)?),
    })
}

/// Locations within `radius_m` meters of `point`, nearest first.
pub async fn nearby_locations(
    db: &Database,
    point: GeoPoint,
    radius_m: f64,
    limit: usize,
) -> Result<Vec<Location>, AgrobotError> {
    let bbox = point.bounding_box(radius_m);
    let [(lon_min_a, lon_max_a), (lon_min_b, lon_max_b)] = bbox.longitude_ranges();
    let candidates = db
        .connection()
        .call(move |conn| -> Result<Vec<Location>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {COLUMNS} FROM locations
                 WHERE latitude BETWEEN ?1 AND ?2
                   AND (longitude BETWEEN ?3 AND ?4 OR longitude BETWEEN ?5 AND ?6)"
            ))?;
            stmt.query_map(
                params![
                    bbox.min_latitude,
                    bbox.max_latitude,
                    lon_min_a,
                    lon_max_a,
                    lon_min_b,
                    lon_max_b
                ],
                from_row,
            )?
            .collect()
        })
        .await
        .map_err(map_tr_err)?;

    let mut within: Vec<(f64, Location)> = candidates
        .into_iter()
        .map(|loc| (point.distance_m(&loc.point), loc))
        .filter(|(dist, _)| *dist <= radius_m)
        .collect();
    within.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
    Ok(within.into_iter().take(limit).map(|(_, loc)| loc).collect())
}

pub async fn get_location(db: &Database, id: RecordId) -> Result<Option<Location>, AgrobotError> {
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM locations WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_location_by_code(
    db: &Database,
    code: &str,
) -> Result<Option<Location>, AgrobotError> {
    let code = code.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM locations WHERE code = ?1"),
                params![code],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a location, or return the existing one with the same code.
pub async fn upsert_location(
    db: &Database,
    new: &NewLocation,
) -> Result<(Location, bool), AgrobotError> {
    let new = new.clone();
    let alternate_names = serde_json::to_string(&new.alternate_names).map_err(|e| {
        AgrobotError::Storage {
            source: Box::new(e),
        }
    })?;
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let select = format!("SELECT {COLUMNS} FROM locations WHERE code = ?1");
            if let Some(mut location) = conn
                .query_row(&select, params![new.code], from_row)
                .optional()?
            {
                if location.phonetic != new.phonetic {
                    conn.execute(
                        "UPDATE locations SET soundex = ?1, metaphone = ?2 WHERE id = ?3",
                        params![new.phonetic.soundex, new.phonetic.metaphone, location.id],
                    )?;
                    location.phonetic = new.phonetic;
                }
                return Ok((location, false));
            }

            conn.execute(
                "INSERT INTO locations
                    (code, name, alternate_names, city, region, country,
                     soundex, metaphone, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    new.code,
                    new.name,
                    alternate_names,
                    new.city,
                    new.region,
                    new.country,
                    new.phonetic.soundex,
                    new.phonetic.metaphone,
                    new.point.latitude,
                    new.point.longitude,
                ],
            )?;
            let location = conn.query_row(&select, params![new.code], from_row)?;
            Ok((location, true))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_locations(db: &Database) -> Result<u64, AgrobotError> {
    db.connection()
        .call(|conn| -> Result<u64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM locations", [], |row| {
                row.get::<_, i64>(0).map(|n| n.max(0) as u64)
            })
        })
        .await
        .map_err(map_tr_err)
}
