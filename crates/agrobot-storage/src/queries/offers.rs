// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offer persistence and counter-offer search.
//!
//! Scalar filters are pushed into SQL. Distance filters are evaluated in
//! Rust, in which case the SQL query runs without a limit.

use std::str::FromStr;

use agrobot_core::{
    AgrobotError, Direction, GeoPoint, NewOffer, Offer, OfferFilter, OfferQuery, RecordId,
};
use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use crate::database::{Database, map_tr_err};
use crate::queries::{parse_json, parse_timestamp, sql_limit};

const COLUMNS: &str = "id, direction, product_id, measurement_id, quantity, price, \
                       origin_location_id, origin_latitude, origin_longitude, \
                       destination_location_id, destination_latitude, destination_longitude, \
                       user_id, matched, options, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Offer> {
    let direction: String = row.get(1)?;
    let options: String = row.get(14)?;
    let created_at: String = row.get(15)?;
    Ok(Offer {
        id: row.get(0)?,
        direction: Direction::from_str(&direction)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?,
        product_id: row.get(2)?,
        measurement_id: row.get(3)?,
        quantity: row.get(4)?,
        price: row.get(5)?,
        origin_location_id: row.get(6)?,
        origin_point: GeoPoint::new(row.get(7)?, row.get(8)?),
        destination_location_id: row.get(9)?,
        destination_point: GeoPoint::new(row.get(10)?, row.get(11)?),
        user_id: row.get(12)?,
        matched: row.get(13)?,
        options: parse_json(14, &options)?,
        created_at: parse_timestamp(15, &created_at)?,
    })
}

/// Persist an offer after checking its invariants.
pub async fn create_offer(db: &Database, offer: &NewOffer) -> Result<Offer, AgrobotError> {
    offer.validate().map_err(AgrobotError::Internal)?;
    let offer = offer.clone();
    let options = serde_json::to_string(&offer.options).map_err(|e| AgrobotError::Storage {
        source: Box::new(e),
    })?;
    db.connection()
        .call(move |conn| -> Result<Offer, rusqlite::Error> {
            conn.execute(
                "INSERT INTO offers (direction, product_id, measurement_id, quantity, price,
                                     origin_location_id, origin_latitude, origin_longitude,
                                     destination_location_id, destination_latitude,
                                     destination_longitude, user_id, options, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    offer.direction.to_string(),
                    offer.product_id,
                    offer.measurement_id,
                    offer.quantity,
                    offer.price,
                    offer.origin_location_id,
                    offer.origin_point.latitude,
                    offer.origin_point.longitude,
                    offer.destination_location_id,
                    offer.destination_point.latitude,
                    offer.destination_point.longitude,
                    offer.user_id,
                    options,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM offers WHERE id = ?1"),
                params![id],
                from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_offer(db: &Database, id: RecordId) -> Result<Option<Offer>, AgrobotError> {
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM offers WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Build the SQL and bind values for the scalar part of `query`.
fn build_search(query: &OfferQuery) -> (String, Vec<Value>) {
    let mut sql = format!("SELECT {COLUMNS} FROM offers WHERE direction = ? AND product_id = ?");
    let mut values = vec![
        Value::Text(query.direction.to_string()),
        Value::Integer(query.product_id),
    ];

    for filter in &query.filters {
        match filter {
            OfferFilter::PriceBand { min, max } => {
                if let Some(min) = min {
                    sql.push_str(" AND price >= ?");
                    values.push(Value::Real(*min));
                }
                if let Some(max) = max {
                    sql.push_str(" AND price <= ?");
                    values.push(Value::Real(*max));
                }
            }
            OfferFilter::QuantityBand { min, max } => {
                sql.push_str(" AND quantity BETWEEN ? AND ?");
                values.push(Value::Real(*min));
                values.push(Value::Real(*max));
            }
            OfferFilter::SameMeasurement(id) => {
                sql.push_str(" AND measurement_id = ?");
                values.push(Value::Integer(*id));
            }
            OfferFilter::ExcludeUser(id) => {
                sql.push_str(" AND user_id != ?");
                values.push(Value::Integer(*id));
            }
            OfferFilter::OriginNear { .. } | OfferFilter::DestinationNear { .. } => {}
        }
    }

    sql.push_str(" ORDER BY id");
    if !query.has_geo_filter() {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(sql_limit(query.limit)));
    }
    (sql, values)
}

/// Offers satisfying `query`, oldest first, at most `query.limit`.
pub async fn search_offers(db: &Database, query: &OfferQuery) -> Result<Vec<Offer>, AgrobotError> {
    let (sql, values) = build_search(query);
    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<Offer>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(params_from_iter(values), from_row)?
                .collect()
        })
        .await
        .map_err(map_tr_err)?;

    Ok(rows
        .into_iter()
        .filter(|offer| query.accepts(offer))
        .take(query.limit)
        .collect())
}

pub async fn count_offers(db: &Database) -> Result<u64, AgrobotError> {
    db.connection()
        .call(|conn| -> Result<u64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM offers", [], |row| {
                row.get::<_, i64>(0).map(|n| n.max(0) as u64)
            })
        })
        .await
        .map_err(map_tr_err)
}
