// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User registration and lookups.

use agrobot_core::{AgrobotError, NewUser, RecordId, User};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err, unique_violation};
use crate::queries::parse_timestamp;

const COLUMNS: &str = "id, first_name, last_name, phone, email, subject_id, app_subject_id, \
                       picture_url, gender, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(9)?;
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        subject_id: row.get(5)?,
        app_subject_id: row.get(6)?,
        picture_url: row.get(7)?,
        gender: row.get(8)?,
        created_at: parse_timestamp(9, &created_at)?,
    })
}

/// Register a user.
///
/// Fails with [`AgrobotError::Conflict`] naming the column when the phone,
/// email or subject id is already taken.
pub async fn create_user(db: &Database, user: &NewUser) -> Result<User, AgrobotError> {
    let user = user.clone();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<Result<User, String>, rusqlite::Error> {
            let created_at = Utc::now().to_rfc3339();
            let insert = conn.execute(
                "INSERT INTO users (first_name, last_name, phone, email, subject_id,
                                    app_subject_id, picture_url, gender, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user.first_name,
                    user.last_name,
                    user.phone,
                    user.email,
                    user.subject_id,
                    user.app_subject_id,
                    user.picture_url,
                    user.gender,
                    created_at,
                ],
            );
            if let Err(e) = insert {
                return match unique_violation(&e) {
                    Some(column) => Ok(Err(column)),
                    None => Err(e),
                };
            }
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                from_row,
            )
            .map(Ok)
        })
        .await
        .map_err(map_tr_err)?;
    outcome.map_err(|field| AgrobotError::Conflict { field })
}

pub async fn get_user(db: &Database, id: RecordId) -> Result<Option<User>, AgrobotError> {
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user_by_subject(
    db: &Database,
    subject_id: &str,
) -> Result<Option<User>, AgrobotError> {
    let subject_id = subject_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE subject_id = ?1"),
                params![subject_id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
