// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the catalog tables.

pub mod locations;
pub mod measurements;
pub mod offers;
pub mod products;
pub mod users;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

/// Convert a result limit into an SQL bind value.
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Parse an RFC 3339 timestamp stored in column `idx`.
pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a JSON document stored in column `idx`.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    idx: usize,
    raw: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Bind an empty phonetic code as NULL so it never equals anything.
pub(crate) fn code_param(code: &str) -> Option<String> {
    (!code.is_empty()).then(|| code.to_string())
}
