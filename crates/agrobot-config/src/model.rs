// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Agrobot configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgrobotConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// SQLite catalog settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversation limits and phrasing.
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Counter-offer compatibility filters.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Catalog seeding settings.
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Name the bot introduces itself with.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "Agrobot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    "agrobot.db".to_string()
}

fn default_true() -> bool {
    true
}

/// Dialogue tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialogueConfig {
    /// Maximum product candidates shown for one query.
    #[serde(default = "default_result_limit")]
    pub product_limit: usize,

    /// Radius for the nearby-location lookup, in meters.
    #[serde(default = "default_location_radius_m")]
    pub location_radius_m: f64,

    /// Maximum nearby locations offered.
    #[serde(default = "default_result_limit")]
    pub location_limit: usize,

    /// Re-asks allowed for one question before falling back to recovery.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Currency named in the price question.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Base URL for product images. Cards carry no image when unset.
    #[serde(default)]
    pub image_base_url: Option<String>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            product_limit: default_result_limit(),
            location_radius_m: default_location_radius_m(),
            location_limit: default_result_limit(),
            max_attempts: default_max_attempts(),
            currency: default_currency(),
            image_base_url: None,
        }
    }
}

fn default_result_limit() -> usize {
    8
}

fn default_location_radius_m() -> f64 {
    5000.0
}

fn default_max_attempts() -> u32 {
    3
}

fn default_currency() -> String {
    "US Dollars".to_string()
}

/// Counter-offer search settings.
///
/// Only direction inversion and product identity are always enforced. Each
/// optional filter below is off unless set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    /// Maximum candidates returned.
    #[serde(default = "default_result_limit")]
    pub limit: usize,

    /// Fractional price tolerance, e.g. `0.25` for 25%.
    #[serde(default)]
    pub price_tolerance: Option<f64>,

    /// Fractional quantity tolerance around the offered quantity.
    #[serde(default)]
    pub quantity_tolerance: Option<f64>,

    /// Require the same unit of measurement.
    #[serde(default)]
    pub same_measurement: bool,

    /// Require origin and destination within this many meters.
    #[serde(default)]
    pub proximity_radius_m: Option<f64>,

    /// Never match a user against their own offers.
    #[serde(default)]
    pub exclude_self: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            limit: default_result_limit(),
            price_tolerance: None,
            quantity_tolerance: None,
            same_measurement: false,
            proximity_radius_m: None,
            exclude_self: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    /// Measurement code linked to every seeded product.
    #[serde(default = "default_measurement")]
    pub default_measurement: Option<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            default_measurement: default_measurement(),
        }
    }
}

fn default_measurement() -> Option<String> {
    Some("MEASUREMENT_KILOGRAM".to_string())
}
