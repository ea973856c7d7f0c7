// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde cannot express: non-empty paths, positive
//! limits and radii, and tolerances that are real fractions.

use crate::diagnostic::ConfigError;
use crate::model::AgrobotConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of failing fast.
pub fn validate_config(config: &AgrobotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.agent.name.trim().is_empty() {
        fail("agent.name must not be empty".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let dialogue = &config.dialogue;
    if dialogue.product_limit == 0 {
        fail("dialogue.product_limit must be at least 1".to_string());
    }
    if dialogue.location_limit == 0 {
        fail("dialogue.location_limit must be at least 1".to_string());
    }
    if !(dialogue.location_radius_m.is_finite() && dialogue.location_radius_m > 0.0) {
        fail(format!(
            "dialogue.location_radius_m must be positive, got {}",
            dialogue.location_radius_m
        ));
    }
    if dialogue.max_attempts == 0 {
        fail("dialogue.max_attempts must be at least 1".to_string());
    }
    if dialogue.currency.trim().is_empty() {
        fail("dialogue.currency must not be empty".to_string());
    }
    if let Some(url) = &dialogue.image_base_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        fail(format!(
            "dialogue.image_base_url `{url}` must start with http:// or https://"
        ));
    }

    let matching = &config.matching;
    if matching.limit == 0 {
        fail("matching.limit must be at least 1".to_string());
    }
    for (key, value) in [
        ("price_tolerance", matching.price_tolerance),
        ("quantity_tolerance", matching.quantity_tolerance),
    ] {
        if let Some(tol) = value
            && !(tol > 0.0 && tol <= 1.0)
        {
            fail(format!("matching.{key} must be in (0, 1], got {tol}"));
        }
    }
    if let Some(radius) = matching.proximity_radius_m
        && !(radius.is_finite() && radius > 0.0)
    {
        fail(format!(
            "matching.proximity_radius_m must be positive, got {radius}"
        ));
    }

    if let Some(code) = &config.seed.default_measurement
        && code.trim().is_empty()
    {
        fail("seed.default_measurement must not be empty when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
