// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./agrobot.toml` > `~/.config/agrobot/agrobot.toml` > `/etc/agrobot/agrobot.toml`
//! with environment variable overrides via the `AGROBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::AgrobotConfig;

pub(crate) const LOCAL_CONFIG: &str = "agrobot.toml";
pub(crate) const SYSTEM_CONFIG: &str = "/etc/agrobot/agrobot.toml";

/// Config sections that environment variables may address.
const ENV_SECTIONS: &[&str] = &["agent", "storage", "dialogue", "matching", "seed"];

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("agrobot").join(LOCAL_CONFIG))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/agrobot/agrobot.toml`
/// 3. `~/.config/agrobot/agrobot.toml`
/// 4. `./agrobot.toml`
/// 5. `AGROBOT_*` environment variables
pub fn load_config() -> Result<AgrobotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AgrobotConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string on top of the defaults (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<AgrobotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AgrobotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AgrobotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AgrobotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Maps `AGROBOT_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Uses `Env::map()` rather than `split("_")` because keys contain
/// underscores: `AGROBOT_DIALOGUE_MAX_ATTEMPTS` must become
/// `dialogue.max_attempts`.
fn env_provider() -> Env {
    Env::prefixed("AGROBOT_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
