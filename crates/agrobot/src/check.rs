// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `agrobot check` command implementation.
//!
//! Runs diagnostic checks against the configured catalog database so an
//! operator can see whether the bot is ready to serve conversations.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use agrobot_config::model::AgrobotConfig;
use agrobot_core::{AgrobotError, CatalogStore, HealthStatus, PluginAdapter};
use agrobot_storage::SqliteCatalog;
use colored::Colorize;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `agrobot check` command.
///
/// Returns an error when any check failed so the process exits non-zero.
pub async fn run_check(config: &AgrobotConfig, plain: bool) -> Result<(), AgrobotError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect(config).await;

    println!();
    println!("  agrobot check");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", format_line(result, use_color));
    }
    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    if fail_count > 0 {
        return Err(AgrobotError::Internal(format!("{fail_count} check(s) failed")));
    }
    Ok(())
}

/// Run every check in order. Database checks are skipped when the file is
/// missing, since opening it would create it.
pub async fn collect(config: &AgrobotConfig) -> Vec<CheckResult> {
    let start = Instant::now();
    let mut results = vec![CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        format!("valid (agent.name={})", config.agent.name),
        start,
    )];

    let db_path = &config.storage.database_path;
    if !Path::new(db_path).exists() {
        results.push(CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (run `agrobot seed` to create it)"),
            start,
        ));
        return results;
    }

    let start = Instant::now();
    let catalog = SqliteCatalog::new(config.storage.clone());
    if let Err(e) = catalog.initialize().await {
        results.push(CheckResult::new(
            "Database",
            CheckStatus::Fail,
            e.to_string(),
            start,
        ));
        return results;
    }
    results.push(match catalog.health_check().await {
        Ok(HealthStatus::Healthy) => {
            CheckResult::new("Database", CheckStatus::Pass, "connected", start)
        }
        Ok(HealthStatus::Degraded(reason)) => {
            CheckResult::new("Database", CheckStatus::Warn, reason, start)
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            CheckResult::new("Database", CheckStatus::Fail, reason, start)
        }
        Err(e) => CheckResult::new("Database", CheckStatus::Fail, e.to_string(), start),
    });

    results.push(check_catalog(&catalog).await);
    if let Some(code) = config.seed.default_measurement.as_deref() {
        results.push(check_default_measurement(&catalog, code).await);
    }

    let _ = catalog.shutdown().await;
    results
}

async fn check_catalog(catalog: &SqliteCatalog) -> CheckResult {
    let start = Instant::now();
    match catalog.stats().await {
        Ok(stats) => {
            let message = format!(
                "{} products, {} measurements, {} locations, {} offers",
                stats.products, stats.measurements, stats.locations, stats.offers
            );
            let status = if stats.products == 0 || stats.measurements == 0 || stats.locations == 0
            {
                CheckStatus::Warn
            } else {
                CheckStatus::Pass
            };
            CheckResult::new("Catalog", status, message, start)
        }
        Err(e) => CheckResult::new("Catalog", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_default_measurement(catalog: &SqliteCatalog, code: &str) -> CheckResult {
    let start = Instant::now();
    match catalog.find_measurement_by_code(code).await {
        Ok(Some(_)) => CheckResult::new("Default unit", CheckStatus::Pass, code, start),
        Ok(None) => CheckResult::new(
            "Default unit",
            CheckStatus::Warn,
            format!("{code} is not in the catalog"),
            start,
        ),
        Err(e) => CheckResult::new("Default unit", CheckStatus::Fail, e.to_string(), start),
    }
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<20} {} ({duration_ms}ms)", result.name, result.message)
    }
}

#[cfg(test)]
mod tests {
    use agrobot_config::model::StorageConfig;

    use super::*;

    fn config_at(path: &Path) -> AgrobotConfig {
        AgrobotConfig {
            storage: StorageConfig {
                database_path: path.to_string_lossy().to_string(),
                wal_mode: true,
            },
            ..AgrobotConfig::default()
        }
    }

    #[tokio::test]
    async fn missing_database_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_at(&dir.path().join("absent.db"));

        let results = collect(&config).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].status, CheckStatus::Warn);
        assert!(!dir.path().join("absent.db").exists());
    }

    #[tokio::test]
    async fn empty_catalog_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        let config = config_at(&path);
        let catalog = SqliteCatalog::new(config.storage.clone());
        catalog.initialize().await.unwrap();
        catalog.shutdown().await.unwrap();

        let results = collect(&config).await;
        let database = results.iter().find(|r| r.name == "Database").unwrap();
        assert_eq!(database.status, CheckStatus::Warn);
        let unit = results.iter().find(|r| r.name == "Default unit").unwrap();
        assert_eq!(unit.status, CheckStatus::Warn);
    }

    #[test]
    fn plain_lines_carry_a_tag() {
        let result = CheckResult {
            name: "Catalog".into(),
            status: CheckStatus::Fail,
            message: "boom".into(),
            duration: Duration::from_millis(3),
        };
        let line = format_line(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("boom (3ms)"));
    }
}
