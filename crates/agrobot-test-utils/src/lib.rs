// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Agrobot integration tests.
//!
//! Provides a mock channel, a seeded catalog and test harness
//! infrastructure for fast, deterministic, CI-runnable tests without
//! external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock messaging channel with event injection and capture
//! - [`TestHarness`] - Full agent stack over a temp SQLite catalog
//! - [`fixtures`] - Catalog seed data and direct record helpers

pub mod fixtures;
pub mod harness;
pub mod mock_channel;

pub use fixtures::{NAIROBI_CBD, OPEN_SEA, SeededCatalog};
pub use harness::{TestHarness, texts};
pub use mock_channel::MockChannel;
