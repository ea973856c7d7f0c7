// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Matching engine for Agrobot offers.

pub mod engine;

pub use engine::{MatchingEngine, counter_offer_query};
