// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entity resolution for Agrobot.
//!
//! Maps free-text answers to catalog products through exact word forms and
//! two phonetic codes, and shared coordinates to nearby catalog locations.
//! The same [`phonetic_codes`] function is used when seeding the catalog, so
//! stored and query codes always agree.

pub mod normalize;
pub mod phonetic;
pub mod resolver;

pub use normalize::normalize_query;
pub use phonetic::{metaphone, phonetic_codes, soundex};
pub use resolver::{EntityResolver, ResolverLimits};
