// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query text cleanup.

/// Normalize free text for catalog lookups.
///
/// The text is lowercased, internal whitespace collapsed to single spaces
/// and surrounding punctuation stripped. Returns `None` when nothing
/// searchable is left, so an empty answer never matches the whole catalog.
pub fn normalize_query(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    let collapsed = lowered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let trimmed = collapsed.trim_matches(|c: char| !c.is_alphanumeric());
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
