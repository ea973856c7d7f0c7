// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phonetic encodings used to match differently spelled catalog names.
//!
//! Soundex gives the coarse consonant skeleton, Metaphone the finer
//! pronunciation code. Both are pure functions of the input text. Only
//! ASCII letters take part in the encoding, so digits, punctuation and
//! whitespace never change a code.

use agrobot_core::PhoneticCodes;
use rphonetic::{Encoder, Metaphone, Soundex};

/// ASCII letters of `text`, in order.
fn letters(text: &str) -> String {
    text.chars().filter(char::is_ascii_alphabetic).collect()
}

/// American Soundex code, e.g. `T530` for "tomato".
///
/// Returns an empty string when `text` contains no letters.
pub fn soundex(text: &str) -> String {
    let letters = letters(text);
    if letters.is_empty() {
        return String::new();
    }
    Soundex::default().encode(&letters)
}

/// Metaphone code, e.g. `TMT` for "tomato".
///
/// Returns an empty string when `text` contains no letters.
pub fn metaphone(text: &str) -> String {
    let letters = letters(text);
    if letters.is_empty() {
        return String::new();
    }
    Metaphone::default().encode(&letters)
}

/// Both codes for a catalog name or a query.
pub fn phonetic_codes(text: &str) -> PhoneticCodes {
    PhoneticCodes {
        soundex: soundex(text),
        metaphone: metaphone(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn soundex_reference_values() {
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("Ashcraft"), "A261");
        assert_eq!(soundex("Tymczak"), "T522");
        assert_eq!(soundex("Pfister"), "P236");
    }

    #[test]
    fn produce_names() {
        assert_eq!(soundex("tomato"), "T530");
        assert_eq!(soundex("Tomatoes"), "T532");
        assert_eq!(metaphone("tomato"), "TMT");
        assert_eq!(metaphone("TOMATOES"), "TMTS");
    }

    #[test]
    fn sound_alike_spellings_share_a_code() {
        assert_eq!(metaphone("phone"), metaphone("fone"));
        assert_eq!(soundex("tomato"), soundex("tamato"));
    }

    #[test]
    fn no_letters_means_no_code() {
        assert_eq!(phonetic_codes(""), PhoneticCodes::default());
        assert_eq!(phonetic_codes("  42 !"), PhoneticCodes::default());
    }

    #[test]
    fn non_letters_are_ignored() {
        assert_eq!(phonetic_codes("to-ma.to"), phonetic_codes("tomato"));
        assert_eq!(phonetic_codes("tomato 2"), phonetic_codes("tomato"));
    }

    proptest! {
        #[test]
        fn encoding_is_deterministic(text in "\\PC{0,24}") {
            prop_assert_eq!(phonetic_codes(&text), phonetic_codes(&text));
        }

        #[test]
        fn soundex_shape(text in "[a-zA-Z]{1,16}") {
            let code = soundex(&text);
            prop_assert_eq!(code.len(), 4);
            let first = text.chars().next().unwrap().to_ascii_uppercase();
            prop_assert_eq!(code.chars().next(), Some(first));
            prop_assert!(code[1..].chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn case_does_not_matter(text in "[a-zA-Z ]{0,16}") {
            prop_assert_eq!(phonetic_codes(&text), phonetic_codes(&text.to_lowercase()));
        }
    }
}
