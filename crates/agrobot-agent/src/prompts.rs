// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot phrasing.
//!
//! Most prompts come in several phrasings and one is picked at random per
//! message. [`Phrasing::First`] always picks the first, for tests.

use agrobot_core::Direction;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phrasing {
    #[default]
    Random,
    First,
}

impl Phrasing {
    pub fn pick<'a>(self, options: &[&'a str]) -> &'a str {
        let chosen = match self {
            Self::Random => options.choose(&mut rand::thread_rng()),
            Self::First => options.first(),
        };
        chosen.copied().unwrap_or_default()
    }
}

pub const ASK_DIRECTION: &[&str] = &[
    "What would you like to do?",
    "Can I help you buy or sell?",
    "Would you like to buy or sell?",
];

pub const WELCOME_BACK: &[&str] = &["Welcome back."];
pub const HEY: &[&str] = &["Hey!"];

pub const FOUND_PRODUCTS: &[&str] = &[
    "Great! I've found some products. Take a look.",
    "Here are some options based on your search.",
];

pub const RETRY_ACK: &[&str] = &["Great!", "Let's try again.", "No problem."];

pub const NO_PROBLEM: &[&str] = &["OK, let's start over.", "No problem. Let's start over."];

pub const FOUND_PLACES: &[&str] = &[
    "I've found some places nearby. Choose the closest to you.",
    "Here are a few locations close to you. Which one are you in?",
];

pub const NO_PLACES: &[&str] = &[
    "Sorry, I couldn't find any places near you.",
    "Hmm, I don't know any places close to that spot.",
];

pub const FOUND_OFFERS: &[&str] = &[
    "I've found some offers nearby.",
    "Here are some options based on your search.",
];

pub const SORRY: &[&str] = &[
    "Sorry, I couldn't understand you. Let's start over.",
    "Opps... I forgot where we were. Let's try this again.",
];

pub const GOODBYE: &[&str] = &["Thanks for the chat!", "See you next time.", "Talk to you later!"];

pub const TRY_AGAIN: &str = "Sorry, I did not get that. Please try again.";
pub const PRE_ONBOARDING: &str =
    "We've been chatting for a while and have not actually exchanged details.";
pub const ASK_PHONE: &str = "Can I have your phone number?";
pub const ASK_EMAIL: &str = "Can I have your email address?";
pub const ALREADY_REGISTERED: &str =
    "That phone number or email address is already registered. Can I have a different phone number?";
pub const SEARCHING: &str = "Great! Let's see if I can find what you're looking for...";
pub const NO_MATCH: &str = "Sorry, I wasn't able to find a match.";
pub const OFFER_UNAVAILABLE: &str = "Sorry, that offer is no longer available. Try another one?";

pub fn introduction(agent_name: &str) -> [String; 4] {
    [
        "Hi".to_string(),
        format!("My name is {agent_name}"),
        "I'm here to help you buy and sell agricultural produce by connecting you to local \
         producers or consumers."
            .to_string(),
        "I can do a lot for a bot, but just remember, I'm not a real person. So, let's get started!"
            .to_string(),
    ]
}

pub fn ask_product(direction: Direction) -> String {
    format!("What do you want to {}?", direction.verb())
}

pub fn product_not_found(phrasing: Phrasing, query: &str) -> String {
    match phrasing.pick(&["sorry", "whoops"]) {
        "whoops" => format!("Whoops! I didn't find {query}. Would you like to try again?"),
        _ => format!("Sorry, I can't find {query}. Try again?"),
    }
}

pub fn ask_measurement(product_name: &str, direction: Direction) -> String {
    format!(
        "What size, unit, or measurement of {} do you want to {}?",
        product_name.to_lowercase(),
        direction.verb()
    )
}

pub fn ask_quantity(measurement_plural: &str, product_plural: &str) -> String {
    format!(
        "How many {} of {}?",
        measurement_plural.to_lowercase(),
        product_plural.to_lowercase()
    )
}

pub fn ask_location(direction: Direction, product_plural: &str) -> String {
    format!(
        "Where do you want to {} {}?",
        direction.verb(),
        product_plural.to_lowercase()
    )
}

pub fn ask_price(
    currency: &str,
    direction: Direction,
    quantity: u32,
    measurement_plural: &str,
    product_plural: &str,
) -> String {
    format!(
        "How much (in {currency}) are you willing to {} {quantity} {} of {} for?",
        direction.verb(),
        measurement_plural.to_lowercase(),
        product_plural.to_lowercase()
    )
}

pub fn connect(name: &str, phone: &str) -> String {
    format!("Great! You can reach {name} at {phone}. Good luck with the deal!")
}
