//! # Generation Options
//!
//! Options for deck and template runs. Both deserialize from JSON with
//! camelCase keys and per-field defaults, so an options file only needs the
//! fields it changes:
//!
//! ```json
//! { "title": "Biology", "randomize": true, "includeToc": true, "seed": 7 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FlashdeckError;

pub const DEFAULT_DECK_TITLE: &str = "My Flashcards";
pub const DEFAULT_TEMPLATE_TITLE: &str = "Flashcard_Template";
pub const DEFAULT_TEMPLATE_CARDS: usize = 10;
pub const MAX_TEMPLATE_CARDS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckOptions {
    #[serde(default = "default_deck_title")]
    pub title: String,
    /// Shuffle cards before layout.
    #[serde(default)]
    pub randomize: bool,
    /// Show the back text on the front page and vice versa.
    #[serde(default)]
    pub flip: bool,
    #[serde(default)]
    pub include_toc: bool,
    /// Fixed shuffle seed; entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_deck_title() -> String {
    DEFAULT_DECK_TITLE.to_string()
}

impl Default for DeckOptions {
    fn default() -> Self {
        DeckOptions {
            title: default_deck_title(),
            randomize: false,
            flip: false,
            include_toc: false,
            seed: None,
        }
    }
}

impl DeckOptions {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FlashdeckError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The title to print, falling back to the default when blank.
    pub fn effective_title(&self) -> &str {
        non_blank_or(&self.title, DEFAULT_DECK_TITLE)
    }

    pub fn output_filename(&self) -> String {
        format!("{}.pdf", sanitize_filename(self.effective_title()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateOptions {
    #[serde(default = "default_template_title")]
    pub title: String,
    #[serde(default = "default_template_cards")]
    pub card_count: usize,
}

fn default_template_title() -> String {
    DEFAULT_TEMPLATE_TITLE.to_string()
}

fn default_template_cards() -> usize {
    DEFAULT_TEMPLATE_CARDS
}

impl Default for TemplateOptions {
    fn default() -> Self {
        TemplateOptions {
            title: default_template_title(),
            card_count: DEFAULT_TEMPLATE_CARDS,
        }
    }
}

impl TemplateOptions {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FlashdeckError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<(), FlashdeckError> {
        if self.card_count == 0 || self.card_count > MAX_TEMPLATE_CARDS {
            return Err(FlashdeckError::Config(format!(
                "template card count must be between 1 and {}, got {}",
                MAX_TEMPLATE_CARDS, self.card_count
            )));
        }
        Ok(())
    }

    pub fn effective_title(&self) -> &str {
        non_blank_or(&self.title, DEFAULT_TEMPLATE_TITLE)
    }

    pub fn output_filename(&self) -> String {
        format!("{}_template.pdf", sanitize_filename(self.effective_title()))
    }
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Replace every character outside `[A-Za-z0-9]` with `_` and lowercase.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}
