//! # Card Deck
//!
//! Cards come from newline-delimited records with the front and back
//! separated by a tab. Each card keeps the 0-based line it was read from as
//! its `original_index`, which stays its identity for the rest of the
//! session: deleting other cards never renumbers it.

use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::FlashdeckError;

/// File extensions accepted by [`Deck::from_path`].
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["txt", "csv", "tsv"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub front: String,
    pub back: String,
    pub original_index: usize,
}

impl Card {
    pub fn new(front: impl Into<String>, back: impl Into<String>, original_index: usize) -> Self {
        Card {
            front: front.into(),
            back: back.into(),
            original_index,
        }
    }
}

/// The cards of one editing/generation session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Deck { cards }
    }

    /// Parse tab-separated records. Only the first two fields of a record are
    /// used; a record with both of them blank is skipped.
    pub fn parse(text: &str) -> Result<Self, FlashdeckError> {
        let cards: Vec<Card> = text
            .split('\n')
            .enumerate()
            .filter_map(|(index, line)| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                let mut parts = line.split('\t');
                let front = parts.next().unwrap_or_default();
                let back = parts.next().unwrap_or_default();
                if front.trim().is_empty() && back.trim().is_empty() {
                    return None;
                }
                Some(Card::new(front, back, index))
            })
            .collect();

        if cards.is_empty() {
            return Err(FlashdeckError::InputFormat(
                "No valid card data found in file.".to_string(),
            ));
        }
        log::debug!("Parsed {} cards", cards.len());
        Ok(Deck { cards })
    }

    /// Read and parse a `.txt`, `.csv` or `.tsv` file as UTF-8.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FlashdeckError> {
        let path = path.as_ref();
        let accepted = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                ACCEPTED_EXTENSIONS
                    .iter()
                    .any(|ok| ext.eq_ignore_ascii_case(ok))
            })
            .unwrap_or(false);
        if !accepted {
            return Err(FlashdeckError::InputFormat(format!(
                "Invalid file type: {} (expected .txt, .csv or .tsv)",
                path.display()
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            FlashdeckError::InputFormat(format!("Error reading file {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, original_index: usize) -> Option<&Card> {
        self.cards.iter().find(|c| c.original_index == original_index)
    }

    /// Remove the card with this `original_index`. Unknown indices are a
    /// logged no-op.
    pub fn delete(&mut self, original_index: usize) -> Option<Card> {
        match self.cards.iter().position(|c| c.original_index == original_index) {
            Some(pos) => {
                let card = self.cards.remove(pos);
                log::info!("Card deleted. Remaining: {}", self.cards.len());
                Some(card)
            }
            None => {
                log::warn!("Card with original index {} not found", original_index);
                None
            }
        }
    }

    /// Cards in the order they are laid out: as imported, or uniformly
    /// shuffled.
    pub fn processing_order<R: Rng + ?Sized>(&self, randomize: bool, rng: &mut R) -> Vec<&Card> {
        let mut order: Vec<&Card> = self.cards.iter().collect();
        if randomize {
            order.shuffle(rng);
        }
        order
    }
}
