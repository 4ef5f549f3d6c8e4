//! # Flashdeck
//!
//! Turns front/back text pairs into a paginated, cross-linked PDF deck of
//! flashcards.
//!
//! Every card gets two A4 pages, a front and a back, each with Back / Show /
//! Next buttons that jump between them. An optional table of contents lists
//! every card and links to its front. Card text may carry simple inline
//! markup (`<b>`, `<i>`, `<br>`) and LaTeX formulas (`\( … \)` inline,
//! `\[ … \]` display), which are typeset by external engines and embedded as
//! images.
//!
//! The hard part is that links point forward and backward across pages that
//! do not exist yet when they are drawn. So all page numbers are fixed up
//! front by the page plan, links are only recorded while pages are drawn, and
//! they are committed once the document is complete.
//!
//! ## Architecture
//!
//! ```text
//! Input (tab-separated records)
//!       ↓
//!   [deck]       — Cards with stable identities, processing order
//!       ↓
//!   [plan]       — Page number of every logical page
//!       ↓
//!   [assembler]  — Title, cards, TOC; per face:
//!       ├── [segment]  — plain text vs. formulas
//!       ├── [text]     — markup runs, word flow, wrapping
//!       ├── [math]     — typeset + rasterize formulas
//!       └── [nav]      — footer buttons, TOC slots, link intents
//!       ↓
//!   [canvas]     — Page-based drawing surface
//!       ↓
//!   [pdf]        — Serialize to PDF bytes
//! ```

pub mod assembler;
pub mod canvas;
pub mod config;
pub mod deck;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod math;
pub mod nav;
pub mod pdf;
pub mod plan;
pub mod segment;
pub mod text;

pub use assembler::{AssembledDeck, DeckAssembler};
pub use config::{DeckOptions, TemplateOptions};
pub use deck::{Card, Deck};
pub use error::FlashdeckError;
pub use math::{CommandBackend, MathBackend};

/// Render a deck to PDF bytes.
///
/// Nothing is returned on failure, so a failed run never leaves a partial
/// document behind.
pub fn render_deck(
    deck: &Deck,
    options: &DeckOptions,
    backend: &dyn MathBackend,
) -> Result<Vec<u8>, FlashdeckError> {
    let assembled = DeckAssembler::new(backend).assemble(deck, options)?;
    Ok(assembled.to_pdf_bytes())
}

/// Render an empty card template to PDF bytes.
pub fn render_template(
    options: &TemplateOptions,
    backend: &dyn MathBackend,
) -> Result<Vec<u8>, FlashdeckError> {
    let assembled = DeckAssembler::new(backend).assemble_template(options)?;
    Ok(assembled.to_pdf_bytes())
}
