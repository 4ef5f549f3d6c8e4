//! Structured error types for deck generation.
//!
//! `FlashdeckError` covers everything that stops a run before or during
//! generation. Failures that are recovered locally (a single formula that
//! won't typeset, a link pointing past the last page) have their own types
//! and never escape the assembler as an `Err`.

use thiserror::Error;

/// The unified error type returned by all public flashdeck API functions.
#[derive(Debug, Error)]
pub enum FlashdeckError {
    /// No usable card records, unreadable or wrongly typed input file.
    #[error("Input error: {0}")]
    InputFormat(String),

    /// An external engine needed for formula rendering is absent.
    #[error("Required engine '{engine}' is not available: {reason}")]
    RenderDependencyMissing { engine: String, reason: String },

    /// Something failed inside the page loop. No output is written.
    #[error("Error generating PDF: {0}")]
    Generation(String),

    /// Options out of range or inconsistent.
    #[error("Invalid options: {0}")]
    Config(String),

    /// An options file failed to parse.
    #[error("Failed to parse options: {source}{}", hint_suffix(.hint))]
    Json {
        source: serde_json::Error,
        hint: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FlashdeckError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the options schema. Check field names and types."
                    .to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input. Is the file truncated?".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        FlashdeckError::Json { source: e, hint }
    }
}

/// A single formula failed somewhere between typesetting and decoding.
///
/// Always recovered by the assembler with a literal-text fallback.
#[derive(Debug, Error)]
pub enum FormulaError {
    #[error("typesetting failed: {0}")]
    Typeset(String),
    #[error("rasterization failed: {0}")]
    Rasterize(String),
    #[error("could not decode rendered image: {0}")]
    Decode(String),
    #[error("rendered formula has unusable dimensions {width}x{height}")]
    BadDimensions { width: f64, height: f64 },
}

/// Drawing surface misuse.
#[derive(Debug, Error, PartialEq)]
pub enum CanvasError {
    #[error("page {page} does not exist (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },
}

impl From<CanvasError> for FlashdeckError {
    fn from(e: CanvasError) -> Self {
        FlashdeckError::Generation(e.to_string())
    }
}
