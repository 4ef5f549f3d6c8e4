//! # Page Geometry
//!
//! Fixed bands of an A4 card page, in points from the top-left corner.
//!
//! ```text
//!   0.00 ┬──────────────────────────────┐
//!  15.00 │ header band (38.35)          │
//!  53.35 ├──────────────────────────────┤ header rule
//!        │ padding (25)                 │
//!  78.35 │ content band                 │
//!        │   x = 15, width = 565.28     │
//! 739.37 │ padding (25)                 │
//! 764.37 ├──────────────────────────────┤ footer rule
//!        │ footer band (62.52)          │
//! 826.89 │ margin (15)                  │
//! 841.89 ┴──────────────────────────────┘
//! ```

use crate::canvas::{A4_HEIGHT, A4_WIDTH};

pub const PAGE_WIDTH: f64 = A4_WIDTH;
pub const PAGE_HEIGHT: f64 = A4_HEIGHT;
pub const MARGIN: f64 = 15.0;

pub const HEADER_HEIGHT: f64 = 38.35;
pub const FOOTER_HEIGHT: f64 = 62.52;
/// Gap between the header/footer bands and the content band.
pub const CONTENT_PADDING: f64 = 25.0;

pub const HEADER_Y: f64 = MARGIN;
pub const FOOTER_Y: f64 = PAGE_HEIGHT - MARGIN - FOOTER_HEIGHT;

pub const CONTENT_X: f64 = MARGIN;
pub const CONTENT_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;
pub const CONTENT_TOP: f64 = HEADER_Y + HEADER_HEIGHT + CONTENT_PADDING;
pub const CONTENT_BOTTOM: f64 = FOOTER_Y - CONTENT_PADDING;
