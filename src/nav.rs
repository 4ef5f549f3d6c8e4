//! # Navigation Links
//!
//! Button geometry and table of contents slots, plus the ledger that holds
//! every link until the whole document exists.
//!
//! Links are built in two strictly ordered phases. While pages are drawn,
//! each button or TOC row only records a [`LinkIntent`]. Once every page is
//! in place, [`LinkLedger::commit`] turns intents into annotations, dropping
//! any whose target falls outside the document.

use crate::canvas::Canvas;
use crate::error::CanvasError;
use crate::layout::{CONTENT_WIDTH, FOOTER_HEIGHT, FOOTER_Y, MARGIN};
use crate::plan::{Face, PagePlan, TocGeometry};

pub const BUTTON_WIDTH: f64 = 85.04;
pub const SMALL_BUTTON_WIDTH: f64 = 60.0;
pub const BUTTON_HEIGHT: f64 = 28.35;
pub const BUTTON_GAP: f64 = 10.0;
pub const BUTTON_RADIUS: f64 = 5.0;

/// A deferred request to make a rectangle on `source_page` jump to
/// `target_page`. Rectangles use the canvas's top-left coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkIntent {
    pub source_page: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub target_page: usize,
}

/// Outcome of the link pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub committed: usize,
    pub dropped: usize,
}

/// Link intents in the order they were recorded.
#[derive(Debug, Clone, Default)]
pub struct LinkLedger {
    intents: Vec<LinkIntent>,
}

impl LinkLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, intent: LinkIntent) {
        self.intents.push(intent);
    }

    pub fn intents(&self) -> &[LinkIntent] {
        &self.intents
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Attach every intent to its source page. Targets outside
    /// `1..=total_pages` are logged and skipped.
    ///
    /// Errors only when a source page is missing from the canvas, which means
    /// the page plan and the drawn document disagree.
    pub fn commit(self, canvas: &mut Canvas, total_pages: usize) -> Result<LinkReport, CanvasError> {
        let mut report = LinkReport::default();

        for intent in self.intents {
            if intent.target_page == 0 || intent.target_page > total_pages {
                log::warn!(
                    "Skipping link on page {} to invalid target {} (total: {})",
                    intent.source_page,
                    intent.target_page,
                    total_pages
                );
                report.dropped += 1;
                continue;
            }
            canvas.set_active_page(intent.source_page)?;
            canvas.add_link_annotation(intent.x, intent.y, intent.width, intent.height, intent.target_page)?;
            report.committed += 1;
        }

        log::debug!(
            "Committed {} links, dropped {}",
            report.committed,
            report.dropped
        );
        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Back,
    Primary,
    Next,
}

/// One footer button, positioned and targeted.
#[derive(Debug, Clone, PartialEq)]
pub struct NavButton {
    pub kind: ButtonKind,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub target_page: usize,
}

impl NavButton {
    pub fn intent(&self, source_page: usize) -> LinkIntent {
        LinkIntent {
            source_page,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            target_page: self.target_page,
        }
    }

    /// Center of the button, where its label goes.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Footer buttons for the card at `position` showing `face`, left to right.
///
/// Back appears from the second card on and Next up to the second-to-last;
/// the primary button flips to the other face. The row is centered using
/// only the buttons that are shown.
pub fn footer_buttons(plan: &PagePlan, position: usize, face: Face, primary_label: &str) -> Vec<NavButton> {
    let show_back = position > 0;
    let show_next = position + 1 < plan.card_count;

    let mut total_width = BUTTON_WIDTH;
    if show_back {
        total_width += SMALL_BUTTON_WIDTH + BUTTON_GAP;
    }
    if show_next {
        total_width += SMALL_BUTTON_WIDTH + BUTTON_GAP;
    }

    let y = FOOTER_Y + (FOOTER_HEIGHT - BUTTON_HEIGHT) / 2.0;
    let mut x = MARGIN + (CONTENT_WIDTH - total_width) / 2.0;
    let mut buttons = Vec::with_capacity(3);

    if show_back {
        buttons.push(NavButton {
            kind: ButtonKind::Back,
            label: "Back".to_string(),
            x,
            y,
            width: SMALL_BUTTON_WIDTH,
            height: BUTTON_HEIGHT,
            target_page: plan.front_page(position - 1),
        });
        x += SMALL_BUTTON_WIDTH + BUTTON_GAP;
    }

    buttons.push(NavButton {
        kind: ButtonKind::Primary,
        label: primary_label.to_string(),
        x,
        y,
        width: BUTTON_WIDTH,
        height: BUTTON_HEIGHT,
        target_page: plan.face_page(position, face.other()),
    });
    x += BUTTON_WIDTH + BUTTON_GAP;

    if show_next {
        buttons.push(NavButton {
            kind: ButtonKind::Next,
            label: "Next".to_string(),
            x,
            y,
            width: SMALL_BUTTON_WIDTH,
            height: BUTTON_HEIGHT,
            target_page: plan.front_page(position + 1),
        });
    }

    buttons
}

/// One table of contents row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub label: String,
    pub target_page: usize,
}

/// Where TOC row `idx` lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TocSlot {
    /// 0-based TOC page.
    pub page_index: usize,
    pub column: usize,
    pub row: usize,
    pub x: f64,
    /// Baseline of the row.
    pub y: f64,
}

pub fn toc_slot(geometry: &TocGeometry, idx: usize) -> TocSlot {
    let lines_per_page = geometry.lines_per_page();
    let lines_per_column = geometry.lines_per_column.max(1);
    let on_page = idx % lines_per_page;
    let column = on_page / lines_per_column;
    let row = on_page % lines_per_column;

    TocSlot {
        page_index: idx / lines_per_page,
        column,
        row,
        x: geometry.left + column as f64 * (geometry.column_width + geometry.column_gap),
        y: geometry.start_y + row as f64 * geometry.line_height,
    }
}
