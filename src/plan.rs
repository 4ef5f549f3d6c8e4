//! # Page Plan
//!
//! Every page number in the deck is known before the first page is drawn.
//! The document is laid out as
//!
//! ```text
//! [title] [toc 1 .. toc k] [card 0 front] [card 0 back] [card 1 front] ...
//! ```
//!
//! so the only unknown is `k`, the number of table of contents pages, which
//! depends on nothing but the card count and the TOC geometry.

use crate::layout::{MARGIN, PAGE_HEIGHT, PAGE_WIDTH};

/// Vertical distance between TOC rows.
pub const TOC_LINE_HEIGHT: f64 = 18.0;
/// Top of the first TOC row.
pub const TOC_START_Y: f64 = 75.0;
/// Gap between the two TOC columns.
pub const TOC_COLUMN_GAP: f64 = 30.0;
pub const TOC_COLUMNS: usize = 2;

/// Row grid of a table of contents page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TocGeometry {
    pub start_y: f64,
    pub line_height: f64,
    pub lines_per_column: usize,
    pub columns: usize,
    pub column_width: f64,
    pub column_gap: f64,
    pub left: f64,
}

impl TocGeometry {
    pub fn for_page(page_width: f64, page_height: f64, margin: f64) -> Self {
        let available = page_height - margin - TOC_START_Y;
        let lines_per_column = (available / TOC_LINE_HEIGHT).floor().max(0.0) as usize;
        TocGeometry {
            start_y: TOC_START_Y,
            line_height: TOC_LINE_HEIGHT,
            lines_per_column,
            columns: TOC_COLUMNS,
            column_width: (page_width - 2.0 * margin - TOC_COLUMN_GAP) / TOC_COLUMNS as f64,
            column_gap: TOC_COLUMN_GAP,
            left: margin,
        }
    }

    /// Rows that fit on one TOC page. Never zero.
    pub fn lines_per_page(&self) -> usize {
        (self.columns * self.lines_per_column).max(1)
    }
}

impl Default for TocGeometry {
    fn default() -> Self {
        Self::for_page(PAGE_WIDTH, PAGE_HEIGHT, MARGIN)
    }
}

/// Which side of a card a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

impl Face {
    pub fn other(self) -> Face {
        match self {
            Face::Front => Face::Back,
            Face::Back => Face::Front,
        }
    }
}

/// Absolute page numbers (1-based) for every logical page of a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub title_page_count: usize,
    pub toc_page_count: usize,
    pub page_offset: usize,
    pub total_pages: usize,
    pub card_count: usize,
}

impl PagePlan {
    pub fn compute(card_count: usize, include_toc: bool, toc: &TocGeometry) -> Self {
        let title_page_count = 1;
        let toc_page_count = if include_toc && card_count > 0 {
            card_count.div_ceil(toc.lines_per_page())
        } else {
            0
        };
        let page_offset = title_page_count + toc_page_count;
        PagePlan {
            title_page_count,
            toc_page_count,
            page_offset,
            total_pages: page_offset + 2 * card_count,
            card_count,
        }
    }

    /// Page number of the front of the card at `position` in processing order.
    pub fn front_page(&self, position: usize) -> usize {
        self.page_offset + 2 * position + 1
    }

    pub fn back_page(&self, position: usize) -> usize {
        self.front_page(position) + 1
    }

    pub fn face_page(&self, position: usize, face: Face) -> usize {
        match face {
            Face::Front => self.front_page(position),
            Face::Back => self.back_page(position),
        }
    }

    /// Page number of the `index`th TOC page (0-based).
    pub fn toc_page(&self, index: usize) -> usize {
        self.title_page_count + index + 1
    }

    /// The card position and face shown on `page`, if it is a card page.
    pub fn card_at(&self, page: usize) -> Option<(usize, Face)> {
        if page <= self.page_offset || page > self.total_pages {
            return None;
        }
        let rel = page - self.page_offset - 1;
        let face = if rel % 2 == 0 { Face::Front } else { Face::Back };
        Some((rel / 2, face))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_a4_toc_geometry() {
        let toc = TocGeometry::default();
        assert_eq!(toc.lines_per_column, 41);
        assert_eq!(toc.lines_per_page(), 82);
        assert!((toc.column_width - 267.64).abs() < 1e-9);
    }

    #[test]
    fn test_no_cards() {
        let plan = PagePlan::compute(0, true, &TocGeometry::default());
        assert_eq!(plan.toc_page_count, 0);
        assert_eq!(plan.page_offset, 1);
        assert_eq!(plan.total_pages, 1);
    }

    #[test]
    fn test_toc_page_boundaries() {
        let toc = TocGeometry::default();
        assert_eq!(PagePlan::compute(1, true, &toc).toc_page_count, 1);
        assert_eq!(PagePlan::compute(82, true, &toc).toc_page_count, 1);
        assert_eq!(PagePlan::compute(83, true, &toc).toc_page_count, 2);
        assert_eq!(PagePlan::compute(83, false, &toc).toc_page_count, 0);
    }

    #[test]
    fn test_card_pages_follow_toc() {
        let plan = PagePlan::compute(3, true, &TocGeometry::default());
        assert_eq!(plan.page_offset, 2);
        assert_eq!(plan.front_page(0), 3);
        assert_eq!(plan.back_page(0), 4);
        assert_eq!(plan.front_page(2), 7);
        assert_eq!(plan.total_pages, 8);
        assert_eq!(plan.toc_page(0), 2);
    }

    #[test]
    fn test_card_at() {
        let plan = PagePlan::compute(2, false, &TocGeometry::default());
        assert_eq!(plan.card_at(1), None);
        assert_eq!(plan.card_at(2), Some((0, Face::Front)));
        assert_eq!(plan.card_at(3), Some((0, Face::Back)));
        assert_eq!(plan.card_at(5), Some((1, Face::Back)));
        assert_eq!(plan.card_at(6), None);
    }

    #[test]
    fn test_tiny_page_never_divides_by_zero() {
        let toc = TocGeometry::for_page(200.0, 80.0, 15.0);
        assert_eq!(toc.lines_per_column, 0);
        assert_eq!(toc.lines_per_page(), 1);
        assert_eq!(PagePlan::compute(4, true, &toc).toc_page_count, 4);
    }

    proptest! {
        #[test]
        fn prop_page_totals(card_count in 0usize..2000, include_toc in any::<bool>()) {
            let plan = PagePlan::compute(card_count, include_toc, &TocGeometry::default());
            prop_assert_eq!(plan.page_offset, 1 + plan.toc_page_count);
            prop_assert_eq!(plan.total_pages, plan.page_offset + 2 * card_count);
            if !include_toc || card_count == 0 {
                prop_assert_eq!(plan.toc_page_count, 0);
            } else {
                prop_assert!(plan.toc_page_count * 82 >= card_count);
                prop_assert!((plan.toc_page_count - 1) * 82 < card_count);
            }
        }

        #[test]
        fn prop_faces_are_adjacent(card_count in 1usize..500, include_toc in any::<bool>(), pick in any::<prop::sample::Index>()) {
            let plan = PagePlan::compute(card_count, include_toc, &TocGeometry::default());
            let pos = pick.index(card_count);
            prop_assert_eq!(plan.front_page(pos), plan.page_offset + 2 * pos + 1);
            prop_assert_eq!(plan.back_page(pos), plan.front_page(pos) + 1);
            prop_assert_eq!(plan.card_at(plan.front_page(pos)), Some((pos, Face::Front)));
            prop_assert_eq!(plan.card_at(plan.back_page(pos)), Some((pos, Face::Back)));
            prop_assert!(plan.back_page(pos) <= plan.total_pages);
        }
    }
}
