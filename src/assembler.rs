//! # Deck Assembly
//!
//! Drives a whole generation run:
//!
//! 1. compute the [`PagePlan`] (every page number, before drawing anything),
//! 2. draw the title page and reserve blank TOC pages,
//! 3. draw each card's front and back page in processing order, recording
//!    footer link intents,
//! 4. fill in the TOC pages, recording one intent per row,
//! 5. commit all intents against the finished document.
//!
//! Formulas are rendered one at a time in document order, since each one is
//! placed at the cursor the previous segment left behind. A formula that fails
//! to render is replaced by its source text and the page carries on.

use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::canvas::{Baseline, Canvas, Color, ShapeStyle, TextAlign, TextStyle};
use crate::config::{DeckOptions, TemplateOptions};
use crate::deck::Deck;
use crate::error::FlashdeckError;
use crate::font::FontVariant;
use crate::layout::{
    CONTENT_BOTTOM, CONTENT_TOP, CONTENT_WIDTH, CONTENT_X, FOOTER_Y, HEADER_HEIGHT, HEADER_Y, MARGIN,
};
use crate::math::{FormulaRenderer, MathBackend, RenderedFormula};
use crate::nav::{
    footer_buttons, toc_slot, LinkIntent, LinkLedger, LinkReport, NavButton, TocEntry, BUTTON_RADIUS,
};
use crate::pdf::Metadata;
use crate::plan::{Face, PagePlan, TocGeometry};
use crate::segment::{segment, toc_label, SegmentKind};
use crate::text::{TextFlow, DEFAULT_FONT_SIZE, LINE_HEIGHT_FACTOR};

const SUBJECT: &str = "Flashcard Deck";
const THIN_LINE: f64 = 0.2;
const TOC_FONT_SIZE: f64 = 10.0;

/// The finished, fully linked document.
#[derive(Debug, Clone)]
pub struct AssembledDeck {
    pub canvas: Canvas,
    pub plan: PagePlan,
    pub report: LinkReport,
    pub title: String,
    /// Formulas replaced by their source text.
    pub formula_fallbacks: usize,
    /// PDF date string of the run.
    pub created: String,
}

impl AssembledDeck {
    pub fn metadata(&self) -> Metadata {
        Metadata {
            title: Some(self.title.clone()),
            subject: Some(SUBJECT.to_string()),
            creation_date: Some(self.created.clone()),
        }
    }

    pub fn to_pdf_bytes(&self) -> Vec<u8> {
        self.canvas.to_pdf_bytes(&self.metadata())
    }
}

/// Names of the two faces and the labels of the primary button on each.
struct FaceLabels {
    front: String,
    back: String,
    front_button: String,
    back_button: String,
}

impl FaceLabels {
    fn for_deck(flip: bool) -> Self {
        let (front, back) = if flip { ("Definition", "Word") } else { ("Word", "Definition") };
        FaceLabels {
            front: front.to_string(),
            back: back.to_string(),
            front_button: format!("Show {}", back),
            back_button: format!("Show {}", front),
        }
    }

    fn template() -> Self {
        FaceLabels {
            front: "Question".to_string(),
            back: "Answer".to_string(),
            front_button: "Show Answer".to_string(),
            back_button: "Show Question".to_string(),
        }
    }

    fn name(&self, face: Face) -> &str {
        match face {
            Face::Front => &self.front,
            Face::Back => &self.back,
        }
    }

    fn button(&self, face: Face) -> &str {
        match face {
            Face::Front => &self.front_button,
            Face::Back => &self.back_button,
        }
    }
}

pub struct DeckAssembler<'a> {
    backend: &'a dyn MathBackend,
    toc: TocGeometry,
    generated_on: String,
}

impl<'a> DeckAssembler<'a> {
    pub fn new(backend: &'a dyn MathBackend) -> Self {
        DeckAssembler {
            backend,
            toc: TocGeometry::default(),
            generated_on: Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    /// Override the date printed on the title page.
    pub fn with_generated_on(mut self, date: impl Into<String>) -> Self {
        self.generated_on = date.into();
        self
    }

    /// Lay out a parsed deck.
    pub fn assemble(&self, deck: &Deck, options: &DeckOptions) -> Result<AssembledDeck, FlashdeckError> {
        if deck.is_empty() {
            return Err(FlashdeckError::InputFormat("No cards available.".to_string()));
        }
        self.backend.check_available()?;

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let order = deck.processing_order(options.randomize, &mut rng);
        let faces: Vec<(&str, &str)> = order
            .iter()
            .map(|card| {
                if options.flip {
                    (card.back.as_str(), card.front.as_str())
                } else {
                    (card.front.as_str(), card.back.as_str())
                }
            })
            .collect();

        let plan = PagePlan::compute(faces.len(), options.include_toc, &self.toc);
        self.build(
            options.effective_title(),
            plan,
            &faces,
            &FaceLabels::for_deck(options.flip),
            options.include_toc,
        )
    }

    /// Lay out a blank template: same pages and links, no card content, no TOC.
    pub fn assemble_template(&self, options: &TemplateOptions) -> Result<AssembledDeck, FlashdeckError> {
        options.validate()?;
        self.backend.check_available()?;

        let faces = vec![("", ""); options.card_count];
        let plan = PagePlan::compute(faces.len(), false, &self.toc);
        self.build(options.effective_title(), plan, &faces, &FaceLabels::template(), false)
    }

    fn build(
        &self,
        title: &str,
        plan: PagePlan,
        faces: &[(&str, &str)],
        labels: &FaceLabels,
        include_toc: bool,
    ) -> Result<AssembledDeck, FlashdeckError> {
        log::info!(
            "Laying out {} cards on {} pages ({} TOC pages)",
            plan.card_count,
            plan.total_pages,
            plan.toc_page_count
        );

        let mut canvas = Canvas::new();
        let mut ledger = LinkLedger::new();
        let mut toc_entries: Vec<TocEntry> = Vec::new();
        let mut formula_fallbacks = 0;

        self.draw_title_page(&mut canvas, title);
        for _ in 0..plan.toc_page_count {
            canvas.new_page();
        }

        // Layout phase
        for (position, &(front, back)) in faces.iter().enumerate() {
            let card_number = position + 1;
            log::info!(
                "Generating Card {}: Front {}, Back {}",
                card_number,
                plan.front_page(position),
                plan.back_page(position)
            );

            if include_toc {
                toc_entries.push(TocEntry {
                    label: format!("Card {}: {}", card_number, toc_label(front)),
                    target_page: plan.front_page(position),
                });
            }

            for (face, content) in [(Face::Front, front), (Face::Back, back)] {
                let page = canvas.new_page();
                let planned = plan.face_page(position, face);
                if page != planned {
                    return Err(FlashdeckError::Generation(format!(
                        "card {} {} landed on page {}, planned for page {}",
                        card_number,
                        labels.name(face),
                        page,
                        planned
                    )));
                }

                self.draw_header(&mut canvas, title, card_number, plan.card_count);
                let identifier = format!("Card {} {}", card_number, labels.name(face));
                formula_fallbacks += self.draw_content(&mut canvas, content, &identifier);

                let buttons = footer_buttons(&plan, position, face, labels.button(face));
                self.draw_footer(&mut canvas, &buttons, page, plan.total_pages);
                for button in &buttons {
                    ledger.push(button.intent(page));
                }
            }
        }

        if !toc_entries.is_empty() {
            log::info!("Generating TOC content on {} pages", plan.toc_page_count);
            self.draw_toc(&mut canvas, &plan, &toc_entries, &mut ledger)?;
        }

        if canvas.page_count() != plan.total_pages {
            return Err(FlashdeckError::Generation(format!(
                "document has {} pages, planned {}",
                canvas.page_count(),
                plan.total_pages
            )));
        }

        // Link phase
        log::info!("Adding {} links", ledger.len());
        let report = ledger.commit(&mut canvas, plan.total_pages)?;

        Ok(AssembledDeck {
            canvas,
            plan,
            report,
            title: title.to_string(),
            formula_fallbacks,
            created: Local::now().format("D:%Y%m%d%H%M%S").to_string(),
        })
    }

    fn draw_title_page(&self, canvas: &mut Canvas, title: &str) {
        let center_x = canvas.width / 2.0;
        let third = canvas.height / 3.0;

        canvas.draw_text(
            title,
            center_x,
            third,
            &TextStyle::new(FontVariant::Bold, 36.0)
                .color(Color::gray(30))
                .align(TextAlign::Center),
        );
        canvas.draw_text(
            SUBJECT,
            center_x,
            third + 40.0,
            &TextStyle::new(FontVariant::Normal, 18.0)
                .color(Color::gray(50))
                .align(TextAlign::Center),
        );

        let rule_y = third + 60.0;
        let inset = canvas.width / 4.0;
        canvas.draw_line(inset, rule_y, canvas.width - inset, rule_y, Color::gray(100), 1.5);

        canvas.draw_text(
            &format!("Generated on: {}", self.generated_on),
            center_x,
            canvas.height - MARGIN * 2.0,
            &TextStyle::new(FontVariant::Normal, 10.0)
                .color(Color::gray(100))
                .align(TextAlign::Center),
        );
    }

    fn draw_header(&self, canvas: &mut Canvas, title: &str, card_number: usize, card_count: usize) {
        let y = HEADER_Y + HEADER_HEIGHT / 2.0 + 4.0;
        let style = TextStyle::new(FontVariant::Normal, 14.0)
            .color(Color::gray(50))
            .baseline(Baseline::Middle);

        canvas.draw_text(title, MARGIN, y, &style);
        canvas.draw_text(
            &format!("Card {} / {}", card_number, card_count),
            canvas.width - MARGIN,
            y,
            &style.align(TextAlign::Right),
        );

        let rule_y = HEADER_Y + HEADER_HEIGHT;
        canvas.draw_line(MARGIN, rule_y, canvas.width - MARGIN, rule_y, Color::gray(100), THIN_LINE);
    }

    /// Draw one card face into the content band. Returns how many formulas
    /// fell back to text.
    fn draw_content(&self, canvas: &mut Canvas, content: &str, identifier: &str) -> usize {
        if content.trim().is_empty() {
            log::debug!("[{}] Content is empty", identifier);
            return 0;
        }

        let flow = TextFlow::new(CONTENT_X, CONTENT_WIDTH).with_bottom(CONTENT_BOTTOM);
        let renderer = FormulaRenderer::new(self.backend);
        let mut y = CONTENT_TOP;
        let mut fallbacks = 0;

        for seg in segment(content) {
            match seg.kind {
                SegmentKind::PlainText { html } => {
                    if !html.trim().is_empty() {
                        y = flow.flow_markup(canvas, html, y);
                    }
                }
                SegmentKind::Formula {
                    tex,
                    display,
                    original,
                } => match renderer.render(tex, display) {
                    Ok(formula) => {
                        y = self.place_formula(canvas, formula, display, y, identifier);
                    }
                    Err(e) => {
                        log::warn!("[{}] Error rendering formula {}: {}", identifier, original, e);
                        y = self.draw_formula_fallback(canvas, original, y);
                        fallbacks += 1;
                    }
                },
            }
        }

        log::debug!("[{}] Finished content at y = {:.2}", identifier, y);
        fallbacks
    }

    fn place_formula(
        &self,
        canvas: &mut Canvas,
        mut formula: RenderedFormula,
        display: bool,
        y: f64,
        identifier: &str,
    ) -> f64 {
        let max_width = if display { CONTENT_WIDTH } else { CONTENT_WIDTH - 20.0 };
        formula.fit_width(max_width);

        let x = if display {
            CONTENT_X + (CONTENT_WIDTH - formula.width) / 2.0
        } else {
            CONTENT_X + 10.0
        };
        if y + formula.height > CONTENT_BOTTOM {
            log::warn!("[{}] Formula overflows the content area", identifier);
        }

        let height = formula.height;
        canvas.draw_image(formula.image, x, y, formula.width, height);
        y + height + if display { 10.0 } else { 5.0 }
    }

    fn draw_formula_fallback(&self, canvas: &mut Canvas, original: &str, y: f64) -> f64 {
        let line_height = DEFAULT_FONT_SIZE * LINE_HEIGHT_FACTOR;
        let text = format!("[LaTeX Error: {}]", original);
        let lines = canvas.wrap_text_to_width(&text, CONTENT_WIDTH, FontVariant::Normal, DEFAULT_FONT_SIZE);
        let style = TextStyle::new(FontVariant::Normal, DEFAULT_FONT_SIZE)
            .color(Color::gray(75))
            .baseline(Baseline::Top);

        for (i, line) in lines.iter().enumerate() {
            canvas.draw_text(line, CONTENT_X, y + i as f64 * line_height, &style);
        }
        y + lines.len() as f64 * line_height + 5.0
    }

    fn draw_footer(&self, canvas: &mut Canvas, buttons: &[NavButton], page: usize, total_pages: usize) {
        canvas.draw_line(MARGIN, FOOTER_Y, canvas.width - MARGIN, FOOTER_Y, Color::gray(100), THIN_LINE);

        let shape = ShapeStyle::fill_and_stroke(Color::gray(200), Color::gray(100), THIN_LINE);
        for button in buttons {
            canvas.draw_rounded_rect(button.x, button.y, button.width, button.height, BUTTON_RADIUS, &shape);
        }

        let label_style = TextStyle::new(FontVariant::Normal, 10.0)
            .color(Color::gray(50))
            .align(TextAlign::Center)
            .baseline(Baseline::Middle);
        for button in buttons {
            let (cx, cy) = button.center();
            canvas.draw_text(&button.label, cx, cy, &label_style);
        }

        canvas.draw_text(
            &format!("Page {} / {}", page, total_pages),
            canvas.width / 2.0,
            canvas.height - MARGIN,
            &TextStyle::new(FontVariant::Normal, 9.0)
                .color(Color::gray(100))
                .align(TextAlign::Center),
        );
    }

    /// Second pass over the reserved TOC pages, once every card page exists.
    fn draw_toc(
        &self,
        canvas: &mut Canvas,
        plan: &PagePlan,
        entries: &[TocEntry],
        ledger: &mut LinkLedger,
    ) -> Result<(), FlashdeckError> {
        let title_style = TextStyle::new(FontVariant::Bold, 20.0)
            .color(Color::gray(50))
            .align(TextAlign::Center);
        let row_style = TextStyle::new(FontVariant::Normal, TOC_FONT_SIZE).color(Color::rgb8(40, 40, 220));
        let metrics = canvas.fonts().metrics(FontVariant::Normal);
        let ascent = metrics.ascender as f64 / 1000.0 * TOC_FONT_SIZE;
        let descent = metrics.descender as f64 / 1000.0 * TOC_FONT_SIZE;

        for (idx, entry) in entries.iter().enumerate() {
            let slot = toc_slot(&self.toc, idx);
            let page = plan.toc_page(slot.page_index);
            canvas.set_active_page(page)?;

            if slot.row == 0 && slot.column == 0 {
                let heading = if slot.page_index == 0 {
                    "Table of Contents"
                } else {
                    "Table of Contents (cont.)"
                };
                canvas.draw_text(heading, canvas.width / 2.0, MARGIN + 25.0, &title_style);
            }

            let lines = canvas.wrap_text_to_width(
                &entry.label,
                self.toc.column_width,
                FontVariant::Normal,
                TOC_FONT_SIZE,
            );
            let Some(first) = lines.first().filter(|line| !line.is_empty()) else {
                continue;
            };
            canvas.draw_text(first, slot.x, slot.y, &row_style);

            ledger.push(LinkIntent {
                source_page: page,
                x: slot.x,
                y: slot.y - ascent,
                width: canvas.measure_text_width(first, FontVariant::Normal, TOC_FONT_SIZE),
                height: ascent - descent,
                target_page: entry.target_page,
            });
        }

        Ok(())
    }
}
