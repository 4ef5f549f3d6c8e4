//! Integration tests for the flashdeck pipeline.
//!
//! These tests drive the public API from card text to PDF bytes with a stand-in
//! math engine. They verify:
//! - Page counts and page order (title, TOC, card faces)
//! - Every committed link lands where the navigation rules say
//! - TOC rows spill onto continuation pages
//! - A failing formula never stops the rest of the card
//! - PDF output is structurally valid and carries the link annotations

use flashdeck::canvas::LinkAnnotation;
use flashdeck::error::FormulaError;
use flashdeck::math::TypesetFormula;
use flashdeck::plan::Face;
use flashdeck::{AssembledDeck, Deck, DeckAssembler, DeckOptions, FlashdeckError, MathBackend, TemplateOptions};

// ─── Helpers ────────────────────────────────────────────────────

/// Typesets every formula as 6x2ex; anything containing `\undefined` fails.
struct FakeMath;

impl MathBackend for FakeMath {
    fn typeset(&self, tex: &str, _display: bool) -> Result<TypesetFormula, FormulaError> {
        if tex.contains("\\undefined") {
            return Err(FormulaError::Typeset("Undefined control sequence".to_string()));
        }
        Ok(TypesetFormula {
            svg: format!("<svg width=\"6ex\" height=\"2ex\"><!-- {} --></svg>", tex),
            width_ex: 6.0,
            height_ex: 2.0,
        })
    }

    fn rasterize(&self, _svg: &str, width_px: u32, height_px: u32) -> Result<Vec<u8>, FormulaError> {
        let img = image::RgbaImage::from_pixel(width_px, height_px, image::Rgba([0, 0, 0, 255]));
        let mut buf = Vec::new();
        image::ImageEncoder::write_image(
            image::codecs::png::PngEncoder::new(&mut buf),
            img.as_raw(),
            width_px,
            height_px,
            image::ColorType::Rgba8,
        )
        .map_err(|e| FormulaError::Rasterize(e.to_string()))?;
        Ok(buf)
    }

    fn check_available(&self) -> Result<(), FlashdeckError> {
        Ok(())
    }
}

struct MissingEngines;

impl MathBackend for MissingEngines {
    fn typeset(&self, _tex: &str, _display: bool) -> Result<TypesetFormula, FormulaError> {
        Err(FormulaError::Typeset("no engine".to_string()))
    }

    fn rasterize(&self, _svg: &str, _w: u32, _h: u32) -> Result<Vec<u8>, FormulaError> {
        Err(FormulaError::Rasterize("no engine".to_string()))
    }

    fn check_available(&self) -> Result<(), FlashdeckError> {
        Err(FlashdeckError::RenderDependencyMissing {
            engine: "tex2svg".to_string(),
            reason: "not found on PATH".to_string(),
        })
    }
}

fn numbered_deck(count: usize) -> Deck {
    let text: String = (0..count).map(|i| format!("front {}\tback {}\n", i, i)).collect();
    Deck::parse(&text).unwrap()
}

fn assemble(deck: &Deck, options: &DeckOptions) -> AssembledDeck {
    DeckAssembler::new(&FakeMath)
        .with_generated_on("2026-10-16")
        .assemble(deck, options)
        .unwrap()
}

fn texts(deck: &AssembledDeck, page: usize) -> Vec<String> {
    deck.canvas.page(page).unwrap().texts().map(str::to_string).collect()
}

fn links(deck: &AssembledDeck, page: usize) -> Vec<LinkAnnotation> {
    deck.canvas.page(page).unwrap().links.clone()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(bytes.windows(5).any(|w| w == b"%%EOF"), "Missing %%EOF marker");
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Missing xref table");
    assert!(bytes.windows(7).any(|w| w == b"trailer"), "Missing trailer");
}

fn count_occurrences(bytes: &[u8], needle: &[u8]) -> usize {
    bytes.windows(needle.len()).filter(|w| *w == needle).count()
}

// ─── Page Plan Tests ────────────────────────────────────────────

#[test]
fn test_page_count_without_toc() {
    let out = assemble(&numbered_deck(4), &DeckOptions::default());
    assert_eq!(out.plan.page_offset, 1);
    assert_eq!(out.canvas.page_count(), 9);
    assert_eq!(texts(&out, 9).iter().filter(|t| *t == "Page 9 / 9").count(), 1);
}

#[test]
fn test_card_faces_follow_processing_order() {
    let out = assemble(&numbered_deck(3), &DeckOptions::default());
    for pos in 0..3 {
        let front = texts(&out, out.plan.front_page(pos));
        let back = texts(&out, out.plan.back_page(pos));
        assert!(front.contains(&pos.to_string()), "front of card {} missing its text", pos);
        assert!(front.contains(&format!("Card {} / 3", pos + 1)));
        assert!(back.contains(&"back".to_string()));
    }
}

#[test]
fn test_toc_spills_onto_continuation_page() {
    let options = DeckOptions {
        include_toc: true,
        ..DeckOptions::default()
    };
    let out = assemble(&numbered_deck(100), &options);
    assert_eq!(out.plan.toc_page_count, 2);
    assert_eq!(out.canvas.page_count(), 1 + 2 + 200);

    let first = texts(&out, 2);
    assert_eq!(first[0], "Table of Contents");
    assert_eq!(links(&out, 2).len(), 82);

    let second = texts(&out, 3);
    assert_eq!(second[0], "Table of Contents (cont.)");
    assert_eq!(second[1], "Card 83: front 82");
    let second_links = links(&out, 3);
    assert_eq!(second_links.len(), 18);
    assert_eq!(second_links[0].target_page, out.plan.front_page(82));
}

// ─── Navigation Tests ───────────────────────────────────────────

#[test]
fn test_navigation_round_trip() {
    let options = DeckOptions {
        include_toc: true,
        ..DeckOptions::default()
    };
    let out = assemble(&numbered_deck(5), &options);
    let plan = out.plan;

    for pos in 0..5 {
        for face in [Face::Front, Face::Back] {
            let page = plan.face_page(pos, face);
            let mut targets: Vec<(usize, Face)> = links(&out, page)
                .iter()
                .map(|l| plan.card_at(l.target_page).unwrap())
                .collect();
            targets.sort_by_key(|(p, f)| (*p, *f == Face::Back));

            let mut expected = vec![(pos, face.other())];
            if pos > 0 {
                expected.push((pos - 1, Face::Front));
            }
            if pos < 4 {
                expected.push((pos + 1, Face::Front));
            }
            expected.sort_by_key(|(p, f)| (*p, *f == Face::Back));

            assert_eq!(targets, expected, "links on page {}", page);
        }
    }
}

#[test]
fn test_links_sit_inside_the_page() {
    let out = assemble(&numbered_deck(3), &DeckOptions::default());
    for page in out.canvas.pages() {
        for link in &page.links {
            assert!(link.x >= 0.0 && link.x + link.width <= out.canvas.width);
            assert!(link.y >= 0.0 && link.y + link.height <= out.canvas.height);
        }
    }
    assert_eq!(out.report.dropped, 0);
}

#[test]
fn test_randomized_order_keeps_links_consistent() {
    let options = DeckOptions {
        randomize: true,
        seed: Some(2026),
        include_toc: true,
        ..DeckOptions::default()
    };
    let out = assemble(&numbered_deck(30), &options);
    // The TOC row for each card must point at the page showing that card.
    for (row, link) in links(&out, 2).iter().enumerate() {
        let label = &texts(&out, 2)[row + 1];
        let front_text = label.split(": ").nth(1).unwrap();
        let word = front_text.split(' ').nth(1).unwrap();
        assert!(texts(&out, link.target_page).contains(&word.to_string()));
    }
}

// ─── Content Tests ──────────────────────────────────────────────

#[test]
fn test_failed_formula_does_not_stop_following_text() {
    let deck = Deck::parse("Start \\(\\undefined{x}\\) middle \\[y^2\\] end").unwrap();
    let out = assemble(&deck, &DeckOptions::default());
    assert_eq!(out.formula_fallbacks, 1);

    let front = texts(&out, 2);
    assert!(front.contains(&"[LaTeX Error: \\(\\undefined{x}\\)]".to_string()));
    assert!(front.contains(&"middle".to_string()));
    assert!(front.contains(&"end".to_string()));
    assert_eq!(out.canvas.images().len(), 1);
}

#[test]
fn test_markup_and_entities_survive_to_page() {
    let deck = Deck::parse("<b>H&lt;sub&gt;2</b>O<br>water\tliquid").unwrap();
    let out = assemble(&deck, &DeckOptions::default());
    let front = texts(&out, 2);
    assert!(front.contains(&"H<sub>2".to_string()));
    assert!(front.contains(&"O".to_string()));
    assert!(front.contains(&"water".to_string()));
}

#[test]
fn test_comparisons_stay_on_page_and_in_toc() {
    let deck = Deck::parse("if a < b and c > d then\tx < 3, y > 2").unwrap();
    let options = DeckOptions {
        include_toc: true,
        ..DeckOptions::default()
    };
    let out = assemble(&deck, &options);

    let toc = texts(&out, 2);
    assert_eq!(toc[1], "Card 1: if a < b and c > d then");

    let front = texts(&out, 3).concat();
    assert!(front.contains("if a < b and c > d then"));
    let back = texts(&out, 4).concat();
    assert!(back.contains("x < 3, y > 2"));
}

// ─── Input and Options Tests ────────────────────────────────────

#[test]
fn test_file_import_delete_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("words.tsv");
    std::fs::write(&input, "one\t1\ntwo\t2\nthree\t3\n").unwrap();

    let mut deck = Deck::from_path(&input).unwrap();
    assert_eq!(deck.delete(1).map(|c| c.front), Some("two".to_string()));
    assert!(deck.delete(1).is_none());

    let options = DeckOptions {
        title: "Numbers".to_string(),
        ..DeckOptions::default()
    };
    let out = assemble(&deck, &options);
    assert_eq!(out.canvas.page_count(), 5);

    let path = dir.path().join(options.output_filename());
    let written = out.canvas.save(&path, &out.metadata()).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), written);
    assert!(path.ends_with("numbers.pdf"));
    assert_valid_pdf(&bytes);
}

#[test]
fn test_missing_engine_is_reported_before_generation() {
    let err = flashdeck::render_deck(&numbered_deck(2), &DeckOptions::default(), &MissingEngines).unwrap_err();
    assert!(matches!(err, FlashdeckError::RenderDependencyMissing { .. }));
    assert!(err.to_string().contains("tex2svg"));
}

// ─── Template Tests ─────────────────────────────────────────────

#[test]
fn test_template_mode() {
    let options = TemplateOptions {
        title: "Blank Deck".to_string(),
        card_count: 3,
    };
    let out = DeckAssembler::new(&FakeMath).assemble_template(&options).unwrap();
    assert_eq!(out.canvas.page_count(), 7);
    assert_eq!(out.report.committed, 14);

    let front = texts(&out, 2);
    assert!(front.contains(&"Show Answer".to_string()));
    assert!(front.contains(&"Card 1 / 3".to_string()));
    assert_eq!(links(&out, 2).iter().map(|l| l.target_page).collect::<Vec<_>>(), vec![3, 4]);
}

#[test]
fn test_template_count_out_of_range() {
    let options = TemplateOptions {
        card_count: 501,
        ..TemplateOptions::default()
    };
    let err = flashdeck::render_template(&options, &FakeMath).unwrap_err();
    assert!(matches!(err, FlashdeckError::Config(_)));
}

// ─── PDF Output Tests ───────────────────────────────────────────

#[test]
fn test_pdf_contains_every_committed_link() {
    let options = DeckOptions {
        include_toc: true,
        title: "Linked".to_string(),
        ..DeckOptions::default()
    };
    let out = assemble(&numbered_deck(4), &options);
    let bytes = out.to_pdf_bytes();
    assert_valid_pdf(&bytes);

    // 4 TOC rows + footer links (2 + 3 + 3 + 2 per face pair)
    assert_eq!(out.report.committed, 4 + 20);
    assert_eq!(count_occurrences(&bytes, b"/Subtype /Link"), out.report.committed);
    assert_eq!(count_occurrences(&bytes, b"/Type /Page "), out.plan.total_pages);
    assert!(count_occurrences(&bytes, b"/Title (Linked)") == 1);
}

#[test]
fn test_pdf_with_formula_embeds_image() {
    let deck = Deck::parse("\\(a+b\\)\tsum").unwrap();
    let bytes = flashdeck::render_deck(&deck, &DeckOptions::default(), &FakeMath).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(count_occurrences(&bytes, b"/Subtype /Image"), 1);
}
