//! # Drawing Surface
//!
//! A page-based canvas: pages are appended with
//! [`Canvas::new_page`], one page is active at a time, and every drawing call
//! lands on the active page. Coordinates are points with the origin at the
//! top-left corner and y growing downwards; the PDF writer flips them.
//!
//! Drawing is recorded as [`DrawCommand`]s rather than serialized straight
//! away, so earlier pages stay editable (the table of contents and the link
//! pass both go back to pages drawn long before).

use crate::error::{CanvasError, FlashdeckError};
use crate::font::{FontContext, FontVariant};
use crate::image_loader::LoadedImage;
use crate::pdf::{Metadata, PdfWriter};
use crate::text;
use std::path::Path;

/// A4 portrait width in points.
pub const A4_WIDTH: f64 = 595.28;
/// A4 portrait height in points.
pub const A4_HEIGHT: f64 = 841.89;

/// RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };

    /// Color from 8-bit channels.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Color {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Grey with the same 8-bit level on every channel.
    pub fn gray(level: u8) -> Self {
        Self::rgb8(level, level, level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Which part of the text the `y` coordinate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Baseline {
    #[default]
    Alphabetic,
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontVariant,
    pub size: f64,
    pub color: Color,
    pub align: TextAlign,
    pub baseline: Baseline,
}

impl TextStyle {
    pub fn new(font: FontVariant, size: f64) -> Self {
        TextStyle {
            font,
            size,
            color: Color::BLACK,
            align: TextAlign::Left,
            baseline: Baseline::Alphabetic,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }
}

/// Fill and stroke for rectangles and lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub line_width: f64,
}

impl ShapeStyle {
    pub fn fill_and_stroke(fill: Color, stroke: Color, line_width: f64) -> Self {
        ShapeStyle {
            fill: Some(fill),
            stroke: Some(stroke),
            line_width,
        }
    }
}

/// A recorded drawing operation. Text positions are already resolved to the
/// left edge and the alphabetic baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text {
        text: String,
        x: f64,
        y: f64,
        font: FontVariant,
        size: f64,
        color: Color,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
        style: ShapeStyle,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
        line_width: f64,
    },
    /// Index into [`Canvas::images`].
    Image {
        image: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// A committed page-jump annotation. `target_page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkAnnotation {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub target_page: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CanvasPage {
    pub commands: Vec<DrawCommand>,
    pub links: Vec<LinkAnnotation>,
}

impl CanvasPage {
    /// All text drawn on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// The document being built. Starts with one blank page, and page numbers
/// are 1-based throughout.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pages: Vec<CanvasPage>,
    active: usize,
    images: Vec<LoadedImage>,
    fonts: FontContext,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Canvas {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            pages: vec![CanvasPage::default()],
            active: 0,
            images: Vec::new(),
            fonts: FontContext::new(),
        }
    }

    /// Append a blank page and make it active. Returns its page number.
    pub fn new_page(&mut self) -> usize {
        self.pages.push(CanvasPage::default());
        self.active = self.pages.len() - 1;
        self.pages.len()
    }

    pub fn set_active_page(&mut self, page: usize) -> Result<(), CanvasError> {
        self.check_page(page)?;
        self.active = page - 1;
        Ok(())
    }

    pub fn active_page(&self) -> usize {
        self.active + 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[CanvasPage] {
        &self.pages
    }

    pub fn page(&self, page: usize) -> Option<&CanvasPage> {
        page.checked_sub(1).and_then(|idx| self.pages.get(idx))
    }

    pub fn images(&self) -> &[LoadedImage] {
        &self.images
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    pub fn measure_text_width(&self, text: &str, font: FontVariant, size: f64) -> f64 {
        self.fonts.measure_string(text, font, size)
    }

    /// Split `text` into lines no wider than `max_width`.
    pub fn wrap_text_to_width(
        &self,
        text: &str,
        max_width: f64,
        font: FontVariant,
        size: f64,
    ) -> Vec<String> {
        text::wrap_text_to_width(&self.fonts, text, max_width, font, size)
    }

    pub fn draw_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        let width = self.measure_text_width(text, style.font, style.size);
        let left = match style.align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let metrics = self.fonts.metrics(style.font);
        let ascent = metrics.ascender as f64 / 1000.0 * style.size;
        let descent = metrics.descender as f64 / 1000.0 * style.size;
        let baseline_y = match style.baseline {
            Baseline::Alphabetic => y,
            Baseline::Top => y + ascent,
            Baseline::Middle => y + (ascent + descent) / 2.0,
            Baseline::Bottom => y + descent,
        };
        self.current_page_mut().commands.push(DrawCommand::Text {
            text: text.to_string(),
            x: left,
            y: baseline_y,
            font: style.font,
            size: style.size,
            color: style.color,
        });
    }

    pub fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, style: &ShapeStyle) {
        self.draw_rounded_rect(x, y, width, height, 0.0, style);
    }

    pub fn draw_rounded_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
        style: &ShapeStyle,
    ) {
        self.current_page_mut().commands.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            radius,
            style: *style,
        });
    }

    pub fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color, line_width: f64) {
        self.current_page_mut().commands.push(DrawCommand::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            line_width,
        });
    }

    pub fn draw_image(&mut self, image: LoadedImage, x: f64, y: f64, width: f64, height: f64) {
        let index = self.images.len();
        self.images.push(image);
        self.current_page_mut().commands.push(DrawCommand::Image {
            image: index,
            x,
            y,
            width,
            height,
        });
    }

    /// Attach a page-jump annotation to the active page.
    pub fn add_link_annotation(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        target_page: usize,
    ) -> Result<(), CanvasError> {
        self.check_page(target_page)?;
        self.current_page_mut().links.push(LinkAnnotation {
            x,
            y,
            width,
            height,
            target_page,
        });
        Ok(())
    }

    /// Serialize the document to PDF bytes.
    pub fn to_pdf_bytes(&self, metadata: &Metadata) -> Vec<u8> {
        PdfWriter::new().write(self, metadata)
    }

    /// Serialize and write the document to `path`.
    pub fn save(&self, path: impl AsRef<Path>, metadata: &Metadata) -> Result<usize, FlashdeckError> {
        let bytes = self.to_pdf_bytes(metadata);
        std::fs::write(path.as_ref(), &bytes)?;
        Ok(bytes.len())
    }

    fn check_page(&self, page: usize) -> Result<(), CanvasError> {
        if page == 0 || page > self.pages.len() {
            return Err(CanvasError::PageOutOfRange {
                page,
                page_count: self.pages.len(),
            });
        }
        Ok(())
    }

    fn current_page_mut(&mut self) -> &mut CanvasPage {
        &mut self.pages[self.active]
    }
}
