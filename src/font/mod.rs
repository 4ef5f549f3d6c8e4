//! # Font Management
//!
//! The deck uses a single base family, Helvetica, in four variants. These are
//! standard PDF fonts, so nothing is embedded: the writer only needs the PDF
//! name, and layout only needs the advance widths.

pub mod metrics;

pub use metrics::StandardFontMetrics;

/// Font variant selected from a run's bold/italic flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FontVariant {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl FontVariant {
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => FontVariant::BoldItalic,
            (true, false) => FontVariant::Bold,
            (false, true) => FontVariant::Italic,
            (false, false) => FontVariant::Normal,
        }
    }

    /// The standard PDF face backing this variant.
    pub fn standard_font(self) -> StandardFont {
        match self {
            FontVariant::Normal => StandardFont::Helvetica,
            FontVariant::Bold => StandardFont::HelveticaBold,
            FontVariant::Italic => StandardFont::HelveticaOblique,
            FontVariant::BoldItalic => StandardFont::HelveticaBoldOblique,
        }
    }

    pub const ALL: [FontVariant; 4] = [
        FontVariant::Normal,
        FontVariant::Bold,
        FontVariant::Italic,
        FontVariant::BoldItalic,
    ];
}

/// The Helvetica members of the 14 standard PDF fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }
}

/// Text measurement shared by layout and the canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, variant: FontVariant, font_size: f64) -> f64 {
        variant.standard_font().metrics().char_width(ch, font_size)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, variant: FontVariant, font_size: f64) -> f64 {
        variant.standard_font().metrics().measure_string(text, font_size)
    }

    pub fn metrics(&self, variant: FontVariant) -> StandardFontMetrics {
        variant.standard_font().metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::new();
        let w = ctx.char_width(' ', FontVariant::Normal, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = ctx.char_width('A', FontVariant::Normal, 12.0);
        let bold = ctx.char_width('A', FontVariant::Bold, 12.0);
        assert!(bold > regular, "Bold A should be wider than regular A");
    }

    #[test]
    fn test_oblique_shares_upright_widths() {
        let ctx = FontContext::new();
        let upright = ctx.measure_string("Flashcards", FontVariant::Bold, 16.0);
        let slanted = ctx.measure_string("Flashcards", FontVariant::BoldItalic, 16.0);
        assert!((upright - slanted).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_char_uses_default_width() {
        let ctx = FontContext::new();
        let w = ctx.char_width('\u{4E2D}', FontVariant::Normal, 10.0);
        assert!((w - 5.56).abs() < 0.001);
    }

    #[test]
    fn test_variant_from_flags() {
        assert_eq!(FontVariant::from_flags(false, false), FontVariant::Normal);
        assert_eq!(FontVariant::from_flags(true, true), FontVariant::BoldItalic);
        assert_eq!(
            FontVariant::from_flags(false, true).standard_font().pdf_name(),
            "Helvetica-Oblique"
        );
    }
}
