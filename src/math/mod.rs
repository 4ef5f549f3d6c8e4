//! # Formula Rendering
//!
//! Formulas go through two external steps: a typesetter turns TeX into SVG
//! (sized in `ex`), and a rasterizer turns that SVG into PNG. Both sit behind
//! [`MathBackend`] so generation can run against real tools
//! ([`CommandBackend`]) or a stand-in.
//!
//! [`FormulaRenderer`] converts the typesetter's `ex` units to points, renders
//! the raster at a multiple of the point size for print sharpness and decodes
//! the result into an embeddable image. Nothing is cached; each occurrence of
//! a formula is rendered on its own.

mod command;

pub use command::{svg_ex_dimensions, CommandBackend};

use crate::error::{FlashdeckError, FormulaError};
use crate::image_loader::{decode_png, LoadedImage};
use crate::text::DEFAULT_FONT_SIZE;

/// Points per `ex` at the card font size.
pub const EX_TO_PT: f64 = DEFAULT_FONT_SIZE / 2.0;
/// Raster pixels per point.
pub const RASTER_SCALE: f64 = 4.0;

/// Typesetter output: SVG markup plus its size in `ex`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypesetFormula {
    pub svg: String,
    pub width_ex: f64,
    pub height_ex: f64,
}

/// The external typesetting and rasterizing engines.
pub trait MathBackend {
    /// Typeset `tex` as SVG, in display or inline style.
    fn typeset(&self, tex: &str, display: bool) -> Result<TypesetFormula, FormulaError>;

    /// Render `svg` to PNG bytes at exactly `width_px` x `height_px`.
    fn rasterize(&self, svg: &str, width_px: u32, height_px: u32) -> Result<Vec<u8>, FormulaError>;

    /// Fails with [`FlashdeckError::RenderDependencyMissing`] when an engine
    /// cannot be reached. Checked once before generation starts.
    fn check_available(&self) -> Result<(), FlashdeckError>;
}

/// A formula ready to place: image plus its size on the page in points.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFormula {
    pub image: LoadedImage,
    pub width: f64,
    pub height: f64,
}

impl RenderedFormula {
    /// Shrink proportionally so the width is at most `max_width`.
    pub fn fit_width(&mut self, max_width: f64) {
        if self.width > max_width && self.width > 0.0 {
            let scale = max_width / self.width;
            self.width *= scale;
            self.height *= scale;
        }
    }
}

pub struct FormulaRenderer<'a> {
    backend: &'a dyn MathBackend,
    ex_to_pt: f64,
    raster_scale: f64,
}

impl<'a> FormulaRenderer<'a> {
    pub fn new(backend: &'a dyn MathBackend) -> Self {
        FormulaRenderer {
            backend,
            ex_to_pt: EX_TO_PT,
            raster_scale: RASTER_SCALE,
        }
    }

    pub fn render(&self, tex: &str, display: bool) -> Result<RenderedFormula, FormulaError> {
        let typeset = self.backend.typeset(tex, display)?;
        let width = typeset.width_ex * self.ex_to_pt;
        let height = typeset.height_ex * self.ex_to_pt;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(FormulaError::BadDimensions { width, height });
        }

        let width_px = (width * self.raster_scale).round().max(1.0) as u32;
        let height_px = (height * self.raster_scale).round().max(1.0) as u32;
        log::debug!(
            "Rasterizing {} formula at {}x{}px ({:.2}x{:.2}pt)",
            if display { "display" } else { "inline" },
            width_px,
            height_px,
            width,
            height
        );
        let png = self.backend.rasterize(&typeset.svg, width_px, height_px)?;
        let image = decode_png(&png)?;

        Ok(RenderedFormula { image, width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 0]));
        let mut buf = Vec::new();
        image::ImageEncoder::write_image(
            image::codecs::png::PngEncoder::new(&mut buf),
            img.as_raw(),
            width,
            height,
            image::ColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    struct Recording {
        size_ex: (f64, f64),
        raster_calls: RefCell<Vec<(u32, u32)>>,
    }

    impl MathBackend for Recording {
        fn typeset(&self, tex: &str, _display: bool) -> Result<TypesetFormula, FormulaError> {
            if tex.contains("\\bad") {
                return Err(FormulaError::Typeset("Undefined control sequence".into()));
            }
            Ok(TypesetFormula {
                svg: "<svg/>".into(),
                width_ex: self.size_ex.0,
                height_ex: self.size_ex.1,
            })
        }

        fn rasterize(&self, _svg: &str, width_px: u32, height_px: u32) -> Result<Vec<u8>, FormulaError> {
            self.raster_calls.borrow_mut().push((width_px, height_px));
            Ok(png_bytes(width_px, height_px))
        }

        fn check_available(&self) -> Result<(), FlashdeckError> {
            Ok(())
        }
    }

    fn backend(width_ex: f64, height_ex: f64) -> Recording {
        Recording {
            size_ex: (width_ex, height_ex),
            raster_calls: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_ex_units_scaled_to_points() {
        let b = backend(5.0, 2.5);
        let rendered = FormulaRenderer::new(&b).render("x^2", false).unwrap();
        assert!((rendered.width - 40.0).abs() < 1e-9);
        assert!((rendered.height - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_raster_is_oversampled() {
        let b = backend(5.0, 2.5);
        let rendered = FormulaRenderer::new(&b).render("x^2", true).unwrap();
        assert_eq!(*b.raster_calls.borrow(), vec![(160, 80)]);
        assert_eq!(rendered.image.width_px, 160);
        assert_eq!(rendered.image.height_px, 80);
    }

    #[test]
    fn test_typeset_error_propagates() {
        let b = backend(5.0, 2.5);
        let err = FormulaRenderer::new(&b).render("\\bad", false).unwrap_err();
        assert!(matches!(err, FormulaError::Typeset(_)));
        assert!(b.raster_calls.borrow().is_empty());
    }

    #[test]
    fn test_zero_size_rejected() {
        let b = backend(0.0, 2.0);
        let err = FormulaRenderer::new(&b).render("x", false).unwrap_err();
        assert!(matches!(err, FormulaError::BadDimensions { .. }));
    }

    #[test]
    fn test_fit_width_scales_proportionally() {
        let mut rendered = RenderedFormula {
            image: decode_png(&png_bytes(1, 1)).unwrap(),
            width: 600.0,
            height: 30.0,
        };
        rendered.fit_width(300.0);
        assert!((rendered.width - 300.0).abs() < 1e-9);
        assert!((rendered.height - 15.0).abs() < 1e-9);

        rendered.fit_width(500.0);
        assert!((rendered.width - 300.0).abs() < 1e-9);
    }
}
