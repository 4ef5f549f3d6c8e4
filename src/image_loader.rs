//! # Formula Image Decoding
//!
//! The rasterizer hands back PNG bytes. PDF wants raw samples instead: an RGB
//! plane for the image XObject and, when any pixel is see-through, a
//! grayscale plane for its SMask so the formula background stays transparent.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::error::FormulaError;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Pixel planes of one rasterized formula.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    /// Row-major RGB triples.
    pub rgb: Vec<u8>,
    /// One coverage byte per pixel; `None` when every pixel is opaque.
    pub alpha: Option<Vec<u8>>,
    pub width_px: u32,
    pub height_px: u32,
}

impl LoadedImage {
    fn from_rgba(rgba: &RgbaImage) -> Self {
        let (rgb, alpha): (Vec<[u8; 3]>, Vec<u8>) = rgba
            .pixels()
            .map(|p| ([p[0], p[1], p[2]], p[3]))
            .unzip();
        let opaque = alpha.iter().all(|&a| a == u8::MAX);

        LoadedImage {
            rgb: rgb.into_iter().flatten().collect(),
            alpha: (!opaque).then_some(alpha),
            width_px: rgba.width(),
            height_px: rgba.height(),
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha.is_none()
    }
}

/// Decode rasterizer output.
pub fn decode_png(data: &[u8]) -> Result<LoadedImage, FormulaError> {
    if !data.starts_with(&PNG_SIGNATURE) {
        return Err(FormulaError::Decode("rasterizer output is not a PNG".to_string()));
    }

    let decoded = image::load(Cursor::new(data), ImageFormat::Png)
        .map_err(|e| FormulaError::Decode(e.to_string()))?;
    let loaded = LoadedImage::from_rgba(&decoded.to_rgba8());

    if loaded.width_px == 0 || loaded.height_px == 0 {
        return Err(FormulaError::BadDimensions {
            width: loaded.width_px as f64,
            height: loaded.height_px as f64,
        });
    }
    Ok(loaded)
}
