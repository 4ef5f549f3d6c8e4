//! # PDF Serializer
//!
//! Takes the recorded pages of a [`Canvas`] and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. The subset a flashcard deck needs
//! is small: Type1 references to the standard Helvetica faces, Flate
//! compressed content streams, RGB image XObjects with an alpha SMask, and
//! `/Link` annotations with `/Dest` page jumps.
//!
//! ## Object layout
//!
//! ```text
//! 1          Catalog
//! 2          Pages (page tree root)
//! 3..        fonts, then image XObjects
//! base+2i    content stream of page i
//! base+2i+1  page object of page i
//! ..         link annotations, in page order
//! last       Info dictionary
//! ```
//!
//! Page object ids are fixed before any page is written, so an annotation on
//! page 1 can point at page 200.

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use crate::canvas::{Canvas, CanvasPage, DrawCommand, LinkAnnotation, ShapeStyle};
use crate::font::FontVariant;
use crate::image_loader::LoadedImage;
use miniz_oxide::deflate::compress_to_vec_zlib;

/// Document information dictionary entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub subject: Option<String>,
    /// Already in PDF date format, e.g. `D:20261016093000`.
    pub creation_date: Option<String>,
}

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font variant -> object id, in resource order (/F0, /F1, ...).
    font_objects: Vec<(FontVariant, usize)>,
    /// XObject id per canvas image, indexed as /Im0, /Im1, ...
    image_objects: Vec<usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write the canvas pages to a PDF byte vector.
    pub fn write(&self, canvas: &Canvas, metadata: &Metadata) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            image_objects: Vec::new(),
        };

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        for _ in 0..3 {
            builder.objects.push(PdfObject { data: vec![] });
        }

        self.register_fonts(&mut builder, canvas.pages());
        self.register_images(&mut builder, canvas.images());

        let pages = canvas.pages();
        let first_page_obj = builder.objects.len();
        let page_obj_id = |page_idx: usize| first_page_obj + page_idx * 2 + 1;
        let mut next_annot_id = first_page_obj + pages.len() * 2;
        let mut annotations: Vec<Vec<u8>> = Vec::new();
        let mut page_obj_ids: Vec<usize> = Vec::with_capacity(pages.len());

        for (page_idx, page) in pages.iter().enumerate() {
            let content = self.build_content_stream(page, canvas.height, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_obj_id = builder.objects.len();
            debug_assert_eq!(content_obj_id, first_page_obj + page_idx * 2);
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            builder.objects.push(PdfObject { data: content_data });

            let mut annot_ids = Vec::with_capacity(page.links.len());
            for link in &page.links {
                annot_ids.push(next_annot_id);
                next_annot_id += 1;
                let dest = page_obj_id(link.target_page - 1);
                annotations.push(self.link_annotation(link, canvas.height, dest).into_bytes());
            }

            let font_resources = self.build_font_resource_dict(&builder.font_objects);
            let xobject_resources = self.build_xobject_resource_dict(page, &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!("/Font << {} >> /XObject << {} >>", font_resources, xobject_resources)
            };
            let annots = if annot_ids.is_empty() {
                String::new()
            } else {
                let refs: Vec<String> = annot_ids.iter().map(|id| format!("{} 0 R", id)).collect();
                format!(" /Annots [{}]", refs.join(" "))
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >>{} >>",
                canvas.width, canvas.height, content_obj_id, resources, annots
            );
            page_obj_ids.push(builder.objects.len());
            builder.objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
        }

        for data in annotations {
            builder.objects.push(PdfObject { data });
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = builder.objects.len();
        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::encode_text(title));
        }
        if let Some(ref subject) = metadata.subject {
            let _ = write!(info, "/Subject ({}) ", Self::encode_text(subject));
        }
        if let Some(ref date) = metadata.creation_date {
            let _ = write!(info, "/CreationDate ({}) ", Self::encode_text(date));
        }
        info.push_str("/Producer (flashdeck) /Creator (flashdeck) >>");
        builder.objects.push(PdfObject {
            data: info.into_bytes(),
        });

        self.serialize(&builder, info_obj_id)
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(&self, page: &CanvasPage, page_height: f64, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for command in &page.commands {
            self.write_command(&mut stream, command, page_height, builder);
        }
        stream
    }

    /// Write a single draw command as PDF operators.
    fn write_command(&self, stream: &mut String, command: &DrawCommand, page_height: f64, builder: &PdfBuilder) {
        match command {
            DrawCommand::Text {
                text,
                x,
                y,
                font,
                size,
                color,
            } => {
                let font_idx = self.font_index(*font, &builder.font_objects);
                let _ = write!(
                    stream,
                    "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
                    color.r,
                    color.g,
                    color.b,
                    font_idx,
                    size,
                    x,
                    page_height - y,
                    Self::encode_text(text)
                );
            }

            DrawCommand::Rect {
                x,
                y,
                width,
                height,
                radius,
                style,
            } => {
                let paint = match Self::paint_operator(style) {
                    Some(op) => op,
                    None => return,
                };
                let pdf_y = page_height - y - height;
                stream.push_str("q\n");
                self.write_shape_style(stream, style);
                if *radius > 0.0 {
                    self.write_rounded_rect(stream, *x, pdf_y, *width, *height, *radius);
                } else {
                    let _ = writeln!(stream, "{:.2} {:.2} {:.2} {:.2} re", x, pdf_y, width, height);
                }
                let _ = write!(stream, "{}\nQ\n", paint);
            }

            DrawCommand::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                line_width,
            } => {
                let _ = write!(
                    stream,
                    "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    color.r,
                    color.g,
                    color.b,
                    line_width,
                    x1,
                    page_height - y1,
                    x2,
                    page_height - y2
                );
            }

            DrawCommand::Image {
                image,
                x,
                y,
                width,
                height,
            } => {
                let _ = write!(
                    stream,
                    "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                    width,
                    height,
                    x,
                    page_height - y - height,
                    image
                );
            }
        }
    }

    fn paint_operator(style: &ShapeStyle) -> Option<&'static str> {
        match (style.fill.is_some(), style.stroke.is_some()) {
            (true, true) => Some("B"),
            (true, false) => Some("f"),
            (false, true) => Some("S"),
            (false, false) => None,
        }
    }

    fn write_shape_style(&self, stream: &mut String, style: &ShapeStyle) {
        if let Some(fill) = style.fill {
            let _ = writeln!(stream, "{:.3} {:.3} {:.3} rg", fill.r, fill.g, fill.b);
        }
        if let Some(stroke) = style.stroke {
            let _ = write!(
                stream,
                "{:.3} {:.3} {:.3} RG\n{:.2} w\n",
                stroke.r, stroke.g, stroke.b, style.line_width
            );
        }
    }

    fn write_rounded_rect(&self, stream: &mut String, x: f64, y: f64, w: f64, h: f64, radius: f64) {
        let k = 0.5522847498;
        let r = radius.min(w / 2.0).min(h / 2.0);

        let _ = writeln!(stream, "{:.2} {:.2} m", x + r, y);
        let _ = writeln!(stream, "{:.2} {:.2} l", x + w - r, y);
        let _ = writeln!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            x + w - r + r * k,
            y,
            x + w,
            y + r - r * k,
            x + w,
            y + r
        );
        let _ = writeln!(stream, "{:.2} {:.2} l", x + w, y + h - r);
        let _ = writeln!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            x + w,
            y + h - r + r * k,
            x + w - r + r * k,
            y + h,
            x + w - r,
            y + h
        );
        let _ = writeln!(stream, "{:.2} {:.2} l", x + r, y + h);
        let _ = writeln!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            x + r - r * k,
            y + h,
            x,
            y + h - r + r * k,
            x,
            y + h - r
        );
        let _ = writeln!(stream, "{:.2} {:.2} l", x, y + r);
        let _ = writeln!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            x,
            y + r - r * k,
            x + r - r * k,
            y,
            x + r,
            y
        );
        stream.push_str("h\n");
    }

    /// A `/Link` annotation jumping to the page object `dest_obj_id`.
    fn link_annotation(&self, link: &LinkAnnotation, page_height: f64, dest_obj_id: usize) -> String {
        format!(
            "<< /Type /Annot /Subtype /Link /Rect [{:.2} {:.2} {:.2} {:.2}] \
             /Border [0 0 0] /Dest [{} 0 R /XYZ null null null] >>",
            link.x,
            page_height - link.y - link.height,
            link.x + link.width,
            page_height - link.y,
            dest_obj_id
        )
    }

    /// Register one Type1 font object per variant used anywhere in the document.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[CanvasPage]) {
        let mut used: BTreeSet<FontVariant> = BTreeSet::new();
        for page in pages {
            for command in &page.commands {
                if let DrawCommand::Text { font, .. } = command {
                    used.insert(*font);
                }
            }
        }

        // Always have at least Helvetica
        if used.is_empty() {
            used.insert(FontVariant::Normal);
        }

        for variant in used {
            let obj_id = builder.objects.len();
            let font_dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                 /Encoding /WinAnsiEncoding >>",
                variant.standard_font().pdf_name()
            );
            builder.objects.push(PdfObject {
                data: font_dict.into_bytes(),
            });
            builder.font_objects.push((variant, obj_id));
        }
    }

    /// Create the XObject PDF objects for every image on the canvas.
    fn register_images(&self, builder: &mut PdfBuilder, images: &[LoadedImage]) {
        for image in images {
            let xobj_id = Self::write_image_xobject(builder, image);
            builder.image_objects.push(xobj_id);
        }
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        // Write SMask first if alpha channel exists
        let smask_id = image.alpha.as_ref().map(|alpha_data| {
            let compressed_alpha = compress_to_vec_zlib(alpha_data, 6);
            let smask_obj_id = builder.objects.len();
            let mut smask_data: Vec<u8> = Vec::new();
            let _ = write!(
                smask_data,
                "<< /Type /XObject /Subtype /Image \
                 /Width {} /Height {} \
                 /ColorSpace /DeviceGray \
                 /BitsPerComponent 8 \
                 /Filter /FlateDecode \
                 /Length {} >>\nstream\n",
                image.width_px,
                image.height_px,
                compressed_alpha.len()
            );
            smask_data.extend_from_slice(&compressed_alpha);
            smask_data.extend_from_slice(b"\nendstream");
            builder.objects.push(PdfObject { data: smask_data });
            smask_obj_id
        });

        let compressed_rgb = compress_to_vec_zlib(&image.rgb, 6);
        let obj_id = builder.objects.len();
        let smask_ref = smask_id
            .map(|id| format!(" /SMask {} 0 R", id))
            .unwrap_or_default();

        let mut obj_data: Vec<u8> = Vec::new();
        let _ = write!(
            obj_data,
            "<< /Type /XObject /Subtype /Image \
             /Width {} /Height {} \
             /ColorSpace /DeviceRGB \
             /BitsPerComponent 8 \
             /Filter /FlateDecode \
             /Length {}{} >>\nstream\n",
            image.width_px,
            image.height_px,
            compressed_rgb.len(),
            smask_ref
        );
        obj_data.extend_from_slice(&compressed_rgb);
        obj_data.extend_from_slice(b"\nendstream");
        builder.objects.push(PdfObject { data: obj_data });
        obj_id
    }

    /// Build the /XObject resource dict entries for the images drawn on a page.
    fn build_xobject_resource_dict(&self, page: &CanvasPage, builder: &PdfBuilder) -> String {
        let used: BTreeSet<usize> = page
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image { image, .. } => Some(*image),
                _ => None,
            })
            .collect();
        used.iter()
            .filter_map(|&idx| builder.image_objects.get(idx).map(|obj_id| (idx, obj_id)))
            .map(|(idx, obj_id)| format!("/Im{} {} 0 R", idx, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_font_resource_dict(&self, font_objects: &[(FontVariant, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Look up the font index (/F0, /F1, etc.) for a variant.
    fn font_index(&self, variant: FontVariant, font_objects: &[(FontVariant, usize)]) -> usize {
        font_objects
            .iter()
            .position(|(v, _)| *v == variant)
            .unwrap_or(0)
    }

    /// Encode a string as the body of a PDF literal string in WinAnsiEncoding.
    fn encode_text(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    // Octal escape for bytes outside ASCII printable range
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// contains special mappings for smart quotes, bullets, dashes, etc.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82), // Single low-9 quotation mark
            0x0192 => Some(0x83), // Latin small letter f with hook
            0x201E => Some(0x84), // Double low-9 quotation mark
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86), // Dagger
            0x2021 => Some(0x87), // Double dagger
            0x02C6 => Some(0x88), // Modifier letter circumflex accent
            0x2030 => Some(0x89), // Per mille sign
            0x0160 => Some(0x8A), // Latin capital letter S with caron
            0x2039 => Some(0x8B), // Single left-pointing angle quotation
            0x0152 => Some(0x8C), // Latin capital ligature OE
            0x017D => Some(0x8E), // Latin capital letter Z with caron
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98), // Small tilde
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A), // Latin small letter s with caron
            0x203A => Some(0x9B), // Single right-pointing angle quotation
            0x0153 => Some(0x9C), // Latin small ligature oe
            0x017E => Some(0x9E), // Latin small letter z with caron
            0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}
