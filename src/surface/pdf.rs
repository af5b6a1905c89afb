//! # PDF Surface
//!
//! A [`DrawingSurface`] that records draw operations per page and serializes
//! them to a PDF 1.7 file on [`DrawingSurface::finish`].
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, images)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Text uses the standard Type1 Helvetica faces with WinAnsiEncoding, so no
//! font embedding is needed. Images are loaded when they are drawn; each
//! distinct path becomes one XObject no matter how often it is placed.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>
use std::path::{Path, PathBuf};

use miniz_oxide::deflate::compress_to_vec_zlib;

use super::{DrawingSurface, ImageFit, Overflow, Rect, TextAlign, TextStyle};
use crate::config::PageSize;
use crate::error::SurfaceError;
use crate::font::{FontContext, FontStyle, StandardFont};
use crate::image_loader::{self, ImagePixelData, JpegColorSpace, LoadedImage};
use crate::template::{Template, TemplateElement};
use crate::text::{TextLayout, LINE_HEIGHT_FACTOR};

/// Shrink-to-fit never goes below this fraction of the requested size.
const SHRINK_FLOOR: f64 = 0.6;
const SHRINK_STEP: f64 = 0.5;

/// One recorded drawing operation. Coordinates are PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f64,
        /// Baseline.
        y: f64,
        text: String,
        style: TextStyle,
    },
    Image {
        index: usize,
        x: f64,
        /// Bottom edge.
        y: f64,
        width: f64,
        height: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        line_width: f64,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SurfacePage {
    pub ops: Vec<DrawOp>,
}

impl SurfacePage {
    /// Text runs in the order they were drawn.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn image_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }
}

pub struct PdfSurface {
    page_size: PageSize,
    pages: Vec<SurfacePage>,
    images: Vec<LoadedImage>,
    image_paths: HashMap<PathBuf, usize>,
    font_context: FontContext,
    text_layout: TextLayout,
    title: Option<String>,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font resource name index -> object id.
    font_objects: Vec<(FontStyle, usize)>,
    /// Image index -> XObject id.
    image_objects: Vec<usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfSurface {
    /// An empty document whose pages will be `page_size`.
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            images: Vec::new(),
            image_paths: HashMap::new(),
            font_context: FontContext::new(),
            text_layout: TextLayout::new(),
            title: None,
        }
    }

    /// A document pre-populated with the template's background pages.
    pub fn from_template(template: &Template) -> Self {
        let mut surface = Self::new(template.page_size);
        let height = template.page_size.height;
        for page in &template.pages {
            let ops = page
                .elements
                .iter()
                .map(|el| match el {
                    TemplateElement::Text {
                        x,
                        top,
                        text,
                        font_size,
                        bold,
                    } => DrawOp::Text {
                        x: *x,
                        y: height - top - font_size,
                        text: text.clone(),
                        style: TextStyle::new(
                            if *bold { FontStyle::Bold } else { FontStyle::Regular },
                            *font_size,
                        ),
                    },
                    TemplateElement::Rect {
                        x,
                        top,
                        width,
                        height: h,
                        line_width,
                    } => DrawOp::Rect {
                        x: *x,
                        y: height - top - h,
                        width: *width,
                        height: *h,
                        line_width: *line_width,
                    },
                })
                .collect();
            surface.pages.push(SurfacePage { ops });
        }
        surface
    }

    pub fn pages(&self) -> &[SurfacePage] {
        &self.pages
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut SurfacePage, SurfaceError> {
        self.pages.get_mut(page).ok_or(SurfaceError::NoSuchPage(page))
    }

    /// Index of the embedded image for `path`, loading it on first use.
    fn image_index(&mut self, path: &Path) -> Result<usize, SurfaceError> {
        if let Some(&idx) = self.image_paths.get(path) {
            return Ok(idx);
        }
        let loaded = image_loader::load_image(path).map_err(SurfaceError::Image)?;
        if loaded.width_px == 0 || loaded.height_px == 0 {
            return Err(SurfaceError::Image(format!(
                "'{}' has zero size",
                path.display()
            )));
        }
        let idx = self.images.len();
        self.images.push(loaded);
        self.image_paths.insert(path.to_path_buf(), idx);
        Ok(idx)
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(&self, page: &SurfacePage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for op in &page.ops {
            match op {
                DrawOp::Text { x, y, text, style } => {
                    let font_idx = builder
                        .font_objects
                        .iter()
                        .position(|(s, _)| *s == style.font)
                        .unwrap_or(0);
                    let _ = write!(
                        stream,
                        "BT\n0 0 0 rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
                        font_idx,
                        style.size,
                        x,
                        y,
                        Self::encode_text(text)
                    );
                }
                DrawOp::Image {
                    index,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let _ = write!(
                        stream,
                        "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                        width, height, x, y, index
                    );
                }
                DrawOp::Rect {
                    x,
                    y,
                    width,
                    height,
                    line_width,
                } => {
                    let _ = write!(
                        stream,
                        "q\n0 0 0 RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                        line_width, x, y, width, height
                    );
                }
            }
        }
        stream
    }

    /// Register one Type1 font object per style used anywhere in the document.
    fn register_fonts(&self, builder: &mut PdfBuilder) {
        let mut styles: BTreeSet<FontStyle> = self
            .pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Text { style, .. } => Some(style.font),
                _ => None,
            })
            .collect();

        // Always have at least Helvetica
        if styles.is_empty() {
            styles.insert(FontStyle::Regular);
        }

        for style in styles {
            let obj_id = builder.objects.len();
            let font_dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                StandardFont::for_style(style).pdf_name()
            );
            builder.objects.push(PdfObject {
                data: font_dict.into_bytes(),
            });
            builder.font_objects.push((style, obj_id));
        }
    }

    fn register_images(&self, builder: &mut PdfBuilder) {
        for image in &self.images {
            let id = Self::write_image_xobject(builder, image);
            builder.image_objects.push(id);
        }
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };

                let obj_id = builder.objects.len();
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space_str,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                builder.objects.push(PdfObject { data: obj_data });
                obj_id
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_id = alpha.as_ref().map(|alpha_data| {
                    let compressed_alpha = compress_to_vec_zlib(alpha_data, 6);
                    let smask_obj_id = builder.objects.len();
                    let mut smask_data: Vec<u8> = Vec::new();
                    let _ = write!(
                        smask_data,
                        "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode \
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

                let compressed_rgb = compress_to_vec_zlib(rgb, 6);
                let obj_id = builder.objects.len();
                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();

                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode \
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
        }
    }

    /// The /XObject resource entries for the images a page actually uses.
    fn build_xobject_resource_dict(page: &SurfacePage, builder: &PdfBuilder) -> String {
        let used: BTreeSet<usize> = page
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        used.iter()
            .map(|idx| format!("/Im{} {} 0 R", idx, builder.image_objects[*idx]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_font_resource_dict(builder: &PdfBuilder) -> String {
        builder
            .font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Escape special characters in a PDF string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// Encode text as a WinAnsi literal string body.
    fn encode_text(text: &str) -> String {
        let mut out = String::new();
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
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
    fn serialize(builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
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

        let _ = write!(output, "trailer\n<< /Size {} /Root 1 0 R", builder.objects.len());
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

impl DrawingSurface for PdfSurface {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self) -> (f64, f64) {
        (self.page_size.width, self.page_size.height)
    }

    fn add_page(&mut self) -> Result<usize, SurfaceError> {
        self.pages.push(SurfacePage::default());
        Ok(self.pages.len() - 1)
    }

    fn measure_text(&self, text: &str, style: TextStyle) -> f64 {
        self.font_context.measure_string(text, style.font, style.size)
    }

    fn measure_height(&self, text: &str, width: f64, style: TextStyle) -> f64 {
        self.text_layout
            .measure_height(&self.font_context, text, width, style.size, style.font)
    }

    fn text_box(
        &mut self,
        page: usize,
        rect: Rect,
        text: &str,
        style: TextStyle,
        align: TextAlign,
        overflow: Overflow,
    ) -> Result<f64, SurfaceError> {
        if page >= self.pages.len() {
            return Err(SurfaceError::NoSuchPage(page));
        }
        if !(rect.width > 0.0) || !(rect.height > 0.0) {
            return Err(SurfaceError::NoRoom(rect.height));
        }

        let mut size = style.size;
        let wrap = |size: f64| {
            self.text_layout
                .break_into_lines(&self.font_context, text, rect.width, size, style.font)
        };
        let mut lines = wrap(size);

        if overflow == Overflow::ShrinkToFit {
            let floor = style.size * SHRINK_FLOOR;
            while lines.len() as f64 * size * LINE_HEIGHT_FACTOR > rect.height
                && size - SHRINK_STEP >= floor
            {
                size -= SHRINK_STEP;
                lines = wrap(size);
            }
        }

        let line_height = size * LINE_HEIGHT_FACTOR;
        let max_lines = ((rect.height + 1e-6) / line_height).floor() as usize;
        if max_lines == 0 {
            return Err(SurfaceError::NoRoom(rect.height));
        }
        if lines.len() > max_lines {
            log::debug!(
                "text box truncated to {} of {} lines at {:.1}pt",
                max_lines,
                lines.len(),
                size
            );
            lines.truncate(max_lines);
        }

        let placed_style = TextStyle::new(style.font, size);
        let ops: Vec<DrawOp> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let x = match align {
                    TextAlign::Left => rect.x,
                    TextAlign::Center => rect.x + (rect.width - line.width).max(0.0) / 2.0,
                    TextAlign::Right => rect.x + (rect.width - line.width).max(0.0),
                };
                DrawOp::Text {
                    x,
                    y: rect.top - i as f64 * line_height - size,
                    text: line.text.clone(),
                    style: placed_style,
                }
            })
            .collect();

        let used = ops.len() as f64 * line_height;
        self.page_mut(page)?.ops.extend(ops);
        Ok(used)
    }

    fn draw_text(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        text: &str,
        style: TextStyle,
    ) -> Result<(), SurfaceError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(SurfaceError::Encoding(format!(
                "non-finite text position ({}, {})",
                x, y
            )));
        }
        self.page_mut(page)?.ops.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            style,
        });
        Ok(())
    }

    fn draw_image(
        &mut self,
        page: usize,
        path: &Path,
        rect: Rect,
        fit: ImageFit,
    ) -> Result<(), SurfaceError> {
        if page >= self.pages.len() {
            return Err(SurfaceError::NoSuchPage(page));
        }
        let index = self.image_index(path)?;
        let image = &self.images[index];

        let (width, height) = match fit {
            ImageFit::Exact => (rect.width, rect.height),
            ImageFit::Contain => {
                let scale = (rect.width / image.width_px as f64)
                    .min(rect.height / image.height_px as f64);
                (image.width_px as f64 * scale, image.height_px as f64 * scale)
            }
        };

        self.page_mut(page)?.ops.push(DrawOp::Image {
            index,
            x: rect.x,
            y: rect.top - height,
            width,
            height,
        });
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn finish(self) -> Result<Vec<u8>, SurfaceError> {
        if self.pages.is_empty() {
            return Err(SurfaceError::Encoding("document has no pages".to_string()));
        }

        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            image_objects: Vec::new(),
        };

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        for _ in 0..3 {
            builder.objects.push(PdfObject { data: vec![] });
        }

        self.register_fonts(&mut builder);
        self.register_images(&mut builder);

        let (page_w, page_h) = self.page_size();
        let font_resources = Self::build_font_resource_dict(&builder);
        let mut page_obj_ids: Vec<usize> = Vec::new();

        for page in &self.pages {
            let content = self.build_content_stream(page, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_obj_id = builder.objects.len();
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            builder.objects.push(PdfObject { data: content_data });

            let xobject_resources = Self::build_xobject_resource_dict(page, &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!(
                    "/Font << {} >> /XObject << {} >>",
                    font_resources, xobject_resources
                )
            };
            let page_obj_id = builder.objects.len();
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page_w, page_h, content_obj_id, resources
            );
            builder.objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
            page_obj_ids.push(page_obj_id);
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
        if let Some(ref title) = self.title {
            let _ = write!(info, "/Title ({}) ", Self::escape_pdf_string(title));
        }
        let _ = write!(info, "/Producer (inspectpdf) /Creator (inspectpdf) >>");
        builder.objects.push(PdfObject {
            data: info.into_bytes(),
        });

        Ok(Self::serialize(&builder, Some(info_obj_id)))
    }
}
