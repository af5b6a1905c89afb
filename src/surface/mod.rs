//! # Drawing Surface
//!
//! The narrow set of primitives the layout engine needs from a document
//! backend: page creation, text measurement, boxed and raw text placement,
//! image embedding, and final serialization.
//!
//! All coordinates here are in the surface's native system: points, origin
//! at the bottom-left of the page, y growing upwards. Converting from the
//! top-anchored authoring system happens in [`crate::layout`].

pub mod pdf;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;
use crate::font::FontStyle;

pub use pdf::PdfSurface;

/// Font face and size for a run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontStyle,
    pub size: f64,
}

impl TextStyle {
    pub fn new(font: FontStyle, size: f64) -> Self {
        Self { font, size }
    }

    pub fn regular(size: f64) -> Self {
        Self::new(FontStyle::Regular, size)
    }

    pub fn bold(size: f64) -> Self {
        Self::new(FontStyle::Bold, size)
    }
}

/// A box in surface coordinates. `top` is the y of the upper edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, top: f64, width: f64, height: f64) -> Self {
        Self { x, top, width, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top - self.height
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// What a text box does with content taller than the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Drop the lines that do not fit.
    Truncate,
    /// Reduce the font size first, then truncate.
    ShrinkToFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFit {
    /// Stretch the image to the rect exactly.
    Exact,
    /// Scale into the rect keeping the intrinsic aspect ratio, top-left anchored.
    Contain,
}

pub trait DrawingSurface {
    fn page_count(&self) -> usize;

    /// Width and height of pages created by [`DrawingSurface::add_page`].
    fn page_size(&self) -> (f64, f64);

    /// Append a page and return its index.
    fn add_page(&mut self) -> Result<usize, SurfaceError>;

    /// Advance width of `text` on a single line.
    fn measure_text(&self, text: &str, style: TextStyle) -> f64;

    /// Height of `text` wrapped to `width`.
    fn measure_height(&self, text: &str, width: f64, style: TextStyle) -> f64;

    /// Place wrapped, top-aligned text inside `rect`. Returns the height used.
    fn text_box(
        &mut self,
        page: usize,
        rect: Rect,
        text: &str,
        style: TextStyle,
        align: TextAlign,
        overflow: Overflow,
    ) -> Result<f64, SurfaceError>;

    /// Draw a single line of text with its baseline at `(x, y)`.
    fn draw_text(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        text: &str,
        style: TextStyle,
    ) -> Result<(), SurfaceError>;

    fn draw_image(
        &mut self,
        page: usize,
        path: &Path,
        rect: Rect,
        fit: ImageFit,
    ) -> Result<(), SurfaceError>;

    /// Document title, where the backend supports one.
    fn set_title(&mut self, _title: &str) {}

    /// Serialize the finished document.
    fn finish(self) -> Result<Vec<u8>, SurfaceError>
    where
        Self: Sized;
}
