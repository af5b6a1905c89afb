//! # Font Management
//!
//! The renderer draws with the standard PDF Helvetica family, which needs no
//! embedding. This module maps a [`FontStyle`] to its PDF base font and
//! provides text measurement from the AFM widths.

pub mod metrics;

pub use metrics::StandardFontMetrics;
use serde::{Deserialize, Serialize};

/// Weight/slant of a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
}

/// The standard PDF fonts the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
}

impl StandardFont {
    pub fn for_style(style: FontStyle) -> Self {
        match style {
            FontStyle::Regular => Self::Helvetica,
            FontStyle::Bold => Self::HelveticaBold,
            FontStyle::Italic => Self::HelveticaOblique,
        }
    }

    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
        }
    }
}

/// Shared font context used by line breaking and the PDF surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, style: FontStyle, font_size: f64) -> f64 {
        StandardFont::for_style(style).metrics().char_width(ch, font_size)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, style: FontStyle, font_size: f64) -> f64 {
        StandardFont::for_style(style)
            .metrics()
            .measure_string(text, font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::new();
        let w = ctx.char_width(' ', FontStyle::Regular, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = ctx.char_width('b', FontStyle::Regular, 12.0);
        let bold = ctx.char_width('b', FontStyle::Bold, 12.0);
        assert!(bold > regular, "Bold b should be wider than regular b");
    }

    #[test]
    fn test_italic_shares_regular_widths() {
        let ctx = FontContext::new();
        let regular = ctx.measure_string("Shingles", FontStyle::Regular, 10.0);
        let italic = ctx.measure_string("Shingles", FontStyle::Italic, 10.0);
        assert!((regular - italic).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_char_uses_default_width() {
        let ctx = FontContext::new();
        let w = ctx.char_width('\u{4E2D}', FontStyle::Regular, 10.0);
        assert!((w - 5.56).abs() < 0.001);
    }

    #[test]
    fn test_pdf_names() {
        assert_eq!(StandardFont::for_style(FontStyle::Bold).pdf_name(), "Helvetica-Bold");
        assert_eq!(StandardFont::for_style(FontStyle::Regular).pdf_name(), "Helvetica");
    }
}
