//! # Layout Configuration
//!
//! Every fixed offset, threshold and size the engine uses. None of these are
//! derived from the template at runtime. The pagination thresholds are tuned
//! independently of each other and are kept as separate values.
//!
//! All fields have defaults, so a config file only needs the keys it changes:
//!
//! ```json
//! { "thresholds": { "sectionBreak": 140 }, "placeholder": "N/A" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Page dimensions in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 50.0,
            right: 36.0,
            bottom: 50.0,
            left: 36.0,
        }
    }
}

impl Margins {
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }
}

/// Minimum remaining heights before content is pushed to a new page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Thresholds {
    pub section_break: f64,
    pub line_item_break: f64,
    pub comment_break: f64,
    /// Below this a paragraph starts a new page instead of shrinking.
    pub min_text_height: f64,
    /// Upper bound on the box a single paragraph may claim.
    pub max_text_box_height: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            section_break: 100.0,
            line_item_break: 120.0,
            comment_break: 90.0,
            min_text_height: 50.0,
            max_text_box_height: 650.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ImageLayout {
    pub min_height: f64,
    pub safety_margin: f64,
    pub spacing_before: f64,
    pub spacing_after: f64,
    /// Gap kept between an image's bottom edge and the bottom margin.
    pub bottom_offset: f64,
    pub max_height: f64,
    /// Used to estimate rendered height when dimensions cannot be probed.
    pub fallback_aspect_ratio: f64,
    pub header_top: f64,
    pub header_max_height: f64,
}

impl Default for ImageLayout {
    fn default() -> Self {
        Self {
            min_height: 100.0,
            safety_margin: 10.0,
            spacing_before: 6.0,
            spacing_after: 12.0,
            bottom_offset: 5.0,
            max_height: 400.0,
            fallback_aspect_ratio: 4.0 / 3.0,
            header_top: 60.0,
            header_max_height: 150.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FontSizes {
    pub section_title: f64,
    pub line_item_title: f64,
    pub comment_label: f64,
    pub body: f64,
    pub header_field: f64,
    pub report_id: f64,
    pub footer: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            section_title: 14.0,
            line_item_title: 12.0,
            comment_label: 11.0,
            body: 10.0,
            header_field: 11.0,
            report_id: 13.0,
            footer: 8.0,
        }
    }
}

/// Vertical space left after each element and tree level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Spacing {
    pub after_title: f64,
    pub after_paragraph: f64,
    pub after_comment: f64,
    pub after_line_item: f64,
    pub after_section: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            after_title: 4.0,
            after_paragraph: 6.0,
            after_comment: 6.0,
            after_line_item: 8.0,
            after_section: 12.0,
        }
    }
}

/// Where a fixed header field sits, in top-anchored coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldPosition {
    pub x: f64,
    pub top: f64,
    pub width: f64,
}

impl FieldPosition {
    pub const fn new(x: f64, top: f64, width: f64) -> Self {
        Self { x, top, width }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct HeaderLayout {
    pub report_id: FieldPosition,
    pub client_name: FieldPosition,
    pub inspection_date: FieldPosition,
    pub property_address: FieldPosition,
    pub inspector_name: FieldPosition,
    pub inspector_license: FieldPosition,
    pub sponsor_name: FieldPosition,
    pub sponsor_license: FieldPosition,
}

impl Default for HeaderLayout {
    fn default() -> Self {
        Self {
            report_id: FieldPosition::new(36.0, 230.0, 540.0),
            client_name: FieldPosition::new(180.0, 270.0, 396.0),
            inspection_date: FieldPosition::new(180.0, 295.0, 396.0),
            property_address: FieldPosition::new(180.0, 320.0, 396.0),
            inspector_name: FieldPosition::new(180.0, 345.0, 396.0),
            inspector_license: FieldPosition::new(180.0, 370.0, 396.0),
            sponsor_name: FieldPosition::new(180.0, 395.0, 396.0),
            sponsor_license: FieldPosition::new(180.0, 420.0, 396.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LayoutConfig {
    /// Page size used when no template is supplied.
    pub page_size: PageSize,
    pub margin: Margins,
    pub thresholds: Thresholds,
    pub images: ImageLayout,
    pub fonts: FontSizes,
    pub spacing: Spacing,
    pub header: HeaderLayout,
    /// Shown for header fields with no value.
    pub placeholder: String,
    /// Distance from the page bottom to the top of the page-number footer.
    pub footer_offset: f64,
    /// Zero-based index of the first body page.
    pub body_start_page: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            margin: Margins::default(),
            thresholds: Thresholds::default(),
            images: ImageLayout::default(),
            fonts: FontSizes::default(),
            spacing: Spacing::default(),
            header: HeaderLayout::default(),
            placeholder: "Not Found".to_string(),
            footer_offset: 30.0,
            body_start_page: 2,
        }
    }
}

impl LayoutConfig {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        let config: LayoutConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let json = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Whether the margins leave any room on a page of `page_size`.
    pub fn has_content_area(&self, page_size: PageSize) -> bool {
        self.margin.horizontal() < page_size.width
            && self.margin.top + self.margin.bottom < page_size.height
    }

    fn validate(&self) -> Result<(), RenderError> {
        if self.page_size.width <= 0.0 || self.page_size.height <= 0.0 {
            return Err(RenderError::Config("page size must be positive".to_string()));
        }
        if !self.has_content_area(self.page_size) {
            return Err(RenderError::Config("margins leave no content area".to_string()));
        }
        if self.images.fallback_aspect_ratio <= 0.0 {
            return Err(RenderError::Config(
                "fallbackAspectRatio must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
