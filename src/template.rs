//! Template geometry.
//!
//! A template describes the pre-authored background the report is overlaid
//! on: the page size plus a sequence of pages carrying static labels and
//! rules. Template pages are imported as the first pages of the document.
//! Field positions are NOT read from the template; they live in
//! [`crate::config::LayoutConfig`].
//!
//! ```json
//! {
//!   "pageSize": { "width": 612, "height": 792 },
//!   "pages": [
//!     { "elements": [
//!       { "type": "Text", "x": 36, "top": 40, "text": "Inspection Report", "fontSize": 20, "bold": true },
//!       { "type": "Rect", "x": 36, "top": 60, "width": 540, "height": 200 }
//!     ] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::PageSize;
use crate::error::RenderError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Template {
    #[serde(default)]
    pub page_size: PageSize,
    #[serde(default)]
    pub pages: Vec<TemplatePage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplatePage {
    #[serde(default)]
    pub elements: Vec<TemplateElement>,
}

/// A static element, positioned in top-anchored coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum TemplateElement {
    Text {
        x: f64,
        top: f64,
        text: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
        #[serde(default)]
        bold: bool,
    },
    Rect {
        x: f64,
        top: f64,
        width: f64,
        height: f64,
        #[serde(default = "default_line_width")]
        line_width: f64,
    },
}

fn default_font_size() -> f64 {
    10.0
}

fn default_line_width() -> f64 {
    0.75
}

impl Template {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let json = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let template = Self::from_json(&json)?;
        if template.page_size.width <= 0.0 || template.page_size.height <= 0.0 {
            return Err(RenderError::Config(format!(
                "template '{}' has a non-positive page size",
                path.display()
            )));
        }
        Ok(template)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
