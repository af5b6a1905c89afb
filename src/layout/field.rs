//! # Fixed Fields
//!
//! Single-line values drawn at configured positions on the current page,
//! independent of the flowing cursor. Used for the cover-page header block
//! and the page-number footer.

use super::{PageCursor, Placement};
use crate::config::{FieldPosition, LayoutConfig};
use crate::date::format_date;
use crate::model::Report;
use crate::surface::{DrawingSurface, Overflow, Rect, TextAlign, TextStyle};

/// Box height as a multiple of the font size.
const FIELD_BOX_FACTOR: f64 = 1.6;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub text: String,
    pub position: FieldPosition,
    pub style: TextStyle,
    pub align: TextAlign,
}

impl Field {
    pub fn new(text: impl Into<String>, position: FieldPosition, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            position,
            style,
            align: TextAlign::Left,
        }
    }

    pub fn aligned(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

/// Draw a field on the cursor's page. The cursor does not move.
pub fn place_field<S: DrawingSurface>(surface: &mut S, cursor: &mut PageCursor, field: &Field) -> Placement {
    if field.text.trim().is_empty() {
        return Placement::skipped("empty field");
    }
    let Some(page) = cursor.ensure_page(surface) else {
        return Placement::skipped("no page available");
    };

    let FieldPosition { x, top, width } = field.position;
    let y = cursor.to_drawing_y(top);
    let rect = Rect::new(x, y, width, field.style.size * FIELD_BOX_FACTOR);

    match surface.text_box(page, rect, &field.text, field.style, field.align, Overflow::ShrinkToFit) {
        Ok(_) => Placement::Placed,
        Err(e) => {
            log::debug!("field box failed ({}); drawing as plain text", e);
            match surface.draw_text(page, x, y - field.style.size, &field.text, field.style) {
                Ok(()) => Placement::degraded(format!("drawn without a box: {}", e)),
                Err(e) => {
                    log::warn!("could not draw field '{}': {}", field.text, e);
                    Placement::skipped(e.to_string())
                }
            }
        }
    }
}

/// The cover-page header fields, with the placeholder standing in for
/// anything missing.
pub fn header_fields(report: &Report, config: &LayoutConfig) -> Vec<Field> {
    let placeholder = config.placeholder.as_str();
    let value = |v: &Option<String>| v.as_deref().unwrap_or(placeholder).to_string();

    let date = report
        .inspection_date
        .as_deref()
        .and_then(format_date)
        .unwrap_or_else(|| placeholder.to_string());
    let address = value(&report.property_address);

    let header = &config.header;
    let field_style = TextStyle::regular(config.fonts.header_field);

    vec![
        Field::new(
            format!("{} - {}", address, date),
            header.report_id,
            TextStyle::bold(config.fonts.report_id),
        ),
        Field::new(value(&report.client_name), header.client_name, field_style),
        Field::new(date, header.inspection_date, field_style),
        Field::new(address, header.property_address, field_style),
        Field::new(value(&report.inspector_name), header.inspector_name, field_style),
        Field::new(
            value(&report.inspector_license),
            header.inspector_license,
            field_style,
        ),
        Field::new(value(&report.sponsor_name), header.sponsor_name, field_style),
        Field::new(value(&report.sponsor_license), header.sponsor_license, field_style),
    ]
}
