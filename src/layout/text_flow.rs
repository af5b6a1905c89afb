//! # Text Flow
//!
//! Places one flowing paragraph at the cursor. A paragraph that does not fit
//! the room left is moved whole to the next page; only a paragraph taller
//! than a fresh page is shrunk (and, past the shrink floor, truncated).
//!
//! If the surface rejects the boxed placement, the paragraph is wrapped by
//! hand and drawn line by line, continuing onto new pages as needed.

use super::page_break::{decide_paragraph, BreakDecision};
use super::{PageCursor, Placement};
use crate::config::Thresholds;
use crate::surface::{DrawingSurface, Overflow, Rect, TextAlign, TextStyle};
use crate::text::LINE_HEIGHT_FACTOR;

/// A paragraph ready to be placed at the cursor.
#[derive(Debug, Clone, Copy)]
pub struct Paragraph<'a> {
    pub text: &'a str,
    pub style: TextStyle,
    /// Left edge in surface coordinates.
    pub x: f64,
    pub width: f64,
    /// Gap left below the paragraph.
    pub spacing_after: f64,
}

pub fn place_paragraph<S: DrawingSurface>(
    surface: &mut S,
    cursor: &mut PageCursor,
    thresholds: &Thresholds,
    para: &Paragraph,
) -> Placement {
    if para.text.trim().is_empty() {
        return Placement::skipped("empty text");
    }
    if cursor.ensure_page(surface).is_none() {
        return Placement::skipped("no page available");
    }

    if cursor.available() < thresholds.min_text_height && cursor.new_page(surface).is_none() {
        return Placement::skipped("no page available");
    }

    let fresh = cursor
        .geometry()
        .fresh_capacity()
        .min(thresholds.max_text_box_height);
    let required = surface.measure_height(para.text, para.width, para.style);
    let mut capacity = cursor.available().min(thresholds.max_text_box_height);

    match decide_paragraph(required, capacity, fresh, cursor.is_fresh()) {
        BreakDecision::Place | BreakDecision::ShrinkToFit => {}
        BreakDecision::MoveToNextPage => {
            if cursor.new_page(surface).is_none() {
                return Placement::skipped("no page available");
            }
            capacity = cursor.available().min(thresholds.max_text_box_height);
        }
    }

    let Some(page) = cursor.current_page() else {
        return Placement::skipped("no page available");
    };
    let box_height = required.min(capacity);
    let rect = Rect::new(para.x, cursor.y(), para.width, box_height);

    match surface.text_box(
        page,
        rect,
        para.text,
        para.style,
        TextAlign::Left,
        Overflow::ShrinkToFit,
    ) {
        Ok(used) => {
            cursor.move_down(used + para.spacing_after);
            if required > box_height + 1e-6 {
                Placement::degraded(format!(
                    "{:.0}pt of text shrunk into {:.0}pt",
                    required, box_height
                ))
            } else {
                Placement::Placed
            }
        }
        Err(e) => {
            log::debug!("text box failed on page {}: {}; wrapping manually", page + 1, e);
            wrap_manually(surface, cursor, para)
        }
    }
}

/// Greedy word wrap drawn one line at a time.
fn wrap_manually<S: DrawingSurface>(
    surface: &mut S,
    cursor: &mut PageCursor,
    para: &Paragraph,
) -> Placement {
    let lines = greedy_lines(surface, para);
    let line_height = para.style.size * LINE_HEIGHT_FACTOR;
    let bottom = cursor.geometry().bottom_margin;

    for (i, line) in lines.iter().enumerate() {
        if cursor.y() - line_height < bottom && cursor.new_page(surface).is_none() {
            return Placement::skipped(format!("ran out of pages after {} lines", i));
        }
        let Some(page) = cursor.current_page() else {
            return Placement::skipped("no page available");
        };
        let baseline = cursor.y() - para.style.size;
        if let Err(e) = surface.draw_text(page, para.x, baseline, line, para.style) {
            log::warn!("could not draw text on page {}: {}", page + 1, e);
            return Placement::skipped(format!("line {} failed: {}", i + 1, e));
        }
        cursor.move_down(line_height);
    }

    cursor.move_down(para.spacing_after);
    Placement::degraded("boxed placement failed; wrapped by hand")
}

fn greedy_lines<S: DrawingSurface>(surface: &S, para: &Paragraph) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in para.text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", line, word);
        if surface.measure_text(&candidate, para.style) > para.width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
