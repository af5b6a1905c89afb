//! # Page-Aware Layout
//!
//! The report is laid out directly onto pages: every element asks the cursor
//! how much room is left, and either fits, shrinks, or opens a new page before
//! it is placed. Nothing is laid out on an unbounded canvas and sliced later.
//!
//! ```text
//!   walker      — visits header, sections, line items, comments in order
//!     ├─ field      — fixed-position single-line header fields
//!     ├─ text_flow  — flowing paragraphs with shrink-to-fit
//!     └─ image      — aspect-correct photo placement
//!   PageCursor  — current page + vertical position, shared by all of them
//! ```
//!
//! Positions are authored top-down (distance from the page top) and converted
//! to the surface's bottom-up system with [`Geometry::to_drawing_y`]. The
//! cursor itself is stored in surface coordinates, so "room left" is simply
//! `cursor - bottom_margin`.
//!
//! No renderer here returns an error. Each reports a [`Placement`], and a
//! failed element is logged and skipped while the rest of the document goes on.

pub mod field;
pub mod image;
pub mod page_break;
pub mod text_flow;
pub mod walker;

use serde::Serialize;

use crate::config::Margins;
use crate::surface::DrawingSurface;

const EPSILON: f64 = 1e-6;

/// Fixed page geometry in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub page_width: f64,
    pub page_height: f64,
    pub content_left: f64,
    pub content_width: f64,
    /// Surface y of the top of the content area.
    pub content_top: f64,
    /// Surface y below which nothing may be placed.
    pub bottom_margin: f64,
}

impl Geometry {
    pub fn new(page_size: (f64, f64), margin: &Margins) -> Self {
        let (page_width, page_height) = page_size;
        Self {
            page_width,
            page_height,
            content_left: margin.left,
            content_width: page_width - margin.horizontal(),
            content_top: page_height - margin.top,
            bottom_margin: margin.bottom,
        }
    }

    /// Convert a distance from the page top into a surface y.
    pub fn to_drawing_y(&self, top_offset: f64) -> f64 {
        self.page_height - top_offset
    }

    /// Vertical room on an empty page.
    pub fn fresh_capacity(&self) -> f64 {
        self.content_top - self.bottom_margin
    }
}

/// The mutable page/cursor state for one render.
///
/// Invariant: `bottom_margin <= y <= content_top` whenever a page is current.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    geometry: Geometry,
    page: Option<usize>,
    y: f64,
}

impl PageCursor {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            page: None,
            y: geometry.content_top,
        }
    }

    /// A cursor positioned at the top of an existing page.
    pub fn at_page(geometry: Geometry, page: usize) -> Self {
        Self {
            geometry,
            page: Some(page),
            y: geometry.content_top,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn current_page(&self) -> Option<usize> {
        self.page
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn to_drawing_y(&self, top_offset: f64) -> f64 {
        self.geometry.to_drawing_y(top_offset)
    }

    /// Room between the cursor and the bottom margin.
    pub fn available(&self) -> f64 {
        self.y - self.geometry.bottom_margin
    }

    /// Nothing has been placed below the content top yet.
    pub fn is_fresh(&self) -> bool {
        self.y >= self.geometry.content_top - EPSILON
    }

    /// Move to `y`, clamped to the content area.
    pub fn move_to(&mut self, y: f64) {
        self.y = y.clamp(self.geometry.bottom_margin, self.geometry.content_top);
    }

    pub fn move_down(&mut self, dy: f64) {
        self.move_to(self.y - dy);
    }

    /// Guarantee there is a current page, creating one if the surface has none.
    ///
    /// Returns `None` only when the surface refuses to create a page; the
    /// failure is logged, never raised.
    pub fn ensure_page<S: DrawingSurface>(&mut self, surface: &mut S) -> Option<usize> {
        if let Some(page) = self.page {
            if page < surface.page_count() {
                return Some(page);
            }
        }
        if surface.page_count() > 0 {
            self.page = Some(0);
            self.y = self.geometry.content_top;
            return self.page;
        }
        match surface.add_page() {
            Ok(page) => {
                self.page = Some(page);
                self.y = self.geometry.content_top;
                self.page
            }
            Err(e) => {
                log::warn!("could not create first page: {}", e);
                None
            }
        }
    }

    /// Advance to the next page and reset the cursor to the content top.
    ///
    /// Reuses the following page if the surface already has one (template
    /// pages), otherwise appends a blank page.
    pub fn new_page<S: DrawingSurface>(&mut self, surface: &mut S) -> Option<usize> {
        let next = self.page.map_or(0, |p| p + 1);
        if next < surface.page_count() {
            self.page = Some(next);
            self.y = self.geometry.content_top;
            log::debug!("advanced to existing page {}", next + 1);
            return self.page;
        }
        match surface.add_page() {
            Ok(page) => {
                self.page = Some(page);
                self.y = self.geometry.content_top;
                log::debug!("started page {}", page + 1);
                self.page
            }
            Err(e) => {
                log::warn!("could not start a new page: {}", e);
                None
            }
        }
    }

    /// Jump to page `index`, creating blank pages up to it if needed.
    pub fn go_to_page<S: DrawingSurface>(&mut self, surface: &mut S, index: usize) -> Option<usize> {
        while surface.page_count() <= index {
            if let Err(e) = surface.add_page() {
                log::warn!("could not create page {}: {}", surface.page_count() + 1, e);
                return None;
            }
        }
        self.page = Some(index);
        self.y = self.geometry.content_top;
        self.page
    }
}

/// Outcome of placing a single element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum Placement {
    Placed,
    /// Nothing was drawn.
    Skipped(String),
    /// Drawn, but through a fallback path or with reduced fidelity.
    Degraded(String),
}

impl Placement {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Placement::Skipped(reason.into())
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Placement::Degraded(reason.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Field,
    Paragraph,
    HeaderImage,
    Photo,
    Video,
    Footer,
    /// A page opened ahead of a section, line item or comment.
    Page,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEvent {
    pub kind: ElementKind,
    /// Zero-based page the element ended up on, if any.
    pub page: Option<usize>,
    pub placement: Placement,
}

/// Per-element outcomes collected over one render.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub page_count: usize,
    pub events: Vec<RenderEvent>,
}

impl RenderReport {
    pub fn record(&mut self, kind: ElementKind, page: Option<usize>, placement: Placement) {
        match &placement {
            Placement::Placed => {}
            Placement::Skipped(reason) => log::debug!("{:?} skipped: {}", kind, reason),
            Placement::Degraded(reason) => log::debug!("{:?} degraded: {}", kind, reason),
        }
        self.events.push(RenderEvent {
            kind,
            page,
            placement,
        });
    }

    pub fn placed(&self) -> usize {
        self.count(|p| matches!(p, Placement::Placed))
    }

    pub fn skipped(&self) -> usize {
        self.count(|p| matches!(p, Placement::Skipped(_)))
    }

    pub fn degraded(&self) -> usize {
        self.count(|p| matches!(p, Placement::Degraded(_)))
    }

    /// Events of one kind, in render order.
    pub fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &RenderEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    fn count(&self, pred: impl Fn(&Placement) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.placement)).count()
    }
}
