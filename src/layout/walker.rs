//! # Report Walker
//!
//! Visits the report in a fixed order and hands each element to its
//! renderer:
//!
//! 1. Page 1: header fields, then the header image.
//! 2. Page 2: left as the template has it.
//! 3. Pages 3+: sections, line items and comments, flowing top to bottom.
//! 4. Every page: a "Page N of T" footer, drawn once the page count is final.
//!
//! Each group checks the room left before its first element and opens a new
//! page if it would start too close to the bottom.

use super::field::{header_fields, place_field, Field};
use super::image::{place_content_image, place_header_image};
use super::page_break::should_break_before;
use super::text_flow::{place_paragraph, Paragraph};
use super::{ElementKind, Geometry, PageCursor, Placement, RenderReport};
use crate::config::{FieldPosition, LayoutConfig};
use crate::image_loader::DimensionProbe;
use crate::model::{Comment, LineItem, Report, Section};
use crate::resolve::ImageResolver;
use crate::surface::{DrawingSurface, TextAlign, TextStyle};

pub struct Walker<'a, S: DrawingSurface> {
    surface: &'a mut S,
    cursor: PageCursor,
    config: &'a LayoutConfig,
    resolver: &'a dyn ImageResolver,
    probe: &'a dyn DimensionProbe,
    outcome: RenderReport,
}

impl<'a, S: DrawingSurface> Walker<'a, S> {
    pub fn new(
        surface: &'a mut S,
        config: &'a LayoutConfig,
        resolver: &'a dyn ImageResolver,
        probe: &'a dyn DimensionProbe,
    ) -> Self {
        let geometry = Geometry::new(surface.page_size(), &config.margin);
        Self {
            surface,
            cursor: PageCursor::new(geometry),
            config,
            resolver,
            probe,
            outcome: RenderReport::default(),
        }
    }

    /// Lay out the whole report. Never fails; per-element problems end up
    /// in the returned [`RenderReport`].
    pub fn walk(mut self, report: &Report) -> RenderReport {
        self.surface.set_title(&document_title(report));

        self.render_header(report);
        self.reserve_static_pages();

        if !report.sections.is_empty() {
            let start = self.config.body_start_page;
            if self.cursor.go_to_page(self.surface, start).is_some() {
                for section in &report.sections {
                    self.render_section(section);
                }
            } else {
                log::warn!("could not reach body page {}; body omitted", start + 1);
                self.record(ElementKind::Page, Placement::skipped("body page unavailable"));
            }
        }

        self.render_footers();
        self.outcome.page_count = self.surface.page_count();
        log::info!(
            "laid out {} pages: {} placed, {} skipped, {} degraded",
            self.outcome.page_count,
            self.outcome.placed(),
            self.outcome.skipped(),
            self.outcome.degraded()
        );
        self.outcome
    }

    fn render_header(&mut self, report: &Report) {
        if self.cursor.ensure_page(self.surface).is_none() {
            return;
        }
        for field in header_fields(report, self.config) {
            let placement = place_field(self.surface, &mut self.cursor, &field);
            self.record(ElementKind::Field, placement);
        }

        let Some(url) = report.header_image_url.as_deref() else {
            return;
        };
        let placement = match self.resolver.resolve(url) {
            Some(path) => place_header_image(self.surface, &mut self.cursor, &self.config.images, &path),
            None => {
                log::info!("header image '{}' not available locally", url);
                Placement::skipped("header image not available locally")
            }
        };
        self.record(ElementKind::HeaderImage, placement);
    }

    /// Make sure every page before the body exists, blank if the template
    /// did not supply it.
    fn reserve_static_pages(&mut self) {
        while self.surface.page_count() < self.config.body_start_page {
            if let Err(e) = self.surface.add_page() {
                log::warn!("could not add static page: {}", e);
                self.outcome.record(ElementKind::Page, None, Placement::skipped(e.to_string()));
                return;
            }
        }
    }

    fn render_section(&mut self, section: &Section) {
        self.break_before(self.config.thresholds.section_break);
        if let Some(title) = section.title() {
            self.paragraph(
                &title,
                TextStyle::bold(self.config.fonts.section_title),
                self.config.spacing.after_title,
            );
        }
        let number = section.section_number.as_deref();
        for item in &section.line_items {
            self.render_line_item(item, number);
        }
        self.cursor.move_down(self.config.spacing.after_section);
    }

    fn render_line_item(&mut self, item: &LineItem, section_number: Option<&str>) {
        self.break_before(self.config.thresholds.line_item_break);
        if let Some(title) = item.title(section_number) {
            self.paragraph(
                &title,
                TextStyle::bold(self.config.fonts.line_item_title),
                self.config.spacing.after_title,
            );
        }
        for comment in &item.comments {
            self.render_comment(comment);
        }
        self.cursor.move_down(self.config.spacing.after_line_item);
    }

    fn render_comment(&mut self, comment: &Comment) {
        let fonts = self.config.fonts;
        let spacing = self.config.spacing;

        self.break_before(self.config.thresholds.comment_break);
        if let Some(title) = comment.title() {
            self.paragraph(&title, TextStyle::bold(fonts.comment_label), spacing.after_title);
        }
        if let Some(text) = comment.decoded_text() {
            self.paragraph(&text, TextStyle::regular(fonts.body), spacing.after_paragraph);
        }

        for photo in &comment.photos {
            let placement = match self.resolver.resolve(photo) {
                Some(path) => place_content_image(
                    self.surface,
                    &mut self.cursor,
                    &self.config.images,
                    self.probe,
                    &path,
                ),
                None => {
                    log::info!("photo '{}' not available locally; skipped", photo);
                    Placement::skipped(format!("photo '{}' not available locally", photo))
                }
            };
            self.record(ElementKind::Photo, placement);
        }

        for video in &comment.videos {
            let placement = self.place_text(
                &format!("Video: {}", video),
                TextStyle::regular(fonts.body),
                spacing.after_paragraph,
            );
            self.record(ElementKind::Video, placement);
        }

        self.cursor.move_down(spacing.after_comment);
    }

    fn render_footers(&mut self) {
        let total = self.surface.page_count();
        let geometry = *self.cursor.geometry();
        let position = FieldPosition::new(
            geometry.content_left,
            geometry.page_height - self.config.footer_offset,
            geometry.content_width,
        );
        let style = TextStyle::regular(self.config.fonts.footer);

        for page in 0..total {
            let mut cursor = PageCursor::at_page(geometry, page);
            let field = Field::new(format!("Page {} of {}", page + 1, total), position, style)
                .aligned(TextAlign::Center);
            let placement = place_field(self.surface, &mut cursor, &field);
            self.outcome.record(ElementKind::Footer, Some(page), placement);
        }
    }

    fn break_before(&mut self, threshold: f64) {
        if !should_break_before(self.cursor.available(), threshold, self.cursor.is_fresh()) {
            return;
        }
        let placement = match self.cursor.new_page(self.surface) {
            Some(_) => Placement::Placed,
            None => Placement::skipped("could not start a new page"),
        };
        self.record(ElementKind::Page, placement);
    }

    fn paragraph(&mut self, text: &str, style: TextStyle, spacing_after: f64) {
        let placement = self.place_text(text, style, spacing_after);
        self.record(ElementKind::Paragraph, placement);
    }

    fn place_text(&mut self, text: &str, style: TextStyle, spacing_after: f64) -> Placement {
        let geometry = *self.cursor.geometry();
        let para = Paragraph {
            text,
            style,
            x: geometry.content_left,
            width: geometry.content_width,
            spacing_after,
        };
        place_paragraph(self.surface, &mut self.cursor, &self.config.thresholds, &para)
    }

    fn record(&mut self, kind: ElementKind, placement: Placement) {
        self.outcome.record(kind, self.cursor.current_page(), placement);
    }
}

/// Document title, derived from the property address when known.
pub fn document_title(report: &Report) -> String {
    match report.property_address.as_deref() {
        Some(address) => format!("Inspection Report - {}", address),
        None => "Inspection Report".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSize;
    use crate::image_loader::NoProbe;
    use crate::resolve::LocalImageResolver;
    use crate::surface::PdfSurface;

    fn walk(report: &Report, surface: &mut PdfSurface) -> RenderReport {
        let config = LayoutConfig::default();
        let resolver = LocalImageResolver::empty();
        Walker::new(surface, &config, &resolver, &NoProbe).walk(report)
    }

    fn comment(text: &str) -> Comment {
        Comment {
            text: Some(text.to_string()),
            ..Comment::default()
        }
    }

    #[test]
    fn test_empty_report_has_cover_and_static_page() {
        let mut surface = PdfSurface::new(PageSize::LETTER);
        let outcome = walk(&Report::default(), &mut surface);
        assert_eq!(outcome.page_count, 2);
        assert_eq!(outcome.of_kind(ElementKind::Field).count(), 8);
        assert!(surface.pages()[1].texts().iter().all(|t| t.starts_with("Page ")));
    }

    #[test]
    fn test_body_starts_on_third_page() {
        let report = Report {
            sections: vec![Section {
                name: Some("Roof".to_string()),
                ..Section::default()
            }],
            ..Report::default()
        };
        let mut surface = PdfSurface::new(PageSize::LETTER);
        let outcome = walk(&report, &mut surface);
        assert_eq!(outcome.page_count, 3);
        assert_eq!(surface.pages()[2].texts()[0], "Roof");
    }

    #[test]
    fn test_footer_on_every_page() {
        let report = Report {
            sections: vec![Section {
                line_items: vec![LineItem {
                    comments: (0..40).map(|_| comment(&"lorem ipsum ".repeat(120))).collect(),
                    ..LineItem::default()
                }],
                ..Section::default()
            }],
            ..Report::default()
        };
        let mut surface = PdfSurface::new(PageSize::LETTER);
        let outcome = walk(&report, &mut surface);
        let total = surface.page_count();
        assert!(total > 3);
        for (i, page) in surface.pages().iter().enumerate() {
            let footer = format!("Page {} of {}", i + 1, total);
            assert!(page.texts().contains(&footer.as_str()), "page {}", i + 1);
        }
        assert_eq!(outcome.of_kind(ElementKind::Footer).count(), total);
    }

    #[test]
    fn test_unresolved_photo_is_skipped() {
        let report = Report {
            sections: vec![Section {
                line_items: vec![LineItem {
                    comments: vec![Comment {
                        photos: vec!["nowhere.jpg".to_string()],
                        videos: vec!["https://v.example/1".to_string()],
                        ..Comment::default()
                    }],
                    ..LineItem::default()
                }],
                ..Section::default()
            }],
            ..Report::default()
        };
        let mut surface = PdfSurface::new(PageSize::LETTER);
        let outcome = walk(&report, &mut surface);
        let photo = outcome.of_kind(ElementKind::Photo).next().unwrap();
        assert!(matches!(photo.placement, Placement::Skipped(_)));
        assert!(surface.pages()[2].texts().contains(&"Video: https://v.example/1"));
    }

    #[test]
    fn test_group_breaks_are_recorded() {
        let report = Report {
            sections: vec![Section {
                line_items: vec![LineItem {
                    comments: (0..200).map(|i| comment(&format!("note {}", i))).collect(),
                    ..LineItem::default()
                }],
                ..Section::default()
            }],
            ..Report::default()
        };
        let mut surface = PdfSurface::new(PageSize::LETTER);
        let outcome = walk(&report, &mut surface);

        let breaks: Vec<_> = outcome.of_kind(ElementKind::Page).collect();
        assert!(outcome.page_count > 3);
        // every page past the first body page was opened by a comment break
        assert_eq!(breaks.len(), outcome.page_count - 3);
        for (i, event) in breaks.iter().enumerate() {
            assert_eq!(event.placement, Placement::Placed);
            assert_eq!(event.page, Some(i + 3));
        }
    }

    #[test]
    fn test_document_title() {
        let report = Report {
            property_address: Some("1 Main St".to_string()),
            ..Report::default()
        };
        assert_eq!(document_title(&report), "Inspection Report - 1 Main St");
        assert_eq!(document_title(&Report::default()), "Inspection Report");
    }
}
