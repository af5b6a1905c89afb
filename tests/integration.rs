//! Integration tests for the report rendering pipeline.
//!
//! These tests exercise the full path from a report record to a laid-out
//! surface and PDF bytes. They verify:
//! - Header fields land on the cover page, the body starts on page 3
//! - Visual order and numbering of sections, line items and comments
//! - Pagination of long bodies and the "Page N of T" footer
//! - Aspect-correct photo placement
//! - Recovery when images are missing or the surface rejects a primitive

use std::path::{Path, PathBuf};

use inspectpdf::config::PageSize;
use inspectpdf::error::SurfaceError;
use inspectpdf::layout::text_flow::{place_paragraph, Paragraph};
use inspectpdf::layout::{Geometry, PageCursor};
use inspectpdf::surface::pdf::DrawOp;
use inspectpdf::surface::{DrawingSurface, ImageFit, Overflow, PdfSurface, Rect, TextAlign, TextStyle};
use inspectpdf::*;

// ─── Helpers ────────────────────────────────────────────────────

fn sample_json() -> &'static str {
    r#"{
        "clientInfo": { "name": "Jordan Avery" },
        "schedule": { "date": "2024-03-05" },
        "address": { "fullAddress": "1428 Elm Street" },
        "inspector": { "name": "Sam Whitaker", "licenseNumber": "HI-20931" },
        "sections": [{
            "name": "Roof",
            "sectionNumber": 1,
            "lineItems": [{
                "name": "Shingles",
                "lineItemNumber": 1,
                "comments": [{
                    "label": "Finding",
                    "commentNumber": "1.1",
                    "text": "Minor wear"
                }]
            }]
        }]
    }"#
}

fn offline_renderer() -> ReportRenderer {
    ReportRenderer::default()
        .with_resolver(LocalImageResolver::empty())
        .with_probe(ImageSizeProbe)
}

fn lay_out(renderer: &ReportRenderer, report: &Report) -> (PdfSurface, RenderReport) {
    let mut surface = PdfSurface::new(PageSize::LETTER);
    let outcome = renderer.render_onto(&mut surface, report);
    (surface, outcome)
}

fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::from_fn(w, h, |x, _| image::Rgb([(x % 255) as u8, 90, 160]))
        .save(&path)
        .unwrap();
    path
}

fn images_on(surface: &PdfSurface, page: usize) -> Vec<(f64, f64, f64, f64)> {
    surface.pages()[page]
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Image { x, y, width, height, .. } => Some((*x, *y, *width, *height)),
            _ => None,
        })
        .collect()
}

fn comment_with(text: String) -> model::Comment {
    model::Comment {
        text: Some(text),
        ..Default::default()
    }
}

fn report_with_comments(comments: Vec<model::Comment>) -> Report {
    Report {
        sections: vec![model::Section {
            name: Some("Interior".to_string()),
            section_number: Some("1".to_string()),
            line_items: vec![model::LineItem {
                name: Some("Walls".to_string()),
                line_item_number: Some("1".to_string()),
                comments,
            }],
        }],
        ..Default::default()
    }
}

/// A surface whose boxed text and image primitives always fail.
struct BrokenSurface {
    inner: PdfSurface,
}

impl DrawingSurface for BrokenSurface {
    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn page_size(&self) -> (f64, f64) {
        self.inner.page_size()
    }

    fn add_page(&mut self) -> Result<usize, SurfaceError> {
        self.inner.add_page()
    }

    fn measure_text(&self, text: &str, style: TextStyle) -> f64 {
        self.inner.measure_text(text, style)
    }

    fn measure_height(&self, text: &str, width: f64, style: TextStyle) -> f64 {
        self.inner.measure_height(text, width, style)
    }

    fn text_box(
        &mut self,
        _page: usize,
        _rect: Rect,
        _text: &str,
        _style: TextStyle,
        _align: TextAlign,
        _overflow: Overflow,
    ) -> Result<f64, SurfaceError> {
        Err(SurfaceError::Encoding("text boxes unavailable".to_string()))
    }

    fn draw_text(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        text: &str,
        style: TextStyle,
    ) -> Result<(), SurfaceError> {
        self.inner.draw_text(page, x, y, text, style)
    }

    fn draw_image(
        &mut self,
        _page: usize,
        _path: &Path,
        _rect: Rect,
        _fit: ImageFit,
    ) -> Result<(), SurfaceError> {
        Err(SurfaceError::Image("embedding unavailable".to_string()))
    }

    fn finish(self) -> Result<Vec<u8>, SurfaceError> {
        self.inner.finish()
    }
}

// ─── End to end ─────────────────────────────────────────────────

#[test]
fn test_body_order_and_numbering() {
    let report = Report::from_json(sample_json()).unwrap();
    let (surface, outcome) = lay_out(&offline_renderer(), &report);

    assert_eq!(outcome.page_count, 3);
    let body = surface.pages()[2].texts();
    assert_eq!(&body[..4], &["1. Roof", "1.1 Shingles", "1.1 Finding", "Minor wear"]);
    assert_eq!(body[4], "Page 3 of 3");
}

#[test]
fn test_cover_page_fields() {
    let report = Report::from_json(sample_json()).unwrap();
    let (surface, _) = lay_out(&offline_renderer(), &report);

    let cover = surface.pages()[0].texts();
    assert!(cover.contains(&"1428 Elm Street - March 05, 2024"));
    assert!(cover.contains(&"Jordan Avery"));
    assert!(cover.contains(&"HI-20931"));
    // no sponsor in the record
    assert_eq!(cover.iter().filter(|t| **t == "Not Found").count(), 2);
}

#[test]
fn test_render_json_produces_pdf() {
    let output = render_json(sample_json()).unwrap();
    assert!(output.bytes.starts_with(b"%PDF-1.7"));
    assert!(output.bytes.ends_with(b"%%EOF\n") || output.bytes.ends_with(b"%%EOF"));
    let text = String::from_utf8_lossy(&output.bytes);
    assert!(text.contains("/Count 3"));
    assert!(text.contains("/Title (Inspection Report - 1428 Elm Street)"));
}

#[test]
fn test_invalid_json_is_terminal() {
    let result = render_json("{ \"sections\": [ }");
    assert!(matches!(result, Err(RenderError::Parse { .. })));
}

#[test]
fn test_unresolvable_header_image_matches_no_header_image() {
    let renderer = offline_renderer();
    let plain = Report::from_json(sample_json()).unwrap();
    let with_url = Report {
        header_image_url: Some("https://cdn.example.com/never-fetched.jpg".to_string()),
        ..plain.clone()
    };

    let a = renderer.render(&plain).unwrap();
    let b = renderer.render(&with_url).unwrap();
    assert_eq!(a.bytes, b.bytes);
    assert_eq!(b.report.of_kind(ElementKind::HeaderImage).count(), 1);
    assert_eq!(b.report.skipped(), a.report.skipped() + 1);
}

#[test]
fn test_header_image_from_cache() {
    let cache = tempfile::tempdir().unwrap();
    let url = "https://cdn.example.com/front.png";
    write_png(cache.path(), &resolve::cache_file_name(url), 200, 100);

    let renderer = ReportRenderer::default()
        .with_resolver(LocalImageResolver::empty().with_cache_dir(cache.path()));
    let report = Report {
        header_image_url: Some(url.to_string()),
        ..Default::default()
    };
    let (surface, outcome) = lay_out(&renderer, &report);

    assert_eq!(surface.pages()[0].image_count(), 1);
    let header = outcome.of_kind(ElementKind::HeaderImage).next().unwrap();
    assert_eq!(header.placement, Placement::Placed);
}

// ─── Pagination ─────────────────────────────────────────────────

#[test]
fn test_long_body_paginates_with_consistent_footer() {
    let comments = (0..50)
        .map(|i| comment_with(format!("Comment {} ", i) + &"lorem ipsum dolor ".repeat(111)))
        .collect();
    let report = report_with_comments(comments);
    let (surface, outcome) = lay_out(&offline_renderer(), &report);

    let total = surface.page_count();
    assert!(total > 3, "expected several body pages, got {}", total);
    assert_eq!(outcome.page_count, total);
    for (i, page) in surface.pages().iter().enumerate() {
        let footer = format!("Page {} of {}", i + 1, total);
        assert!(page.texts().contains(&footer.as_str()), "missing footer on page {}", i + 1);
    }

    // Nothing is drawn below the bottom margin except the footer.
    for page in surface.pages() {
        for op in &page.ops {
            if let DrawOp::Text { y, text, .. } = op {
                if !text.starts_with("Page ") {
                    assert!(*y >= 50.0 - 1e-6, "'{}' drawn at {}", text, y);
                }
            }
        }
    }
    assert_eq!(outcome.skipped(), 0);
}

#[test]
fn test_overflowing_paragraph_adds_exactly_one_page() {
    let config = LayoutConfig::default();
    let mut surface = PdfSurface::new(PageSize::LETTER);
    let mut cursor = PageCursor::new(Geometry::new(surface.page_size(), &config.margin));
    cursor.ensure_page(&mut surface);
    cursor.move_to(300.0);

    let text = "The crawlspace vapor barrier is torn in several places. ".repeat(60);
    let para = Paragraph {
        text: &text,
        style: TextStyle::regular(10.0),
        x: 36.0,
        width: 540.0,
        spacing_after: 6.0,
    };
    let before = surface.page_count();
    let placement = place_paragraph(&mut surface, &mut cursor, &config.thresholds, &para);

    assert_eq!(placement, Placement::Placed);
    assert_eq!(surface.page_count(), before + 1);
    assert_eq!(cursor.current_page(), Some(1));
}

#[test]
fn test_template_pages_are_reused() {
    let template = Template::from_json(
        r#"{ "pages": [
            { "elements": [ { "type": "Text", "x": 36, "top": 40, "text": "Home Inspection" } ] },
            { "elements": [ { "type": "Text", "x": 36, "top": 40, "text": "Scope" } ] },
            { "elements": [ { "type": "Rect", "x": 36, "top": 40, "width": 540, "height": 10 } ] }
        ] }"#,
    )
    .unwrap();
    let renderer = offline_renderer().with_template(template);
    let output = renderer.render(&Report::from_json(sample_json()).unwrap()).unwrap();
    assert_eq!(output.report.page_count, 3);
}

// ─── Images ─────────────────────────────────────────────────────

#[test]
fn test_photo_keeps_aspect_ratio() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "attic.png", 300, 200);
    let resolver = move |source: &str| (source == "attic.png").then(|| path.clone());

    let report = report_with_comments(vec![model::Comment {
        text: Some("Attic insulation is uneven.".to_string()),
        photos: vec!["attic.png".to_string(), "missing.png".to_string()],
        ..Default::default()
    }]);
    let renderer = ReportRenderer::default().with_resolver(resolver);
    let (surface, outcome) = lay_out(&renderer, &report);

    let images = images_on(&surface, 2);
    assert_eq!(images.len(), 1);
    let (_, y, w, h) = images[0];
    assert!(((w / h) - 1.5).abs() < 1e-6);
    assert!(w <= 540.0 + 1e-6 && h <= 400.0 + 1e-6);
    assert!(y >= 55.0 - 1e-6);

    let photos: Vec<_> = outcome.of_kind(ElementKind::Photo).collect();
    assert_eq!(photos[0].placement, Placement::Placed);
    assert!(matches!(photos[1].placement, Placement::Skipped(_)));
}

#[test]
fn test_many_photos_never_cross_bottom_margin() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "tall.png", 100, 300);
    let resolver = move |_: &str| Some(path.clone());

    let report = report_with_comments(vec![model::Comment {
        photos: vec!["p".to_string(); 6],
        ..Default::default()
    }]);
    let renderer = ReportRenderer::default().with_resolver(resolver);
    let (surface, outcome) = lay_out(&renderer, &report);

    assert!(surface.page_count() > 3);
    for page in 2..surface.page_count() {
        for (_, y, w, h) in images_on(&surface, page) {
            assert!(y >= 55.0 - 1e-6);
            assert!(((h / w) - 3.0).abs() < 1e-6);
        }
    }
    assert_eq!(outcome.of_kind(ElementKind::Photo).count(), 6);
}

#[test]
fn test_unprobed_photo_uses_estimate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "wide.png", 400, 100);
    let resolver = move |_: &str| Some(path.clone());

    let report = report_with_comments(vec![model::Comment {
        photos: vec!["wide.png".to_string()],
        ..Default::default()
    }]);
    let renderer = ReportRenderer::default()
        .with_resolver(resolver)
        .with_probe(NoProbe);
    let (surface, outcome) = lay_out(&renderer, &report);

    let (_, _, w, h) = images_on(&surface, 2)[0];
    assert!(((w / h) - 4.0).abs() < 1e-6);
    let photo = outcome.of_kind(ElementKind::Photo).next().unwrap();
    assert!(matches!(photo.placement, Placement::Degraded(_)));
}

// ─── Text handling ──────────────────────────────────────────────

#[test]
fn test_entities_decoded_and_video_referenced() {
    let report = Report::from_json(
        r#"{ "sections": [ { "name": "Exterior", "lineItems": [ { "name": "Deck", "comments": [
            { "label": "Rail", "content": "Loose rail &amp; missing baluster&#39;s cap",
              "videos": ["https://video.example.com/deck"] }
        ] } ] } ] }"#,
    )
    .unwrap();
    let (surface, _) = lay_out(&offline_renderer(), &report);

    let body = surface.pages()[2].texts();
    assert_eq!(
        &body[..5],
        &[
            "Exterior",
            "Deck",
            "Rail",
            "Loose rail & missing baluster's cap",
            "Video: https://video.example.com/deck"
        ]
    );
}

#[test]
fn test_named_entities_decoded_in_body() {
    let report = report_with_comments(vec![comment_with("It&apos;s &amp; ready &lt;now&gt;".to_string())]);
    let (surface, _) = lay_out(&offline_renderer(), &report);
    assert!(surface.pages()[2].texts().contains(&"It's & ready <now>"));
}

#[test]
fn test_epoch_millis_date_on_cover() {
    let report = Report::from_json(r#"{ "schedule": { "date": 1700000000000 } }"#).unwrap();
    let (surface, _) = lay_out(&offline_renderer(), &report);
    assert!(surface.pages()[0].texts().contains(&"November 14, 2023"));
}

// ─── Recovery ───────────────────────────────────────────────────

#[test]
fn test_broken_surface_falls_back_and_keeps_going() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "x.png", 10, 10);
    let resolver = move |_: &str| Some(path.clone());

    let report = report_with_comments(vec![
        model::Comment {
            text: Some("Water staining at the ceiling below the bathroom.".to_string()),
            photos: vec!["x.png".to_string()],
            ..Default::default()
        },
        comment_with("Second comment still rendered.".to_string()),
    ]);
    let renderer = ReportRenderer::default().with_resolver(resolver);
    let mut surface = BrokenSurface {
        inner: PdfSurface::new(PageSize::LETTER),
    };
    let outcome = renderer.render_onto(&mut surface, &report);

    let body = surface.inner.pages()[2].texts();
    assert!(body.contains(&"Water staining at the ceiling below the bathroom."));
    assert!(body.contains(&"Second comment still rendered."));
    assert!(outcome
        .of_kind(ElementKind::Paragraph)
        .all(|e| matches!(e.placement, Placement::Degraded(_))));
    assert!(outcome
        .of_kind(ElementKind::Photo)
        .all(|e| matches!(e.placement, Placement::Skipped(_))));

    let bytes = surface.finish().unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_render_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.pdf");
    let report = Report::from_json(sample_json()).unwrap();

    let outcome = offline_renderer().render_to_file(&report, &out).unwrap();
    assert_eq!(outcome.page_count, 3);
    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7"));
}

#[test]
fn test_missing_template_renders_on_default_page() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.pdf");
    let report = Report::from_json(sample_json()).unwrap();

    let renderer = offline_renderer().with_template_path(&dir.path().join("no_such_template.json"));
    let outcome = renderer.render_to_file(&report, &out).unwrap();

    assert_eq!(outcome.page_count, 3);
    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7"));
    assert!(String::from_utf8_lossy(&bytes).contains("/MediaBox [0 0 612.00 792.00]"));
}

#[test]
fn test_template_too_short_for_margins_is_dropped() {
    let template = Template::from_json(
        r#"{ "pageSize": { "width": 612, "height": 80 },
             "pages": [ { "elements": [ { "type": "Text", "x": 36, "top": 20, "text": "Banner" } ] } ] }"#,
    )
    .unwrap();
    let renderer = offline_renderer().with_template(template);
    let report = Report::from_json(sample_json()).unwrap();
    let output = renderer.render(&report).unwrap();

    assert_eq!(output.report.page_count, 3);
    let text = String::from_utf8_lossy(&output.bytes);
    assert!(text.contains("/MediaBox [0 0 612.00 792.00]"));
    assert!(!text.contains("612.00 80.00"));
}

#[test]
fn test_render_to_missing_directory_is_io_error() {
    let report = Report::default();
    let result = offline_renderer().render_to_file(&report, Path::new("/no/such/dir/out.pdf"));
    assert!(matches!(result, Err(RenderError::Io { .. })));
}
