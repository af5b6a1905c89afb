//! # inspectpdf
//!
//! Renders home-inspection reports onto a fixed multi-page template.
//!
//! The first page is a cover with header fields at fixed positions. The
//! second page is static template content. From the third page on, the
//! report body (sections, line items, comments, photos) flows top to bottom
//! with every break decided against the page boundary as content is placed.
//!
//! A single bad element never sinks the document: missing images, text that
//! will not fit and surface errors are logged, recorded in the
//! [`RenderReport`], and rendering carries on.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON record)
//!       ↓
//!   [model]    — normalize aliases into Report / Section / LineItem / Comment
//!       ↓
//!   [layout]   — walker + field / text_flow / image renderers over a PageCursor
//!       ↓
//!   [surface]  — DrawingSurface trait; PdfSurface records ops per page
//!       ↓
//!   PDF bytes
//! ```

pub mod config;
pub mod date;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod resolve;
pub mod surface;
pub mod template;
pub mod text;

use std::path::Path;

pub use config::LayoutConfig;
pub use error::{RenderError, SurfaceError};
pub use image_loader::{DimensionProbe, ImageSizeProbe, NoProbe};
pub use layout::{ElementKind, Placement, RenderReport};
pub use model::Report;
pub use resolve::{ImageResolver, LocalImageResolver};
pub use template::Template;

use layout::walker::Walker;
use surface::{DrawingSurface, PdfSurface};

/// The finished document plus what happened to each element.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub report: RenderReport,
}

/// Configured renderer. Build once, render many reports.
pub struct ReportRenderer {
    config: LayoutConfig,
    template: Option<Template>,
    resolver: Box<dyn ImageResolver>,
    probe: Box<dyn DimensionProbe>,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl ReportRenderer {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            template: None,
            resolver: Box::new(LocalImageResolver::default()),
            probe: Box::new(ImageSizeProbe),
        }
    }

    /// Overlay the report on `template`'s pages. Its page size wins over
    /// the configured one, unless the configured margins leave no content
    /// area on it; such a template is dropped with a warning.
    pub fn with_template(mut self, template: Template) -> Self {
        if !self.config.has_content_area(template.page_size) {
            log::warn!(
                "template page size {}x{} leaves no content area; using {}x{}",
                template.page_size.width,
                template.page_size.height,
                self.config.page_size.width,
                self.config.page_size.height
            );
            self.template = None;
            return self;
        }
        self.template = Some(template);
        self
    }

    /// Load the template at `path`. A template that cannot be read or
    /// parsed is left out with a warning and the configured page size is
    /// used instead.
    pub fn with_template_path(self, path: &Path) -> Self {
        match Template::from_path(path) {
            Ok(template) => self.with_template(template),
            Err(e) => {
                log::warn!("template not loaded, rendering without one: {}", e);
                self
            }
        }
    }

    pub fn with_resolver(mut self, resolver: impl ImageResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_probe(mut self, probe: impl DimensionProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out `report` on a fresh surface and serialize it.
    pub fn render(&self, report: &Report) -> Result<RenderOutput, RenderError> {
        let mut surface = match &self.template {
            Some(template) => PdfSurface::from_template(template),
            None => PdfSurface::new(self.config.page_size),
        };
        let outcome = self.render_onto(&mut surface, report);
        let bytes = surface.finish().map_err(RenderError::Finalize)?;
        Ok(RenderOutput {
            bytes,
            report: outcome,
        })
    }

    /// Lay out `report` onto any drawing surface without finishing it.
    pub fn render_onto<S: DrawingSurface>(&self, surface: &mut S, report: &Report) -> RenderReport {
        Walker::new(surface, &self.config, self.resolver.as_ref(), self.probe.as_ref()).walk(report)
    }

    /// Render and write the PDF to `path`.
    pub fn render_to_file(&self, report: &Report, path: &Path) -> Result<RenderReport, RenderError> {
        let output = self.render(report)?;
        std::fs::write(path, &output.bytes).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("wrote {} bytes to {}", output.bytes.len(), path.display());
        Ok(output.report)
    }
}

/// Render a report with the default configuration.
pub fn render_report(report: &Report) -> Result<RenderOutput, RenderError> {
    ReportRenderer::default().render(report)
}

/// Render a report given as a JSON record with the default configuration.
pub fn render_json(json: &str) -> Result<RenderOutput, RenderError> {
    let report = Report::from_json(json)?;
    render_report(&report)
}
