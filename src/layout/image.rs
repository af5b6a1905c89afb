//! # Image Placement
//!
//! Places a resolved local image either as the cover-page header (fixed
//! box, scaled to fit) or in the body flow at the cursor. Body images keep
//! their intrinsic aspect ratio, are capped in height, and never cross the
//! bottom margin.
//!
//! When no dimension probe is available the surface scales the image into
//! the box itself and the cursor advance is estimated from a fallback
//! aspect ratio.

use std::path::Path;

use super::{PageCursor, Placement};
use crate::config::ImageLayout;
use crate::image_loader::{is_supported_image, DimensionProbe};
use crate::surface::{DrawingSurface, ImageFit, Rect};

/// Draw the header image into its fixed box on the cursor's page.
pub fn place_header_image<S: DrawingSurface>(
    surface: &mut S,
    cursor: &mut PageCursor,
    layout: &ImageLayout,
    path: &Path,
) -> Placement {
    if !is_supported_image(path) {
        return Placement::skipped(format!("'{}' is not a usable image", path.display()));
    }
    let Some(page) = cursor.ensure_page(surface) else {
        return Placement::skipped("no page available");
    };

    let geometry = *cursor.geometry();
    let rect = Rect::new(
        geometry.content_left,
        geometry.to_drawing_y(layout.header_top),
        geometry.content_width,
        layout.header_max_height,
    );
    match surface.draw_image(page, path, rect, ImageFit::Contain) {
        Ok(()) => Placement::Placed,
        Err(e) => {
            log::warn!("header image '{}' not drawn: {}", path.display(), e);
            Placement::skipped(e.to_string())
        }
    }
}

/// Draw a body image at the cursor and advance past it.
pub fn place_content_image<S: DrawingSurface>(
    surface: &mut S,
    cursor: &mut PageCursor,
    layout: &ImageLayout,
    probe: &dyn DimensionProbe,
    path: &Path,
) -> Placement {
    if !is_supported_image(path) {
        return Placement::skipped(format!("'{}' is not a usable image", path.display()));
    }
    if cursor.ensure_page(surface).is_none() {
        return Placement::skipped("no page available");
    }

    let geometry = *cursor.geometry();
    let floor = geometry.bottom_margin + layout.bottom_offset;

    let room = |y: f64| y - geometry.bottom_margin - layout.safety_margin;
    let start = cursor.y() - layout.spacing_before;
    if room(start) < layout.min_height && cursor.new_page(surface).is_none() {
        return Placement::skipped("no page available");
    }
    let Some(page) = cursor.current_page() else {
        return Placement::skipped("no page available");
    };
    cursor.move_down(layout.spacing_before);

    let capped = room(cursor.y()).min(layout.max_height);
    let max_width = geometry.content_width;
    let top = cursor.y();

    let (result, bottom, outcome) = match probe.dimensions(path) {
        Some(intrinsic) => {
            let (width, height) = fit_dimensions(intrinsic, max_width, capped, top, floor);
            let rect = Rect::new(geometry.content_left, top, width, height);
            (
                surface.draw_image(page, path, rect, ImageFit::Exact),
                rect.bottom(),
                Placement::Placed,
            )
        }
        None => {
            log::info!("no dimensions for '{}'; estimating its height", path.display());
            let rect = Rect::new(geometry.content_left, top, max_width, capped);
            let estimated = (max_width / layout.fallback_aspect_ratio).min(capped);
            (
                surface.draw_image(page, path, rect, ImageFit::Contain),
                top - estimated,
                Placement::degraded("dimensions unknown; height estimated"),
            )
        }
    };

    match result {
        Ok(()) => {
            cursor.move_to((bottom - layout.spacing_after).max(floor));
            outcome
        }
        Err(e) => {
            log::warn!("image '{}' not drawn: {}", path.display(), e);
            Placement::skipped(e.to_string())
        }
    }
}

/// Rendered size for an image of `intrinsic` pixels, preserving its aspect
/// ratio, within `max_width` x `capped_height`, and with its bottom edge no
/// lower than `floor` when its top sits at `top`.
pub fn fit_dimensions(
    intrinsic: (u32, u32),
    max_width: f64,
    capped_height: f64,
    top: f64,
    floor: f64,
) -> (f64, f64) {
    let aspect = intrinsic.0 as f64 / intrinsic.1 as f64;

    let (mut width, mut height) = if max_width / aspect <= capped_height {
        (max_width, max_width / aspect)
    } else {
        (capped_height * aspect, capped_height)
    };

    if top - height < floor {
        height = (top - floor).max(0.0);
        width = height * aspect;
        if width > max_width {
            width = max_width;
            height = width / aspect;
        }
    }
    (width, height)
}
