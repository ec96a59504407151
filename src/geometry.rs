use geo::{Coord, Rect};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, OverlayResult};
use crate::fragment::BoundingPolygon;

/// Smallest rendered extent of a highlight, in display units. Keeps
/// near-zero-area boxes visible.
pub const MIN_VISIBLE_SIZE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Natural (intrinsic pixel) size of a decoded image.
    pub fn of(image: &DynamicImage) -> Self {
        Self::new(image.width() as f32, image.height() as f32)
    }

    pub fn ratio(&self) -> f32 {
        self.width / self.height
    }

    /// An extent the layout system cannot map: zero, negative or non-finite.
    /// The DOM reports a 0x0 natural size for an image that is still decoding.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f32, height as f32)
    }
}

/// One reading of the display surface: the image's natural pixel size and the
/// on-screen size of the element showing it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMetrics {
    pub natural: Dimensions,
    pub rendered: Dimensions,
}

impl SurfaceMetrics {
    pub fn new(natural: Dimensions, rendered: Dimensions) -> Self {
        Self { natural, rendered }
    }

    /// Reading for an image element whose decode has not finished.
    pub fn undecoded(rendered: Dimensions) -> Self {
        Self {
            natural: Dimensions::new(0.0, 0.0),
            rendered,
        }
    }

    pub fn is_decoded(&self) -> bool {
        !self.natural.is_degenerate()
    }
}

/// Resolved "contain" placement of an image inside a rendered box: scale
/// factors from natural to display space, the letterbox offsets, and the
/// effective extent the image actually occupies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainFit {
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub fitted: Dimensions,
}

impl ContainFit {
    pub fn compute(natural: Dimensions, rendered: Dimensions) -> OverlayResult<Self> {
        if natural.is_degenerate() || rendered.is_degenerate() {
            return Err(OverlayError::NotReady);
        }

        let (fitted, offset_x, offset_y) = if natural.ratio() > rendered.ratio() {
            // Wider than the box: full width, bars above and below.
            let fitted = Dimensions::new(rendered.width, rendered.width / natural.ratio());
            (fitted, 0.0, (rendered.height - fitted.height) / 2.0)
        } else {
            // Taller than the box: full height, bars left and right.
            let fitted = Dimensions::new(rendered.height * natural.ratio(), rendered.height);
            (fitted, (rendered.width - fitted.width) / 2.0, 0.0)
        };

        let fit = Self {
            scale_x: fitted.width / natural.width,
            scale_y: fitted.height / natural.height,
            offset_x,
            offset_y,
            fitted,
        };
        log::trace!("contain fit of {natural:?} in {rendered:?}: {fit:?}");
        Ok(fit)
    }

    pub fn map_point(&self, point: Coord<f32>) -> Coord<f32> {
        Coord {
            x: point.x * self.scale_x + self.offset_x,
            y: point.y * self.scale_y + self.offset_y,
        }
    }

    /// Map an axis-aligned envelope into display space, flooring both extents
    /// to [`MIN_VISIBLE_SIZE`].
    pub fn map_envelope(&self, envelope: Rect<f32>) -> HighlightRect {
        let min = self.map_point(envelope.min());
        let max = self.map_point(envelope.max());
        HighlightRect {
            left: min.x,
            top: min.y,
            width: (max.x - min.x).max(MIN_VISIBLE_SIZE),
            height: (max.y - min.y).max(MIN_VISIBLE_SIZE),
        }
    }
}

/// Rectangle to mark on the overlay, in the rendered surface's coordinate
/// space (top-left origin, same units as `rendered`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighlightRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl HighlightRect {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Translate an engine-space bounding polygon into the rectangle to draw over
/// an image displayed with "contain" scaling.
pub fn display_rect(
    natural: Dimensions,
    rendered: Dimensions,
    polygon: &BoundingPolygon,
) -> OverlayResult<HighlightRect> {
    Ok(ContainFit::compute(natural, rendered)?.map_envelope(polygon.envelope()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn wide_image_is_width_constrained() {
        let fit = ContainFit::compute(
            Dimensions::new(1000.0, 500.0),
            Dimensions::new(400.0, 300.0),
        )
        .unwrap();
        assert_close(fit.fitted.width, 400.0);
        assert_close(fit.fitted.height, 200.0);
        assert_close(fit.offset_x, 0.0);
        assert_close(fit.offset_y, 50.0);
        assert_close(fit.scale_x, 0.4);
        assert_close(fit.scale_y, 0.4);
    }

    #[test]
    fn tall_image_is_height_constrained() {
        let fit = ContainFit::compute(
            Dimensions::new(500.0, 1000.0),
            Dimensions::new(300.0, 400.0),
        )
        .unwrap();
        assert_close(fit.fitted.width, 200.0);
        assert_close(fit.fitted.height, 400.0);
        assert_close(fit.offset_x, 50.0);
        assert_close(fit.offset_y, 0.0);
        assert_close(fit.scale_x, 0.4);
        assert_close(fit.scale_y, 0.4);
    }

    #[test]
    fn matching_ratio_has_no_letterbox() {
        let fit = ContainFit::compute(
            Dimensions::new(640.0, 480.0),
            Dimensions::new(320.0, 240.0),
        )
        .unwrap();
        assert_close(fit.offset_x, 0.0);
        assert_close(fit.offset_y, 0.0);
        assert_close(fit.scale_x, 0.5);
        assert_close(fit.scale_y, 0.5);
    }

    #[test]
    fn collapsed_envelope_floors_to_visible_size() {
        let fit = ContainFit::compute(
            Dimensions::new(1000.0, 500.0),
            Dimensions::new(400.0, 300.0),
        )
        .unwrap();
        let rect = fit.map_envelope(Rect::new(
            Coord { x: 250.0, y: 250.0 },
            Coord { x: 250.0, y: 250.0 },
        ));
        assert_close(rect.width, MIN_VISIBLE_SIZE);
        assert_close(rect.height, MIN_VISIBLE_SIZE);
    }

    #[test]
    fn undecoded_image_is_not_ready() {
        let surface = SurfaceMetrics::undecoded(Dimensions::new(400.0, 300.0));
        assert!(!surface.is_decoded());
        let err = ContainFit::compute(surface.natural, surface.rendered).unwrap_err();
        assert!(matches!(err, OverlayError::NotReady));
    }

    #[test]
    fn collapsed_surface_is_not_ready() {
        let err = ContainFit::compute(
            Dimensions::new(800.0, 600.0),
            Dimensions::new(0.0, 0.0),
        )
        .unwrap_err();
        assert!(matches!(err, OverlayError::NotReady));
    }
}
