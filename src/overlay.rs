use std::cell::RefCell;
use std::rc::Rc;

use image::{imageops, imageops::FilterType, DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, Blend};
use imageproc::rect::Rect;

use crate::error::OverlayResult;
use crate::geometry::{ContainFit, Dimensions, HighlightRect};

/// Translucent red wash over the matched region, 20% opacity.
const FILL: Rgba<u8> = Rgba([255, 0, 0, 51]);
const BORDER: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BORDER_THICKNESS: u32 = 2;
const LETTERBOX: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Presentation sink for the active highlight. The controller decides what to
/// mark and when; implementations decide how that looks.
pub trait Overlay {
    fn show(&mut self, rect: HighlightRect);
    fn hide(&mut self);
}

impl<T: Overlay> Overlay for Rc<RefCell<T>> {
    fn show(&mut self, rect: HighlightRect) {
        self.borrow_mut().show(rect);
    }

    fn hide(&mut self) {
        self.borrow_mut().hide();
    }
}

/// Sink that discards everything. Useful when only the computed rectangles
/// matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOverlay;

impl Overlay for NullOverlay {
    fn show(&mut self, _rect: HighlightRect) {}

    fn hide(&mut self) {}
}

/// Rasterizing sink: keeps a base view of the rendered surface and paints the
/// active highlight onto a copy on demand.
pub struct ImageOverlay {
    base: RgbaImage,
    active: Option<HighlightRect>,
}

impl ImageOverlay {
    pub fn new(base: RgbaImage) -> Self {
        Self { base, active: None }
    }

    pub fn active(&self) -> Option<HighlightRect> {
        self.active
    }

    pub fn render(&self) -> RgbaImage {
        let canvas = self.base.clone();
        match self.active {
            Some(rect) => draw_highlight(canvas, &rect),
            None => canvas,
        }
    }
}

impl Overlay for ImageOverlay {
    fn show(&mut self, rect: HighlightRect) {
        self.active = Some(rect);
    }

    fn hide(&mut self) {
        self.active = None;
    }
}

/// Paint one highlight: translucent fill first, then an opaque border drawn
/// as inset hollow rects so the stroke stays inside the rectangle.
pub fn draw_highlight(canvas: RgbaImage, rect: &HighlightRect) -> RgbaImage {
    let Some(bounds) = clamp_to_canvas(rect, canvas.width(), canvas.height()) else {
        return canvas;
    };

    let mut blend = Blend(canvas);
    draw_filled_rect_mut(&mut blend, bounds, FILL);
    let mut canvas = blend.0;

    for inset in 0..BORDER_THICKNESS {
        let shrink = 2 * inset;
        if bounds.width() <= shrink || bounds.height() <= shrink {
            break;
        }
        let ring = Rect::at(bounds.left() + inset as i32, bounds.top() + inset as i32)
            .of_size(bounds.width() - shrink, bounds.height() - shrink);
        draw_hollow_rect_mut(&mut canvas, ring, BORDER);
    }

    canvas
}

/// Intersect a display-space rectangle with the canvas, in whole pixels.
/// Returns `None` when nothing of it is on the canvas.
fn clamp_to_canvas(rect: &HighlightRect, width: u32, height: u32) -> Option<Rect> {
    let left = rect.left.clamp(0.0, width as f32).round() as i32;
    let top = rect.top.clamp(0.0, height as f32).round() as i32;
    let right = rect.right().clamp(0.0, width as f32).round() as i32;
    let bottom = rect.bottom().clamp(0.0, height as f32).round() as i32;
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::at(left, top).of_size((right - left) as u32, (bottom - top) as u32))
}

/// Rasterize the "contain" view of an image inside a rendered box: the image
/// scaled to its fitted extent, centered over letterbox bars.
pub fn compose_view(image: &DynamicImage, rendered: Dimensions) -> OverlayResult<RgbaImage> {
    let fit = ContainFit::compute(Dimensions::of(image), rendered)?;

    let mut canvas = RgbaImage::from_pixel(
        rendered.width.round().max(1.0) as u32,
        rendered.height.round().max(1.0) as u32,
        LETTERBOX,
    );
    let fitted = image.resize_exact(
        (fit.fitted.width.round() as u32).max(1),
        (fit.fitted.height.round() as u32).max(1),
        FilterType::Triangle,
    );
    imageops::overlay(
        &mut canvas,
        &fitted.to_rgba8(),
        fit.offset_x.round() as i64,
        fit.offset_y.round() as i64,
    );
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_blends_and_border_overwrites() {
        let canvas = RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]));
        let out = draw_highlight(
            canvas,
            &HighlightRect {
                left: 10.0,
                top: 10.0,
                width: 20.0,
                height: 20.0,
            },
        );
        assert_eq!(*out.get_pixel(10, 10), BORDER);
        let center = out.get_pixel(20, 20);
        assert_eq!(center[0], 255);
        assert!(center[1] < 255, "fill should tint the interior");
        assert_eq!(*out.get_pixel(5, 5), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn offscreen_rect_leaves_the_canvas_alone() {
        let canvas = RgbaImage::from_pixel(8, 8, Rgba([9, 9, 9, 255]));
        let out = draw_highlight(
            canvas.clone(),
            &HighlightRect {
                left: 100.0,
                top: 100.0,
                width: 5.0,
                height: 5.0,
            },
        );
        assert_eq!(out, canvas);
    }

    #[test]
    fn partly_offscreen_rect_is_clipped() {
        let canvas = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let out = draw_highlight(
            canvas,
            &HighlightRect {
                left: -5.0,
                top: -5.0,
                width: 10.0,
                height: 10.0,
            },
        );
        assert_eq!(*out.get_pixel(0, 0), BORDER);
        assert_eq!(*out.get_pixel(9, 9), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn compose_view_letterboxes_a_wide_image() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            200,
            100,
            Rgba([255, 255, 255, 255]),
        ));
        let view = compose_view(&image, Dimensions::new(100.0, 100.0)).unwrap();
        assert_eq!(view.dimensions(), (100, 100));
        assert_eq!(*view.get_pixel(50, 10), LETTERBOX);
        assert_eq!(*view.get_pixel(50, 50), Rgba([255, 255, 255, 255]));
        assert_eq!(*view.get_pixel(50, 90), LETTERBOX);
    }
}
