use std::time::{Duration, Instant};

mod debounce;
mod error;
mod fragment;
mod geometry;
mod overlay;
pub mod payload;

pub use debounce::{Debouncer, DEFAULT_DEBOUNCE_WINDOW};
pub use error::{OverlayError, OverlayResult};
pub use fragment::{BoundingPolygon, FragmentSet, TextFragment};
pub use geometry::{
    display_rect, ContainFit, Dimensions, HighlightRect, SurfaceMetrics, MIN_VISIBLE_SIZE,
};
pub use overlay::{compose_view, draw_highlight, ImageOverlay, NullOverlay, Overlay};
use tracing::instrument;

pub use geo;

pub struct HighlighterBuilder {
    fragments: FragmentSet,
    overlay: Option<Box<dyn Overlay>>,
    surface: SurfaceMetrics,
    debounce_window: Duration,
}

impl HighlighterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragments(mut self, fragments: FragmentSet) -> Self {
        self.fragments = fragments;
        self
    }

    pub fn overlay(mut self, overlay: impl Overlay + 'static) -> Self {
        self.overlay = Some(Box::new(overlay));
        self
    }

    pub fn surface(mut self, surface: SurfaceMetrics) -> Self {
        self.surface = surface;
        self
    }

    pub fn debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    pub fn build(self) -> Highlighter {
        Highlighter {
            fragments: self.fragments,
            overlay: self.overlay.unwrap_or_else(|| Box::new(NullOverlay)),
            surface: self.surface,
            selected: None,
            resize_debounce: Debouncer::new(self.debounce_window),
            awaiting_decode: false,
        }
    }
}

impl Default for HighlighterBuilder {
    fn default() -> Self {
        Self {
            fragments: FragmentSet::default(),
            overlay: None,
            surface: SurfaceMetrics::undecoded(Dimensions::new(0.0, 0.0)),
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

/// Drives the highlight overlay: holds the recognized fragments, the current
/// surface reading and the selection, and redraws through the [`Overlay`]
/// sink as those change.
pub struct Highlighter {
    fragments: FragmentSet,
    overlay: Box<dyn Overlay>,
    surface: SurfaceMetrics,
    selected: Option<usize>,
    resize_debounce: Debouncer,
    awaiting_decode: bool,
}

impl Highlighter {
    pub fn builder() -> HighlighterBuilder {
        HighlighterBuilder::new()
    }

    /// Select a fragment and draw its highlight. Returns the drawn rectangle,
    /// or `None` when the surface is not measurable yet; in that case the
    /// draw re-runs from [`on_image_loaded`](Self::on_image_loaded).
    #[instrument(skip(self), level = "debug")]
    pub fn select(&mut self, index: usize) -> OverlayResult<Option<HighlightRect>> {
        if index >= self.fragments.len() {
            return Err(OverlayError::FragmentOutOfRange {
                index,
                len: self.fragments.len(),
            });
        }
        self.selected = Some(index);
        // A fresh draw supersedes whatever a pending resize redraw would show.
        self.resize_debounce.cancel();
        self.redraw()
    }

    /// Advance the selection, wrapping past the last fragment to the first.
    pub fn select_next(&mut self) -> OverlayResult<Option<HighlightRect>> {
        self.step(1)
    }

    pub fn select_previous(&mut self) -> OverlayResult<Option<HighlightRect>> {
        self.step(-1)
    }

    fn step(&mut self, direction: isize) -> OverlayResult<Option<HighlightRect>> {
        let len = self.fragments.len();
        if len == 0 {
            return Ok(None);
        }
        let next = match self.selected {
            Some(current) => (current as isize + direction).rem_euclid(len as isize) as usize,
            None if direction > 0 => 0,
            None => len - 1,
        };
        self.select(next)
    }

    /// Drop the selection and anything still pending for it.
    pub fn clear(&mut self) {
        self.selected = None;
        self.awaiting_decode = false;
        self.resize_debounce.cancel();
        self.overlay.hide();
    }

    /// Record a new surface reading. The redraw is debounced: it runs from
    /// [`tick`](Self::tick) once the readings settle for a full window.
    pub fn on_surface_changed(&mut self, surface: SurfaceMetrics, now: Instant) {
        self.surface = surface;
        if self.selected.is_some() {
            self.resize_debounce.schedule(now);
        }
    }

    /// Record the surface reading taken when the image finished decoding and
    /// redraw immediately, flushing a draw deferred by an unmeasurable
    /// surface.
    #[instrument(skip(self), level = "debug")]
    pub fn on_image_loaded(
        &mut self,
        surface: SurfaceMetrics,
    ) -> OverlayResult<Option<HighlightRect>> {
        self.surface = surface;
        if self.selected.is_none() {
            return Ok(None);
        }
        self.resize_debounce.cancel();
        self.redraw()
    }

    /// Run the debounced redraw if its window has elapsed by `now`.
    pub fn tick(&mut self, now: Instant) -> OverlayResult<Option<HighlightRect>> {
        if self.resize_debounce.fire(now) {
            self.redraw()
        } else {
            Ok(None)
        }
    }

    /// Swap in a new recognition result. The old selection is meaningless
    /// against the new indices, so it is cleared.
    pub fn replace_fragments(&mut self, fragments: FragmentSet) {
        self.fragments = fragments;
        self.clear();
    }

    fn redraw(&mut self) -> OverlayResult<Option<HighlightRect>> {
        let Some(index) = self.selected else {
            return Ok(None);
        };
        let fragment = &self.fragments[index];
        match display_rect(self.surface.natural, self.surface.rendered, &fragment.polygon) {
            Ok(rect) => {
                self.awaiting_decode = false;
                log::debug!("highlight #{index} at {rect:?}");
                self.overlay.show(rect);
                Ok(Some(rect))
            }
            Err(OverlayError::NotReady) => {
                self.awaiting_decode = true;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub fn fragments(&self) -> &FragmentSet {
        &self.fragments
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_fragment(&self) -> Option<&TextFragment> {
        self.fragments.get(self.selected?)
    }

    pub fn surface(&self) -> SurfaceMetrics {
        self.surface
    }

    /// True while a selected highlight waits on the image decode to finish.
    pub fn awaiting_decode(&self) -> bool {
        self.awaiting_decode
    }
}
