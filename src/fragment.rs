use float_ord::FloatOrd;
use geo::{Coord, LineString, Polygon, Rect};

use crate::error::{OverlayError, OverlayResult};

/// Text region geometry as reported by the OCR engine, in the image's natural
/// pixel space. Only the axis-aligned envelope of the vertices matters to the
/// mapper; vertex order and any rotation beyond the envelope are retained but
/// not interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingPolygon {
    polygon: Polygon<f32>,
    envelope: Rect<f32>,
}

impl BoundingPolygon {
    pub fn new(vertices: Vec<Coord<f32>>) -> OverlayResult<Self> {
        if vertices.len() < 4 {
            return Err(OverlayError::DegeneratePolygon {
                vertices: vertices.len(),
            });
        }
        let envelope = envelope_of(&vertices);
        Ok(Self {
            polygon: Polygon::new(LineString::new(vertices), vec![]),
            envelope,
        })
    }

    /// Four-corner polygon covering exactly `envelope`.
    pub fn axis_aligned(envelope: Rect<f32>) -> Self {
        let (min, max) = (envelope.min(), envelope.max());
        let corners = vec![
            Coord { x: min.x, y: min.y },
            Coord { x: max.x, y: min.y },
            Coord { x: max.x, y: max.y },
            Coord { x: min.x, y: max.y },
        ];
        Self {
            polygon: Polygon::new(LineString::new(corners), vec![]),
            envelope,
        }
    }

    pub fn envelope(&self) -> Rect<f32> {
        self.envelope
    }

    pub fn polygon(&self) -> &Polygon<f32> {
        &self.polygon
    }
}

fn envelope_of(vertices: &[Coord<f32>]) -> Rect<f32> {
    // Callers have already rejected empty vertex lists.
    let min_x = vertices.iter().map(|v| FloatOrd(v.x)).min().unwrap().0;
    let min_y = vertices.iter().map(|v| FloatOrd(v.y)).min().unwrap().0;
    let max_x = vertices.iter().map(|v| FloatOrd(v.x)).max().unwrap().0;
    let max_y = vertices.iter().map(|v| FloatOrd(v.y)).max().unwrap().0;
    Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
}

/// One extracted text region: recognized text, the engine's confidence for
/// it, and its bounding geometry. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub confidence: f32,
    pub polygon: BoundingPolygon,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, confidence: f32, polygon: BoundingPolygon) -> Self {
        Self {
            text: text.into(),
            confidence,
            polygon,
        }
    }
}

/// The ordered result set for the currently displayed image. Replaced
/// wholesale when a new OCR result arrives, never edited in place.
#[derive(Debug, Clone, Default)]
pub struct FragmentSet {
    fragments: Vec<TextFragment>,
}

impl FragmentSet {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TextFragment> {
        self.fragments.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TextFragment> {
        self.fragments.iter()
    }

    pub fn push(&mut self, fragment: TextFragment) {
        self.fragments.push(fragment);
    }

    /// All fragment texts, one per line, in engine order. Feeds the
    /// embedder's copy-all action.
    pub fn full_text(&self) -> String {
        self.fragments
            .iter()
            .map(|fragment| fragment.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::ops::Index<usize> for FragmentSet {
    type Output = TextFragment;

    fn index(&self, index: usize) -> &Self::Output {
        &self.fragments[index]
    }
}

impl FromIterator<TextFragment> for FragmentSet {
    fn from_iter<I: IntoIterator<Item = TextFragment>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_vertices_are_rejected() {
        let err = BoundingPolygon::new(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            Coord { x: 10.0, y: 10.0 },
        ])
        .unwrap_err();
        assert!(matches!(err, OverlayError::DegeneratePolygon { vertices: 3 }));
    }

    #[test]
    fn envelope_ignores_vertex_order() {
        let polygon = BoundingPolygon::new(vec![
            Coord { x: 90.0, y: 140.0 },
            Coord { x: 20.0, y: 35.0 },
            Coord { x: 90.0, y: 35.0 },
            Coord { x: 20.0, y: 140.0 },
            Coord { x: 55.0, y: 80.0 },
        ])
        .unwrap();
        let envelope = polygon.envelope();
        assert_eq!(envelope.min(), Coord { x: 20.0, y: 35.0 });
        assert_eq!(envelope.max(), Coord { x: 90.0, y: 140.0 });
    }

    #[test]
    fn axis_aligned_round_trips_its_envelope() {
        let rect = Rect::new(Coord { x: 1.0, y: 2.0 }, Coord { x: 7.0, y: 9.0 });
        let polygon = BoundingPolygon::axis_aligned(rect);
        assert_eq!(polygon.envelope(), rect);
        assert_eq!(polygon.polygon().exterior().coords().count(), 5);
    }

    #[test]
    fn full_text_preserves_engine_order() {
        let envelope = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        let set: FragmentSet = ["first", "second", "third"]
            .into_iter()
            .map(|text| TextFragment::new(text, 1.0, BoundingPolygon::axis_aligned(envelope)))
            .collect();
        assert_eq!(set.full_text(), "first\nsecond\nthird");
    }
}
