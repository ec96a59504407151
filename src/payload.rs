use geo::{Coord, Rect};
use serde::Deserialize;
use tracing::instrument;

use crate::error::OverlayResult;
use crate::fragment::{BoundingPolygon, FragmentSet, TextFragment};

// Stand-in geometry for engines that return text without usable coordinates:
// a vertical stack down the left edge of the image.
const PLACEHOLDER_LEFT: f32 = 50.0;
const PLACEHOLDER_RIGHT: f32 = 400.0;
const PLACEHOLDER_TOP: f32 = 50.0;
const PLACEHOLDER_ROW_HEIGHT: f32 = 30.0;
const PLACEHOLDER_ROW_STEP: f32 = 40.0;

/// OCR engine response, `images[].fields[]` shape. Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrPayload {
    #[serde(default)]
    pub images: Vec<PayloadImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadImage {
    #[serde(default)]
    pub fields: Vec<PayloadField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadField {
    #[serde(default)]
    pub infer_text: String,
    #[serde(default = "default_confidence")]
    pub infer_confidence: f32,
    pub bounding_poly: Option<BoundingPoly>,
}

fn default_confidence() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
}

impl PayloadField {
    fn polygon(&self) -> Option<BoundingPolygon> {
        let poly = self.bounding_poly.as_ref()?;
        let vertices = poly
            .vertices
            .iter()
            .map(|v| Coord { x: v.x, y: v.y })
            .collect();
        match BoundingPolygon::new(vertices) {
            Ok(polygon) => Some(polygon),
            Err(err) => {
                log::warn!(
                    "skipping malformed bounding polygon for {:?}: {err}",
                    self.infer_text
                );
                None
            }
        }
    }
}

impl FragmentSet {
    /// Parse an engine response into the fragment list the display layer
    /// consumes. Fields without text are dropped; fields whose polygon fails
    /// validation never reach the mapper.
    #[instrument(level = "debug", skip(payload))]
    pub fn from_payload_str(payload: &str) -> OverlayResult<FragmentSet> {
        let payload: OcrPayload = serde_json::from_str(payload)?;
        Ok(Self::from_payload(&payload))
    }

    pub fn from_payload(payload: &OcrPayload) -> FragmentSet {
        let mut fragments = Vec::new();
        let mut boxless = Vec::new();

        for field in payload.images.iter().flat_map(|image| &image.fields) {
            if field.infer_text.is_empty() {
                continue;
            }
            match field.polygon() {
                Some(polygon) => fragments.push(TextFragment::new(
                    &field.infer_text,
                    field.infer_confidence,
                    polygon,
                )),
                None => boxless.push(field),
            }
        }

        if fragments.is_empty() && !boxless.is_empty() {
            // No field carried usable geometry at all; stack placeholder
            // boxes so selection still marks a region instead of nothing.
            log::debug!(
                "no usable coordinates in payload, stacking {} placeholder boxes",
                boxless.len()
            );
            fragments = boxless
                .iter()
                .enumerate()
                .map(|(row, field)| {
                    TextFragment::new(&field.infer_text, field.infer_confidence, placeholder(row))
                })
                .collect();
        } else {
            for field in &boxless {
                // Keeping these would desync fragment indices from their
                // geometry, so they are dropped rather than kept box-free.
                log::warn!("dropping text without coordinates: {:?}", field.infer_text);
            }
        }

        log::debug!("parsed {} fragments from payload", fragments.len());
        FragmentSet::new(fragments)
    }
}

fn placeholder(row: usize) -> BoundingPolygon {
    let top = PLACEHOLDER_TOP + row as f32 * PLACEHOLDER_ROW_STEP;
    BoundingPolygon::axis_aligned(Rect::new(
        Coord {
            x: PLACEHOLDER_LEFT,
            y: top,
        },
        Coord {
            x: PLACEHOLDER_RIGHT,
            y: top + PLACEHOLDER_ROW_HEIGHT,
        },
    ))
}
