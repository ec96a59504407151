use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    /// The image element has not reported usable dimensions yet. Recoverable:
    /// retry once the decode-complete notification arrives.
    #[error("image dimensions are not available yet")]
    NotReady,

    #[error("bounding polygon needs at least 4 vertices, got {vertices}")]
    DegeneratePolygon { vertices: usize },

    #[error("fragment index {index} out of range ({len} fragments)")]
    FragmentOutOfRange { index: usize, len: usize },

    #[error("malformed engine payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type OverlayResult<T> = Result<T, OverlayError>;
