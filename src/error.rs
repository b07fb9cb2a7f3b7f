use thiserror::Error;

// ---------------------------------------------------------------------------
// Core error taxonomy
// ---------------------------------------------------------------------------

/// Failures surfaced by the spectrum engine, the mask generator and the
/// session store. Every variant is a deterministic function of the input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpectralError {
    /// The referenced session id is not (or no longer) in the store.
    #[error("session not found: {0}")]
    NotFound(String),

    /// Unknown shape kind, malformed coordinates or bad thickness.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The image exceeds the configured dimension bound.
    #[error("image {width}x{height} exceeds the {max}px dimension limit")]
    ImageTooLarge {
        width: usize,
        height: usize,
        max: usize,
    },

    /// Two buffers that must share a shape do not.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    /// A rendered view could not be encoded for display.
    #[error("encoding failed: {0}")]
    Encode(String),
}

impl SpectralError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SpectralError::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SpectralError>;
