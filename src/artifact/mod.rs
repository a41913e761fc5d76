//! Artifact: the scannable image derived from a payload.
//! Rendering is a pure function of the payload; caching and expiry belong to the slot.

pub mod qr;

pub use qr::QrPngRenderer;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

pub const CONTENT_TYPE_PNG: &str = "image/png";

// ========================================
// ARTIFACT
// ========================================

/// Encoded image bytes plus the media type they are served with.
#[derive(Clone, Debug, PartialEq)]
pub struct Artifact {
    pub bytes: Bytes,
    pub content_type: &'static str,
}

impl Artifact {
    pub fn png(bytes: Bytes) -> Self {
        Self { bytes, content_type: CONTENT_TYPE_PNG }
    }
}

// ========================================
// ERRORS
// ========================================

#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactError {
    /// Nothing to encode.
    EmptyPayload,
    /// The payload does not fit a symbol (too long, or rejected by the encoder).
    Encode(String),
    /// Rasterized fine, but writing the image container failed.
    Image(String),
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactError::EmptyPayload => write!(f, "cannot render an empty payload"),
            ArtifactError::Encode(msg) => write!(f, "encode failed: {}", msg),
            ArtifactError::Image(msg) => write!(f, "image write failed: {}", msg),
        }
    }
}

impl std::error::Error for ArtifactError {}

// ========================================
// RENDERER
// ========================================

/// Turns a payload into image bytes. Implementations hold no per-payload state.
pub trait ArtifactRenderer: Send + Sync {
    fn render(&self, payload: &[u8]) -> Result<Artifact, ArtifactError>;

    /// Checks that `render` would succeed. The default renders and discards.
    fn validate(&self, payload: &[u8]) -> Result<(), ArtifactError> {
        self.render(payload).map(|_| ())
    }
}

// ========================================
// STRATEGY
// ========================================

/// When the artifact is produced relative to the payload's arrival.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Validate on arrival, render fresh on every read.
    Lazy,
    /// Render once on arrival and keep the bytes with the entry.
    Eager,
}

impl RenderStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStrategy::Lazy => "lazy",
            RenderStrategy::Eager => "eager",
        }
    }
}

impl FromStr for RenderStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lazy" => Ok(RenderStrategy::Lazy),
            "eager" => Ok(RenderStrategy::Eager),
            other => Err(format!("unknown render strategy '{}'. Use: lazy, eager", other)),
        }
    }
}
