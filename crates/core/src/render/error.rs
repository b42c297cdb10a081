//! Typed failures of the render engine.

use std::fmt;

use serde::Serialize;

use crate::label::SourceError;

/// Physical dimension checked against device limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Print width across the printhead.
    Width,
    /// Label length along the feed direction.
    Length,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Width => f.write_str("width"),
            Dimension::Length => f.write_str("length"),
        }
    }
}

/// Render engine failure.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The finalized document needs more room than the device has.
    #[error("{dimension} overflow: requested {requested} dots, device maximum is {max}")]
    DimensionOverflow {
        /// Which dimension overflowed.
        dimension: Dimension,
        /// Requested size in dots.
        requested: u32,
        /// Device ceiling in dots.
        max: u32,
    },

    /// Strict mode: render resolution differs from the device's native one.
    #[error("resolution mismatch: rendering at {render} dpi for a {device} dpi device")]
    ResolutionMismatch {
        /// Requested render DPI.
        render: u32,
        /// Device native DPI.
        device: u32,
    },

    /// The label source failed to produce markup.
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl RenderError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            RenderError::DimensionOverflow { .. } => "dimension_overflow",
            RenderError::ResolutionMismatch { .. } => "resolution_mismatch",
            RenderError::Source(_) => "source_failed",
        }
    }
}
