//! Typed errors for preview rendering.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use zpl_labelkit_core::RenderError;

/// Preview failure.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// Finalizing the markup failed before rasterization.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The resolution maps to a dots-per-mm the rasterizer does not offer.
    #[error("unsupported resolution {dpi} dpi ({dpmm} dpmm); supported: 6, 8, 12, 24 dpmm")]
    UnsupportedResolution {
        /// Requested resolution.
        dpi: u32,
        /// Rounded dots per millimeter.
        dpmm: u32,
    },

    /// The rasterizer needs a surface size the geometry does not give.
    #[error("render geometry has no {0}")]
    MissingGeometry(&'static str),

    /// The HTTP request could not be made or completed.
    #[error("request to rasterizer failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The rasterizer answered with a non-success status.
    #[error("rasterizer returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The rasterizer succeeded but returned no image data.
    #[error("rasterizer returned an empty image")]
    EmptyImage,

    /// The helper executable could not be started.
    #[error("failed to launch '{}': {source}", .program.display())]
    Launch {
        /// Helper path.
        program: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The helper did not finish in time and was killed.
    #[error("helper timed out after {0:?}")]
    Timeout(Duration),

    /// The helper exited unsuccessfully.
    #[error("helper failed ({}): {stderr}", exit_label(.code))]
    HelperFailed {
        /// Exit code, if the helper exited normally.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// Talking to the helper's pipes failed.
    #[error("helper I/O failed: {0}")]
    Io(#[from] io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "killed by signal".to_string(),
    }
}
