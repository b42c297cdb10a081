//! PNG previews of label markup.
//!
//! Rasterization is delegated to an [`ImageRenderer`]: the Labelary web
//! service ([`LabelaryRenderer`]) or a local `zpl2png` executable
//! ([`Zpl2PngRenderer`]). [`PreviewService`] chains a markup engine in front
//! so a label source goes straight to an image.

mod error;
mod labelary;
mod zpl2png;

pub use error::PreviewError;
pub use labelary::{DEFAULT_LABELARY_URL, LabelaryRenderer};
pub use zpl2png::Zpl2PngRenderer;

use std::time::Duration;

use tracing::debug;
use zpl_labelkit_core::profile::{MILLIMETERS_PER_INCH, RenderGeometry};
use zpl_labelkit_core::{LabelSource, MarkupEngine, RenderOptions};

/// Default rasterization timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Surface and time budget for one rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRenderOptions {
    /// Surface to rasterize onto.
    pub geometry: RenderGeometry,
    /// Give up after this long.
    pub timeout: Duration,
}

impl ImageRenderOptions {
    /// Options with the default timeout.
    pub fn new(geometry: RenderGeometry) -> Self {
        Self {
            geometry,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Turns finalized markup into an encoded image.
pub trait ImageRenderer {
    /// Rasterize `markup` and return PNG bytes.
    fn render(&self, markup: &str, options: &ImageRenderOptions) -> Result<Vec<u8>, PreviewError>;
}

impl<R: ImageRenderer + ?Sized> ImageRenderer for Box<R> {
    fn render(&self, markup: &str, options: &ImageRenderOptions) -> Result<Vec<u8>, PreviewError> {
        (**self).render(markup, options)
    }
}

/// Finalizes a label with `engine`, then rasterizes it with `renderer`.
#[derive(Debug, Clone)]
pub struct PreviewService<E, R> {
    engine: E,
    renderer: R,
}

impl<E: MarkupEngine, R: ImageRenderer> PreviewService<E, R> {
    /// Service from its two stages.
    pub fn new(engine: E, renderer: R) -> Self {
        Self { engine, renderer }
    }

    /// PNG preview of `label`.
    pub fn png(
        &self,
        label: &dyn LabelSource,
        render_options: &RenderOptions,
        image_options: &ImageRenderOptions,
    ) -> Result<Vec<u8>, PreviewError> {
        let markup = self.engine.render(label, render_options)?;
        let png = self.renderer.render(&markup, image_options)?;
        debug!(bytes = png.len(), "rendered preview");
        Ok(png)
    }
}

/// Dots per millimeter for a resolution, rounded to nearest.
pub(crate) fn dots_per_mm(dpi: u32) -> u32 {
    (f64::from(dpi) / MILLIMETERS_PER_INCH).round() as u32
}
