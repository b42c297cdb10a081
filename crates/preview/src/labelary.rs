//! Labelary web service rasterizer.

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use tracing::debug;

use crate::{ImageRenderOptions, ImageRenderer, PreviewError, dots_per_mm};
use zpl_labelkit_core::profile::RenderGeometry;

/// Public Labelary endpoint.
pub const DEFAULT_LABELARY_URL: &str = "https://api.labelary.com";

/// Print densities Labelary can rasterize, in dots per millimeter.
const SUPPORTED_DPMM: [u32; 4] = [6, 8, 12, 24];

/// Rasterizes through the Labelary HTTP API.
#[derive(Debug, Clone)]
pub struct LabelaryRenderer {
    base_url: String,
}

impl Default for LabelaryRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_LABELARY_URL)
    }
}

impl LabelaryRenderer {
    /// Renderer posting to `base_url` (no trailing path).
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Request URL for `geometry`:
    /// `{base}/v1/printers/{dpmm}dpmm/labels/{w}x{h}/0/`.
    ///
    /// Sizes are in inches with three decimals; a missing size is one inch.
    pub fn request_url(&self, geometry: &RenderGeometry) -> Result<String, PreviewError> {
        let dpi = geometry.dpi;
        let dpmm = dots_per_mm(dpi);
        if dpi == 0 || !SUPPORTED_DPMM.contains(&dpmm) {
            return Err(PreviewError::UnsupportedResolution { dpi, dpmm });
        }
        let inches = |dots: Option<u32>| f64::from(dots.unwrap_or(dpi).max(1)) / f64::from(dpi);
        Ok(format!(
            "{}/v1/printers/{dpmm}dpmm/labels/{:.3}x{:.3}/0/",
            self.base_url,
            inches(geometry.width_dots),
            inches(geometry.height_dots),
        ))
    }
}

impl ImageRenderer for LabelaryRenderer {
    fn render(&self, markup: &str, options: &ImageRenderOptions) -> Result<Vec<u8>, PreviewError> {
        let url = self.request_url(&options.geometry)?;
        debug!(%url, "requesting preview");

        let client = Client::builder().timeout(options.timeout).build()?;
        let response = client
            .post(&url)
            .header(ACCEPT, "image/png")
            .body(markup.to_owned())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(PreviewError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(PreviewError::EmptyImage);
        }
        Ok(bytes.to_vec())
    }
}
