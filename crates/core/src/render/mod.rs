//! Render/injection engine: turns a label source into a finalized document.
//!
//! Steps, in order:
//!
//! 1. produce markup from the [`LabelSource`]
//! 2. add `^XA` / `^XZ` framing if either is missing
//! 3. estimate the length with the placeholder text removed
//! 4. add the safety margin
//! 5. replace every placeholder with `^LL<length>`
//! 6. check print width and length against the device ceilings

mod error;

pub use error::{Dimension, RenderError};

use serde::{Deserialize, Serialize};
use tracing::debug;
use zpl_labelkit_profile::{Device, RenderGeometry, Stock};

use crate::estimate::{EstimatorConfig, estimate_detailed};
use crate::label::LabelSource;

/// Placeholder text that `{% ll %}` expands to and the engine replaces.
pub const DEFAULT_LENGTH_PLACEHOLDER: &str = "<<LL_MARKER>>";
/// Clearance added past the estimated content, in dots.
pub const DEFAULT_MARGIN_DOTS: u32 = 150;

const START_FORMAT: &str = "^XA";
const END_FORMAT: &str = "^XZ";
const PRINT_WIDTH: &str = "^PW";
const LABEL_LENGTH: &str = "^LL";

/// Engine tuning. Every field has a default, so a partial JSON object
/// deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Dots added to the estimate before injection and validation.
    pub margin_dots: u32,
    /// Text replaced by the computed `^LL` command. Empty disables injection.
    pub length_placeholder: String,
    /// Reject geometries whose DPI differs from the device's native DPI.
    pub strict_resolution: bool,
    /// Insert `^PW` after `^XA` when the document sets no print width.
    pub inject_print_width: bool,
    /// Height estimator approximations.
    pub estimator: EstimatorConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            margin_dots: DEFAULT_MARGIN_DOTS,
            length_placeholder: DEFAULT_LENGTH_PLACEHOLDER.to_owned(),
            strict_resolution: false,
            inject_print_width: false,
            estimator: EstimatorConfig::default(),
        }
    }
}

/// What a document is rendered for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Target rendering surface.
    pub geometry: RenderGeometry,
    /// Loaded media.
    pub stock: Stock,
    /// Printer and its limits.
    pub device: Device,
}

impl RenderOptions {
    /// Options from explicit parts.
    pub fn new(geometry: RenderGeometry, stock: Stock, device: Device) -> Self {
        Self {
            geometry,
            stock,
            device,
        }
    }

    /// Render one label of `stock` at the device's native resolution.
    pub fn for_device(device: Device, stock: Stock) -> Self {
        Self {
            geometry: RenderGeometry::for_stock(&stock, device.native_dpi),
            stock,
            device,
        }
    }
}

/// Something that finalizes label markup for a device.
pub trait MarkupEngine {
    /// Produce the finalized document for `label`.
    fn render(&self, label: &dyn LabelSource, options: &RenderOptions)
    -> Result<String, RenderError>;
}

/// [`MarkupEngine`] running [`render_final_markup`] with a fixed config.
#[derive(Debug, Clone, Default)]
pub struct DefaultEngine {
    config: RenderConfig,
}

impl DefaultEngine {
    /// Engine with the given configuration.
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }
}

impl MarkupEngine for DefaultEngine {
    fn render(
        &self,
        label: &dyn LabelSource,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        render_final_markup(label, options, &self.config)
    }
}

/// Finalize `label` for the device in `options`.
///
/// Never mutates its inputs and performs no I/O beyond what the label
/// source itself does.
pub fn render_final_markup<L: LabelSource + ?Sized>(
    label: &L,
    options: &RenderOptions,
    config: &RenderConfig,
) -> Result<String, RenderError> {
    let device = &options.device;
    let native = device.native_dpi;

    let mut zpl = label.produce_markup()?;

    if config.strict_resolution && options.geometry.dpi != native.value() {
        return Err(RenderError::ResolutionMismatch {
            render: options.geometry.dpi,
            device: native.value(),
        });
    }
    ensure_framing(&mut zpl);

    let placeholder = config.length_placeholder.as_str();
    let estimate = if placeholder.is_empty() {
        estimate_detailed(&zpl, &config.estimator)
    } else {
        estimate_detailed(&zpl.replace(placeholder, ""), &config.estimator)
    };
    let length = estimate.dots.saturating_add(config.margin_dots);
    debug!(
        structural = estimate.structural,
        explicit = ?estimate.explicit,
        margin = config.margin_dots,
        length,
        "estimated label length"
    );

    if !placeholder.is_empty() && zpl.contains(placeholder) {
        zpl = zpl.replace(placeholder, &format!("{LABEL_LENGTH}{length}"));
    }

    let width = options.stock.width_dots(native);
    if config.inject_print_width {
        inject_print_width(&mut zpl, width);
    }

    if width > device.max_width_dots {
        return Err(RenderError::DimensionOverflow {
            dimension: Dimension::Width,
            requested: width,
            max: device.max_width_dots,
        });
    }
    if length > device.max_length_dots {
        return Err(RenderError::DimensionOverflow {
            dimension: Dimension::Length,
            requested: length,
            max: device.max_length_dots,
        });
    }

    debug!(device = %device.name, width, length, "finalized label");
    Ok(zpl)
}

fn ensure_framing(zpl: &mut String) {
    if !zpl.contains(START_FORMAT) {
        zpl.insert_str(0, &format!("{START_FORMAT}\n"));
    }
    if !zpl.contains(END_FORMAT) {
        zpl.push('\n');
        zpl.push_str(END_FORMAT);
    }
}

fn inject_print_width(zpl: &mut String, width: u32) {
    if zpl.contains(PRINT_WIDTH) {
        return;
    }
    if let Some(pos) = zpl.find(START_FORMAT) {
        zpl.insert_str(pos + START_FORMAT.len(), &format!("{PRINT_WIDTH}{width}"));
    }
}
