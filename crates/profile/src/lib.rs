//! Printer device and label stock profiles for zpl-labelkit.
//!
//! A [`Device`] describes the hard physical ceilings of a printer, a
//! [`Stock`] describes the media loaded into it, and a [`RenderGeometry`]
//! describes the surface a document is rendered for. All three are plain,
//! immutable values: the render engine reads them and never mutates them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Millimeters per inch, used for all metric conversions.
pub const MILLIMETERS_PER_INCH: f64 = 25.4;

/// Errors that can occur when building or loading a device/stock profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// JSON deserialization failed.
    #[error("invalid profile JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is out of its valid range.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The name of the field that failed validation.
        field: String,
        /// A human-readable explanation of why the field value is invalid.
        reason: String,
    },

    /// The printer model cannot run at the requested resolution.
    #[error("DPI {dpi} is not valid for {model}; allowed: {allowed:?}")]
    UnsupportedResolution {
        /// The model that was requested.
        model: Model,
        /// The rejected resolution.
        dpi: u32,
        /// Resolutions the model does support.
        allowed: Vec<u32>,
    },
}

// ── Resolution ──────────────────────────────────────────────────────────

/// A printhead resolution in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Dpi {
    /// 203 dpi (8 dots/mm).
    Dpi203,
    /// 300 dpi (12 dots/mm).
    Dpi300,
    /// 600 dpi (24 dots/mm).
    Dpi600,
}

impl Dpi {
    /// All supported resolutions, lowest first.
    pub const ALL: [Dpi; 3] = [Dpi::Dpi203, Dpi::Dpi300, Dpi::Dpi600];

    /// Dots per inch as a plain integer.
    pub fn value(self) -> u32 {
        match self {
            Dpi::Dpi203 => 203,
            Dpi::Dpi300 => 300,
            Dpi::Dpi600 => 600,
        }
    }

    /// Dots per millimeter, rounded to the nearest whole dot.
    pub fn dots_per_mm(self) -> u32 {
        (f64::from(self.value()) / MILLIMETERS_PER_INCH).round() as u32
    }
}

impl TryFrom<u32> for Dpi {
    type Error = ProfileError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Dpi::ALL
            .into_iter()
            .find(|d| d.value() == value)
            .ok_or_else(|| ProfileError::InvalidField {
                field: "dpi".into(),
                reason: format!("{value} is not a supported resolution (203, 300, 600)"),
            })
    }
}

impl From<Dpi> for u32 {
    fn from(dpi: Dpi) -> Self {
        dpi.value()
    }
}

impl fmt::Display for Dpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

// ── Models and devices ──────────────────────────────────────────────────

/// Known printer models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    /// Zebra ZD620 desktop printer.
    #[serde(rename = "ZD620")]
    Zd620,
    /// Zebra ZT411 industrial printer.
    #[serde(rename = "ZT411")]
    Zt411,
}

impl Model {
    /// Resolutions the model's printheads are sold in.
    pub fn allowed_dpis(self) -> &'static [Dpi] {
        match self {
            Model::Zd620 => &[Dpi::Dpi203, Dpi::Dpi300],
            Model::Zt411 => &[Dpi::Dpi300, Dpi::Dpi600],
        }
    }

    /// Maximum print width in inches.
    pub fn max_print_width_inches(self) -> f64 {
        4.09
    }

    /// Maximum label length in inches.
    pub fn max_label_length_inches(self) -> f64 {
        match self {
            Model::Zd620 => 39.0,
            Model::Zt411 => 157.0,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Zd620 => write!(f, "ZD620"),
            Model::Zt411 => write!(f, "ZT411"),
        }
    }
}

/// A physical printer and its hard limits.
///
/// The ceilings describe the printer, not the stock currently loaded: a
/// ZD620 can print 4" wide even while a 2"x1" roll is installed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    /// Human-readable device name.
    pub name: String,
    /// Native printhead resolution.
    pub native_dpi: Dpi,
    /// Widest printable area in dots.
    pub max_width_dots: u32,
    /// Longest printable label in dots.
    pub max_length_dots: u32,
}

impl Device {
    /// Create a device from explicit limits.
    pub fn new(
        name: impl Into<String>,
        native_dpi: Dpi,
        max_width_dots: u32,
        max_length_dots: u32,
    ) -> Self {
        Self {
            name: name.into(),
            native_dpi,
            max_width_dots,
            max_length_dots,
        }
    }

    /// Build a device for a known model, deriving its limits at `dpi`.
    pub fn for_model(model: Model, dpi: Dpi) -> Result<Self, ProfileError> {
        if !model.allowed_dpis().contains(&dpi) {
            return Err(ProfileError::UnsupportedResolution {
                model,
                dpi: dpi.value(),
                allowed: model.allowed_dpis().iter().map(|d| d.value()).collect(),
            });
        }
        Ok(Self {
            name: format!("{model}-{dpi}"),
            native_dpi: dpi,
            max_width_dots: Measure::Inches(model.max_print_width_inches()).to_dots(dpi),
            max_length_dots: Measure::Inches(model.max_label_length_inches()).to_dots(dpi),
        })
    }
}

/// Load and validate a [`Device`] from a JSON string.
///
/// Both ceilings must be non-zero and the name must not be blank.
pub fn load_device_from_str(s: &str) -> Result<Device, ProfileError> {
    let device: Device = serde_json::from_str(s)?;
    if device.name.trim().is_empty() {
        return Err(ProfileError::InvalidField {
            field: "name".into(),
            reason: "must not be empty".into(),
        });
    }
    if device.max_width_dots == 0 {
        return Err(ProfileError::InvalidField {
            field: "max_width_dots".into(),
            reason: "must be > 0".into(),
        });
    }
    if device.max_length_dots == 0 {
        return Err(ProfileError::InvalidField {
            field: "max_length_dots".into(),
            reason: "must be > 0".into(),
        });
    }
    Ok(device)
}

// ── Media ───────────────────────────────────────────────────────────────

/// A physical length, either already in dots or in a unit that needs a
/// resolution to convert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Device dots.
    Dots(u32),
    /// Inches.
    Inches(f64),
    /// Millimeters.
    Millimeters(f64),
}

impl Measure {
    /// Convert to whole dots at `dpi`, rounding to nearest.
    ///
    /// Negative or non-finite physical lengths convert to 0.
    pub fn to_dots(self, dpi: Dpi) -> u32 {
        let inches = match self {
            Measure::Dots(d) => return d,
            Measure::Inches(i) => i,
            Measure::Millimeters(mm) => mm / MILLIMETERS_PER_INCH,
        };
        let dots = (inches * f64::from(dpi.value())).round();
        if dots.is_finite() && dots > 0.0 {
            dots.min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }

    /// Convert to inches; dot measures need the resolution they were taken at.
    pub fn to_inches(self, dpi: Dpi) -> f64 {
        match self {
            Measure::Dots(d) => f64::from(d) / f64::from(dpi.value()),
            Measure::Inches(i) => i,
            Measure::Millimeters(mm) => mm / MILLIMETERS_PER_INCH,
        }
    }

    /// Convert to millimeters.
    pub fn to_mm(self, dpi: Dpi) -> f64 {
        self.to_inches(dpi) * MILLIMETERS_PER_INCH
    }
}

/// Label media loaded into a printer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    /// Media width.
    pub width: Measure,
    /// Nominal label height (ignored by printers for continuous media).
    pub height: Measure,
    /// Gap between die-cut labels.
    pub gap: Measure,
    /// Continuous (variable-length) media rather than die-cut labels.
    #[serde(default)]
    pub continuous: bool,
}

impl Stock {
    /// Create stock measured in inches.
    pub fn from_inches(width: f64, height: f64, gap: f64, continuous: bool) -> Self {
        Self {
            width: Measure::Inches(width),
            height: Measure::Inches(height),
            gap: Measure::Inches(gap),
            continuous,
        }
    }

    /// The common 2" x 1" die-cut roll with a 1/8" gap.
    pub fn roll_2x1() -> Self {
        Self::from_inches(2.0, 1.0, 0.125, false)
    }

    /// Width in dots at `dpi`.
    pub fn width_dots(&self, dpi: Dpi) -> u32 {
        self.width.to_dots(dpi)
    }

    /// Nominal height in dots at `dpi`.
    pub fn height_dots(&self, dpi: Dpi) -> u32 {
        self.height.to_dots(dpi)
    }

    /// Gap in dots at `dpi`.
    pub fn gap_dots(&self, dpi: Dpi) -> u32 {
        self.gap.to_dots(dpi)
    }

    /// Width in millimeters.
    pub fn width_mm(&self, dpi: Dpi) -> f64 {
        self.width.to_mm(dpi)
    }

    /// Nominal height in millimeters.
    pub fn height_mm(&self, dpi: Dpi) -> f64 {
        self.height.to_mm(dpi)
    }

    /// Gap in millimeters.
    pub fn gap_mm(&self, dpi: Dpi) -> f64 {
        self.gap.to_mm(dpi)
    }
}

/// Load and validate a [`Stock`] from a JSON string.
///
/// Example: `{"width": {"inches": 2.0}, "height": {"inches": 1.0}, "gap": {"dots": 25}}`.
pub fn load_stock_from_str(s: &str) -> Result<Stock, ProfileError> {
    let stock: Stock = serde_json::from_str(s)?;
    let positive = match stock.width {
        Measure::Dots(d) => d > 0,
        Measure::Inches(v) | Measure::Millimeters(v) => v.is_finite() && v > 0.0,
    };
    if !positive {
        return Err(ProfileError::InvalidField {
            field: "width".into(),
            reason: "must be > 0".into(),
        });
    }
    Ok(stock)
}

// ── Render geometry ─────────────────────────────────────────────────────

/// The surface a document is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderGeometry {
    /// Render resolution in dots per inch.
    pub dpi: u32,
    /// Surface width in dots; renderers may infer it from `^PW`.
    #[serde(default)]
    pub width_dots: Option<u32>,
    /// Surface height in dots; renderers may auto-size.
    #[serde(default)]
    pub height_dots: Option<u32>,
}

impl RenderGeometry {
    /// A geometry with only a resolution.
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi,
            width_dots: None,
            height_dots: None,
        }
    }

    /// A geometry covering one label of `stock` at `dpi`.
    pub fn for_stock(stock: &Stock, dpi: Dpi) -> Self {
        Self {
            dpi: dpi.value(),
            width_dots: Some(stock.width_dots(dpi)),
            height_dots: Some(stock.height_dots(dpi)),
        }
    }
}
