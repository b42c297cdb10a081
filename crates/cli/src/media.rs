//! Device and stock selection shared by every command that finalizes a label.

use std::fs;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use zpl_labelkit_core::RenderOptions;
use zpl_labelkit_profile::{
    Device, Dpi, Model, RenderGeometry, Stock, load_device_from_str, load_stock_from_str,
};

/// Printer model choices for `--model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModelArg {
    /// Zebra ZD620 desktop printer.
    Zd620,
    /// Zebra ZT411 industrial printer.
    Zt411,
}

impl From<ModelArg> for Model {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Zd620 => Model::Zd620,
            ModelArg::Zt411 => Model::Zt411,
        }
    }
}

/// Media flags. Without any, the label targets a 203 dpi ZD620 with a
/// 2"x1" die-cut roll.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct MediaArgs {
    /// Device profile JSON (name, native_dpi, max_width_dots, max_length_dots).
    #[arg(long, conflicts_with_all = ["model", "dpi"])]
    pub(crate) device: Option<String>,

    /// Known printer model [default: zd620].
    #[arg(long, value_enum)]
    pub(crate) model: Option<ModelArg>,

    /// Printhead resolution of the model [default: 203].
    #[arg(long)]
    pub(crate) dpi: Option<u32>,

    /// Stock profile JSON (width, height, gap, continuous).
    #[arg(long, conflicts_with_all = ["width_in", "height_in", "gap_in", "continuous"])]
    pub(crate) stock: Option<String>,

    /// Stock width in inches [default: 2.0].
    #[arg(long)]
    pub(crate) width_in: Option<f64>,

    /// Nominal label height in inches [default: 1.0].
    #[arg(long)]
    pub(crate) height_in: Option<f64>,

    /// Gap between labels in inches [default: 0.125].
    #[arg(long)]
    pub(crate) gap_in: Option<f64>,

    /// Continuous media rather than die-cut labels.
    #[arg(long)]
    pub(crate) continuous: bool,

    /// Render for this resolution instead of the device's native one.
    #[arg(long)]
    pub(crate) render_dpi: Option<u32>,
}

impl MediaArgs {
    /// Resolve the flags into render options.
    pub(crate) fn resolve(&self) -> Result<RenderOptions> {
        let device = self.device()?;
        let stock = self.stock()?;
        let mut options = RenderOptions::for_device(device, stock);
        if let Some(dpi) = self.render_dpi {
            let dpi = Dpi::try_from(dpi).context("invalid --render-dpi")?;
            options.geometry = RenderGeometry::for_stock(&options.stock, dpi);
        }
        Ok(options)
    }

    fn device(&self) -> Result<Device> {
        if let Some(path) = &self.device {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read device profile '{path}'"))?;
            return load_device_from_str(&text)
                .with_context(|| format!("invalid device profile '{path}'"));
        }
        let model = self.model.unwrap_or(ModelArg::Zd620).into();
        let dpi = Dpi::try_from(self.dpi.unwrap_or(203)).context("invalid --dpi")?;
        Ok(Device::for_model(model, dpi)?)
    }

    fn stock(&self) -> Result<Stock> {
        if let Some(path) = &self.stock {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read stock profile '{path}'"))?;
            return load_stock_from_str(&text)
                .with_context(|| format!("invalid stock profile '{path}'"));
        }
        let width = self.width_in.unwrap_or(2.0);
        if !(width.is_finite() && width > 0.0) {
            anyhow::bail!("--width-in must be > 0");
        }
        Ok(Stock::from_inches(
            width,
            self.height_in.unwrap_or(1.0),
            self.gap_in.unwrap_or(0.125),
            self.continuous,
        ))
    }
}
