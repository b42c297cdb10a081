//! Shared test helpers for `zpl_labelkit_core` integration tests.

#![allow(unreachable_pub)]

use std::path::PathBuf;

use zpl_labelkit_core::RenderOptions;
use zpl_labelkit_core::profile::{Device, Dpi, Model, Stock};

/// Repository root (two levels above this crate's manifest).
#[allow(dead_code)]
pub fn repo_root() -> PathBuf {
    let mut root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    root.pop();
    root.pop();
    root
}

/// Read a file from the top-level `samples/` directory.
#[allow(dead_code)]
pub fn sample(name: &str) -> String {
    let path = repo_root().join("samples").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

/// A 203 dpi device with the given length ceiling and a roomy width.
#[allow(dead_code)]
pub fn device_with_max_length(max_length_dots: u32) -> Device {
    Device::new("test-203", Dpi::Dpi203, 832, max_length_dots)
}

/// ZD620 at 203 dpi with a 2x1 roll.
#[allow(dead_code)]
pub fn zd620_options() -> RenderOptions {
    let device = Device::for_model(Model::Zd620, Dpi::Dpi203).expect("ZD620 supports 203 dpi");
    RenderOptions::for_device(device, Stock::roll_2x1())
}

/// Options for an arbitrary device with a 2x1 roll.
#[allow(dead_code)]
pub fn options_for(device: Device) -> RenderOptions {
    RenderOptions::for_device(device, Stock::roll_2x1())
}
