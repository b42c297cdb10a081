//! Label length estimation.
//!
//! Walks the token stream once, tracking the label home, the current field
//! origin and font metrics, and records the lowest point reached by any
//! content-bearing command (field data, barcodes, graphic boxes). The
//! result is reconciled with any explicit `^LL` in the document by taking
//! the larger of the two, so a structural estimate never clips a document
//! that deliberately declares more length.
//!
//! Estimation never fails. Parameters that do not parse are treated as
//! absent, which can only make the estimate smaller or larger.

mod state;

use serde::{Deserialize, Serialize};

use crate::grammar::lexer::{Token, tokenize};
use state::LayoutState;

/// Approximations used in place of real font and barcode metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Font height in dots until a `^A` or `^CF` sets one.
    pub default_font_height: u32,
    /// Vertical gap in dots between lines of multi-line field data.
    pub default_line_gap: u32,
    /// Barcode height in dots when `^BC` omits it.
    pub default_barcode_height: u32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            default_font_height: 30,
            default_line_gap: 2,
            default_barcode_height: 100,
        }
    }
}

/// Breakdown of a length estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeightEstimate {
    /// Lowest point reached by content, in dots.
    pub structural: u32,
    /// Largest `^LL` value seen, if any parsed.
    pub explicit: Option<u32>,
    /// `max(structural, explicit)`.
    pub dots: u32,
}

/// Estimate the rendered length of `markup` in dots.
pub fn estimate_height_dots(markup: &str, config: &EstimatorConfig) -> u32 {
    estimate_detailed(markup, config).dots
}

/// Estimate the rendered length of an already tokenized document.
pub fn estimate_tokens(tokens: &[Token<'_>], config: &EstimatorConfig) -> u32 {
    measure(tokens, config).dots
}

/// Estimate the length of `markup` and report how it was reached.
pub fn estimate_detailed(markup: &str, config: &EstimatorConfig) -> HeightEstimate {
    measure(&tokenize(markup), config)
}

fn measure(tokens: &[Token<'_>], config: &EstimatorConfig) -> HeightEstimate {
    let mut state = LayoutState::new(config);
    for tok in tokens {
        state.apply(tok);
    }
    state.finish()
}
