//! ZPL label markup core library.
//!
//! Tokenizes ZPL II markup, estimates how long a label will print, injects
//! that length into a finalized document, and re-serializes markup for
//! reading or transmission. The main entry points are [`tokenize`],
//! [`estimate_height_dots`], [`render_final_markup`], [`pretty_print`] and
//! [`minify`].

#![warn(missing_docs)]

/// Height estimation over the token stream.
pub mod estimate;
/// ZPL grammar: lexer and formatter.
pub mod grammar;
/// Label sources that produce markup on demand.
pub mod label;
/// Render/injection engine.
pub mod render;
/// Named template archive with placeholder expansion.
pub mod template;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Lexer
pub use grammar::lexer::{Token, tokenize, tokenize_with_config};

// Formatter
pub use grammar::format::{minify, pretty_print};

// Estimator
pub use estimate::{
    EstimatorConfig, HeightEstimate, estimate_detailed, estimate_height_dots, estimate_tokens,
};

// Label sources
pub use label::{FileLabel, FnLabel, LabelSource, SourceError, TemplateLabel};

// Templates
pub use template::TemplateArchive;

// Render engine
pub use render::{
    DEFAULT_LENGTH_PLACEHOLDER, DEFAULT_MARGIN_DOTS, DefaultEngine, Dimension, MarkupEngine,
    RenderConfig, RenderError, RenderOptions, render_final_markup,
};

// Device and media types used in render options.
pub use zpl_labelkit_profile as profile;
