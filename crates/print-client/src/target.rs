//! Output targets: where a finalized label (or its preview image) goes.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{PrintError, Printer};

/// Something a target can deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum Payload {
    /// Finalized label markup.
    Markup {
        /// Markup text.
        markup: String,
        /// Resolution the markup was rendered for.
        dpi: u32,
    },
    /// Rasterized preview image.
    Image {
        /// Encoded image bytes (PNG).
        bytes: Vec<u8>,
        /// Resolution the image was rasterized at.
        dpi: u32,
    },
}

impl Payload {
    /// Markup payload.
    pub fn markup(markup: impl Into<String>, dpi: u32) -> Self {
        Payload::Markup {
            markup: markup.into(),
            dpi,
        }
    }

    /// Image payload.
    pub fn image(bytes: Vec<u8>, dpi: u32) -> Self {
        Payload::Image { bytes, dpi }
    }

    /// Resolution the payload was produced for.
    pub fn dpi(&self) -> u32 {
        match self {
            Payload::Markup { dpi, .. } | Payload::Image { dpi, .. } => *dpi,
        }
    }

    /// Short name of the payload kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Markup { .. } => "markup",
            Payload::Image { .. } => "image",
        }
    }
}

/// Delivers payloads.
pub trait Target {
    /// Deliver `payload`. With `strict`, a payload produced for a resolution
    /// other than the target's native one is rejected before any output.
    fn send(&mut self, payload: &Payload, strict: bool) -> Result<(), PrintError>;
}

/// Reject resolution mismatches in strict mode. Targets without a native
/// resolution accept everything.
fn check_resolution(payload: &Payload, native: Option<u32>, strict: bool) -> Result<(), PrintError> {
    match native {
        Some(target) if strict && payload.dpi() != target => Err(PrintError::ResolutionMismatch {
            payload: payload.dpi(),
            target,
        }),
        _ => Ok(()),
    }
}

// ── Printer ─────────────────────────────────────────────────────────────

/// Adapts a [`Printer`] to [`Target`]. Only markup can be printed.
#[derive(Debug)]
pub struct PrinterTarget<P> {
    printer: P,
    native_dpi: u32,
}

impl<P: Printer> PrinterTarget<P> {
    /// Target for `printer` whose printhead runs at `native_dpi`.
    pub fn new(printer: P, native_dpi: u32) -> Self {
        Self {
            printer,
            native_dpi,
        }
    }

    /// Unwrap, returning the printer.
    pub fn into_inner(self) -> P {
        self.printer
    }
}

impl<P: Printer> Target for PrinterTarget<P> {
    fn send(&mut self, payload: &Payload, strict: bool) -> Result<(), PrintError> {
        check_resolution(payload, Some(self.native_dpi), strict)?;
        match payload {
            Payload::Markup { markup, .. } => {
                debug!(bytes = markup.len(), "printing label");
                self.printer.send_zpl(markup)
            }
            Payload::Image { .. } => Err(PrintError::UnsupportedPayload {
                target: "printer",
                kind: payload.kind(),
            }),
        }
    }
}

// ── File ────────────────────────────────────────────────────────────────

/// Writes markup text or image bytes to a file, replacing it atomically.
#[derive(Debug, Clone)]
pub struct FileTarget {
    path: PathBuf,
    native_dpi: Option<u32>,
}

impl FileTarget {
    /// Target writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            native_dpi: None,
        }
    }

    /// Resolution checked against in strict mode.
    pub fn with_native_dpi(mut self, dpi: u32) -> Self {
        self.native_dpi = Some(dpi);
        self
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Target for FileTarget {
    fn send(&mut self, payload: &Payload, strict: bool) -> Result<(), PrintError> {
        check_resolution(payload, self.native_dpi, strict)?;
        let bytes: &[u8] = match payload {
            Payload::Markup { markup, .. } => markup.as_bytes(),
            Payload::Image { bytes, .. } => bytes,
        };
        write_replacing(&self.path, bytes)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), kind = payload.kind(), "wrote payload");
        Ok(())
    }
}

fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), PrintError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);
    let fail = |p: &Path, source| PrintError::FileWrite {
        path: p.to_path_buf(),
        source,
    };
    std::fs::write(&tmp, bytes).map_err(|e| fail(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| fail(path, e))
}

// ── Writer ──────────────────────────────────────────────────────────────

/// Writes markup as text, and a one-line summary for images, to any writer.
#[derive(Debug)]
pub struct WriterTarget<W> {
    writer: W,
    native_dpi: Option<u32>,
}

impl<W: Write> WriterTarget<W> {
    /// Target writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            native_dpi: None,
        }
    }

    /// Resolution checked against in strict mode.
    pub fn with_native_dpi(mut self, dpi: u32) -> Self {
        self.native_dpi = Some(dpi);
        self
    }

    /// Unwrap, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Target for WriterTarget<W> {
    fn send(&mut self, payload: &Payload, strict: bool) -> Result<(), PrintError> {
        check_resolution(payload, self.native_dpi, strict)?;
        let written = match payload {
            Payload::Markup { markup, .. } => writeln!(self.writer, "{markup}"),
            Payload::Image { bytes, dpi } => {
                writeln!(self.writer, "PNG {} bytes @ {dpi} dpi", bytes.len())
            }
        };
        written
            .and_then(|()| self.writer.flush())
            .map_err(PrintError::WriteFailed)
    }
}
