//! Local `zpl2png` helper rasterizer.
//!
//! The helper reads markup on stdin and writes a PNG to stdout. It is told
//! the surface size in whole millimeters and the density in dots per mm.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::{ImageRenderOptions, ImageRenderer, PreviewError, dots_per_mm};
use zpl_labelkit_core::profile::MILLIMETERS_PER_INCH;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Rasterizes by piping markup through a helper executable.
#[derive(Debug, Clone)]
pub struct Zpl2PngRenderer {
    helper: PathBuf,
}

impl Zpl2PngRenderer {
    /// Renderer running the executable at `helper`.
    pub fn new(helper: impl Into<PathBuf>) -> Self {
        Self {
            helper: helper.into(),
        }
    }

    /// Helper path.
    pub fn helper(&self) -> &Path {
        &self.helper
    }

    fn args(options: &ImageRenderOptions) -> Result<Vec<String>, PreviewError> {
        let geometry = &options.geometry;
        let width = geometry
            .width_dots
            .ok_or(PreviewError::MissingGeometry("width"))?;
        let height = geometry
            .height_dots
            .ok_or(PreviewError::MissingGeometry("height"))?;
        let mm = |dots: u32| {
            let mm = f64::from(dots) / f64::from(geometry.dpi.max(1)) * MILLIMETERS_PER_INCH;
            mm.round() as u32
        };
        Ok(vec![
            "--width-mm".into(),
            mm(width).to_string(),
            "--height-mm".into(),
            mm(height).to_string(),
            "--dpmm".into(),
            dots_per_mm(geometry.dpi).to_string(),
        ])
    }
}

impl ImageRenderer for Zpl2PngRenderer {
    fn render(&self, markup: &str, options: &ImageRenderOptions) -> Result<Vec<u8>, PreviewError> {
        let args = Self::args(options)?;
        debug!(helper = %self.helper.display(), ?args, "launching helper");

        let mut child = Command::new(&self.helper)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| PreviewError::Launch {
                program: self.helper.clone(),
                source,
            })?;

        // Feed and drain on threads so a chatty helper cannot deadlock on a full pipe.
        let stdin = child.stdin.take().map(|mut pipe| {
            let input = markup.as_bytes().to_vec();
            thread::spawn(move || {
                // The helper may exit without reading everything.
                let _ = pipe.write_all(&input);
            })
        });
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match wait_with_deadline(&mut child, options.timeout)? {
            Some(status) => status,
            None => {
                warn!(timeout = ?options.timeout, "helper timed out, killing it");
                let _ = child.kill();
                let _ = child.wait();
                return Err(PreviewError::Timeout(options.timeout));
            }
        };

        if let Some(handle) = stdin {
            let _ = handle.join();
        }
        let output = collect(stdout)?;
        let errors = collect(stderr)?;

        if !status.success() {
            return Err(PreviewError::HelperFailed {
                code: status.code(),
                stderr: String::from_utf8_lossy(&errors).trim_end().to_owned(),
            });
        }
        if output.is_empty() {
            return Err(PreviewError::EmptyImage);
        }
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Vec<u8>, PreviewError> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(result) => Ok(result?),
            Err(_) => Err(PreviewError::Io(std::io::Error::other(
                "pipe reader thread panicked",
            ))),
        },
        None => Ok(Vec::new()),
    }
}

fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<std::process::ExitStatus>, PreviewError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
