//! Output targets for finalized ZPL labels.
//!
//! A [`Target`] accepts a [`Payload`] (label markup or a preview image) and
//! delivers it: to a printer's raw TCP port, to a file, or to any writer.
//! The API is synchronous (`std::net`), with no async runtime required.
mod addr;
mod config;
mod error;
mod retry;
mod target;
#[cfg(feature = "tcp")]
mod tcp;

pub use addr::{DEFAULT_PORT, resolve_printer_addr};
pub use config::{PrinterConfig, PrinterTimeouts, RetryConfig};
pub use error::PrintError;
pub use retry::{ReconnectRetryPrinter, RetryPrinter};
pub use target::{FileTarget, Payload, PrinterTarget, Target, WriterTarget};
#[cfg(feature = "tcp")]
pub use tcp::TcpPrinter;

// ── Traits ──────────────────────────────────────────────────────────────

/// Send bytes to a printer. Every transport implements this.
pub trait Printer: Send {
    /// Send raw bytes to the printer.
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError>;

    /// Send label markup (convenience wrapper over `send_raw`).
    fn send_zpl(&mut self, zpl: &str) -> Result<(), PrintError> {
        self.send_raw(zpl.as_bytes())
    }
}

/// A printer that can re-establish its connection after a failure.
///
/// [`ReconnectRetryPrinter`] calls this between attempts so retries work
/// even after the connection dropped.
pub trait Reconnectable {
    /// Close the old connection, if any, and open a fresh one.
    fn reconnect(&mut self) -> Result<(), PrintError>;
}

impl<P: Printer + ?Sized> Printer for Box<P> {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError> {
        (**self).send_raw(data)
    }
}
