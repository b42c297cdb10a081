//! Raw TCP transport (port 9100 / JetDirect / RAW).

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tracing::{debug, trace};

use crate::addr::resolve_printer_addr;
use crate::{PrintError, Printer, PrinterConfig, Reconnectable};

/// Keepalive probe interval for idle printer connections.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// A synchronous connection to a printer's raw port.
///
/// Label jobs are written as-is; nothing is read back.
#[derive(Debug)]
pub struct TcpPrinter {
    stream: TcpStream,
    config: PrinterConfig,
    addr: SocketAddr,
}

impl TcpPrinter {
    /// Connect to the printer at `addr` (see [`resolve_printer_addr`] for
    /// accepted forms).
    pub fn connect(addr: &str, config: PrinterConfig) -> Result<Self, PrintError> {
        let addr = resolve_printer_addr(addr)?;
        let stream = open_stream(&addr, &config)?;
        debug!(%addr, "connected to printer");
        Ok(Self {
            stream,
            config,
            addr,
        })
    }

    /// Drop the current connection and open a fresh one to the same address.
    pub fn reconnect(&mut self) -> Result<(), PrintError> {
        let _ = self.stream.shutdown(Shutdown::Both);
        self.stream = open_stream(&self.addr, &self.config)?;
        debug!(addr = %self.addr, "reconnected to printer");
        Ok(())
    }

    /// The resolved address this printer is connected to.
    pub fn remote_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Printer for TcpPrinter {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError> {
        trace!(addr = %self.addr, bytes = data.len(), "sending job");
        self.stream.write_all(data).map_err(PrintError::WriteFailed)?;
        self.stream.flush().map_err(PrintError::WriteFailed)
    }
}

impl Reconnectable for TcpPrinter {
    fn reconnect(&mut self) -> Result<(), PrintError> {
        TcpPrinter::reconnect(self)
    }
}

impl Drop for TcpPrinter {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

fn open_stream(addr: &SocketAddr, config: &PrinterConfig) -> Result<TcpStream, PrintError> {
    let connect = config.timeouts.connect;
    let stream = TcpStream::connect_timeout(addr, connect).map_err(|e| match e.kind() {
        io::ErrorKind::ConnectionRefused => PrintError::ConnectionRefused {
            addr: addr.to_string(),
            source: e,
        },
        io::ErrorKind::TimedOut => PrintError::ConnectionTimeout {
            addr: addr.to_string(),
            timeout: connect,
            source: e,
        },
        _ => PrintError::ConnectionFailed {
            addr: addr.to_string(),
            source: e,
        },
    })?;

    configure_stream(&stream, config).map_err(|e| PrintError::ConnectionFailed {
        addr: addr.to_string(),
        source: e,
    })?;
    Ok(stream)
}

/// TCP_NODELAY, keepalive, and the write timeout.
fn configure_stream(stream: &TcpStream, config: &PrinterConfig) -> io::Result<()> {
    stream.set_nodelay(true)?;

    let keepalive = TcpKeepalive::new().with_time(KEEPALIVE_INTERVAL);
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    let keepalive = keepalive.with_interval(KEEPALIVE_INTERVAL);
    SockRef::from(stream).set_tcp_keepalive(&keepalive)?;

    stream.set_write_timeout(Some(config.timeouts.write))
}
