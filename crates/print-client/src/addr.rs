//! Printer address resolution.
//!
//! Accepts `IP`, `IP:PORT`, `[v6]:PORT`, `hostname` and `hostname:PORT`.
//! A missing port means the raw printing port, 9100.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use tracing::trace;

use crate::PrintError;

/// Default raw printing port (JetDirect / RAW).
pub const DEFAULT_PORT: u16 = 9100;

/// Resolve a user-supplied printer address to a socket address.
///
/// Hostnames that resolve to several addresses use the first one.
pub fn resolve_printer_addr(input: &str) -> Result<SocketAddr, PrintError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PrintError::InvalidAddress("empty address".into()));
    }

    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = input.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    let resolved = if has_port(input) {
        input.to_socket_addrs().ok().and_then(|mut it| it.next())
    } else {
        (input, DEFAULT_PORT)
            .to_socket_addrs()
            .ok()
            .and_then(|mut it| it.next())
    };
    match resolved {
        Some(addr) => {
            trace!(input, %addr, "resolved printer address");
            Ok(addr)
        }
        None => Err(PrintError::NoAddressFound(input.to_string())),
    }
}

/// `host:port` with a numeric port. Bare IPv6 literals never get here.
fn has_port(input: &str) -> bool {
    input
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
}
