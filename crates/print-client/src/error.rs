//! Typed error types for output targets.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Delivery failures, categorized by where they happened.
///
/// Use [`PrintError::is_retryable()`] to tell transient transport failures
/// from permanent ones.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    // -- Connection --
    /// The printer actively refused the connection (e.g. port not open).
    #[error("connection refused: {addr}")]
    ConnectionRefused {
        /// The address that was attempted.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// TCP connect timed out before the printer responded.
    #[error("connection timed out: {addr} ({timeout:?})")]
    ConnectionTimeout {
        /// The address that was attempted.
        addr: String,
        /// The configured timeout that elapsed.
        timeout: Duration,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Connection failed for a reason other than refusal or timeout.
    #[error("connection failed: {addr}")]
    ConnectionFailed {
        /// The address that was attempted.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    // -- Address --
    /// The address string was empty or otherwise unusable.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// DNS resolution found no addresses for the given hostname.
    #[error("no address found for hostname: {0}")]
    NoAddressFound(String),

    // -- I/O --
    /// Writing to the printer or writer failed.
    #[error("write failed: {0}")]
    WriteFailed(#[source] io::Error),

    /// Writing an output file failed.
    #[error("failed to write '{}': {source}", .path.display())]
    FileWrite {
        /// Destination path.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    // -- Payload --
    /// Strict mode: the payload was produced for a different resolution.
    #[error("resolution mismatch: payload is {payload} dpi, target is {target} dpi")]
    ResolutionMismatch {
        /// Payload resolution.
        payload: u32,
        /// Target native resolution.
        target: u32,
    },

    /// The target cannot deliver this kind of payload.
    #[error("{target} target cannot send {kind} payloads")]
    UnsupportedPayload {
        /// Target kind, e.g. `"printer"`.
        target: &'static str,
        /// Payload kind, e.g. `"image"`.
        kind: &'static str,
    },

    // -- Retry --
    /// All retry attempts have been exhausted.
    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        /// Total number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last_error: Box<PrintError>,
    },

    // -- Configuration --
    /// An invalid configuration was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PrintError {
    /// Returns `true` if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PrintError::ConnectionTimeout { .. } | PrintError::WriteFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_hiccups_are_retryable() {
        assert!(
            PrintError::ConnectionTimeout {
                addr: "10.0.0.9:9100".into(),
                timeout: Duration::from_secs(1),
                source: io::Error::new(io::ErrorKind::TimedOut, "test"),
            }
            .is_retryable()
        );
        assert!(
            PrintError::WriteFailed(io::Error::new(io::ErrorKind::BrokenPipe, "test"))
                .is_retryable()
        );
    }

    #[test]
    fn permanent_failures_are_not_retryable() {
        assert!(
            !PrintError::ConnectionRefused {
                addr: "x".into(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "test"),
            }
            .is_retryable()
        );
        assert!(!PrintError::NoAddressFound("x".into()).is_retryable());
        assert!(
            !PrintError::ResolutionMismatch {
                payload: 300,
                target: 203
            }
            .is_retryable()
        );
        assert!(
            !PrintError::UnsupportedPayload {
                target: "printer",
                kind: "image"
            }
            .is_retryable()
        );
        assert!(
            !PrintError::FileWrite {
                path: "/tmp/x".into(),
                source: io::Error::other("disk full"),
            }
            .is_retryable()
        );
        assert!(
            !PrintError::RetriesExhausted {
                attempts: 3,
                last_error: Box::new(PrintError::WriteFailed(io::Error::other("x"))),
            }
            .is_retryable()
        );
    }

    #[test]
    fn messages_name_the_mismatch() {
        let err = PrintError::ResolutionMismatch {
            payload: 300,
            target: 203,
        };
        assert_eq!(
            err.to_string(),
            "resolution mismatch: payload is 300 dpi, target is 203 dpi"
        );
        let err = PrintError::UnsupportedPayload {
            target: "printer",
            kind: "image",
        };
        assert_eq!(err.to_string(), "printer target cannot send image payloads");
    }
}
