//! Retry wrappers that add exponential backoff to any [`Printer`].

use std::time::{Duration, SystemTime};

use tracing::warn;

use crate::config::RetryConfig;
use crate::{PrintError, Printer, Reconnectable};

/// Retries transient failures on the same connection.
///
/// Useful when the stream survives the failure (a write that timed out
/// while the printer was busy). After a dropped connection every retry
/// fails the same way; use [`ReconnectRetryPrinter`] for that.
#[derive(Debug)]
pub struct RetryPrinter<P> {
    inner: P,
    retry_config: RetryConfig,
}

impl<P> RetryPrinter<P> {
    /// Wrap `inner`.
    pub fn new(inner: P, retry_config: RetryConfig) -> Self {
        Self {
            inner,
            retry_config,
        }
    }

    /// Unwrap, returning the inner printer.
    pub fn into_inner(self) -> P {
        self.inner
    }

    /// Shared reference to the inner printer.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: Printer> Printer for RetryPrinter<P> {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError> {
        run_with_retry(
            &self.retry_config,
            &mut self.inner,
            |p| p.send_raw(data),
            |_| {},
        )
    }
}

/// Retries transient failures, reconnecting before each retry.
///
/// ```rust,no_run
/// use zpl_labelkit_print_client::{
///     Printer, PrinterConfig, ReconnectRetryPrinter, RetryConfig, TcpPrinter,
/// };
///
/// let tcp = TcpPrinter::connect("192.168.1.100", PrinterConfig::default()).unwrap();
/// let mut printer = ReconnectRetryPrinter::new(tcp, RetryConfig::default());
/// printer.send_zpl("^XA^FDHello^FS^XZ").unwrap();
/// ```
#[derive(Debug)]
pub struct ReconnectRetryPrinter<P> {
    inner: P,
    retry_config: RetryConfig,
}

impl<P> ReconnectRetryPrinter<P> {
    /// Wrap `inner`.
    pub fn new(inner: P, retry_config: RetryConfig) -> Self {
        Self {
            inner,
            retry_config,
        }
    }

    /// Unwrap, returning the inner printer.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Printer + Reconnectable> Printer for ReconnectRetryPrinter<P> {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError> {
        run_with_retry(
            &self.retry_config,
            &mut self.inner,
            |p| p.send_raw(data),
            |p| {
                // A failed reconnect surfaces as the next attempt's error.
                if let Err(e) = p.reconnect() {
                    warn!(error = %e, "reconnect before retry failed");
                }
            },
        )
    }
}

impl<P: Reconnectable> Reconnectable for ReconnectRetryPrinter<P> {
    fn reconnect(&mut self) -> Result<(), PrintError> {
        self.inner.reconnect()
    }
}

// ── Retry loop ─────────────────────────────────────────────────────────

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
///
/// `before_retry` runs after each backoff sleep and before the next
/// attempt. Exhaustion wraps the last error in
/// [`PrintError::RetriesExhausted`].
fn run_with_retry<S, T>(
    config: &RetryConfig,
    state: &mut S,
    mut op: impl FnMut(&mut S) -> Result<T, PrintError>,
    mut before_retry: impl FnMut(&mut S),
) -> Result<T, PrintError> {
    if config.max_attempts == 0 {
        return Err(PrintError::InvalidConfig(
            "max_attempts must be >= 1".into(),
        ));
    }

    let mut attempt = 0u32;
    loop {
        let err = match op(state) {
            Ok(val) => return Ok(val),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => e,
        };
        attempt += 1;
        if attempt >= config.max_attempts {
            return Err(PrintError::RetriesExhausted {
                attempts: attempt,
                last_error: Box::new(err),
            });
        }

        let delay = compute_delay(config, attempt - 1);
        warn!(
            attempt,
            max_attempts = config.max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "print attempt failed, retrying"
        );
        std::thread::sleep(delay);
        before_retry(state);
    }
}

/// Backoff before retry number `retry` (0-indexed):
/// `min(initial * 2^retry, max)`, jittered into `[d/2, d]` when enabled.
fn compute_delay(config: &RetryConfig, retry: u32) -> Duration {
    let capped = config
        .initial_delay
        .saturating_mul(2u32.saturating_pow(retry))
        .min(config.max_delay);
    if !config.jitter {
        return capped;
    }

    let half = capped / 2;
    let span = capped.as_nanos() - half.as_nanos();
    if span == 0 {
        return capped;
    }
    // Clock nanoseconds seed the jitter.
    let seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let offset = u64::try_from(u128::from(seed) % span).unwrap_or(0);
    half + Duration::from_nanos(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Pops scripted results, then succeeds. Counts sends and reconnects.
    #[derive(Default)]
    struct ScriptedPrinter {
        script: Vec<Result<(), PrintError>>,
        sends: u32,
        reconnects: u32,
    }

    impl ScriptedPrinter {
        fn failing(script: Vec<Result<(), PrintError>>) -> Self {
            Self {
                script,
                ..Self::default()
            }
        }
    }

    impl Printer for ScriptedPrinter {
        fn send_raw(&mut self, _data: &[u8]) -> Result<(), PrintError> {
            self.sends += 1;
            if self.script.is_empty() {
                Ok(())
            } else {
                self.script.remove(0)
            }
        }
    }

    impl Reconnectable for ScriptedPrinter {
        fn reconnect(&mut self) -> Result<(), PrintError> {
            self.reconnects += 1;
            Ok(())
        }
    }

    fn broken_pipe() -> PrintError {
        PrintError::WriteFailed(io::Error::new(io::ErrorKind::BrokenPipe, "mock"))
    }

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: false,
        }
    }

    #[test]
    fn permanent_error_is_not_retried() {
        let inner = ScriptedPrinter::failing(vec![Err(PrintError::InvalidAddress("x".into()))]);
        let mut printer = RetryPrinter::new(inner, fast(3));
        let err = printer.send_zpl("^XA^XZ").unwrap_err();
        assert!(matches!(err, PrintError::InvalidAddress(_)));
        assert_eq!(printer.inner().sends, 1);
    }

    #[test]
    fn recovers_after_transient_failures() {
        let inner = ScriptedPrinter::failing(vec![Err(broken_pipe()), Err(broken_pipe())]);
        let mut printer = RetryPrinter::new(inner, fast(5));
        printer.send_zpl("^XA^XZ").unwrap();
        assert_eq!(printer.inner().sends, 3);
        assert_eq!(printer.inner().reconnects, 0);
    }

    #[test]
    fn exhaustion_wraps_last_error() {
        let inner =
            ScriptedPrinter::failing(vec![Err(broken_pipe()), Err(broken_pipe()), Err(broken_pipe())]);
        let mut printer = RetryPrinter::new(inner, fast(3));
        match printer.send_zpl("^XA^XZ").unwrap_err() {
            PrintError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last_error, PrintError::WriteFailed(_)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(printer.into_inner().sends, 3);
    }

    #[test]
    fn zero_attempts_is_a_config_error() {
        let mut printer = RetryPrinter::new(ScriptedPrinter::default(), fast(0));
        assert!(matches!(
            printer.send_zpl("x"),
            Err(PrintError::InvalidConfig(_))
        ));
        assert_eq!(printer.inner().sends, 0);
    }

    #[test]
    fn single_attempt_still_reports_exhaustion() {
        let inner = ScriptedPrinter::failing(vec![Err(broken_pipe())]);
        let mut printer = RetryPrinter::new(inner, fast(1));
        assert!(matches!(
            printer.send_zpl("x"),
            Err(PrintError::RetriesExhausted { attempts: 1, .. })
        ));
    }

    #[test]
    fn reconnects_between_attempts_only() {
        let inner =
            ScriptedPrinter::failing(vec![Err(broken_pipe()), Err(broken_pipe()), Err(broken_pipe())]);
        let mut printer = ReconnectRetryPrinter::new(inner, fast(3));
        assert!(printer.send_zpl("x").is_err());
        let inner = printer.into_inner();
        assert_eq!(inner.sends, 3);
        assert_eq!(inner.reconnects, 2);
    }

    #[test]
    fn reconnect_wrapper_skips_reconnect_on_permanent_error() {
        let inner = ScriptedPrinter::failing(vec![Err(PrintError::NoAddressFound("h".into()))]);
        let mut printer = ReconnectRetryPrinter::new(inner, fast(3));
        assert!(printer.send_zpl("x").is_err());
        assert_eq!(printer.into_inner().reconnects, 0);
    }

    #[test]
    fn delay_doubles_up_to_cap() {
        let cfg = RetryConfig {
            max_attempts: 10,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            jitter: false,
        };
        let delays: Vec<_> = (0..5).map(|n| compute_delay(&cfg, n).as_secs()).collect();
        assert_eq!(delays, [1, 2, 4, 5, 5]);
    }

    #[test]
    fn jittered_delay_stays_in_range() {
        let cfg = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            jitter: true,
        };
        for retry in 0..4 {
            let base = Duration::from_millis(100 * 2u64.pow(retry)).min(cfg.max_delay);
            for _ in 0..10 {
                let d = compute_delay(&cfg, retry);
                assert!(d >= base / 2 && d <= base, "retry {retry}: {d:?}");
            }
        }
    }
}
