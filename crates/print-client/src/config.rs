//! Connection and retry settings.

use std::time::Duration;

/// Timeouts plus retry policy for a printer connection.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PrinterConfig {
    /// Transport timeouts.
    pub timeouts: PrinterTimeouts,
    /// Retry settings for transient failures.
    pub retry: RetryConfig,
}

impl PrinterConfig {
    /// Replace the retry attempt count, keeping everything else.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts;
        self
    }
}

/// Timeouts for the raw TCP port.
///
/// The raw port is one-way for label jobs, so only connect and write are
/// bounded. Writes get a long budget: a label carrying `^GF` graphics can
/// run to hundreds of kilobytes.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PrinterTimeouts {
    /// Maximum time to wait for the connection to establish.
    pub connect: Duration,
    /// Maximum time a single write may block.
    pub write: Duration,
}

impl Default for PrinterTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            write: Duration::from_secs(30),
        }
    }
}

/// Exponential backoff with optional jitter.
///
/// Only errors where [`PrintError::is_retryable()`](crate::PrintError::is_retryable)
/// returns `true` are retried.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Randomize each delay within `[delay/2, delay]`.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = PrinterConfig::default();
        assert_eq!(cfg.timeouts.connect, Duration::from_secs(5));
        assert_eq!(cfg.timeouts.write, Duration::from_secs(30));
        assert_eq!(cfg.retry.max_attempts, 3);
        assert!(cfg.retry.jitter);
    }

    #[test]
    fn with_max_attempts_keeps_timeouts() {
        let cfg = PrinterConfig::default().with_max_attempts(7);
        assert_eq!(cfg.retry.max_attempts, 7);
        assert_eq!(cfg.timeouts, PrinterTimeouts::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_fills_defaults() {
        let cfg: PrinterConfig =
            serde_json::from_str(r#"{ "retry": { "max_attempts": 5 } }"#).unwrap();
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.initial_delay, Duration::from_millis(500));
        assert_eq!(cfg.timeouts, PrinterTimeouts::default());
    }
}
