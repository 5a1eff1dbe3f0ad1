//! Backoff between attempts to reopen the event stream.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Delay schedule for reopening a dropped stream.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Wait after the first failed attempt.
    pub initial_delay: Duration,
    /// Ceiling for any single wait.
    pub max_delay: Duration,
    /// Growth factor applied after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// The infinite sequence of waits this schedule produces.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_delay.min(self.max_delay),
            max: self.max_delay,
            multiplier: self.multiplier,
        }
    }
}

/// Iterator over successive waits: 1 s, 2 s, 4 s ... capped at the maximum.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    multiplier: f64,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = current.mul_f64(self.multiplier).min(self.max);
        Some(current)
    }
}

/// Run `open` until it yields a connection, waiting out the backoff
/// schedule between failures. `None` when `cancel` fires first.
pub async fn reconnect_loop<T, E, F, Fut>(
    url: &str,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
    mut open: F,
) -> Option<T>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    for (attempt, wait) in (1u32..).zip(config.backoff()) {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => None,
            result = open() => Some(result),
        };
        match outcome {
            None => {
                tracing::debug!(url, "Reconnect abandoned");
                return None;
            }
            Some(Ok(conn)) => {
                tracing::info!(url, attempt, "Realtime stream reopened");
                return Some(conn);
            }
            Some(Err(e)) => {
                tracing::warn!(
                    url,
                    attempt,
                    retry_in_ms = wait.as_millis() as u64,
                    error = %e,
                    "Realtime reconnect failed",
                );
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(wait) => {}
        }
    }
    None
}
