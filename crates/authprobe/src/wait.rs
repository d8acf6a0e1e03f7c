//! Wait mechanisms.
//!
//! Load states mirror the browser lifecycle events the login pages are
//! synchronized on, and [`poll_until`] is the auto-waiting loop behind every
//! `assert_*` in [`BasePage`](crate::BasePage).

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default timeout for auto-waiting assertions (5 seconds)
pub const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for navigation and load states (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Network idle threshold (500ms without new requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// Wait for the `load` event to fire
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
    /// Wait for network to be idle (no requests for 500ms)
    #[default]
    NetworkIdle,
}

impl LoadState {
    /// Get the event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "domcontentloaded",
            Self::NetworkIdle => "networkidle",
        }
    }

    /// Whether `document.readyState` satisfies this state
    #[must_use]
    pub fn satisfied_by_ready_state(&self, ready_state: &str) -> bool {
        match self {
            Self::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            Self::Load | Self::NetworkIdle => ready_state == "complete",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

impl std::str::FromStr for LoadState {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "load" => Ok(Self::Load),
            "domcontentloaded" => Ok(Self::DomContentLoaded),
            "networkidle" => Ok(Self::NetworkIdle),
            other => Err(ProbeError::config(format!("unknown load state '{other}'"))),
        }
    }
}

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout
    pub timeout: Duration,
    /// Polling interval
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_EXPECT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitOptions {
    /// Create new wait options
    #[must_use]
    pub const fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout in whole milliseconds
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Outcome of one probe inside [`poll_until`]
#[derive(Debug)]
pub enum Poll<T> {
    /// Condition satisfied
    Ready(T),
    /// Not yet; the message describes what was observed
    Pending(String),
}

/// Poll `probe` until it reports ready or the timeout elapses.
///
/// A `Driver` error counts as a pending observation: evaluation fails
/// transiently while a navigation replaces the execution context. Every
/// other probe error aborts the wait immediately. On timeout the error built
/// by `on_timeout` receives the last observation.
///
/// # Errors
///
/// Returns the probe's non-driver error, or `on_timeout(last_observation)`
/// on timeout
pub async fn poll_until<T, P, Fut, E>(
    options: WaitOptions,
    mut probe: P,
    on_timeout: E,
) -> ProbeResult<T>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<Poll<T>>>,
    E: FnOnce(String) -> ProbeError,
{
    let deadline = Instant::now() + options.timeout;
    loop {
        let observed = match probe().await {
            Ok(Poll::Ready(value)) => return Ok(value),
            Ok(Poll::Pending(observed)) => observed,
            Err(ProbeError::Driver { message }) => {
                debug!(%message, "driver error while polling, retrying");
                format!("driver error: {message}")
            }
            Err(err) => return Err(err),
        };
        if Instant::now() >= deadline {
            return Err(on_timeout(observed));
        }
        tokio::time::sleep(options.poll_interval).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_default_is_network_idle() {
            assert_eq!(LoadState::default(), LoadState::NetworkIdle);
        }

        #[test]
        fn test_parse() {
            assert_eq!("load".parse::<LoadState>().unwrap(), LoadState::Load);
            assert_eq!(
                "DOMContentLoaded".parse::<LoadState>().unwrap(),
                LoadState::DomContentLoaded
            );
            assert_eq!(
                "networkidle".parse::<LoadState>().unwrap(),
                LoadState::NetworkIdle
            );
            assert!("idle".parse::<LoadState>().is_err());
        }

        #[test]
        fn test_ready_state() {
            assert!(LoadState::DomContentLoaded.satisfied_by_ready_state("interactive"));
            assert!(!LoadState::Load.satisfied_by_ready_state("interactive"));
            assert!(LoadState::NetworkIdle.satisfied_by_ready_state("complete"));
        }

        #[test]
        fn test_display() {
            assert_eq!(LoadState::NetworkIdle.to_string(), "networkidle");
        }
    }

    mod poll_tests {
        use super::*;

        fn fast() -> WaitOptions {
            WaitOptions::new(Duration::from_millis(100), Duration::from_millis(5))
        }

        #[tokio::test]
        async fn test_ready_after_a_few_polls() {
            let calls = AtomicUsize::new(0);
            let value = poll_until(
                fast(),
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n >= 2 {
                            Ok(Poll::Ready(n))
                        } else {
                            Ok(Poll::Pending(format!("attempt {n}")))
                        }
                    }
                },
                ProbeError::assertion,
            )
            .await
            .unwrap();
            assert_eq!(value, 2);
        }

        #[tokio::test]
        async fn test_timeout_reports_last_observation() {
            let err = poll_until(
                fast(),
                || async { Ok(Poll::<()>::Pending("still hidden".to_string())) },
                |observed| ProbeError::assertion(format!("never visible: {observed}")),
            )
            .await
            .unwrap_err();
            assert!(err.to_string().contains("still hidden"));
        }

        #[tokio::test]
        async fn test_strict_violation_aborts() {
            let calls = AtomicUsize::new(0);
            let err = poll_until(
                fast(),
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async {
                        Err::<Poll<()>, _>(ProbeError::StrictModeViolation {
                            selector: "button".to_string(),
                            count: 2,
                        })
                    }
                },
                ProbeError::assertion,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ProbeError::StrictModeViolation { count: 2, .. }));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_transient_driver_error_is_retried() {
            let calls = AtomicUsize::new(0);
            let value = poll_until(
                fast(),
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 {
                            Err(ProbeError::driver("Execution context was destroyed"))
                        } else {
                            Ok(Poll::Ready(n))
                        }
                    }
                },
                ProbeError::assertion,
            )
            .await
            .unwrap();
            assert_eq!(value, 1);
        }

        #[tokio::test]
        async fn test_persistent_driver_error_times_out_with_message() {
            let err = poll_until(
                fast(),
                || async { Err::<Poll<()>, _>(ProbeError::driver("page crashed")) },
                |observed| ProbeError::assertion(format!("never visible: {observed}")),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ProbeError::AssertionFailed { .. }));
            assert!(err.to_string().contains("driver error: page crashed"));
        }
    }
}
