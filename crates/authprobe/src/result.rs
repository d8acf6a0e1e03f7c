//! Result and error types for authprobe.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for authprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Coarse failure classes used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Expected UI state absent or mismatched
    Assertion,
    /// Element or network response never arrived
    Timeout,
    /// Selector matched nothing usable or matched ambiguously (third-party markup changed)
    SelectorDrift,
    /// Browser, filesystem, configuration or protocol failure
    Infrastructure,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Assertion => "assertion",
            Self::Timeout => "timeout",
            Self::SelectorDrift => "selector-drift",
            Self::Infrastructure => "infrastructure",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while driving a login flow
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Low-level driver failure (CDP command rejected, page crashed, ...)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Locator matched more than one element when exactly one was required
    #[error("Strict mode violation: {selector} resolved to {count} elements")]
    StrictModeViolation {
        /// Selector description
        selector: String,
        /// Number of matches
        count: usize,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// A network response arrived with the wrong status
    #[error("Expected HTTP {expected} from {url} but got {actual}")]
    UnexpectedStatus {
        /// Response URL
        url: String,
        /// Expected status code
        expected: u16,
        /// Observed status code
        actual: u16,
    },

    /// Verification code is not six digits
    #[error("Invalid verification code: {message}")]
    InvalidCode {
        /// Error message
        message: String,
    },

    /// URL pattern could not be compiled
    #[error("Invalid URL pattern {pattern}: {message}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A page-object step failed; the screenshot (if any) was captured once
    #[error("{context} failed: {source}")]
    StepFailed {
        /// Step context, e.g. `GitHubLoginPage.assertOnPage`
        context: String,
        /// Path of the captured error screenshot
        screenshot: Option<PathBuf>,
        /// Underlying failure
        #[source]
        source: Box<ProbeError>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// URL parse error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl ProbeError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(what: impl Into<String>, ms: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            ms,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The innermost error, looking through `StepFailed` wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether this error already went through error capture
    #[must_use]
    pub const fn is_captured(&self) -> bool {
        matches!(self, Self::StepFailed { .. })
    }

    /// Screenshot written for this failure, if any
    #[must_use]
    pub fn screenshot(&self) -> Option<&std::path::Path> {
        match self {
            Self::StepFailed { screenshot, .. } => screenshot.as_deref(),
            _ => None,
        }
    }

    /// Classify the failure
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self.root_cause() {
            Self::AssertionFailed { .. } | Self::UnexpectedStatus { .. } => FailureKind::Assertion,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::StrictModeViolation { .. } => FailureKind::SelectorDrift,
            _ => FailureKind::Infrastructure,
        }
    }
}
