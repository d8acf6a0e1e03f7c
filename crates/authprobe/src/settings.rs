//! Suite settings.
//!
//! Sources, lowest precedence first: built-in defaults, a YAML file,
//! `AUTHPROBE_*` environment variables, then whatever the caller (usually
//! the CLI) sets through the `with_*` builders.

use crate::code::VerificationCode;
use crate::driver::DriverConfig;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{
    WaitOptions, DEFAULT_EXPECT_TIMEOUT_MS, DEFAULT_NAVIGATION_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Application under test
pub const DEFAULT_BASE_URL: &str = "https://app.insomnia.rest";

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "AUTHPROBE_";

/// Browser viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Timeouts, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Waiting for an element to become actionable
    pub action_ms: u64,
    /// Auto-waiting assertions
    pub expect_ms: u64,
    /// Navigation, load states and URL waits
    pub navigation_ms: u64,
    /// Response waits
    pub response_ms: u64,
    /// Polling interval
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            expect_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            navigation_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            response_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Timeouts {
    /// The same budget for every wait; handy for fast test suites
    #[must_use]
    pub const fn uniform(ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            action_ms: ms,
            expect_ms: ms,
            navigation_ms: ms,
            response_ms: ms,
            poll_interval_ms,
        }
    }
}

/// Accounts and inputs the scenarios type into the login screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestData {
    /// Address used for the email one-time-code flow
    pub email: String,
    /// Work address routed to the SSO identity provider
    pub company_email: String,
    /// GitHub login
    pub github_email: String,
    /// Password GitHub must reject
    pub github_wrong_password: String,
    /// Address Google does not know
    pub google_unknown_email: String,
    /// Okta username
    pub sso_username: String,
    /// Password Okta must reject
    pub sso_wrong_password: String,
    /// Code the email screen must reject
    pub wrong_code: VerificationCode,
    /// Given name for Google registration
    pub first_name: String,
    /// Family name for Google registration
    pub last_name: String,
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            email: "authprobe@example.com".to_string(),
            company_email: "authprobe@konghq.com".to_string(),
            github_email: "authprobe@example.com".to_string(),
            github_wrong_password: "not-the-password".to_string(),
            google_unknown_email: "authprobe.no.such.account.7731@gmail.com".to_string(),
            sso_username: "authprobe@konghq.com".to_string(),
            sso_wrong_password: "not-the-password".to_string(),
            wrong_code: VerificationCode::default(),
            first_name: "Auth".to_string(),
            last_name: "Probe".to_string(),
        }
    }
}

/// Suite configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Origin relative URLs resolve against
    pub base_url: String,
    /// Browser viewport
    pub viewport: Viewport,
    /// Run Chromium without a window
    pub headless: bool,
    /// Chromium executable override
    pub chromium_path: Option<PathBuf>,
    /// Wait budgets
    pub timeouts: Timeouts,
    /// Where error screenshots are written
    pub screenshot_dir: PathBuf,
    /// Scenario inputs
    pub test_data: TestData,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            viewport: Viewport::default(),
            headless: true,
            chromium_path: None,
            timeouts: Timeouts::default(),
            screenshot_dir: PathBuf::from("."),
            test_data: TestData::default(),
        }
    }
}

impl Settings {
    /// Create new default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns a YAML error for malformed input, `Config` for an invalid base URL
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        let settings: Self = serde_yaml_ng::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read, otherwise as [`Settings::from_yaml_str`]
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Apply `AUTHPROBE_*` overrides from the process environment
    ///
    /// # Errors
    ///
    /// Returns `Config` when a variable holds an unparsable value
    pub fn apply_env(self) -> ProbeResult<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `AUTHPROBE_*` overrides from an arbitrary lookup
    ///
    /// # Errors
    ///
    /// Returns `Config` when a variable holds an unparsable value
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> ProbeResult<Self> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(base_url) = var("BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(headless) = var("HEADLESS") {
            self.headless = parse_bool("HEADLESS", &headless)?;
        }
        if let Some(path) = var("CHROMIUM") {
            self.chromium_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = var("SCREENSHOT_DIR") {
            self.screenshot_dir = PathBuf::from(dir);
        }
        if let Some(ms) = var("EXPECT_TIMEOUT_MS") {
            self.timeouts.expect_ms = parse_ms("EXPECT_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = var("ACTION_TIMEOUT_MS") {
            self.timeouts.action_ms = parse_ms("ACTION_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = var("NAVIGATION_TIMEOUT_MS") {
            self.timeouts.navigation_ms = parse_ms("NAVIGATION_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = var("RESPONSE_TIMEOUT_MS") {
            self.timeouts.response_ms = parse_ms("RESPONSE_TIMEOUT_MS", &ms)?;
        }
        if let Some(email) = var("EMAIL") {
            self.test_data.email = email;
        }
        if let Some(email) = var("COMPANY_EMAIL") {
            self.test_data.company_email = email;
        }
        if let Some(code) = var("WRONG_CODE") {
            self.test_data.wrong_code = VerificationCode::parse(&code)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check the base URL is an absolute http(s) URL
    ///
    /// # Errors
    ///
    /// Returns `Config` otherwise
    pub fn validate(&self) -> ProbeResult<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ProbeError::config(format!("base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProbeError::config(format!(
                "base_url must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(ProbeError::config("poll_interval_ms must be positive"));
        }
        Ok(())
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set Chromium executable
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set screenshot directory
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// Set timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set test data
    #[must_use]
    pub fn with_test_data(mut self, test_data: TestData) -> Self {
        self.test_data = test_data;
        self
    }

    /// Resolve `url` against the base URL; absolute URLs pass through
    ///
    /// # Errors
    ///
    /// Returns a URL error if either side does not parse
    pub fn resolve_url(&self, url: &str) -> ProbeResult<String> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute.to_string());
        }
        Ok(Url::parse(&self.base_url)?.join(url)?.to_string())
    }

    /// Wait options for auto-waiting assertions
    #[must_use]
    pub const fn expect_wait(&self) -> WaitOptions {
        self.wait(self.timeouts.expect_ms)
    }

    /// Wait options for actions
    #[must_use]
    pub const fn action_wait(&self) -> WaitOptions {
        self.wait(self.timeouts.action_ms)
    }

    /// Wait options for navigation
    #[must_use]
    pub const fn navigation_wait(&self) -> WaitOptions {
        self.wait(self.timeouts.navigation_ms)
    }

    /// Response wait budget
    #[must_use]
    pub const fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.response_ms)
    }

    const fn wait(&self, ms: u64) -> WaitOptions {
        WaitOptions::new(
            Duration::from_millis(ms),
            Duration::from_millis(self.timeouts.poll_interval_ms),
        )
    }

    /// Chromium launch configuration
    #[must_use]
    pub fn driver_config(&self) -> DriverConfig {
        let config = DriverConfig::new()
            .headless(self.headless)
            .viewport(self.viewport.width, self.viewport.height)
            .request_timeout(Duration::from_millis(self.timeouts.navigation_ms));
        match &self.chromium_path {
            Some(path) => config.executable_path(path.clone()),
            None => config,
        }
    }
}

fn parse_bool(name: &str, raw: &str) -> ProbeResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ProbeError::config(format!(
            "{ENV_PREFIX}{name}: expected a boolean, got {raw:?}"
        ))),
    }
}

fn parse_ms(name: &str, raw: &str) -> ProbeResult<u64> {
    raw.trim().parse().map_err(|_| {
        ProbeError::config(format!(
            "{ENV_PREFIX}{name}: expected milliseconds, got {raw:?}"
        ))
    })
}
