//! PageDriver - abstract browser automation seam.
//!
//! Page objects are written once against `&dyn PageDriver`. Two
//! implementations exist:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageDriver (object-safe async trait)                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐     ┌──────────────────────────┐   │
//! │  │  ChromiumDriver      │     │  MockDriver              │   │
//! │  │  (feature "browser") │     │  (scripted page model)   │   │
//! │  │  CDP via chromiumoxide│    │  integration tests       │   │
//! │  └──────────────────────┘     └──────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drivers perform single, immediate operations. Waiting, strict-mode and
//! timeouts live one level up in [`BasePage`](crate::BasePage).

use crate::locator::Locator;
use crate::network::{ResponseStream, RouteHandler, UrlPattern};
use crate::result::ProbeResult;
use crate::wait::LoadState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Observable state of one resolved element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Rendered and not hidden by CSS
    pub visible: bool,
    /// Text content
    pub text: String,
    /// Input value (empty for non-inputs)
    pub value: String,
    /// Checkbox state
    pub checked: bool,
}

/// Result of resolving a locator against the live page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Number of elements the locator resolved to
    pub count: usize,
    /// Whether any of the matches is visible
    pub any_visible: bool,
    /// State of the first match
    pub element: Option<ElementState>,
}

impl ElementSnapshot {
    /// Create a snapshot; `any_visible` follows the first element
    #[must_use]
    pub fn new(count: usize, element: Option<ElementState>) -> Self {
        let any_visible = element.as_ref().is_some_and(|el| el.visible);
        Self {
            count,
            any_visible,
            element,
        }
    }

    /// Snapshot for a locator that matched nothing
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether exactly one visible element matched
    #[must_use]
    pub fn is_single_visible(&self) -> bool {
        self.count == 1 && self.element.as_ref().is_some_and(|el| el.visible)
    }
}

/// Click behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickOptions {
    /// Skip actionability checks and dispatch the click directly
    pub force: bool,
}

impl ClickOptions {
    /// Forced click
    #[must_use]
    pub const fn forced() -> Self {
        Self { force: true }
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Timestamp when screenshot was taken
    pub timestamp: DateTime<Utc>,
}

impl Screenshot {
    /// PNG file signature
    pub const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    /// Create a new screenshot stamped now
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if the data carries a PNG signature
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.data.starts_with(&Self::PNG_MAGIC)
    }
}

/// Browser configuration for the Chromium driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Timeout for CDP requests
    pub request_timeout: Duration,
    /// Executable path override
    pub executable_path: Option<PathBuf>,
    /// Disable the Chromium sandbox (containers, CI)
    pub no_sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            request_timeout: Duration::from_secs(30),
            executable_path: None,
            no_sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set CDP request timeout
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set Chromium executable path
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = Some(path.into());
        self
    }
}

/// Abstract page driver.
///
/// One driver instance is one browser tab in an isolated context, owned by a
/// single scenario.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to an absolute URL and wait for the navigation to commit
    async fn goto(&self, url: &str) -> ProbeResult<()>;

    /// Current page URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Wait until the page reaches `state`
    async fn wait_for_load_state(&self, state: LoadState) -> ProbeResult<()>;

    /// Resolve a locator once against the current DOM
    async fn query(&self, locator: &Locator) -> ProbeResult<ElementSnapshot>;

    /// Click the first element the locator resolves to
    async fn click(&self, locator: &Locator, options: ClickOptions) -> ProbeResult<()>;

    /// Replace the value of the first element the locator resolves to
    async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()>;

    /// Stream of responses received after this call (redirects included)
    async fn subscribe_responses(&self) -> ProbeResult<ResponseStream>;

    /// Intercept requests matching `pattern`
    async fn route(&self, pattern: UrlPattern, handler: RouteHandler) -> ProbeResult<()>;

    /// Capture the viewport as PNG
    async fn screenshot(&self) -> ProbeResult<Screenshot>;

    /// Dispose the page and its browser context
    async fn close(&self) -> ProbeResult<()>;
}
