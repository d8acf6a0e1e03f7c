//! Authprobe: end-to-end checks for OAuth, SSO and email-code login flows.
//!
//! Page objects wrap each screen of the login journey (the app's authorize
//! page, GitHub, Google, Okta and the one-time code screen). Scenarios chain
//! them into tagged journeys that run against a [`PageDriver`]: Chromium over
//! CDP with the `browser` feature, or the scripted [`mock::MockDriver`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌────────────┐
//! │ Scenario     │──►│ Page objects │──►│ BasePage     │──►│ PageDriver │
//! │ catalog      │   │ (per screen) │   │ waits, error │   │ chromium / │
//! │ + runner     │   │              │   │ capture      │   │ mock       │
//! └──────────────┘   └──────────────┘   └──────────────┘   └────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use authprobe::{pages::AuthPage, ChromiumBrowser, Settings};
//!
//! let settings = Settings::new();
//! let browser = ChromiumBrowser::launch(settings.driver_config()).await?;
//! let driver = browser.new_driver().await?;
//! let auth = AuthPage::new(&driver, &settings);
//! auth.navigate().await?;
//! auth.login_with_github().await?;
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod base_page;
#[cfg(feature = "browser")]
mod browser;
mod capture;
mod code;
mod driver;
mod locator;
mod page_object;
mod result;
mod settings;

/// Scripted in-memory driver for tests
pub mod mock;

/// URL patterns, response records and request interception
pub mod network;

/// Page objects for each login screen
#[allow(clippy::missing_errors_doc)]
pub mod pages;

/// Scenario catalog and suite runner
pub mod scenario;

/// Auto-wait primitives
pub mod wait;

pub use base_page::BasePage;
#[cfg(feature = "browser")]
pub use browser::{ChromiumBrowser, ChromiumDriver};
pub use capture::{error_screenshot_name, error_screenshot_path, file_timestamp};
pub use code::{VerificationCode, CODE_LENGTH};
pub use driver::{ClickOptions, DriverConfig, ElementSnapshot, ElementState, PageDriver, Screenshot};
pub use locator::{normalize_whitespace, AriaRole, ExpectAssertion, Locator, Selector};
pub use network::{ResponseRecord, UrlPattern};
pub use page_object::PageObject;
pub use result::{FailureKind, ProbeError, ProbeResult};
pub use scenario::{
    catalog, DriverFactory, Scenario, ScenarioContext, ScenarioOutcome, Selection, SuiteResults,
    SuiteRunner, Tag,
};
pub use settings::{Settings, TestData, Timeouts, Viewport, DEFAULT_BASE_URL};
pub use wait::{LoadState, WaitOptions};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::pages::*;
    pub use super::{
        AriaRole, BasePage, Locator, LoadState, PageDriver, PageObject, ProbeError, ProbeResult,
        Settings, UrlPattern, VerificationCode,
    };
}
