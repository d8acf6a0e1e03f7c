//! Shared page primitives.
//!
//! [`BasePage`] is composed into every flow page object. It turns the
//! driver's one-shot operations into auto-waiting actions and assertions,
//! and owns error capture: a failed step is screenshotted once, logged, and
//! handed back wrapped in [`ProbeError::StepFailed`].

use crate::capture;
use crate::driver::{ClickOptions, PageDriver};
use crate::locator::{ExpectAssertion, Locator};
use crate::network::{ResponseRecord, RouteHandler, UrlPattern};
use crate::result::{ProbeError, ProbeResult};
use crate::settings::Settings;
use crate::wait::{poll_until, LoadState, Poll, WaitOptions};
use chrono::Utc;
use futures::StreamExt;
use std::future::Future;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Common operations over one page handle
#[derive(Clone, Copy)]
pub struct BasePage<'a> {
    driver: &'a dyn PageDriver,
    settings: &'a Settings,
}

impl std::fmt::Debug for BasePage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasePage")
            .field("base_url", &self.settings.base_url)
            .finish_non_exhaustive()
    }
}

impl<'a> BasePage<'a> {
    /// Bind to a page handle
    #[must_use]
    pub const fn new(driver: &'a dyn PageDriver, settings: &'a Settings) -> Self {
        Self { driver, settings }
    }

    /// Underlying driver
    #[must_use]
    pub const fn driver(&self) -> &'a dyn PageDriver {
        self.driver
    }

    /// Suite settings
    #[must_use]
    pub const fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// Navigate; relative URLs resolve against the base URL
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if navigation exceeds the navigation budget, or the
    /// driver's navigation error
    pub async fn navigate(&self, url: &str) -> ProbeResult<()> {
        let target = self.settings.resolve_url(url)?;
        info!(url = %target, "navigate");
        let budget = self.settings.navigation_wait();
        tokio::time::timeout(budget.timeout, self.driver.goto(&target))
            .await
            .map_err(|_| ProbeError::timeout(format!("navigation to {target}"), budget.timeout_ms()))?
    }

    /// Click a single visible element
    ///
    /// # Errors
    ///
    /// Returns `StrictModeViolation` on ambiguous matches, `Timeout` when no
    /// actionable element appears
    pub async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        self.click_with(locator, ClickOptions::default()).await
    }

    /// Click with options; `force` skips the visibility wait
    ///
    /// # Errors
    ///
    /// As [`BasePage::click`]
    pub async fn click_with(&self, locator: &Locator, options: ClickOptions) -> ProbeResult<()> {
        self.wait_actionable(locator, !options.force).await?;
        debug!(%locator, force = options.force, "click");
        self.driver.click(locator, options).await
    }

    /// Replace the value of a single visible element
    ///
    /// # Errors
    ///
    /// As [`BasePage::click`]
    pub async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        self.wait_actionable(locator, true).await?;
        debug!(%locator, len = text.len(), "fill");
        self.driver.fill(locator, text).await
    }

    /// Wait for a page lifecycle state
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if the state is not reached within the navigation budget
    pub async fn wait_for_page_load(&self, state: LoadState) -> ProbeResult<()> {
        let budget = self.settings.navigation_wait();
        debug!(%state, "wait for load state");
        tokio::time::timeout(budget.timeout, self.driver.wait_for_load_state(state))
            .await
            .map_err(|_| ProbeError::timeout(format!("load state {state}"), budget.timeout_ms()))?
    }

    /// Wait until the current URL matches
    ///
    /// # Errors
    ///
    /// Returns `Timeout` with the last URL seen
    pub async fn wait_for_url(&self, pattern: &UrlPattern) -> ProbeResult<String> {
        let budget = self.settings.navigation_wait();
        self.poll_url(pattern, budget, |url| {
            ProbeError::timeout(
                format!("URL matching {pattern} (last URL {url})"),
                budget.timeout_ms(),
            )
        })
        .await
    }

    /// Run `trigger` and return the first response whose URL matches.
    ///
    /// The subscription is taken before the trigger runs, so responses the
    /// trigger causes cannot be missed.
    ///
    /// # Errors
    ///
    /// Returns the trigger's error, or `Timeout` when no matching response
    /// arrives within the response budget
    pub async fn wait_for_response<F, Fut>(
        &self,
        pattern: &UrlPattern,
        trigger: F,
    ) -> ProbeResult<ResponseRecord>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProbeResult<()>>,
    {
        pattern.validate()?;
        let mut responses = self.driver.subscribe_responses().await?;
        trigger().await?;

        let budget = self.settings.response_timeout();
        let matching = async {
            while let Some(response) = responses.next().await {
                if pattern.matches(&response.url) {
                    return Ok(response);
                }
            }
            Err(ProbeError::driver(format!(
                "response stream ended before {pattern} arrived"
            )))
        };
        let response = tokio::time::timeout(budget, matching).await.map_err(|_| {
            ProbeError::timeout(
                format!("response {pattern}"),
                u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            )
        })??;
        debug!(url = %response.url, status = response.status, "response");
        Ok(response)
    }

    /// Click `locator` and require the matching response to carry `status`
    ///
    /// # Errors
    ///
    /// As [`BasePage::wait_for_response`], plus `UnexpectedStatus`
    pub async fn wait_for_response_status(
        &self,
        pattern: &UrlPattern,
        locator: &Locator,
        status: u16,
    ) -> ProbeResult<ResponseRecord> {
        let response = self
            .wait_for_response(pattern, || self.click(locator))
            .await?;
        response.expect_status(status)?;
        Ok(response)
    }

    /// Install a request interception handler
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` for an uncompilable pattern, or a driver error
    pub async fn route_request(&self, pattern: UrlPattern, handler: RouteHandler) -> ProbeResult<()> {
        pattern.validate()?;
        debug!(%pattern, "route");
        self.driver.route(pattern, handler).await
    }

    /// Auto-waiting URL assertion
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` with the last URL seen
    pub async fn assert_url(&self, pattern: &UrlPattern) -> ProbeResult<()> {
        let budget = self.settings.expect_wait();
        self.poll_url(pattern, budget, |url| {
            ProbeError::assertion(format!("expected URL to match {pattern}, got {url}"))
        })
        .await
        .map(|_| ())
    }

    /// Auto-waiting visibility assertion
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed`, or `StrictModeViolation` for ambiguous locators
    pub async fn assert_visible(&self, locator: &Locator) -> ProbeResult<()> {
        self.expect(locator, ExpectAssertion::IsVisible).await
    }

    /// Auto-waiting hidden assertion (absence counts as hidden)
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed`
    pub async fn assert_hidden(&self, locator: &Locator) -> ProbeResult<()> {
        self.expect(locator, ExpectAssertion::IsHidden).await
    }

    /// Auto-waiting text assertion (whitespace-normalized equality)
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed`, or `StrictModeViolation`
    pub async fn assert_has_text(&self, locator: &Locator, expected: &str) -> ProbeResult<()> {
        self.expect(locator, ExpectAssertion::HasText(expected.to_string()))
            .await
    }

    /// Auto-waiting input value assertion
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed`, or `StrictModeViolation`
    pub async fn assert_has_value(&self, locator: &Locator, expected: &str) -> ProbeResult<()> {
        self.expect(locator, ExpectAssertion::HasValue(expected.to_string()))
            .await
    }

    /// Auto-waiting match-count assertion
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed`
    pub async fn assert_count(&self, locator: &Locator, expected: usize) -> ProbeResult<()> {
        self.expect(locator, ExpectAssertion::HasCount(expected))
            .await
    }

    /// Checkbox state of a single element
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if no element appears, `StrictModeViolation` if several do
    pub async fn is_checked(&self, locator: &Locator) -> ProbeResult<bool> {
        self.wait_actionable(locator, false).await?;
        let snapshot = self.driver.query(locator).await?;
        Ok(snapshot.element.is_some_and(|el| el.checked))
    }

    /// Write a PNG of the viewport to `path`
    ///
    /// # Errors
    ///
    /// Returns `ScreenshotError` if capture or writing fails
    pub async fn screenshot(&self, path: &Path) -> ProbeResult<()> {
        let shot = self.driver.screenshot().await?;
        capture::write_png(path, &shot).await?;
        debug!(path = %path.display(), bytes = shot.size_bytes(), "screenshot");
        Ok(())
    }

    /// Capture `error-<context>-<timestamp>.png`, log, and return the error
    /// wrapped as `StepFailed`.
    ///
    /// Errors that already went through capture are returned untouched so
    /// nested guarded steps produce one screenshot. A failing screenshot is
    /// logged and otherwise ignored.
    pub async fn handle_error(&self, err: ProbeError, context: &str) -> ProbeError {
        if err.is_captured() {
            return err;
        }
        let path = capture::error_screenshot_path(&self.settings.screenshot_dir, context, Utc::now());
        let screenshot = match self.screenshot(&path).await {
            Ok(()) => Some(path),
            Err(shot_err) => {
                warn!(context, error = %shot_err, "could not capture error screenshot");
                None
            }
        };
        error!(
            context,
            kind = %err.kind(),
            screenshot = screenshot.as_deref().map(|p| p.display().to_string()),
            "Error in {context}: {err}"
        );
        ProbeError::StepFailed {
            context: context.to_string(),
            screenshot,
            source: Box::new(err),
        }
    }

    /// Run a page-object step, routing failures through [`BasePage::handle_error`]
    ///
    /// # Errors
    ///
    /// Returns the step's error wrapped as `StepFailed`
    pub async fn guard<T, Fut>(&self, context: &str, step: Fut) -> ProbeResult<T>
    where
        Fut: Future<Output = ProbeResult<T>>,
    {
        match step.await {
            Ok(value) => Ok(value),
            Err(err) => Err(self.handle_error(err, context).await),
        }
    }

    async fn expect(&self, locator: &Locator, assertion: ExpectAssertion) -> ProbeResult<()> {
        let driver = self.driver;
        let assertion = &assertion;
        poll_until(
            self.settings.expect_wait(),
            || async move {
                let snapshot = driver.query(locator).await?;
                assertion.check(locator, &snapshot)
            },
            |observed| {
                ProbeError::assertion(format!(
                    "expected {locator} {}: {observed}",
                    assertion.describe()
                ))
            },
        )
        .await
    }

    async fn wait_actionable(&self, locator: &Locator, require_visible: bool) -> ProbeResult<()> {
        let driver = self.driver;
        let budget = self.settings.action_wait();
        poll_until(
            budget,
            || async move {
                let snapshot = driver.query(locator).await?;
                locator.ensure_unique(&snapshot)?;
                Ok(match &snapshot.element {
                    None => Poll::Pending("no matching element".to_string()),
                    Some(el) if require_visible && !el.visible => {
                        Poll::Pending("element is not visible".to_string())
                    }
                    Some(_) => Poll::Ready(()),
                })
            },
            |observed| ProbeError::timeout(format!("{locator} ({observed})"), budget.timeout_ms()),
        )
        .await
    }

    async fn poll_url(
        &self,
        pattern: &UrlPattern,
        options: WaitOptions,
        on_timeout: impl FnOnce(String) -> ProbeError,
    ) -> ProbeResult<String> {
        pattern.validate()?;
        let driver = self.driver;
        poll_until(
            options,
            || async move {
                let url = driver.current_url().await?;
                Ok(if pattern.matches(&url) {
                    Poll::Ready(url)
                } else {
                    Poll::Pending(url)
                })
            },
            on_timeout,
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::AriaRole;
    use crate::mock::{MockDriver, MockElement, MockEndpoint};
    use crate::network::{continue_route, MockResponse, RouteAction};
    use crate::settings::Timeouts;
    use std::sync::Arc;
    use std::time::Duration;

    fn settings(dir: &Path) -> Settings {
        Settings::new()
            .with_base_url("https://app.test")
            .with_timeouts(Timeouts::uniform(150, 5))
            .with_screenshot_dir(dir)
    }

    fn button() -> Locator {
        Locator::role(AriaRole::Button).name("Go")
    }

    fn driver() -> MockDriver {
        MockDriver::new()
            .with_endpoint(
                MockEndpoint::new(UrlPattern::glob("**/start"))
                    .with_element(
                        MockElement::new(button())
                            .on_click(|page| page.navigate("https://app.test/redirect?client_id=1")),
                    )
                    .with_element(MockElement::new(Locator::new("input#name")))
                    .with_element(MockElement::new(Locator::new("li")).with_text("a"))
                    .with_element(MockElement::new(Locator::new("li")).with_text("b"))
                    .with_element(MockElement::new(Locator::new("p.hidden")).hidden()),
            )
            .with_endpoint(
                MockEndpoint::new(UrlPattern::glob("**/redirect?client_id**"))
                    .redirect("https://idp.test/login"),
            )
            .with_endpoint(MockEndpoint::new(UrlPattern::glob("https://idp.test/**")))
    }

    mod action_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_resolves_relative() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            page.navigate("/start").await.unwrap();
            assert!(driver.was_called("goto:https://app.test/start"));
        }

        #[tokio::test]
        async fn test_fill_and_assert_value() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            page.navigate("/start").await.unwrap();

            let input = Locator::new("input#name");
            page.fill(&input, "Ada").await.unwrap();
            page.assert_has_value(&input, "Ada").await.unwrap();
        }

        #[tokio::test]
        async fn test_click_strict_violation() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            page.navigate("/start").await.unwrap();

            let err = page.click(&Locator::new("li")).await.unwrap_err();
            assert!(matches!(err, ProbeError::StrictModeViolation { count: 2, .. }));
            page.click(&Locator::new("li").nth(1)).await.unwrap();
        }

        #[tokio::test]
        async fn test_click_hidden_times_out_unless_forced() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            page.navigate("/start").await.unwrap();

            let hidden = Locator::new("p.hidden");
            let err = page.click(&hidden).await.unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { .. }));
            assert!(err.to_string().contains("not visible"));
            page.click_with(&hidden, ClickOptions::forced()).await.unwrap();
        }

        #[tokio::test]
        async fn test_wait_for_page_load() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            page.navigate("/start").await.unwrap();
            page.wait_for_page_load(LoadState::default()).await.unwrap();
            assert!(driver.was_called("wait_for_load_state:networkidle"));
        }
    }

    mod network_tests {
        use super::*;

        #[tokio::test]
        async fn test_wait_for_response_status() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            page.navigate("/start").await.unwrap();

            let response = page
                .wait_for_response_status(
                    &UrlPattern::glob("**/redirect?client_id**"),
                    &button(),
                    302,
                )
                .await
                .unwrap();
            assert_eq!(response.status, 302);
            page.wait_for_url(&UrlPattern::glob("https://idp.test/login"))
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_wait_for_response_wrong_status() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            page.navigate("/start").await.unwrap();

            let err = page
                .wait_for_response_status(
                    &UrlPattern::glob("**/redirect?client_id**"),
                    &button(),
                    200,
                )
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ProbeError::UnexpectedStatus {
                    expected: 200,
                    actual: 302,
                    ..
                }
            ));
        }

        #[tokio::test]
        async fn test_wait_for_response_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);

            let err = page
                .wait_for_response(&UrlPattern::glob("**/never"), || async { Ok(()) })
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { .. }));
        }

        #[tokio::test]
        async fn test_route_fulfill() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            page.route_request(UrlPattern::glob("**/start"), continue_route())
                .await
                .unwrap();
            page.route_request(
                UrlPattern::glob("**/start"),
                Arc::new(|_| RouteAction::Fulfill(MockResponse::new().with_status(500))),
            )
            .await
            .unwrap();

            let response = page
                .wait_for_response(&UrlPattern::glob("**/start"), || page.navigate("/start"))
                .await
                .unwrap();
            assert_eq!(response.status, 500);
        }
    }

    mod assertion_tests {
        use super::*;

        #[tokio::test]
        async fn test_assert_url_waits() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            page.navigate("/start").await.unwrap();

            page.assert_url(&UrlPattern::path("/start")).await.unwrap();
            let err = page
                .assert_url(&UrlPattern::glob("**/elsewhere"))
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::AssertionFailed { .. }));
            assert!(err.to_string().contains("https://app.test/start"));
        }

        #[tokio::test]
        async fn test_assert_visible_waits_for_late_element() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let late = Locator::text("Loaded");
            let driver = MockDriver::new().with_endpoint(
                MockEndpoint::new(UrlPattern::Any).with_element(
                    MockElement::new(late.clone()).visible_after(Duration::from_millis(40)),
                ),
            );
            let page = BasePage::new(&driver, &settings);
            page.navigate("https://app.test/").await.unwrap();
            page.assert_visible(&late).await.unwrap();
        }

        #[tokio::test]
        async fn test_assert_visible_rides_out_navigation_errors() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver().with_failing_queries(2);
            let page = BasePage::new(&driver, &settings);
            page.navigate("/start").await.unwrap();

            page.assert_visible(&button()).await.unwrap();
            page.click(&button()).await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://idp.test/login");
        }

        #[tokio::test]
        async fn test_assert_hidden_and_count() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            page.navigate("/start").await.unwrap();

            page.assert_hidden(&Locator::new("p.hidden")).await.unwrap();
            page.assert_hidden(&Locator::new("p.absent")).await.unwrap();
            page.assert_count(&Locator::new("li"), 2).await.unwrap();
            page.assert_has_text(&Locator::new("li").first(), "a")
                .await
                .unwrap();
            assert!(page.assert_count(&Locator::new("li"), 3).await.is_err());
        }

        #[tokio::test]
        async fn test_is_checked() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let checkbox = Locator::new("input[type=\"checkbox\"]");
            let driver = MockDriver::new().with_endpoint(
                MockEndpoint::new(UrlPattern::Any)
                    .with_element(MockElement::new(checkbox.clone()).checkbox(true)),
            );
            let page = BasePage::new(&driver, &settings);
            page.navigate("https://app.test/").await.unwrap();
            assert!(page.is_checked(&checkbox).await.unwrap());
        }
    }

    mod error_capture_tests {
        use super::*;

        fn screenshots(dir: &Path) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }

        #[tokio::test]
        async fn test_guard_captures_once() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);

            let err = page
                .guard("Outer.step", async {
                    page.guard("Inner.step", async {
                        Err::<(), _>(ProbeError::assertion("header not visible"))
                    })
                    .await
                })
                .await
                .unwrap_err();

            match &err {
                ProbeError::StepFailed { context, screenshot, .. } => {
                    assert_eq!(context, "Inner.step");
                    assert!(screenshot.as_ref().unwrap().exists());
                }
                other => panic!("unexpected error {other:?}"),
            }
            let names = screenshots(dir.path());
            assert_eq!(names.len(), 1);
            assert!(names[0].starts_with("error-Inner.step-"));
            assert!(names[0].ends_with(".png"));
            assert_eq!(err.kind(), crate::result::FailureKind::Assertion);
        }

        #[tokio::test]
        async fn test_screenshot_failure_keeps_original_error() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = MockDriver::new().with_failing_screenshots();
            let page = BasePage::new(&driver, &settings);

            let err = page
                .handle_error(ProbeError::timeout("x", 10), "AuthPage.navigate")
                .await;
            assert!(err.screenshot().is_none());
            assert!(matches!(err.root_cause(), ProbeError::Timeout { .. }));
            assert!(screenshots(dir.path()).is_empty());
        }

        #[tokio::test]
        async fn test_guard_passes_success_through() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let driver = driver();
            let page = BasePage::new(&driver, &settings);
            let value = page.guard("Ok.step", async { Ok(7) }).await.unwrap();
            assert_eq!(value, 7);
            assert!(!driver.was_called("screenshot"));
        }
    }
}
