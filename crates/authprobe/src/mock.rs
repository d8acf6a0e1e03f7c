//! Scripted in-memory page model.
//!
//! [`MockDriver`] stands in for a browser tab. Endpoints describe what the
//! server answers for a URL (status, redirect, and the elements rendered on
//! the resulting screen); elements carry optional reactions that run when
//! they are clicked or filled. Navigation follows redirects, consults
//! installed routes and publishes every response to subscribers, so response
//! waits and URL assertions behave as they do against a real page.
//!
//! Locators are matched structurally: an element registered under
//! `Locator::role(AriaRole::Button).name("Next")` is found by exactly that
//! locator (plus any `nth()`), not by CSS evaluation.

use crate::driver::{ClickOptions, ElementSnapshot, ElementState, PageDriver, Screenshot};
use crate::locator::Locator;
use crate::network::{
    InterceptedRequest, MockResponse, ResponseRecord, ResponseStream, RouteAction, RouteHandler,
    UrlPattern,
};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::LoadState;
use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};
use futures::StreamExt;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Redirect hops followed before a navigation is declared a loop
const MAX_REDIRECTS: usize = 10;

/// Callback run against the page after an element is clicked or filled
pub type Reaction = Arc<dyn Fn(&mut MockPage) -> ProbeResult<()> + Send + Sync>;

/// An element rendered on a mock screen
#[derive(Clone)]
pub struct MockElement {
    locator: Locator,
    state: ElementState,
    reveal_after: Option<Duration>,
    toggles: bool,
    on_click: Option<Reaction>,
    on_fill: Option<Reaction>,
}

impl fmt::Debug for MockElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockElement")
            .field("locator", &self.locator.describe())
            .field("state", &self.state)
            .field("reveal_after", &self.reveal_after)
            .field("toggles", &self.toggles)
            .finish_non_exhaustive()
    }
}

impl MockElement {
    /// Visible element found by `locator`
    #[must_use]
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            state: ElementState {
                visible: true,
                ..ElementState::default()
            },
            reveal_after: None,
            toggles: false,
            on_click: None,
            on_fill: None,
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.state.text = text.into();
        self
    }

    /// Set input value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.state.value = value.into();
        self
    }

    /// Render hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.state.visible = false;
        self
    }

    /// Become visible only `delay` after the screen loaded
    #[must_use]
    pub const fn visible_after(mut self, delay: Duration) -> Self {
        self.reveal_after = Some(delay);
        self
    }

    /// Checkbox that toggles on click
    #[must_use]
    pub const fn checkbox(mut self, checked: bool) -> Self {
        self.state.checked = checked;
        self.toggles = true;
        self
    }

    /// Run `reaction` after a click
    #[must_use]
    pub fn on_click<F>(mut self, reaction: F) -> Self
    where
        F: Fn(&mut MockPage) -> ProbeResult<()> + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(reaction));
        self
    }

    /// Run `reaction` after the value was replaced
    #[must_use]
    pub fn on_fill<F>(mut self, reaction: F) -> Self
    where
        F: Fn(&mut MockPage) -> ProbeResult<()> + Send + Sync + 'static,
    {
        self.on_fill = Some(Arc::new(reaction));
        self
    }

    /// Locator this element answers to
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }
}

/// What the mock server answers for URLs matching a pattern
#[derive(Debug, Clone)]
pub struct MockEndpoint {
    pattern: UrlPattern,
    response: MockResponse,
    elements: Vec<MockElement>,
}

impl MockEndpoint {
    /// Endpoint answering 200 with an empty screen
    #[must_use]
    pub fn new(pattern: UrlPattern) -> Self {
        Self {
            pattern,
            response: MockResponse::new(),
            elements: Vec::new(),
        }
    }

    /// Answer with `status`
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.response = self.response.with_status(status);
        self
    }

    /// Answer with a 302 to `location`
    #[must_use]
    pub fn redirect(mut self, location: &str) -> Self {
        self.response = MockResponse::redirect(location);
        self
    }

    /// Render an element on the resulting screen
    #[must_use]
    pub fn with_element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }
}

/// Mutable page state; reactions receive it directly
#[derive(Default)]
pub struct MockPage {
    url: String,
    loaded_at: Option<Instant>,
    load_state_ready: bool,
    elements: Vec<MockElement>,
    endpoints: Vec<MockEndpoint>,
    routes: Vec<(UrlPattern, RouteHandler)>,
    subscribers: Vec<UnboundedSender<ResponseRecord>>,
    requests: Vec<String>,
    history: Vec<String>,
    fail_screenshots: bool,
    failing_queries: usize,
}

impl fmt::Debug for MockPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPage")
            .field("url", &self.url)
            .field("elements", &self.elements)
            .field("endpoints", &self.endpoints.len())
            .field("routes", &self.routes.len())
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl MockPage {
    /// Current URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Navigate to `url`, following redirects and publishing each response
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` if a route aborts the request or the
    /// redirect chain does not terminate
    pub fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        let mut next = url.to_string();
        for _ in 0..=MAX_REDIRECTS {
            let response = self.fetch(&next)?;
            self.publish(ResponseRecord::new(next.clone(), response.status));
            let location = response
                .headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("location"))
                .map(|(_, v)| v.clone());
            match location {
                Some(location) if (300..400).contains(&response.status) => next = location,
                _ => {
                    self.load_screen(next);
                    return Ok(());
                }
            }
        }
        Err(ProbeError::NavigationError {
            url: url.to_string(),
            message: format!("more than {MAX_REDIRECTS} redirects"),
        })
    }

    /// Add an element to the current screen
    pub fn add_element(&mut self, element: MockElement) {
        self.elements.push(element);
    }

    /// Remove every element found by `locator`
    pub fn remove_elements(&mut self, locator: &Locator) {
        self.elements.retain(|el| el.locator.selector() != locator.selector());
    }

    /// Show or hide every element found by `locator`
    pub fn set_visible(&mut self, locator: &Locator, visible: bool) {
        for el in self
            .elements
            .iter_mut()
            .filter(|el| el.locator.selector() == locator.selector())
        {
            el.state.visible = visible;
            el.reveal_after = None;
        }
    }

    /// Value of the first element found by `locator`
    #[must_use]
    pub fn value_of(&self, locator: &Locator) -> Option<&str> {
        self.matching(locator)
            .first()
            .map(|&i| self.elements[i].state.value.as_str())
    }

    /// Whether the first element found by `locator` is checked
    #[must_use]
    pub fn is_checked(&self, locator: &Locator) -> bool {
        self.matching(locator)
            .first()
            .is_some_and(|&i| self.elements[i].state.checked)
    }

    fn fetch(&mut self, url: &str) -> ProbeResult<MockResponse> {
        self.requests.push(url.to_string());
        let request = InterceptedRequest::new(url, "GET");
        let routed = self
            .routes
            .iter()
            .rev()
            .find(|(pattern, _)| pattern.matches(url))
            .map(|(_, handler)| handler(&request));
        match routed {
            Some(RouteAction::Abort(reason)) => Err(ProbeError::NavigationError {
                url: url.to_string(),
                message: reason.message().to_string(),
            }),
            Some(RouteAction::Fulfill(response)) => Ok(response),
            Some(RouteAction::Continue) | None => Ok(self.endpoint_for(url).map_or_else(
                || MockResponse::new().with_status(404),
                |endpoint| endpoint.response.clone(),
            )),
        }
    }

    fn endpoint_for(&self, url: &str) -> Option<&MockEndpoint> {
        self.endpoints.iter().find(|e| e.pattern.matches(url))
    }

    fn load_screen(&mut self, url: String) {
        self.elements = self
            .endpoint_for(&url)
            .map(|e| e.elements.clone())
            .unwrap_or_default();
        self.url = url;
        self.loaded_at = Some(Instant::now());
        self.load_state_ready = true;
    }

    fn publish(&mut self, record: ResponseRecord) {
        self.subscribers
            .retain(|tx| tx.unbounded_send(record.clone()).is_ok());
    }

    fn matching(&self, locator: &Locator) -> Vec<usize> {
        let all = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.locator.selector() == locator.selector())
            .map(|(i, _)| i);
        match locator.index() {
            Some(n) => all.skip(n).take(1).collect(),
            None => all.collect(),
        }
    }

    fn is_visible(&self, el: &MockElement) -> bool {
        if !el.state.visible {
            return false;
        }
        match (el.reveal_after, self.loaded_at) {
            (Some(delay), Some(loaded)) => loaded.elapsed() >= delay,
            _ => true,
        }
    }

    fn snapshot(&self, locator: &Locator) -> ElementSnapshot {
        let matches = self.matching(locator);
        let any_visible = matches.iter().any(|&i| self.is_visible(&self.elements[i]));
        let element = matches.first().map(|&i| {
            let el = &self.elements[i];
            ElementState {
                visible: self.is_visible(el),
                ..el.state.clone()
            }
        });
        ElementSnapshot {
            count: matches.len(),
            any_visible,
            element,
        }
    }

    fn first_index(&self, locator: &Locator) -> ProbeResult<usize> {
        self.matching(locator)
            .first()
            .copied()
            .ok_or_else(|| ProbeError::driver(format!("no element matches {locator}")))
    }
}

/// Mock driver for tests
#[derive(Debug, Default)]
pub struct MockDriver {
    page: Mutex<MockPage>,
}

impl MockDriver {
    /// Create new mock driver on `about:blank`
    #[must_use]
    pub fn new() -> Self {
        let page = MockPage {
            url: "about:blank".to_string(),
            ..MockPage::default()
        };
        Self {
            page: Mutex::new(page),
        }
    }

    /// Register an endpoint; earlier registrations win on overlap
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: MockEndpoint) -> Self {
        self.page_mut().endpoints.push(endpoint);
        self
    }

    /// Make every screenshot attempt fail
    #[must_use]
    pub fn with_failing_screenshots(mut self) -> Self {
        self.page_mut().fail_screenshots = true;
        self
    }

    /// Fail the next `count` queries the way CDP evaluation fails mid-navigation
    #[must_use]
    pub fn with_failing_queries(mut self, count: usize) -> Self {
        self.page_mut().failing_queries = count;
        self
    }

    /// Run `f` against the page state
    pub fn with_page<R>(&self, f: impl FnOnce(&mut MockPage) -> R) -> R {
        f(&mut *self.lock())
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(method))
    }

    /// Every URL requested so far, redirect hops included
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockPage> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn page_mut(&mut self) -> &mut MockPage {
        self.page.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn goto(&self, url: &str) -> ProbeResult<()> {
        let mut page = self.lock();
        page.history.push(format!("goto:{url}"));
        page.load_state_ready = false;
        page.navigate(url)
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn wait_for_load_state(&self, state: LoadState) -> ProbeResult<()> {
        let mut page = self.lock();
        page.history.push(format!("wait_for_load_state:{state}"));
        if page.load_state_ready {
            Ok(())
        } else {
            Err(ProbeError::driver(format!("page never reached {state}")))
        }
    }

    async fn query(&self, locator: &Locator) -> ProbeResult<ElementSnapshot> {
        let mut page = self.lock();
        if page.failing_queries > 0 {
            page.failing_queries -= 1;
            return Err(ProbeError::driver(
                "Execution context was destroyed, most likely because of a navigation",
            ));
        }
        Ok(page.snapshot(locator))
    }

    async fn click(&self, locator: &Locator, options: ClickOptions) -> ProbeResult<()> {
        let mut page = self.lock();
        page.history.push(if options.force {
            format!("click!:{locator}")
        } else {
            format!("click:{locator}")
        });
        let index = page.first_index(locator)?;
        let el = &mut page.elements[index];
        if el.toggles {
            el.state.checked = !el.state.checked;
        }
        let reaction = el.on_click.clone();
        if let Some(reaction) = reaction {
            reaction(&mut *page)?;
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let mut page = self.lock();
        page.history.push(format!("fill:{locator}={text}"));
        let index = page.first_index(locator)?;
        let el = &mut page.elements[index];
        el.state.value = text.to_string();
        let reaction = el.on_fill.clone();
        if let Some(reaction) = reaction {
            reaction(&mut *page)?;
        }
        Ok(())
    }

    async fn subscribe_responses(&self) -> ProbeResult<ResponseStream> {
        let (tx, rx) = mpsc::unbounded();
        self.lock().subscribers.push(tx);
        Ok(rx.boxed())
    }

    async fn route(&self, pattern: UrlPattern, handler: RouteHandler) -> ProbeResult<()> {
        pattern.validate()?;
        let mut page = self.lock();
        page.history.push(format!("route:{pattern}"));
        page.routes.push((pattern, handler));
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Screenshot> {
        let mut page = self.lock();
        page.history.push("screenshot".to_string());
        if page.fail_screenshots {
            return Err(ProbeError::ScreenshotError {
                message: "target closed".to_string(),
            });
        }
        let mut data = Screenshot::PNG_MAGIC.to_vec();
        data.extend_from_slice(page.url.as_bytes());
        Ok(Screenshot::new(data))
    }

    async fn close(&self) -> ProbeResult<()> {
        let mut page = self.lock();
        page.history.push("close".to_string());
        page.subscribers.clear();
        Ok(())
    }
}
