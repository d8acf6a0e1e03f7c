//! Chromium over CDP.
//!
//! [`ChromiumBrowser`] owns the browser process and its CDP handler task.
//! Every [`ChromiumDriver`] it hands out lives in its own browser context,
//! so cookies and storage never leak between scenarios.

use crate::driver::{ClickOptions, DriverConfig, ElementSnapshot, PageDriver, Screenshot};
use crate::locator::Locator;
use crate::network::{
    AbortReason, InterceptedRequest, ResponseRecord, ResponseStream, RouteAction, RouteHandler,
    UrlPattern,
};
use crate::result::{ProbeError, ProbeResult};
use crate::scenario::DriverFactory;
use crate::wait::{LoadState, NETWORK_IDLE_THRESHOLD_MS};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
    FulfillRequestParams, HeaderEntry, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Attribute used to hand a JS-resolved element to `DOM.querySelector`
const TARGET_ATTR: &str = "data-authprobe-target";

/// Interval between `document.readyState` probes
const LOAD_POLL: Duration = Duration::from_millis(50);

fn driver_err(e: impl std::fmt::Display) -> ProbeError {
    ProbeError::driver(e.to_string())
}

/// A launched Chromium process
#[derive(Debug)]
pub struct ChromiumBrowser {
    config: DriverConfig,
    inner: Arc<Mutex<CdpBrowser>>,
    handle: JoinHandle<()>,
}

impl ChromiumBrowser {
    /// Launch Chromium with a throwaway profile directory
    ///
    /// # Errors
    ///
    /// Returns `BrowserLaunchError` if Chromium cannot be found or started
    pub async fn launch(config: DriverConfig) -> ProbeResult<Self> {
        let user_data_dir = std::env::temp_dir().join(format!("authprobe-{}", Uuid::new_v4()));
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .request_timeout(config.request_timeout)
            .user_data_dir(user_data_dir)
            .arg("--disable-dev-shm-usage");

        if !config.headless {
            builder = builder.with_head();
        }

        if config.no_sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| ProbeError::BrowserLaunchError { message: e })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| ProbeError::BrowserLaunchError {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!(error = %e, "browser handler error");
                }
            }
        });

        info!(headless = config.headless, "chromium launched");
        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Open a page in a fresh browser context
    ///
    /// # Errors
    ///
    /// Returns a driver error if the context or target cannot be created
    pub async fn new_driver(&self) -> ProbeResult<ChromiumDriver> {
        let mut browser = self.inner.lock().await;
        let context = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(driver_err)?;
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context.clone())
            .build()
            .map_err(ProbeError::driver)?;
        let page = browser.new_page(target).await.map_err(driver_err)?;
        drop(browser);

        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(self.config.viewport_width),
            i64::from(self.config.viewport_height),
            1.0,
            false,
        ))
        .await
        .map_err(driver_err)?;

        debug!(context = ?context, "new page");
        Ok(ChromiumDriver {
            page,
            browser: Arc::clone(&self.inner),
            context,
            routes: Arc::new(StdMutex::new(Vec::new())),
            interceptor: Mutex::new(None),
        })
    }

    /// Launch configuration
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Close the browser process
    ///
    /// # Errors
    ///
    /// Returns a driver error if Chromium does not shut down cleanly
    pub async fn close(self) -> ProbeResult<()> {
        let mut browser = self.inner.lock().await;
        browser.close().await.map_err(driver_err)?;
        self.handle.abort();
        Ok(())
    }
}

#[async_trait]
impl DriverFactory for ChromiumBrowser {
    async fn new_driver(&self) -> ProbeResult<Box<dyn PageDriver>> {
        Ok(Box::new(ChromiumBrowser::new_driver(self).await?))
    }
}

type Routes = Arc<StdMutex<Vec<(UrlPattern, RouteHandler)>>>;

/// One tab in its own browser context
pub struct ChromiumDriver {
    page: CdpPage,
    browser: Arc<Mutex<CdpBrowser>>,
    context: BrowserContextId,
    routes: Routes,
    interceptor: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ChromiumDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumDriver")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl ChromiumDriver {
    async fn evaluate<T: DeserializeOwned>(&self, script: &str) -> ProbeResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(driver_err)?
            .into_value()
            .map_err(driver_err)
    }

    async fn ensure_interceptor(&self) -> ProbeResult<()> {
        let mut interceptor = self.interceptor.lock().await;
        if interceptor.is_some() {
            return Ok(());
        }
        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(driver_err)?;
        let page = self.page.clone();
        let routes = Arc::clone(&self.routes);
        *interceptor = Some(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                if let Err(e) = resolve_paused(&page, &routes, &event).await {
                    warn!(url = %event.request.url, error = %e, "could not resolve intercepted request");
                }
            }
        }));
        Ok(())
    }
}

async fn resolve_paused(page: &CdpPage, routes: &Routes, event: &EventRequestPaused) -> ProbeResult<()> {
    let request = InterceptedRequest::new(event.request.url.clone(), event.request.method.clone());
    let action = {
        let routes = routes.lock().unwrap_or_else(PoisonError::into_inner);
        routes
            .iter()
            .rev()
            .find(|(pattern, _)| pattern.matches(&request.url))
            .map(|(_, handler)| handler(&request))
            .unwrap_or_default()
    };
    let id = event.request_id.clone();
    match action {
        RouteAction::Continue => {
            page.execute(ContinueRequestParams::new(id))
                .await
                .map_err(driver_err)?;
        }
        RouteAction::Abort(reason) => {
            debug!(url = %request.url, reason = reason.message(), "abort");
            page.execute(FailRequestParams::new(id, error_reason(reason)))
                .await
                .map_err(driver_err)?;
        }
        RouteAction::Fulfill(response) => {
            debug!(url = %request.url, status = response.status, "fulfill");
            let headers: Vec<HeaderEntry> = response
                .headers
                .iter()
                .map(|(name, value)| HeaderEntry::new(name.clone(), value.clone()))
                .collect();
            let params = FulfillRequestParams::builder()
                .request_id(id)
                .response_code(i64::from(response.status))
                .response_headers(headers)
                .body(base64::engine::general_purpose::STANDARD.encode(&response.body))
                .build()
                .map_err(ProbeError::driver)?;
            page.execute(params).await.map_err(driver_err)?;
        }
    }
    Ok(())
}

const fn error_reason(reason: AbortReason) -> ErrorReason {
    match reason {
        AbortReason::Failed => ErrorReason::Failed,
        AbortReason::Aborted => ErrorReason::Aborted,
        AbortReason::TimedOut => ErrorReason::TimedOut,
        AbortReason::AccessDenied => ErrorReason::AccessDenied,
        AbortReason::ConnectionRefused => ErrorReason::ConnectionRefused,
        AbortReason::BlockedByClient => ErrorReason::BlockedByClient,
    }
}

fn status_code(status: i64) -> u16 {
    u16::try_from(status).unwrap_or(0)
}

/// JS string literal for `s`
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn snapshot_script(locator: &Locator) -> String {
    format!(
        "(() => {{ const els = {query}; \
         const vis = el => {{ const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
         return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; }}; \
         const first = els[0]; \
         return {{ count: els.length, any_visible: els.some(vis), \
         element: first ? {{ visible: vis(first), text: first.textContent || '', \
         value: typeof first.value === 'string' ? first.value : '', checked: !!first.checked }} : null }}; }})()",
        query = locator.to_query_all(),
    )
}

fn mark_script(locator: &Locator, id: &str) -> String {
    format!(
        "(() => {{ const el = ({query})[0]; if (!el) return false; \
         el.setAttribute('{TARGET_ATTR}', {id}); el.scrollIntoView({{ block: 'center' }}); return true; }})()",
        query = locator.to_query_all(),
        id = js_string(id),
    )
}

fn force_click_script(locator: &Locator) -> String {
    format!(
        "(() => {{ const el = ({query})[0]; if (!el) return false; el.click(); return true; }})()",
        query = locator.to_query_all(),
    )
}

fn fill_script(locator: &Locator, text: &str) -> String {
    format!(
        "(() => {{ const el = ({query})[0]; if (!el) return false; el.focus(); \
         const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
         Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, {text}); \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
        query = locator.to_query_all(),
        text = js_string(text),
    )
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> ProbeResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ProbeError::NavigationError {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        self.evaluate("window.location.href").await
    }

    async fn wait_for_load_state(&self, state: LoadState) -> ProbeResult<()> {
        loop {
            let ready: String = self.evaluate("document.readyState").await?;
            if state.satisfied_by_ready_state(&ready) {
                break;
            }
            tokio::time::sleep(LOAD_POLL).await;
        }
        if state != LoadState::NetworkIdle {
            return Ok(());
        }

        let threshold = Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS);
        let count_script = "performance.getEntriesByType('resource').length";
        let mut last: u64 = self.evaluate(count_script).await?;
        let mut quiet_since = Instant::now();
        while quiet_since.elapsed() < threshold {
            tokio::time::sleep(LOAD_POLL).await;
            let now: u64 = self.evaluate(count_script).await?;
            if now != last {
                last = now;
                quiet_since = Instant::now();
            }
        }
        Ok(())
    }

    async fn query(&self, locator: &Locator) -> ProbeResult<ElementSnapshot> {
        self.evaluate(&snapshot_script(locator)).await
    }

    async fn click(&self, locator: &Locator, options: ClickOptions) -> ProbeResult<()> {
        if options.force {
            let clicked: bool = self.evaluate(&force_click_script(locator)).await?;
            return if clicked {
                Ok(())
            } else {
                Err(ProbeError::driver(format!("no element matches {locator}")))
            };
        }

        let id = Uuid::new_v4().to_string();
        let marked: bool = self.evaluate(&mark_script(locator, &id)).await?;
        if !marked {
            return Err(ProbeError::driver(format!("no element matches {locator}")));
        }
        let element = self
            .page
            .find_element(format!("[{TARGET_ATTR}=\"{id}\"]"))
            .await
            .map_err(driver_err)?;
        element.click().await.map_err(driver_err)?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let filled: bool = self.evaluate(&fill_script(locator, text)).await?;
        if filled {
            Ok(())
        } else {
            Err(ProbeError::driver(format!("no element matches {locator}")))
        }
    }

    async fn subscribe_responses(&self) -> ProbeResult<ResponseStream> {
        let responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(driver_err)?
            .map(|e| ResponseRecord::new(e.response.url.clone(), status_code(e.response.status)));
        // redirects never produce responseReceived; they ride on the next request
        let redirects = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(driver_err)?
            .filter_map(|e| {
                let record = e
                    .redirect_response
                    .as_ref()
                    .map(|r| ResponseRecord::new(r.url.clone(), status_code(r.status)));
                futures::future::ready(record)
            });
        Ok(futures::stream::select(responses, redirects).boxed())
    }

    async fn route(&self, pattern: UrlPattern, handler: RouteHandler) -> ProbeResult<()> {
        pattern.validate()?;
        let patterns: Vec<RequestPattern> = {
            let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            routes.push((pattern, handler));
            routes
                .iter()
                .map(|(p, _)| RequestPattern::builder().url_pattern(p.to_cdp_pattern()).build())
                .collect()
        };
        self.ensure_interceptor().await?;
        self.page
            .execute(EnableParams::builder().patterns(patterns).build())
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Screenshot> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self
            .page
            .execute(params)
            .await
            .map_err(|e| ProbeError::ScreenshotError {
                message: e.to_string(),
            })?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(|e| ProbeError::ScreenshotError {
                message: e.to_string(),
            })?;
        Ok(Screenshot::new(data))
    }

    async fn close(&self) -> ProbeResult<()> {
        if let Some(task) = self.interceptor.lock().await.take() {
            task.abort();
        }
        self.page.clone().close().await.map_err(driver_err)?;
        self.browser
            .lock()
            .await
            .dispose_browser_context(self.context.clone())
            .await
            .map_err(driver_err)?;
        debug!(context = ?self.context, "page closed");
        Ok(())
    }
}
