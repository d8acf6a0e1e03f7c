//! Network observation and request interception.
//!
//! Response waits and request routing both key off a [`UrlPattern`]. Glob
//! patterns follow the browser-automation convention the login flows are
//! written against: `**` crosses path separators, `*` stays within one
//! segment, and every other character (including `?`) is literal, so
//! `**/authorize?client_id**` matches the OAuth redirect URL as written.

use crate::result::{ProbeError, ProbeResult};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Pattern for matching request URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(String),
    /// Glob pattern (e.g., "**/app/authorize")
    Glob(String),
    /// Path component match, ignoring scheme, host, query and fragment
    Path(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Glob pattern
    #[must_use]
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::Glob(pattern.into())
    }

    /// Regex pattern
    #[must_use]
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex(pattern.into())
    }

    /// Path pattern
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Exact URL
    #[must_use]
    pub fn exact(url: impl Into<String>) -> Self {
        Self::Exact(url.into())
    }

    /// Substring
    #[must_use]
    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    /// Check that regex and glob patterns compile
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if the pattern is not a valid regex
    pub fn validate(&self) -> ProbeResult<()> {
        let source = match self {
            Self::Regex(pattern) => pattern.clone(),
            Self::Glob(pattern) => glob_to_regex(pattern),
            _ => return Ok(()),
        };
        regex::Regex::new(&source)
            .map(|_| ())
            .map_err(|e| ProbeError::InvalidPattern {
                pattern: self.to_string(),
                message: e.to_string(),
            })
    }

    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Contains(pattern) => url.contains(pattern.as_str()),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
            Self::Glob(pattern) => regex::Regex::new(&glob_to_regex(pattern))
                .map(|re| re.is_match(url))
                .unwrap_or(false),
            Self::Path(path) => url_path(url) == path.as_str(),
            Self::Any => true,
        }
    }

    /// Pattern suitable for CDP `Fetch.enable`, which only understands `*`
    #[must_use]
    pub fn to_cdp_pattern(&self) -> String {
        match self {
            Self::Glob(pattern) => pattern.replace("**", "*"),
            Self::Exact(url) => url.clone(),
            Self::Contains(fragment) => format!("*{fragment}*"),
            Self::Path(path) => format!("*{path}*"),
            Self::Regex(_) | Self::Any => "*".to_string(),
        }
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(s) => write!(f, "{s}"),
            Self::Contains(s) => write!(f, "*{s}*"),
            Self::Regex(s) => write!(f, "/{s}/"),
            Self::Glob(s) => write!(f, "{s}"),
            Self::Path(s) => write!(f, "path:{s}"),
            Self::Any => write!(f, "*"),
        }
    }
}

/// Translate a URL glob into an anchored regex
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '*' {
            out.push_str(&regex::escape(&literal));
            literal.clear();
            if chars.peek() == Some(&'*') {
                let _ = chars.next();
                out.push_str(".*");
            } else {
                out.push_str("[^/]*");
            }
        } else {
            literal.push(c);
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}

/// Path component of a URL; relative inputs are treated as paths already
fn url_path(raw: &str) -> &str {
    let without_origin = raw
        .find("://")
        .map(|scheme_end| {
            let rest = &raw[scheme_end + 3..];
            rest.find('/').map_or("/", |slash| &rest[slash..])
        })
        .unwrap_or(raw);
    let end = without_origin
        .find(&['?', '#'][..])
        .unwrap_or(without_origin.len());
    &without_origin[..end]
}

/// A network response observed by the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Response URL
    pub url: String,
    /// HTTP status code
    pub status: u16,
}

impl ResponseRecord {
    /// Create a new response record
    #[must_use]
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
        }
    }

    /// Whether the status is a redirect
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        self.status >= 300 && self.status < 400
    }

    /// Require a specific status
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedStatus` when the status differs
    pub fn expect_status(&self, expected: u16) -> ProbeResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(ProbeError::UnexpectedStatus {
                url: self.url.clone(),
                expected,
                actual: self.status,
            })
        }
    }
}

/// Stream of responses delivered after subscription
pub type ResponseStream = BoxStream<'static, ResponseRecord>;

/// Reasons for aborting a network request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    /// Request failed
    Failed,
    /// Request was aborted
    Aborted,
    /// Request timed out
    TimedOut,
    /// Access was denied
    AccessDenied,
    /// Connection was refused
    ConnectionRefused,
    /// Request was blocked by client
    BlockedByClient,
}

impl AbortReason {
    /// Get the error message for this abort reason
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Failed => "net::ERR_FAILED",
            Self::Aborted => "net::ERR_ABORTED",
            Self::TimedOut => "net::ERR_TIMED_OUT",
            Self::AccessDenied => "net::ERR_ACCESS_DENIED",
            Self::ConnectionRefused => "net::ERR_CONNECTION_REFUSED",
            Self::BlockedByClient => "net::ERR_BLOCKED_BY_CLIENT",
        }
    }
}

/// A fulfilled (stubbed) HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }
}

impl MockResponse {
    /// Create a new mock response
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a redirect to `location`
    #[must_use]
    pub fn redirect(location: &str) -> Self {
        Self::default()
            .with_status(302)
            .with_header("Location", location)
    }

    /// Set status code
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Set body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Action to take when a route matches
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RouteAction {
    /// Let the request through unchanged
    #[default]
    Continue,
    /// Abort the request
    Abort(AbortReason),
    /// Respond without reaching the network
    Fulfill(MockResponse),
}

/// A request paused at an installed route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    /// Request URL
    pub url: String,
    /// HTTP method
    pub method: String,
}

impl InterceptedRequest {
    /// Create a new intercepted request
    #[must_use]
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
        }
    }
}

/// Handler deciding the fate of an intercepted request
pub type RouteHandler = Arc<dyn Fn(&InterceptedRequest) -> RouteAction + Send + Sync>;

/// Handler that lets every request through
#[must_use]
pub fn continue_route() -> RouteHandler {
    Arc::new(|_| RouteAction::Continue)
}
