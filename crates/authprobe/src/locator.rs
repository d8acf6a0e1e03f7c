//! Locator abstraction for element selection.
//!
//! Locators are declarative and stateless: they are re-resolved against the
//! live page on every action or assertion, so a locator built before a
//! redirect is still valid afterwards.
//!
//! - **Strict Selection**: acting on a locator that matches more than one
//!   element fails with a strict-mode violation unless an index was chosen
//! - **Role + Name**: buttons and textboxes are found the way users see them,
//!   by role and accessible name
//! - **Fluent API**: `Locator::role(AriaRole::Button).name("Next").first()`

use crate::driver::ElementSnapshot;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Poll;
use serde::{Deserialize, Serialize};

/// ARIA roles the login screens are located by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    /// `<button>`, `input[type=submit]`, `[role=button]`
    Button,
    /// Text-like inputs and textareas
    Textbox,
    /// `<a href>`
    Link,
    /// `<h1>`..`<h6>`
    Heading,
    /// `input[type=checkbox]`
    Checkbox,
    /// `[role=alert]`
    Alert,
    /// `<img>` named by its `alt` text
    Img,
}

impl AriaRole {
    /// ARIA role name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Textbox => "textbox",
            Self::Link => "link",
            Self::Heading => "heading",
            Self::Checkbox => "checkbox",
            Self::Alert => "alert",
            Self::Img => "img",
        }
    }

    /// CSS selector for elements carrying this role implicitly or explicitly
    #[must_use]
    pub const fn css_candidates(&self) -> &'static str {
        match self {
            Self::Button => {
                "button, [role=button], input[type=submit], input[type=button], input[type=reset]"
            }
            Self::Textbox => {
                "input:not([type]), input[type=text], input[type=email], input[type=password], \
                 input[type=search], input[type=tel], input[type=url], textarea, [role=textbox]"
            }
            Self::Link => "a[href], [role=link]",
            Self::Heading => "h1, h2, h3, h4, h5, h6, [role=heading]",
            Self::Checkbox => "input[type=checkbox], [role=checkbox]",
            Self::Alert => "[role=alert]",
            Self::Img => "img, [role=img]",
        }
    }
}

impl std::fmt::Display for AriaRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., `input.border-error`)
    Css(String),
    /// Text content selector
    Text {
        /// Text to find
        text: String,
        /// Require the whole normalized text to match (case-sensitive)
        exact: bool,
    },
    /// Role and accessible name
    Role {
        /// ARIA role
        role: AriaRole,
        /// Accessible name filter
        name: Option<String>,
        /// Require the whole accessible name to match (case-sensitive)
        exact: bool,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a substring text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: false,
        }
    }

    /// Convert to a JavaScript expression evaluating to an array of all matches
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self {
            Self::Css(css) => format!("Array.from(document.querySelectorAll({css:?}))"),
            Self::Text { text, exact } => format!(
                "(() => {{ {NORMALIZE_JS} \
                 const want = {text:?}; \
                 const hit = el => {{ const t = norm(el.textContent); \
                 return {exact} ? t === norm(want) : t.toLowerCase().includes(norm(want).toLowerCase()); }}; \
                 return Array.from(document.body ? document.body.querySelectorAll('*') : []) \
                 .filter(el => !['SCRIPT','STYLE','NOSCRIPT'].includes(el.tagName)) \
                 .filter(el => hit(el) && !Array.from(el.children).some(hit)); }})()"
            ),
            Self::Role { role, name, exact } => {
                let filter = name.as_ref().map_or_else(String::new, |name| {
                    format!(
                        ".filter(el => {{ const n = accName(el); const want = norm({name:?}); \
                         return {exact} ? n === want : n.toLowerCase().includes(want.toLowerCase()); }})"
                    )
                });
                format!(
                    "(() => {{ {NORMALIZE_JS} {ACCESSIBLE_NAME_JS} \
                     return Array.from(document.querySelectorAll({css:?})){filter}; }})()",
                    css = role.css_candidates(),
                )
            }
        }
    }

    /// Human-readable description used in error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Css(css) => css.clone(),
            Self::Text { text, exact } => {
                if *exact {
                    format!("text={text:?}")
                } else {
                    format!("text={text}")
                }
            }
            Self::Role { role, name, exact } => match name {
                Some(name) if *exact => format!("role={role}[name={name:?}s]"),
                Some(name) => format!("role={role}[name={name:?}i]"),
                None => format!("role={role}"),
            },
        }
    }
}

/// Whitespace normalization shared by the text and role queries
const NORMALIZE_JS: &str = "const norm = s => (s || '').replace(/\\s+/g, ' ').trim();";

/// Accessible name approximation: aria-label, aria-labelledby, alt text,
/// associated labels, then text content. Only input buttons are named by
/// their value; other fields fall back to placeholder or title.
const ACCESSIBLE_NAME_JS: &str = "const accName = el => { \
     const aria = el.getAttribute('aria-label'); if (aria) return norm(aria); \
     const by = el.getAttribute('aria-labelledby'); \
     if (by) return norm(by.split(/\\s+/).map(id => { const l = document.getElementById(id); return l ? l.textContent : ''; }).join(' ')); \
     const alt = el.getAttribute('alt'); if (alt) return norm(alt); \
     if (el.labels && el.labels.length) return norm(Array.from(el.labels).map(l => l.textContent).join(' ')); \
     const text = norm(el.textContent); if (text) return text; \
     const btn = el.tagName === 'INPUT' && ['submit', 'button', 'reset'].includes(el.type); \
     return norm((btn ? el.value : '') || el.getAttribute('placeholder') || el.getAttribute('title') || ''); };";

/// A locator for finding elements.
///
/// Resolution is deferred to the driver; the locator itself only describes
/// what to look for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// The selector for finding elements
    selector: Selector,
    /// Explicit zero-based index among the matches
    index: Option<usize>,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            index: None,
        }
    }

    /// Locate by role (name filter added with [`Locator::name`])
    #[must_use]
    pub const fn role(role: AriaRole) -> Self {
        Self::from_selector(Selector::Role {
            role,
            name: None,
            exact: false,
        })
    }

    /// Locate by text content (case-insensitive substring)
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::text(text))
    }

    /// Filter a role locator by accessible name (case-insensitive substring)
    ///
    /// Has no effect on CSS selectors.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        if let Selector::Role { name: slot, .. } = &mut self.selector {
            *slot = Some(name.into());
        }
        self
    }

    /// Require the whole name or text to match, case-sensitively
    #[must_use]
    pub fn exact(mut self) -> Self {
        match &mut self.selector {
            Selector::Role { exact, .. } | Selector::Text { exact, .. } => *exact = true,
            Selector::Css(_) => {}
        }
        self
    }

    /// Use the first match
    #[must_use]
    pub const fn first(self) -> Self {
        self.nth(0)
    }

    /// Use the match at `index` (zero-based)
    #[must_use]
    pub const fn nth(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Explicit index, if any
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// Whether an index was chosen (strict mode does not apply)
    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// JavaScript expression evaluating to the array of elements this locator targets
    #[must_use]
    pub fn to_query_all(&self) -> String {
        let all = self.selector.to_query_all();
        match self.index() {
            Some(i) => format!("{all}.slice({i}, {end})", end = i + 1),
            None => all,
        }
    }

    /// Human-readable description used in error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self.index() {
            Some(i) => format!("{} >> nth={i}", self.selector.describe()),
            None => self.selector.describe(),
        }
    }

    /// Enforce strict mode on a resolved snapshot
    ///
    /// # Errors
    ///
    /// Returns `StrictModeViolation` when more than one element matched
    pub fn ensure_unique(&self, snapshot: &ElementSnapshot) -> ProbeResult<()> {
        if snapshot.count > 1 {
            return Err(ProbeError::StrictModeViolation {
                selector: self.describe(),
                count: snapshot.count,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Assertion kinds checked against a resolved [`ElementSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectAssertion {
    /// Exactly one visible element
    IsVisible,
    /// No visible element (zero matches also counts)
    IsHidden,
    /// Element text equals (whitespace-normalized)
    HasText(String),
    /// Input value equals
    HasValue(String),
    /// Number of matches
    HasCount(usize),
}

impl ExpectAssertion {
    /// Check the assertion once against a snapshot
    ///
    /// # Errors
    ///
    /// Returns `StrictModeViolation` when a single-element assertion resolved
    /// to several elements; that is never going to fix itself by waiting
    pub fn check(&self, locator: &Locator, snapshot: &ElementSnapshot) -> ProbeResult<Poll<()>> {
        if !matches!(self, Self::HasCount(_) | Self::IsHidden) {
            locator.ensure_unique(snapshot)?;
        }
        let observed = match self {
            Self::IsVisible => match &snapshot.element {
                Some(el) if el.visible => return Ok(Poll::Ready(())),
                Some(_) => "element is hidden".to_string(),
                None => "no matching element".to_string(),
            },
            Self::IsHidden => {
                if snapshot.count == 0 || !snapshot.any_visible {
                    return Ok(Poll::Ready(()));
                }
                format!("{} matching element(s) visible", snapshot.count)
            }
            Self::HasText(expected) => match &snapshot.element {
                Some(el) if normalize_whitespace(&el.text) == normalize_whitespace(expected) => {
                    return Ok(Poll::Ready(()))
                }
                Some(el) => format!("text was {:?}", el.text),
                None => "no matching element".to_string(),
            },
            Self::HasValue(expected) => match &snapshot.element {
                Some(el) if el.value == *expected => return Ok(Poll::Ready(())),
                Some(el) => format!("value was {:?}", el.value),
                None => "no matching element".to_string(),
            },
            Self::HasCount(expected) => {
                if snapshot.count == *expected {
                    return Ok(Poll::Ready(()));
                }
                format!("count was {}", snapshot.count)
            }
        };
        Ok(Poll::Pending(observed))
    }

    /// Describe the expectation for failure messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::IsVisible => "to be visible".to_string(),
            Self::IsHidden => "to be hidden".to_string(),
            Self::HasText(text) => format!("to have text {text:?}"),
            Self::HasValue(value) => format!("to have value {value:?}"),
            Self::HasCount(n) => format!("to have count {n}"),
        }
    }
}

/// Collapse runs of whitespace and trim
#[must_use]
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
