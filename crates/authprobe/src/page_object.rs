//! Page Object Model support.
//!
//! Every flow page object composes a [`BasePage`] and implements
//! [`PageObject`], which names the page for step contexts and tells where
//! the page lives.
//!
//! # Example
//!
//! ```ignore
//! struct LoginPage<'a> {
//!     base: BasePage<'a>,
//!     submit: Locator,
//! }
//!
//! impl<'a> PageObject<'a> for LoginPage<'a> {
//!     fn page_name(&self) -> &'static str {
//!         "LoginPage"
//!     }
//!
//!     fn url_pattern(&self) -> UrlPattern {
//!         UrlPattern::glob("**/login")
//!     }
//!
//!     fn base(&self) -> &BasePage<'a> {
//!         &self.base
//!     }
//! }
//!
//! impl LoginPage<'_> {
//!     pub async fn submit(&self) -> ProbeResult<()> {
//!         self.base.guard(&self.step("submit"), self.base.click(&self.submit)).await
//!     }
//! }
//! ```

use crate::base_page::BasePage;
use crate::network::UrlPattern;

/// A page or screen of the login flow
pub trait PageObject<'a> {
    /// Page name used in step contexts, logs and screenshot names
    fn page_name(&self) -> &'static str;

    /// Pattern the page's URL matches
    fn url_pattern(&self) -> UrlPattern;

    /// Shared primitives bound to the page handle
    fn base(&self) -> &BasePage<'a>;

    /// Step context, e.g. `GitHubLoginPage.assert_on_page`
    fn step(&self, name: &str) -> String {
        format!("{}.{name}", self.page_name())
    }
}
