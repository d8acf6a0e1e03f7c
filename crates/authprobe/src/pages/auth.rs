//! Authorize page: provider selection.

use crate::base_page::BasePage;
use crate::driver::PageDriver;
use crate::locator::{AriaRole, Locator};
use crate::network::{continue_route, UrlPattern};
use crate::page_object::PageObject;
use crate::result::ProbeResult;
use crate::settings::Settings;
use tracing::info;

/// Path of the authorize page, relative to the base URL
pub const AUTHORIZE_PATH: &str = "/app/authorize";

/// Response the authorize page load is synchronized on
pub const AUTHORIZE_RESPONSE: &str = "**/app/authorize";

/// OAuth authorize request issued when a provider button is clicked
pub const OAUTH_AUTHORIZE_RESPONSE: &str = "**/authorize?client_id**";

/// The application's login entry point
#[derive(Debug)]
pub struct AuthPage<'a> {
    base: BasePage<'a>,
    github_button: Locator,
    google_button: Locator,
    email_button: Locator,
    sso_button: Locator,
    email_input: Locator,
    company_email_input: Locator,
    header: Locator,
}

impl<'a> PageObject<'a> for AuthPage<'a> {
    fn page_name(&self) -> &'static str {
        "AuthPage"
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::glob("**/app/authorize*")
    }

    fn base(&self) -> &BasePage<'a> {
        &self.base
    }
}

impl<'a> AuthPage<'a> {
    /// Bind to a page handle
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, settings: &'a Settings) -> Self {
        let button = |name: &str| Locator::role(AriaRole::Button).name(name);
        Self {
            base: BasePage::new(driver, settings),
            github_button: button("Continue with GitHub"),
            google_button: button("Continue with Google"),
            email_button: button("Continue with Email"),
            sso_button: button("Continue with Enterprise SSO"),
            email_input: Locator::role(AriaRole::Textbox).name("Email Email *"),
            company_email_input: Locator::role(AriaRole::Textbox)
                .name("Company Email Company Email *"),
            header: Locator::new("div[class=\"flex items-center\"]").first(),
        }
    }

    /// Load the authorize page; the page response must be 200 and the
    /// header must render
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` wrapping the status, timeout or assertion failure
    pub async fn navigate(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("navigate"), async {
                let pattern = UrlPattern::glob(AUTHORIZE_RESPONSE);
                self.base
                    .route_request(pattern.clone(), continue_route())
                    .await?;
                let response = self
                    .base
                    .wait_for_response(&pattern, || self.base.navigate(AUTHORIZE_PATH))
                    .await?;
                response.expect_status(200)?;
                self.base.assert_visible(&self.header).await?;
                info!(url = %response.url, "authorize page loaded");
                Ok(())
            })
            .await
    }

    /// Header, provider buttons and URL are all in place
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on the first missing landmark
    pub async fn assert_on_page(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_on_page"), async {
                self.base.assert_url(&self.url_pattern()).await?;
                self.base.assert_visible(&self.header).await?;
                for button in [
                    &self.github_button,
                    &self.google_button,
                    &self.email_button,
                    &self.sso_button,
                ] {
                    self.base.assert_visible(button).await?;
                }
                Ok(())
            })
            .await
    }

    /// Click "Continue with GitHub"; the OAuth authorize request must redirect
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` unless the authorize response is a 302
    pub async fn login_with_github(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("login_with_github"),
                self.continue_through_oauth(&self.github_button),
            )
            .await
    }

    /// Click "Continue with Google"; the OAuth authorize request must redirect
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` unless the authorize response is a 302
    pub async fn login_with_google(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("login_with_google"),
                self.continue_through_oauth(&self.google_button),
            )
            .await
    }

    /// Request a one-time code for `email`
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if the email input never shows up
    pub async fn login_with_email(&self, email: &str) -> ProbeResult<()> {
        self.base
            .guard(&self.step("login_with_email"), async {
                self.base.click(&self.email_button).await?;
                self.base.assert_visible(&self.email_input).await?;
                self.base.fill(&self.email_input, email).await?;
                self.base.click(&self.email_button).await
            })
            .await
    }

    /// Hand `company_email` to enterprise SSO; the IdP redirect must be a 302
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if the company email input never shows up or the
    /// redirect status is wrong
    pub async fn login_with_sso(&self, company_email: &str) -> ProbeResult<()> {
        self.base
            .guard(&self.step("login_with_sso"), async {
                self.base.click(&self.sso_button).await?;
                self.base.assert_visible(&self.company_email_input).await?;
                self.base
                    .fill(&self.company_email_input, company_email)
                    .await?;
                self.continue_through_oauth(&self.sso_button).await
            })
            .await
    }

    async fn continue_through_oauth(&self, button: &Locator) -> ProbeResult<()> {
        let pattern = UrlPattern::glob(OAUTH_AUTHORIZE_RESPONSE);
        self.base
            .route_request(pattern.clone(), continue_route())
            .await?;
        let response = self
            .base
            .wait_for_response_status(&pattern, button, 302)
            .await?;
        info!(url = %response.url, "left for identity provider");
        Ok(())
    }
}
