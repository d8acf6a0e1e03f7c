//! Okta sign-in for enterprise SSO.

use crate::base_page::BasePage;
use crate::driver::{ClickOptions, PageDriver};
use crate::locator::{AriaRole, Locator};
use crate::network::UrlPattern;
use crate::page_object::PageObject;
use crate::result::ProbeResult;
use crate::settings::Settings;
use tracing::debug;

/// Okta-hosted login for the company tenant
#[derive(Debug)]
pub struct SsoLoginPage<'a> {
    base: BasePage<'a>,
    logo: Locator,
    username_input: Locator,
    password_input: Locator,
    save_my_info: Locator,
    login_button: Locator,
    error_alert: Locator,
}

impl<'a> PageObject<'a> for SsoLoginPage<'a> {
    fn page_name(&self) -> &'static str {
        "SSOLoginPage"
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::regex(r"https://konghq\.okta\.com/login/login\.htm")
    }

    fn base(&self) -> &BasePage<'a> {
        &self.base
    }
}

impl<'a> SsoLoginPage<'a> {
    /// Bind to a page handle
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, settings: &'a Settings) -> Self {
        Self {
            base: BasePage::new(driver, settings),
            logo: Locator::role(AriaRole::Img).name("Kong logo logo"),
            username_input: Locator::new("#okta-signin-username"),
            password_input: Locator::new("#okta-signin-password"),
            save_my_info: Locator::new("input[type=\"checkbox\"]"),
            login_button: Locator::role(AriaRole::Button).name("Sign in").exact(),
            error_alert: Locator::new("div[role=\"alert\"].infobox-error"),
        }
    }

    /// Dashboard URL the app lands on after a successful SSO login
    #[must_use]
    pub fn dashboard_pattern() -> UrlPattern {
        UrlPattern::regex(r"https://app\.insomnia\.rest/app/dashboard")
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if the URL or a form element is wrong
    pub async fn assert_on_page(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_on_page"), async {
                self.base.assert_url(&self.url_pattern()).await?;
                for landmark in [
                    &self.logo,
                    &self.username_input,
                    &self.password_input,
                    &self.save_my_info,
                    &self.login_button,
                ] {
                    self.base.assert_visible(landmark).await?;
                }
                Ok(())
            })
            .await
    }

    /// Fill credentials, set "remember me" to `save_my_info`, submit.
    ///
    /// The checkbox is styled over, so it is toggled with a forced click and
    /// only when its state differs.
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if a control cannot be used
    pub async fn login_with_sso(&self, username: &str, password: &str, save_my_info: bool) -> ProbeResult<()> {
        self.base
            .guard(&self.step("login_with_sso"), async {
                self.base.fill(&self.username_input, username).await?;
                self.base.fill(&self.password_input, password).await?;
                let checked = self.base.is_checked(&self.save_my_info).await?;
                if checked != save_my_info {
                    debug!(checked, save_my_info, "toggle remember me");
                    self.base
                        .click_with(&self.save_my_info, ClickOptions::forced())
                        .await?;
                }
                self.base.click(&self.login_button).await
            })
            .await
    }

    /// Okta's error box reading "Unable to sign in"
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if the alert is missing or says something else
    pub async fn assert_error_alert_visible(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_error_alert_visible"), async {
                self.base.assert_visible(&self.error_alert).await?;
                self.base
                    .assert_has_text(&self.error_alert, "Unable to sign in")
                    .await
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` unless the app dashboard loads
    pub async fn assert_login_success(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("assert_login_success"),
                self.base.assert_url(&Self::dashboard_pattern()),
            )
            .await
    }
}
