//! GitHub sign-in page reached from "Continue with GitHub".

use crate::base_page::BasePage;
use crate::driver::PageDriver;
use crate::locator::{AriaRole, Locator};
use crate::network::UrlPattern;
use crate::page_object::PageObject;
use crate::result::ProbeResult;
use crate::settings::Settings;

/// GitHub's login form as shown to the OAuth app
#[derive(Debug)]
pub struct GitHubLoginPage<'a> {
    base: BasePage<'a>,
    login_form: Locator,
    home_link: Locator,
    logo: Locator,
    login_header: Locator,
    email_input: Locator,
    password_input: Locator,
    sign_in_button: Locator,
    forgot_password_link: Locator,
    passkey_button: Locator,
    create_account_link: Locator,
    login_error: Locator,
}

impl<'a> PageObject<'a> for GitHubLoginPage<'a> {
    fn page_name(&self) -> &'static str {
        "GitHubLoginPage"
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::regex(r"https://github\.com/login")
    }

    fn base(&self) -> &BasePage<'a> {
        &self.base
    }
}

impl<'a> GitHubLoginPage<'a> {
    /// Bind to a page handle
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, settings: &'a Settings) -> Self {
        Self {
            base: BasePage::new(driver, settings),
            login_form: Locator::new("#login"),
            home_link: Locator::role(AriaRole::Link).name("Homepage"),
            logo: Locator::role(AriaRole::Img).name("Insomnia logo"),
            login_header: Locator::text("Sign in to GitHub to continue"),
            email_input: Locator::role(AriaRole::Textbox).name("Username or email address"),
            password_input: Locator::role(AriaRole::Textbox).name("Password"),
            // exact, or "Sign in with a passkey" matches too
            sign_in_button: Locator::role(AriaRole::Button).name("Sign in").exact(),
            forgot_password_link: Locator::role(AriaRole::Link).name("Forgot password?"),
            passkey_button: Locator::role(AriaRole::Button).name("Sign in with a passkey"),
            create_account_link: Locator::role(AriaRole::Link).name("Create an account"),
            login_error: Locator::text("Incorrect username or password."),
        }
    }

    /// URL and every landmark of the login screen
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on the first missing landmark
    pub async fn assert_on_page(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_on_page"), async {
                self.base.assert_url(&self.url_pattern()).await?;
                for landmark in [
                    &self.home_link,
                    &self.logo,
                    &self.login_header,
                    &self.email_input,
                    &self.password_input,
                    &self.sign_in_button,
                    &self.forgot_password_link,
                    &self.passkey_button,
                    &self.create_account_link,
                ] {
                    self.base.assert_visible(landmark).await?;
                }
                Ok(())
            })
            .await
    }

    /// Fill both credentials and submit
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if a field or the button cannot be used
    pub async fn login_with_github(&self, email: &str, password: &str) -> ProbeResult<()> {
        self.base
            .guard(&self.step("login_with_github"), async {
                self.base.fill(&self.email_input, email).await?;
                self.base.fill(&self.password_input, password).await?;
                self.base.click(&self.sign_in_button).await
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if the field cannot be filled
    pub async fn fill_email(&self, email: &str) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("fill_email"),
                self.base.fill(&self.email_input, email),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if the field cannot be filled
    pub async fn fill_password(&self, password: &str) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("fill_password"),
                self.base.fill(&self.password_input, password),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if the button cannot be clicked
    pub async fn click_sign_in(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("click_sign_in"),
                self.base.click(&self.sign_in_button),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if the link cannot be clicked
    pub async fn click_forgot_password(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("click_forgot_password"),
                self.base.click(&self.forgot_password_link),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if the link cannot be clicked
    pub async fn click_create_account(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("click_create_account"),
                self.base.click(&self.create_account_link),
            )
            .await
    }

    /// Form, both inputs and the submit button
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on the first missing element
    pub async fn assert_login_form_visible(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_login_form_visible"), async {
                self.base.assert_visible(&self.login_form).await?;
                self.base.assert_visible(&self.email_input).await?;
                self.base.assert_visible(&self.password_input).await?;
                self.base.assert_visible(&self.sign_in_button).await
            })
            .await
    }

    /// GitHub's flash after rejected credentials
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if the flash never appears
    pub async fn assert_login_error_visible(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("assert_login_error_visible"),
                self.base.assert_visible(&self.login_error),
            )
            .await
    }
}
