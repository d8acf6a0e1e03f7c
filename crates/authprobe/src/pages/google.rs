//! Google account chooser and sign-up screens.

use crate::base_page::BasePage;
use crate::driver::PageDriver;
use crate::locator::{AriaRole, Locator};
use crate::network::UrlPattern;
use crate::page_object::PageObject;
use crate::result::ProbeResult;
use crate::settings::Settings;
use crate::wait::LoadState;
use tracing::info;

/// Request fired by "Create account"
pub const SIGNUP_RESPONSE: &str = "**/flows/signup?**";

/// Google sign-in as shown to the OAuth app
#[derive(Debug)]
pub struct GoogleLoginPage<'a> {
    base: BasePage<'a>,
    logo: Locator,
    email_input: Locator,
    forgot_email_button: Locator,
    create_account_button: Locator,
    next_button: Locator,
    first_name_input: Locator,
    last_name_input: Locator,
    register_header: Locator,
    birthday_gender_header: Locator,
    unknown_account: Locator,
}

impl<'a> PageObject<'a> for GoogleLoginPage<'a> {
    fn page_name(&self) -> &'static str {
        "GoogleLoginPage"
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::regex(r"^https://accounts\.google\.com/")
    }

    fn base(&self) -> &BasePage<'a> {
        &self.base
    }
}

impl<'a> GoogleLoginPage<'a> {
    /// Bind to a page handle
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, settings: &'a Settings) -> Self {
        let button = |name: &str| Locator::role(AriaRole::Button).name(name);
        let textbox = |name: &str| Locator::role(AriaRole::Textbox).name(name);
        Self {
            base: BasePage::new(driver, settings),
            logo: Locator::role(AriaRole::Img).name("Insomnia"),
            email_input: textbox("Email or phone"),
            forgot_email_button: button("Forgot email?"),
            create_account_button: button("Create account"),
            next_button: button("Next"),
            first_name_input: textbox("First name"),
            last_name_input: textbox("Last name"),
            register_header: Locator::text("Create a Google Account").exact(),
            birthday_gender_header: Locator::text("Enter your birthday and gender").exact(),
            unknown_account: Locator::text("Unable to find your Google Account").exact(),
        }
    }

    /// App logo plus the account chooser controls
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on the first missing landmark
    pub async fn assert_on_page(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_on_page"), async {
                for landmark in [
                    &self.logo,
                    &self.email_input,
                    &self.forgot_email_button,
                    &self.create_account_button,
                    &self.next_button,
                ] {
                    self.base.assert_visible(landmark).await?;
                }
                Ok(())
            })
            .await
    }

    /// Enter `email` and continue
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if the input or Next cannot be used
    pub async fn login_with_google(&self, email: &str) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("login_with_google"),
                self.submit_email(email),
            )
            .await
    }

    /// Enter an address for an account created earlier and continue
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if the input or Next cannot be used
    pub async fn login_with_google_account(&self, email: &str) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("login_with_google_account"),
                self.submit_email(email),
            )
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
    /// Returns `StepFailed` if the button cannot be clicked
    pub async fn click_next(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("click_next"), self.base.click(&self.next_button))
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if the button cannot be clicked
    pub async fn click_forgot_email(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("click_forgot_email"),
                self.base.click(&self.forgot_email_button),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if the button cannot be clicked
    pub async fn click_create_account(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("click_create_account"),
                self.base.click(&self.create_account_button),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if the email input or Next is missing
    pub async fn assert_login_form_visible(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_login_form_visible"), async {
                self.base.assert_visible(&self.email_input).await?;
                self.base.assert_visible(&self.next_button).await
            })
            .await
    }

    /// "Unable to find your Google Account"
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if the message never appears
    pub async fn assert_wrong_account_page(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("assert_wrong_account_page"),
                self.base.assert_visible(&self.unknown_account),
            )
            .await
    }

    /// Network idle, then the app logo
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on timeout or a missing logo
    pub async fn wait_for_page_load(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("wait_for_page_load"), async {
                self.base.wait_for_page_load(LoadState::NetworkIdle).await?;
                self.base.assert_visible(&self.logo).await
            })
            .await
    }

    /// Start sign-up and walk it to the birthday and gender step.
    ///
    /// Clicking "Create account" must answer the sign-up request with a 302.
    /// Later steps need phone verification and are not driven.
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on a wrong status or a missing form element
    pub async fn register_new_account(&self, first_name: &str, last_name: &str) -> ProbeResult<()> {
        self.base
            .guard(&self.step("register_new_account"), async {
                self.base
                    .wait_for_response_status(
                        &UrlPattern::glob(SIGNUP_RESPONSE),
                        &self.create_account_button,
                        302,
                    )
                    .await?;
                self.assert_register_page().await?;
                self.base.fill(&self.first_name_input, first_name).await?;
                self.base.fill(&self.last_name_input, last_name).await?;
                self.base.click(&self.next_button).await?;
                self.base.assert_visible(&self.birthday_gender_header).await?;
                info!("reached birthday and gender step");
                Ok(())
            })
            .await
    }

    /// Sign-up form header, name inputs and Next
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on the first missing element
    pub async fn assert_register_page(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_register_page"), async {
                for landmark in [
                    &self.register_header,
                    &self.first_name_input,
                    &self.last_name_input,
                    &self.next_button,
                ] {
                    self.base.assert_visible(landmark).await?;
                }
                Ok(())
            })
            .await
    }

    async fn submit_email(&self, email: &str) -> ProbeResult<()> {
        self.base.fill(&self.email_input, email).await?;
        self.base.click(&self.next_button).await
    }
}
