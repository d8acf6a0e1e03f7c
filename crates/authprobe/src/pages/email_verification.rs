//! "Check your email" screen of the one-time code flow.

use crate::base_page::BasePage;
use crate::code::{VerificationCode, CODE_LENGTH};
use crate::driver::PageDriver;
use crate::locator::{AriaRole, Locator};
use crate::network::UrlPattern;
use crate::page_object::PageObject;
use crate::result::{ProbeError, ProbeResult};
use crate::settings::Settings;
use crate::wait::LoadState;

/// Path of the code screen
pub const EMAIL_VERIFICATION_PATH: &str = "/app/authorize/email";

/// Input box for digit `index` (1-based)
#[must_use]
pub fn code_box(index: usize) -> Locator {
    Locator::new(format!("input:nth-child({index})"))
}

/// Code inputs flagged after a rejected code
#[must_use]
pub fn error_boxes() -> Locator {
    Locator::new("input.border-error")
}

/// Email one-time code entry
#[derive(Debug)]
pub struct EmailVerificationPage<'a> {
    base: BasePage<'a>,
    check_email: Locator,
    sent_to: Locator,
    manual_entry: Locator,
    wrong_code: Locator,
    go_back_link: Locator,
}

impl<'a> PageObject<'a> for EmailVerificationPage<'a> {
    fn page_name(&self) -> &'static str {
        "EmailVerificationPage"
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::path(EMAIL_VERIFICATION_PATH)
    }

    fn base(&self) -> &BasePage<'a> {
        &self.base
    }
}

impl<'a> EmailVerificationPage<'a> {
    /// Bind to a page handle
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, settings: &'a Settings) -> Self {
        Self {
            base: BasePage::new(driver, settings),
            check_email: Locator::text("Check your email"),
            sent_to: Locator::text("We've sent a verification email to"),
            manual_entry: Locator::text("Enter code manually or click on the link in the email."),
            wrong_code: Locator::text("Wrong email or verification code."),
            go_back_link: Locator::role(AriaRole::Link).name("Go Back"),
        }
    }

    /// The sentence-final address line, e.g. `someone@example.com.`
    #[must_use]
    pub fn email_display(email: &str) -> Locator {
        Locator::text(format!("{email}."))
    }

    /// URL, copy and the address the code went to
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on the first missing landmark
    pub async fn assert_on_page(&self, email: &str) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_on_page"), async {
                self.base.assert_url(&self.url_pattern()).await?;
                for landmark in [
                    &self.check_email,
                    &self.sent_to,
                    &Self::email_display(email),
                    &self.manual_entry,
                    &self.go_back_link,
                ] {
                    self.base.assert_visible(landmark).await?;
                }
                Ok(())
            })
            .await
    }

    /// Type one digit per box, left to right
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if a box cannot be filled
    pub async fn enter_verification_code(&self, code: &VerificationCode) -> ProbeResult<()> {
        self.base
            .guard(&self.step("enter_verification_code"), async {
                for (index, digit) in code.positions() {
                    self.base
                        .fill(&code_box(index), &digit.to_string())
                        .await?;
                }
                Ok(())
            })
            .await
    }

    /// Fill box `index` (1..=6) with `digit`
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` wrapping `InvalidCode` for an out-of-range index
    /// or non-digit, or the fill failure
    pub async fn fill_verification_digit(&self, index: usize, digit: char) -> ProbeResult<()> {
        let context = format!("{}-{index}", self.step("fill_verification_digit"));
        self.base
            .guard(&context, async {
                if !(1..=CODE_LENGTH).contains(&index) {
                    return Err(ProbeError::InvalidCode {
                        message: format!("box {index} is outside 1..={CODE_LENGTH}"),
                    });
                }
                if !digit.is_ascii_digit() {
                    return Err(ProbeError::InvalidCode {
                        message: format!("{digit:?} is not a digit"),
                    });
                }
                self.base
                    .fill(&code_box(index), &digit.to_string())
                    .await
            })
            .await
    }

    /// Empty all six boxes
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if a box cannot be filled
    pub async fn clear_verification_code(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("clear_verification_code"), async {
                for index in 1..=CODE_LENGTH {
                    self.base.fill(&code_box(index), "").await?;
                }
                Ok(())
            })
            .await
    }

    /// Every box holds its digit of `code`
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on the first mismatching box
    pub async fn assert_verification_code(&self, code: &VerificationCode) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_verification_code"), async {
                for (index, digit) in code.positions() {
                    self.base
                        .assert_has_value(&code_box(index), &digit.to_string())
                        .await?;
                }
                Ok(())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if any box still holds a value
    pub async fn assert_verification_code_empty(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_verification_code_empty"), async {
                for index in 1..=CODE_LENGTH {
                    self.base.assert_has_value(&code_box(index), "").await?;
                }
                Ok(())
            })
            .await
    }

    /// "Wrong email or verification code."
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if the message never appears
    pub async fn assert_wrong_code_error_visible(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("assert_wrong_code_error_visible"),
                self.base.assert_visible(&self.wrong_code),
            )
            .await
    }

    /// Exactly `expected` boxes carry the error class
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` if the count settles elsewhere
    pub async fn assert_input_boxes_have_error_state(&self, expected: usize) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("assert_input_boxes_have_error_state"),
                self.base.assert_count(&error_boxes(), expected),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `StepFailed` if the link cannot be clicked
    pub async fn click_go_back(&self) -> ProbeResult<()> {
        self.base
            .guard(
                &self.step("click_go_back"),
                self.base.click(&self.go_back_link),
            )
            .await
    }

    /// Network idle, then "Check your email"
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on timeout or missing copy
    pub async fn wait_for_page_load(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("wait_for_page_load"), async {
                self.base.wait_for_page_load(LoadState::NetworkIdle).await?;
                self.base.assert_visible(&self.check_email).await
            })
            .await
    }

    /// All six code boxes are visible
    ///
    /// # Errors
    ///
    /// Returns `StepFailed` on the first missing box
    pub async fn assert_verification_form_visible(&self) -> ProbeResult<()> {
        self.base
            .guard(&self.step("assert_verification_form_visible"), async {
                for index in 1..=CODE_LENGTH {
                    self.base.assert_visible(&code_box(index)).await?;
                }
                Ok(())
            })
            .await
    }
}
