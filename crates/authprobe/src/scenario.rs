//! Scenario catalog and suite runner.
//!
//! A scenario is one end-to-end journey over a fresh page handle. The catalog
//! is static; the runner asks a [`DriverFactory`] for a new driver per
//! scenario and closes it afterwards, so no state leaks between journeys.

use crate::base_page::BasePage;
use crate::code::{VerificationCode, CODE_LENGTH};
use crate::driver::PageDriver;
use crate::network::UrlPattern;
use crate::pages::{AuthPage, EmailVerificationPage, GitHubLoginPage, GoogleLoginPage, SsoLoginPage};
use crate::result::{FailureKind, ProbeError, ProbeResult};
use crate::settings::Settings;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

/// Scenario tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// Happy-path redirects and landmarks
    Smoke,
    /// Rejection paths and form details
    Regression,
}

impl Tag {
    /// Tag name without the `@`
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Smoke => "smoke",
            Self::Regression => "regression",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl FromStr for Tag {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('@').to_ascii_lowercase().as_str() {
            "smoke" => Ok(Self::Smoke),
            "regression" => Ok(Self::Regression),
            other => Err(ProbeError::config(format!(
                "unknown tag {other:?} (expected smoke or regression)"
            ))),
        }
    }
}

/// What a scenario runs against
#[derive(Clone, Copy)]
pub struct ScenarioContext<'a> {
    /// Page handle
    pub driver: &'a dyn PageDriver,
    /// Suite settings
    pub settings: &'a Settings,
}

impl std::fmt::Debug for ScenarioContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("base_url", &self.settings.base_url)
            .finish_non_exhaustive()
    }
}

impl<'a> ScenarioContext<'a> {
    /// Bind a driver and settings
    #[must_use]
    pub const fn new(driver: &'a dyn PageDriver, settings: &'a Settings) -> Self {
        Self { driver, settings }
    }

    /// Base page over the same handle
    #[must_use]
    pub const fn base(&self) -> BasePage<'a> {
        BasePage::new(self.driver, self.settings)
    }

    /// Authorize page
    #[must_use]
    pub fn auth(&self) -> AuthPage<'a> {
        AuthPage::new(self.driver, self.settings)
    }

    /// GitHub sign-in page
    #[must_use]
    pub fn github(&self) -> GitHubLoginPage<'a> {
        GitHubLoginPage::new(self.driver, self.settings)
    }

    /// Google sign-in and signup pages
    #[must_use]
    pub fn google(&self) -> GoogleLoginPage<'a> {
        GoogleLoginPage::new(self.driver, self.settings)
    }

    /// Okta SSO page
    #[must_use]
    pub fn sso(&self) -> SsoLoginPage<'a> {
        SsoLoginPage::new(self.driver, self.settings)
    }

    /// Email code entry page
    #[must_use]
    pub fn email_verification(&self) -> EmailVerificationPage<'a> {
        EmailVerificationPage::new(self.driver, self.settings)
    }
}

/// Scenario body
pub type ScenarioFn = for<'a> fn(ScenarioContext<'a>) -> BoxFuture<'a, ProbeResult<()>>;

/// A named, tagged journey
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Unique name
    pub name: &'static str,
    /// Tags used for selection
    pub tags: &'static [Tag],
    /// One-line summary
    pub description: &'static str,
    /// Body
    pub run: ScenarioFn,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Check if the scenario carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Tags rendered as `@smoke @regression`
    #[must_use]
    pub fn tag_list(&self) -> String {
        self.tags
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Filter over the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Required tag
    pub tag: Option<Tag>,
    /// Required name substring
    pub grep: Option<String>,
}

impl Selection {
    /// Select everything
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Require a tag
    #[must_use]
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Require a name substring
    #[must_use]
    pub fn with_grep(mut self, grep: impl Into<String>) -> Self {
        self.grep = Some(grep.into());
        self
    }

    /// Check a scenario against both filters
    #[must_use]
    pub fn matches(&self, scenario: &Scenario) -> bool {
        self.tag.map_or(true, |tag| scenario.has_tag(tag))
            && self
                .grep
                .as_deref()
                .map_or(true, |grep| scenario.name.contains(grep))
    }

    /// Catalog entries passing the filters, in catalog order
    #[must_use]
    pub fn select(&self) -> Vec<&'static Scenario> {
        catalog().iter().filter(|s| self.matches(s)).collect()
    }
}

/// Every scenario, in run order
#[must_use]
pub fn catalog() -> &'static [Scenario] {
    &CATALOG
}

/// Look up a scenario by exact name
#[must_use]
pub fn find(name: &str) -> Option<&'static Scenario> {
    catalog().iter().find(|s| s.name == name)
}

const SMOKE: &[Tag] = &[Tag::Smoke];
const REGRESSION: &[Tag] = &[Tag::Regression];

static CATALOG: [Scenario; 13] = [
    Scenario {
        name: "root_redirects_to_authorize",
        tags: SMOKE,
        description: "The site root lands on the authorize page",
        run: root_redirects_to_authorize,
    },
    Scenario {
        name: "authorize_page_loads",
        tags: SMOKE,
        description: "Authorize page answers 200 and shows every provider",
        run: authorize_page_loads,
    },
    Scenario {
        name: "github_redirects_to_login",
        tags: SMOKE,
        description: "Continue with GitHub reaches the GitHub login form",
        run: github_redirects_to_login,
    },
    Scenario {
        name: "github_rejects_wrong_password",
        tags: REGRESSION,
        description: "GitHub refuses a wrong password",
        run: github_rejects_wrong_password,
    },
    Scenario {
        name: "google_redirects_to_sign_in",
        tags: SMOKE,
        description: "Continue with Google reaches the Google account chooser",
        run: google_redirects_to_sign_in,
    },
    Scenario {
        name: "google_unknown_account",
        tags: REGRESSION,
        description: "Google reports an unknown address",
        run: google_unknown_account,
    },
    Scenario {
        name: "google_register_form",
        tags: REGRESSION,
        description: "Google sign-up reaches the birthday and gender step",
        run: google_register_form,
    },
    Scenario {
        name: "sso_redirects_to_okta",
        tags: SMOKE,
        description: "Enterprise SSO hands a company address to Okta",
        run: sso_redirects_to_okta,
    },
    Scenario {
        name: "sso_rejects_wrong_password",
        tags: REGRESSION,
        description: "Okta refuses a wrong password",
        run: sso_rejects_wrong_password,
    },
    Scenario {
        name: "email_code_screen",
        tags: SMOKE,
        description: "Continue with Email shows the six-box code screen",
        run: email_code_screen,
    },
    Scenario {
        name: "email_wrong_code",
        tags: REGRESSION,
        description: "A wrong code flags every box",
        run: email_wrong_code,
    },
    Scenario {
        name: "email_code_entry_and_clear",
        tags: REGRESSION,
        description: "Codes land one digit per box and clear completely",
        run: email_code_entry_and_clear,
    },
    Scenario {
        name: "email_go_back",
        tags: REGRESSION,
        description: "Go Back returns to the authorize page",
        run: email_go_back,
    },
];

fn root_redirects_to_authorize(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let base = cx.base();
        base.guard("root_redirects_to_authorize", async {
            base.navigate("/").await?;
            base.assert_url(&UrlPattern::contains("app/authorize")).await
        })
        .await
    }
    .boxed()
}

fn authorize_page_loads(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let auth = cx.auth();
        auth.navigate().await?;
        auth.assert_on_page().await
    }
    .boxed()
}

fn github_redirects_to_login(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        open_github(cx).await?;
        cx.github().assert_login_form_visible().await
    }
    .boxed()
}

fn github_rejects_wrong_password(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let data = &cx.settings.test_data;
        let github = open_github(cx).await?;
        github
            .login_with_github(&data.github_email, &data.github_wrong_password)
            .await?;
        github.assert_login_error_visible().await
    }
    .boxed()
}

fn google_redirects_to_sign_in(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let google = open_google(cx).await?;
        google.assert_login_form_visible().await
    }
    .boxed()
}

fn google_unknown_account(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let google = open_google(cx).await?;
        google
            .login_with_google(&cx.settings.test_data.google_unknown_email)
            .await?;
        google.assert_wrong_account_page().await
    }
    .boxed()
}

fn google_register_form(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let data = &cx.settings.test_data;
        let google = open_google(cx).await?;
        google
            .register_new_account(&data.first_name, &data.last_name)
            .await
    }
    .boxed()
}

fn sso_redirects_to_okta(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move { open_okta(cx).await.map(|_| ()) }.boxed()
}

fn sso_rejects_wrong_password(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let data = &cx.settings.test_data;
        let sso = open_okta(cx).await?;
        sso.login_with_sso(&data.sso_username, &data.sso_wrong_password, false)
            .await?;
        sso.assert_error_alert_visible().await
    }
    .boxed()
}

fn email_code_screen(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let verification = open_code_screen(cx).await?;
        verification.assert_verification_form_visible().await
    }
    .boxed()
}

fn email_wrong_code(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let verification = open_code_screen(cx).await?;
        verification
            .enter_verification_code(&cx.settings.test_data.wrong_code)
            .await?;
        verification.assert_wrong_code_error_visible().await?;
        verification
            .assert_input_boxes_have_error_state(CODE_LENGTH)
            .await
    }
    .boxed()
}

fn email_code_entry_and_clear(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let code: &VerificationCode = &cx.settings.test_data.wrong_code;
        let verification = open_code_screen(cx).await?;
        verification.enter_verification_code(code).await?;
        verification.assert_verification_code(code).await?;
        verification.clear_verification_code().await?;
        verification.assert_verification_code_empty().await
    }
    .boxed()
}

fn email_go_back(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
    async move {
        let verification = open_code_screen(cx).await?;
        verification.click_go_back().await?;
        cx.auth().assert_on_page().await
    }
    .boxed()
}

async fn open_github(cx: ScenarioContext<'_>) -> ProbeResult<GitHubLoginPage<'_>> {
    let auth = cx.auth();
    auth.navigate().await?;
    auth.login_with_github().await?;
    let github = cx.github();
    github.assert_on_page().await?;
    Ok(github)
}

async fn open_google(cx: ScenarioContext<'_>) -> ProbeResult<GoogleLoginPage<'_>> {
    let auth = cx.auth();
    auth.navigate().await?;
    auth.login_with_google().await?;
    let google = cx.google();
    google.wait_for_page_load().await?;
    google.assert_on_page().await?;
    Ok(google)
}

async fn open_okta(cx: ScenarioContext<'_>) -> ProbeResult<SsoLoginPage<'_>> {
    let auth = cx.auth();
    auth.navigate().await?;
    auth.login_with_sso(&cx.settings.test_data.company_email)
        .await?;
    let sso = cx.sso();
    sso.assert_on_page().await?;
    Ok(sso)
}

async fn open_code_screen(cx: ScenarioContext<'_>) -> ProbeResult<EmailVerificationPage<'_>> {
    let email = &cx.settings.test_data.email;
    let auth = cx.auth();
    auth.navigate().await?;
    auth.login_with_email(email).await?;
    let verification = cx.email_verification();
    verification.wait_for_page_load().await?;
    verification.assert_on_page(email).await?;
    Ok(verification)
}

/// Hands out a fresh page handle per scenario
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Open a new isolated page
    async fn new_driver(&self) -> ProbeResult<Box<dyn PageDriver>>;
}

#[async_trait]
impl<F> DriverFactory for F
where
    F: Fn() -> ProbeResult<Box<dyn PageDriver>> + Send + Sync,
{
    async fn new_driver(&self) -> ProbeResult<Box<dyn PageDriver>> {
        self()
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Scenario name
    pub name: String,
    /// Scenario tags
    pub tags: Vec<Tag>,
    /// Whether the scenario passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Failure class if failed
    pub kind: Option<FailureKind>,
    /// Step that failed, when a page object caught it
    pub step: Option<String>,
    /// Error screenshot, if one was written
    pub screenshot: Option<PathBuf>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl ScenarioOutcome {
    /// Create a passing outcome
    #[must_use]
    pub fn pass(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.to_string(),
            tags: scenario.tags.to_vec(),
            passed: true,
            error: None,
            kind: None,
            step: None,
            screenshot: None,
            duration_ms: 0,
        }
    }

    /// Create a failing outcome from the error that ended the scenario
    #[must_use]
    pub fn fail(scenario: &Scenario, err: &ProbeError) -> Self {
        let step = match err {
            ProbeError::StepFailed { context, .. } => Some(context.clone()),
            _ => None,
        };
        Self {
            passed: false,
            error: Some(err.root_cause().to_string()),
            kind: Some(err.kind()),
            step,
            screenshot: err.screenshot().map(PathBuf::from),
            ..Self::pass(scenario)
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Results from running a selection of scenarios
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Individual outcomes, in run order
    pub results: Vec<ScenarioOutcome>,
    /// Scenarios skipped after a fail-fast stop
    pub skipped: Vec<String>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl SuiteResults {
    /// Check if all scenarios passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed) && self.skipped.is_empty()
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Get total scenario count, skipped included
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len() + self.skipped.len()
    }

    /// Get failed outcomes
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioOutcome> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Run one scenario against an open page handle
pub async fn run_scenario(scenario: &Scenario, cx: ScenarioContext<'_>) -> ScenarioOutcome {
    let span = info_span!("scenario", name = scenario.name);
    async {
        info!(tags = %scenario.tag_list(), "start");
        let start = Instant::now();
        let outcome = match (scenario.run)(cx).await {
            Ok(()) => ScenarioOutcome::pass(scenario),
            Err(err) => ScenarioOutcome::fail(scenario, &err),
        };
        let outcome = outcome.with_duration_ms(elapsed_ms(start));
        info!(passed = outcome.passed, duration_ms = outcome.duration_ms, "finish");
        outcome
    }
    .instrument(span)
    .await
}

/// Sequential suite runner
#[derive(Debug, Default)]
pub struct SuiteRunner {
    /// Whether to stop on first failure
    pub fail_fast: bool,
}

impl SuiteRunner {
    /// Create a new runner
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable fail-fast mode
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Run `scenarios` in order, each on a fresh driver from `factory`.
    ///
    /// `on_start` and `on_outcome` let callers report progress.
    pub async fn run(
        &self,
        factory: &dyn DriverFactory,
        settings: &Settings,
        scenarios: &[&Scenario],
        mut on_start: impl FnMut(&Scenario),
        mut on_outcome: impl FnMut(&ScenarioOutcome),
    ) -> SuiteResults {
        let start = Instant::now();
        let mut suite = SuiteResults::default();

        for (i, scenario) in scenarios.iter().enumerate() {
            on_start(scenario);
            let outcome = match factory.new_driver().await {
                Ok(driver) => {
                    let outcome = run_scenario(scenario, ScenarioContext::new(driver.as_ref(), settings)).await;
                    if let Err(err) = driver.close().await {
                        warn!(scenario = scenario.name, error = %err, "could not close page");
                    }
                    outcome
                }
                Err(err) => ScenarioOutcome::fail(scenario, &err),
            };
            on_outcome(&outcome);
            let failed = !outcome.passed;
            suite.results.push(outcome);

            if failed && self.fail_fast {
                suite.skipped = scenarios[i + 1..]
                    .iter()
                    .map(|s| s.name.to_string())
                    .collect();
                break;
            }
        }

        suite.duration_ms = elapsed_ms(start);
        suite
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod tag_tests {
        use super::*;

        #[test]
        fn test_parse_with_and_without_at() {
            assert_eq!("smoke".parse::<Tag>().unwrap(), Tag::Smoke);
            assert_eq!("@Regression".parse::<Tag>().unwrap(), Tag::Regression);
            assert!("@nightly".parse::<Tag>().is_err());
        }

        #[test]
        fn test_display() {
            assert_eq!(Tag::Smoke.to_string(), "@smoke");
        }
    }

    mod catalog_tests {
        use super::*;
        use std::collections::HashSet;

        #[test]
        fn test_names_unique() {
            let names: HashSet<_> = catalog().iter().map(|s| s.name).collect();
            assert_eq!(names.len(), catalog().len());
        }

        #[test]
        fn test_every_scenario_tagged() {
            assert!(catalog().iter().all(|s| !s.tags.is_empty()));
        }

        #[test]
        fn test_select_by_tag() {
            let smoke = Selection::all().with_tag(Tag::Smoke).select();
            assert_eq!(smoke.len(), 6);
            assert!(smoke.iter().all(|s| s.has_tag(Tag::Smoke)));
        }

        #[test]
        fn test_select_by_grep_and_tag() {
            let picked = Selection::all()
                .with_tag(Tag::Regression)
                .with_grep("email")
                .select();
            let names: Vec<_> = picked.iter().map(|s| s.name).collect();
            assert_eq!(
                names,
                ["email_wrong_code", "email_code_entry_and_clear", "email_go_back"]
            );
        }

        #[test]
        fn test_find() {
            assert!(find("email_go_back").is_some());
            assert!(find("email").is_none());
        }
    }

    mod runner_tests {
        use super::*;
        use crate::mock::MockDriver;
        use crate::settings::Timeouts;

        fn passes(_cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
            async { Ok(()) }.boxed()
        }

        fn fails(cx: ScenarioContext<'_>) -> BoxFuture<'_, ProbeResult<()>> {
            async move {
                cx.base()
                    .guard("Probe.step", async {
                        Err::<(), _>(ProbeError::assertion("nope"))
                    })
                    .await
            }
            .boxed()
        }

        const PASSING: Scenario = Scenario {
            name: "passing",
            tags: SMOKE,
            description: "",
            run: passes,
        };

        const FAILING: Scenario = Scenario {
            name: "failing",
            tags: REGRESSION,
            description: "",
            run: fails,
        };

        fn mock_factory() -> ProbeResult<Box<dyn PageDriver>> {
            Ok(Box::new(MockDriver::new()))
        }

        fn settings(dir: &std::path::Path) -> Settings {
            Settings::new()
                .with_timeouts(Timeouts::uniform(100, 5))
                .with_screenshot_dir(dir)
        }

        #[tokio::test]
        async fn test_outcomes_recorded() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let mut started = Vec::new();
            let suite = SuiteRunner::new()
                .run(
                    &mock_factory,
                    &settings,
                    &[&FAILING, &PASSING],
                    |s| started.push(s.name),
                    |_| {},
                )
                .await;

            assert_eq!(started, ["failing", "passing"]);
            assert_eq!(suite.passed_count(), 1);
            assert_eq!(suite.failed_count(), 1);
            assert!(!suite.all_passed());

            let failure = suite.failures()[0];
            assert_eq!(failure.step.as_deref(), Some("Probe.step"));
            assert_eq!(failure.kind, Some(FailureKind::Assertion));
            assert_eq!(failure.error.as_deref(), Some("Assertion failed: nope"));
            assert!(failure.screenshot.as_ref().unwrap().exists());
        }

        #[tokio::test]
        async fn test_fail_fast_skips_rest() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let suite = SuiteRunner::new()
                .with_fail_fast()
                .run(&mock_factory, &settings, &[&FAILING, &PASSING], |_| {}, |_| {})
                .await;
            assert_eq!(suite.results.len(), 1);
            assert_eq!(suite.skipped, ["passing"]);
            assert_eq!(suite.total(), 2);
        }

        #[tokio::test]
        async fn test_factory_failure_is_infrastructure() {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings(dir.path());
            let broken = || -> ProbeResult<Box<dyn PageDriver>> {
                Err(ProbeError::BrowserLaunchError {
                    message: "no chromium".to_string(),
                })
            };
            let suite = SuiteRunner::new()
                .run(&broken, &settings, &[&PASSING], |_| {}, |_| {})
                .await;
            assert_eq!(suite.results[0].kind, Some(FailureKind::Infrastructure));
        }

        #[test]
        fn test_outcome_serializes() {
            let outcome = ScenarioOutcome::pass(&PASSING).with_duration_ms(12);
            let json = serde_json::to_value(&outcome).unwrap();
            assert_eq!(json["tags"][0], "smoke");
            assert_eq!(json["duration_ms"], 12);
        }
    }
}
