//! Suite execution for the `run` and `list` commands

use crate::commands::{ListArgs, RunArgs};
use crate::config::{resolve_settings, CliConfig};
use crate::error::{CliError, CliResult};
use crate::output::{render_list, ProgressReporter, Report};
use authprobe::{DriverFactory, Scenario, Selection, Settings, SuiteResults, SuiteRunner};
use tracing::info;

/// Drives a selection of scenarios and reports progress
#[derive(Debug)]
pub struct ScenarioRunner {
    reporter: ProgressReporter,
    fail_fast: bool,
}

impl ScenarioRunner {
    /// Create a runner using the CLI's color and verbosity settings
    #[must_use]
    pub fn new(config: &CliConfig, fail_fast: bool) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self {
            reporter,
            fail_fast,
        }
    }

    /// Run `scenarios` with drivers from `factory`, printing each outcome
    /// and the summary
    pub async fn run(
        &mut self,
        factory: &dyn DriverFactory,
        settings: &Settings,
        scenarios: &[&Scenario],
    ) -> SuiteResults {
        let mut runner = SuiteRunner::new();
        if self.fail_fast {
            runner = runner.with_fail_fast();
        }

        self.reporter.header(&format!(
            "Running {} scenarios against {}",
            scenarios.len(),
            settings.base_url
        ));
        self.reporter.start_progress(scenarios.len() as u64);
        let reporter = &self.reporter;
        let results = runner
            .run(
                factory,
                settings,
                scenarios,
                |scenario| reporter.scenario_started(scenario),
                |outcome| reporter.scenario_finished(outcome),
            )
            .await;
        reporter.finish();
        for name in &results.skipped {
            reporter.warning(&format!("{name} skipped (fail-fast)"));
        }
        reporter.summary(&results);
        results
    }

    /// Get the reporter (for testing)
    #[must_use]
    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }
}

/// Scenarios picked by `selection`; an empty pick is an error
pub fn select(selection: &Selection) -> CliResult<Vec<&'static Scenario>> {
    let scenarios = selection.select();
    if scenarios.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "no scenarios match{}{}",
            selection
                .tag
                .map(|t| format!(" tag {t}"))
                .unwrap_or_default(),
            selection
                .grep
                .as_deref()
                .map(|g| format!(" name containing {g:?}"))
                .unwrap_or_default(),
        )));
    }
    Ok(scenarios)
}

/// `authprobe list`
pub fn list(args: &ListArgs) -> CliResult<String> {
    let scenarios = select(&args.filter.selection())?;
    Ok(render_list(&scenarios))
}

/// `authprobe run`: resolves settings, launches Chromium, runs the selection
/// and writes the report. Returns whether every scenario passed.
pub async fn run(config: &CliConfig, args: &RunArgs) -> CliResult<bool> {
    let settings = resolve_settings(args)?;
    let scenarios = select(&args.filter.selection())?;
    let results = run_in_browser(config, args, &settings, &scenarios).await?;

    if let Some(path) = &args.report {
        Report::new(settings.base_url.clone(), results.clone()).write(path)?;
        info!(path = %path.display(), "report written");
    }
    Ok(results.all_passed())
}

#[cfg(feature = "browser")]
async fn run_in_browser(
    config: &CliConfig,
    args: &RunArgs,
    settings: &Settings,
    scenarios: &[&Scenario],
) -> CliResult<SuiteResults> {
    let browser = authprobe::ChromiumBrowser::launch(settings.driver_config()).await?;
    let results = ScenarioRunner::new(config, args.fail_fast)
        .run(&browser, settings, scenarios)
        .await;
    if let Err(err) = browser.close().await {
        tracing::warn!(error = %err, "could not close browser");
    }
    Ok(results)
}

#[cfg(not(feature = "browser"))]
async fn run_in_browser(
    _config: &CliConfig,
    _args: &RunArgs,
    _settings: &Settings,
    _scenarios: &[&Scenario],
) -> CliResult<SuiteResults> {
    Err(CliError::BrowserUnavailable)
}
