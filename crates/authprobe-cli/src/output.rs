//! Output formatting, progress reporting and the JSON report

use crate::error::{CliError, CliResult};
use authprobe::{Scenario, ScenarioOutcome, SuiteResults};
use chrono::{DateTime, Utc};
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Progress reporter for a suite run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message("starting");
        self.progress_bar = Some(pb);
    }

    /// A scenario is about to run
    pub fn scenario_started(&self, scenario: &Scenario) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(scenario.name);
        }
    }

    /// A scenario finished
    pub fn scenario_finished(&self, outcome: &ScenarioOutcome) {
        if outcome.passed {
            self.success(&format!("{} ({}ms)", outcome.name, outcome.duration_ms));
        } else {
            self.failure(&failure_line(outcome));
        }
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line(&styled);
    }

    /// Print the suite summary
    pub fn summary(&self, results: &SuiteResults) {
        let failed = results.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&summary_line(results, self.use_color));
    }

    /// Write above the progress bar when one is active
    fn line(&self, text: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.println(text),
            None => {
                let _ = self.term.write_line(text);
            }
        }
    }
}

/// `name: error [at step] (screenshot: path)`
#[must_use]
pub fn failure_line(outcome: &ScenarioOutcome) -> String {
    let mut line = format!(
        "{}: {}",
        outcome.name,
        outcome.error.as_deref().unwrap_or("unknown error")
    );
    if let Some(kind) = outcome.kind {
        line.push_str(&format!(" [{kind}]"));
    }
    if let Some(step) = &outcome.step {
        line.push_str(&format!(" at {step}"));
    }
    if let Some(shot) = &outcome.screenshot {
        line.push_str(&format!(" (screenshot: {})", shot.display()));
    }
    line
}

/// `PASSED 13 scenarios in 41.20s (13 passed, 0 failed, 0 skipped)`
#[must_use]
pub fn summary_line(results: &SuiteResults, use_color: bool) -> String {
    let (passed, failed, skipped) = (
        results.passed_count(),
        results.failed_count(),
        results.skipped.len(),
    );
    let total = results.total();
    let secs = Duration::from_millis(results.duration_ms).as_secs_f64();

    if use_color {
        let passed_style = Style::new().green().bold();
        let failed_style = Style::new().red().bold();
        let skipped_style = Style::new().yellow();
        let status = if results.all_passed() {
            passed_style.apply_to("PASSED")
        } else {
            failed_style.apply_to("FAILED")
        };
        format!(
            "{status} {total} scenarios in {secs:.2}s ({} passed, {} failed, {} skipped)",
            passed_style.apply_to(passed),
            if failed > 0 {
                failed_style.apply_to(failed).to_string()
            } else {
                failed.to_string()
            },
            skipped_style.apply_to(skipped)
        )
    } else {
        let status = if results.all_passed() { "PASSED" } else { "FAILED" };
        format!(
            "{status} {total} scenarios in {secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
        )
    }
}

/// One line per scenario: name, tags, description
#[must_use]
pub fn render_list(scenarios: &[&Scenario]) -> String {
    let width = scenarios.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let tags_width = scenarios
        .iter()
        .map(|s| s.tag_list().len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for scenario in scenarios {
        out.push_str(&format!(
            "{:<width$}  {:<tags_width$}  {}\n",
            scenario.name,
            scenario.tag_list(),
            scenario.description,
        ));
    }
    out
}

/// JSON report written by `run --report`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// When the run finished
    pub generated_at: DateTime<Utc>,
    /// Application origin the suite ran against
    pub base_url: String,
    /// Per-scenario outcomes and skips
    #[serde(flatten)]
    pub suite: SuiteResults,
}

impl Report {
    /// Report for `suite` run against `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>, suite: SuiteResults) -> Self {
        Self {
            generated_at: Utc::now(),
            base_url: base_url.into(),
            suite,
        }
    }

    /// Write pretty JSON to `path`, creating parent directories
    pub fn write(&self, path: &Path) -> CliResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::report_generation(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}
