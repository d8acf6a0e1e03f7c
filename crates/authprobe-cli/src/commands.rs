//! CLI command definitions using clap

use authprobe::{Selection, Tag};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Authprobe: end-to-end checks for OAuth, SSO and email-code login flows
#[derive(Parser, Debug)]
#[command(name = "authprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios against a live browser
    Run(RunArgs),

    /// List scenarios without running them
    List(ListArgs),
}

/// Scenario filters shared by `run` and `list`
#[derive(Parser, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only scenarios carrying this tag (smoke, regression; leading @ allowed)
    #[arg(short, long, value_parser = parse_tag)]
    pub tag: Option<Tag>,

    /// Only scenarios whose name contains this substring
    #[arg(short, long)]
    pub grep: Option<String>,
}

impl FilterArgs {
    /// Catalog selection described by the filters
    #[must_use]
    pub fn selection(&self) -> Selection {
        let mut selection = Selection::all();
        if let Some(tag) = self.tag {
            selection = selection.with_tag(tag);
        }
        if let Some(grep) = &self.grep {
            selection = selection.with_grep(grep.clone());
        }
        selection
    }
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Scenario filters
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Application origin (overrides config and environment)
    #[arg(long)]
    pub base_url: Option<String>,

    /// YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Stop at the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Directory for error screenshots
    #[arg(long)]
    pub screenshot_dir: Option<PathBuf>,

    /// Write a JSON report here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Chromium executable
    #[arg(long)]
    pub chromium: Option<PathBuf>,
}

/// Arguments for the list command
#[derive(Parser, Debug, Clone, Default)]
pub struct ListArgs {
    /// Scenario filters
    #[command(flatten)]
    pub filter: FilterArgs,
}

fn parse_tag(raw: &str) -> Result<Tag, String> {
    raw.parse::<Tag>().map_err(|e| e.to_string())
}

/// Color choice argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}
