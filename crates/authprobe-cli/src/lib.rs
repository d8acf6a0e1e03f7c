//! Authprobe CLI library
//!
//! Command-line interface over the authprobe scenario catalog.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
pub mod runner;

pub use commands::{Cli, ColorArg, Commands, FilterArgs, ListArgs, LogFormatArg, RunArgs};
pub use config::{resolve_settings, CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{failure_line, render_list, summary_line, ProgressReporter, Report};
pub use runner::ScenarioRunner;
