//! Authprobe CLI: run login-flow scenarios against a live browser
//!
//! ## Usage
//!
//! ```bash
//! authprobe list --tag smoke             # Show the smoke scenarios
//! authprobe run --tag smoke              # Run them headless
//! authprobe run --grep email --headed    # Watch the email-code scenarios
//! authprobe run --report out/run.json    # Full catalog with a JSON report
//! ```

use authprobe_cli::{logging, runner, Cli, CliConfig, CliResult, Commands, Verbosity};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = build_config(&cli);

    match cli.command {
        Commands::List(args) => {
            print!("{}", runner::list(&args)?);
            Ok(true)
        }
        Commands::Run(args) => {
            logging::init_logging(&config);
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(runner::run(&config, &args))
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_format(cli.log_format.into())
}
