//! MT to MX translator CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use mtx_cli::logging::{LogConfig, init_logging};

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command};
use crate::commands::{
    GlobalOptions, run_batch, run_detect, run_pairs, run_prevalidate, run_translate,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: cannot open log output: {error}");
        std::process::exit(2);
    }
    let global = GlobalOptions {
        config: cli.config.clone(),
        standards_dir: cli.standards_dir.clone(),
    };
    let result = match &cli.command {
        Command::Translate(args) => run_translate(args, &global),
        Command::Prevalidate(args) => run_prevalidate(args, &global),
        Command::Detect(args) => run_detect(args).map(|()| 0),
        Command::Batch(args) => run_batch(args, &global),
        Command::Pairs => run_pairs(&global).map(|()| 0),
    };
    let exit_code = match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Flags win over `RUST_LOG`; `-v`/`-q` count as an explicit level.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    if let Some(level) = cli.log_level {
        config = config.with_explicit_level(level.into());
    } else if cli.verbosity.is_present() {
        config = config.with_explicit_level(cli.verbosity.tracing_level_filter());
    }
    let ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
        .with_format(cli.log_format.into())
        .with_log_file(cli.log_file.clone())
        .with_log_data(cli.log_data)
        .with_ansi(ansi)
}
