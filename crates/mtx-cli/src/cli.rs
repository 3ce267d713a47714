//! CLI argument definitions for the MT to MX translator.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use mtx_cli::logging::LogFormat;
use mtx_validate::BackendKind;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "mtx",
    version,
    about = "SWIFT MT to ISO 20022 MX translator",
    long_about = "Translate SWIFT FIN (MT) messages to ISO 20022 (MX) XML.\n\n\
                  Messages are prevalidated against per-type field rules, routed to a\n\
                  mapping profile, rendered as MX XML, and checked against the XSD.\n\
                  Types without a mapping are passed through unchanged."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow message payload values (names, accounts) in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Standards directory (pairs.yaml, mappings, prevalidate, xsd).
    #[arg(long = "standards-dir", value_name = "DIR", global = true)]
    pub standards_dir: Option<PathBuf>,

    /// Settings file (standards_dir, [validator], [batch]).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Translate one MT message to MX XML.
    Translate(TranslateArgs),

    /// Check an MT message against its field definitions.
    Prevalidate(PrevalidateArgs),

    /// Print the detected MT type of a message.
    Detect(InputArgs),

    /// Translate every message of a .dat batch file.
    Batch(BatchArgs),

    /// List the routing catalog.
    Pairs,
}

#[derive(Args)]
pub struct InputArgs {
    /// MT message file ("-" reads stdin).
    #[arg(value_name = "FILE")]
    pub input: PathBuf,
}

#[derive(Args)]
pub struct TranslationFlags {
    /// Treat the message as this MT type instead of detecting it.
    #[arg(long = "force-type", value_name = "TYPE")]
    pub force_type: Option<String>,

    /// Skip the prevalidation gate.
    #[arg(long = "no-prevalidate")]
    pub no_prevalidate: bool,

    /// Request id used for GrpHdr/MsgId.
    #[arg(long = "request-id", value_name = "ID")]
    pub request_id: Option<String>,

    /// XSD validator backend (auto, xsd10, xsd11, remote).
    #[arg(long = "xsd-backend", value_name = "BACKEND")]
    pub xsd_backend: Option<BackendKind>,
}

#[derive(Args)]
pub struct TranslateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub flags: TranslationFlags,

    /// Write the MX XML to this file instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the full result as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct PrevalidateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Treat the message as this MT type instead of detecting it.
    #[arg(long = "force-type", value_name = "TYPE")]
    pub force_type: Option<String>,

    /// Print the verdict as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Batch file with HDR, $-separated messages, and TRL lines.
    #[arg(value_name = "BATCH_FILE")]
    pub batch_file: PathBuf,

    /// Output directory (default: <BATCH_FILE stem>-out next to the batch).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum number of worker threads.
    #[arg(long = "workers", value_name = "N", value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub flags: TranslationFlags,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
