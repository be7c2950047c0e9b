//! CLI argument definitions for the XDT transform tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use xdt_transform::TimestampFormat;

#[derive(Parser)]
#[command(
    name = "xdt-transform",
    version,
    about = "Apply XDT transformations to XML configuration files",
    long_about = "Apply XML-Document-Transform (XDT) files to XML configuration files.\n\n\
                  The transformation may come from a file, an inline document, or a\n\
                  fragment that is wrapped into a <configuration> document.\n\
                  Every engine log call is recorded and can be printed afterwards."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Transform a configuration file and write the result.
    Apply(ApplyArgs),

    /// Check that a transformation document or fragment is well formed.
    Check(CheckArgs),
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Configuration file to transform.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Where to write the transformed configuration (may equal SOURCE).
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    #[command(flatten)]
    pub transformation: TransformationArgs,

    /// Print every recorded diagnostic as a table.
    #[arg(long = "diagnostics")]
    pub diagnostics: bool,

    /// Print every recorded diagnostic as one JSON object per line.
    #[arg(long = "diagnostics-json", conflicts_with = "diagnostics")]
    pub diagnostics_json: bool,

    /// Exit with a failure code when any warning was recorded.
    #[arg(long = "fail-on-warning")]
    pub fail_on_warning: bool,

    /// Timestamp format for printed diagnostics: en-gb, iso8601, or a strftime pattern.
    #[arg(long = "timestamp-format", value_name = "FORMAT", default_value = "en-gb")]
    pub timestamp_format: TimestampFormat,
}

/// Where the transformation comes from. Exactly one is required.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct TransformationArgs {
    /// Transformation file.
    #[arg(long = "transform", value_name = "FILE")]
    pub transform: Option<PathBuf>,

    /// File holding a complete transformation document, applied as text.
    #[arg(long = "document", value_name = "FILE")]
    pub document: Option<PathBuf>,

    /// Transformation fragment, wrapped into a <configuration> document.
    #[arg(long = "fragment", value_name = "XML")]
    pub fragment: Option<String>,
}

#[derive(Parser)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: CheckInput,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct CheckInput {
    /// File holding a transformation document.
    #[arg(long = "document", value_name = "FILE")]
    pub document: Option<PathBuf>,

    /// Transformation fragment; the wrapped document is printed.
    #[arg(long = "fragment", value_name = "XML")]
    pub fragment: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
