//! XDT transform CLI.

use clap::{ColorChoice, Parser};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;
use xdt_cli::logging::{LogConfig, LogFormat, init_logging};
use xdt_cli::report::{diagnostics_table, exit_code, json_lines, print_summary};
use xdt_cli::types::ApplyResult;

mod cli;
mod commands;

use crate::cli::{ApplyArgs, Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_apply, run_check};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let code = match &cli.command {
        Command::Apply(args) => match run_apply(args) {
            Ok(result) => {
                print_summary(&result);
                match print_diagnostics(args, &result) {
                    Ok(()) => exit_code(&result, args.fail_on_warning),
                    Err(error) => {
                        eprintln!("error: {error:#}");
                        1
                    }
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Check(args) => match run_check(args) {
            Ok(output) => {
                println!("{output}");
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(code);
}

fn print_diagnostics(args: &ApplyArgs, result: &ApplyResult) -> anyhow::Result<()> {
    if args.diagnostics {
        println!(
            "{}",
            diagnostics_table(&result.diagnostics, &args.timestamp_format)
        );
    } else if args.diagnostics_json {
        for line in json_lines(&result.diagnostics, &args.timestamp_format)? {
            println!("{line}");
        }
    }
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
