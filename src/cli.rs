// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cronrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cronrun",
    version,
    about = "Run commands on cron schedules, with retries, timeouts and run history.",
    long_about = None
)]
pub struct CliArgs {
    /// Data directory holding task files.
    ///
    /// Default: `~/.cronrun`.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Scheduler check interval in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 1)]
    pub interval: u64,

    /// Maximum number of task processes running at the same time.
    #[arg(long, value_name = "N", default_value_t = 8)]
    pub max_parallel: usize,

    /// Execute one task immediately (ignoring its schedule and enabled
    /// flag), then exit. Exits non-zero if the run fails.
    #[arg(long, value_name = "NAME")]
    pub run_now: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CRONRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print tasks and their next fire times, but don't schedule anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
