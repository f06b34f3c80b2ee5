mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// ktjar - build-step generator for Kotlin and Java libraries
#[derive(Parser)]
#[command(name = "ktjar")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging and show full compiler arguments
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate the build steps for a compilation unit
  Steps {
    /// Compilation unit description (JSON)
    unit: PathBuf,

    /// Toolchain configuration (JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root that relative paths are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Root-relative path to leave out of generated archives (repeatable)
    #[arg(long = "ignore", value_name = "PATH")]
    ignored: Vec<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// List the dependency files a compilation unit produces
  DepFiles {
    /// Compilation unit description (JSON)
    unit: PathBuf,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Decode a kapt option token
  Options {
    /// Base64 token as passed to the kapt plugin
    token: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Summarize an annotation processing timing report
  Stats {
    /// Report written by kapt's dumpProcessorTimings
    report: PathBuf,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Steps {
      unit,
      config,
      root,
      ignored,
      output,
    } => cmd::cmd_steps(&unit, config.as_deref(), &root, &ignored, cli.verbose, output),
    Commands::DepFiles { unit, output } => cmd::cmd_dep_files(&unit, output),
    Commands::Options { token, output } => cmd::cmd_options(&token, output),
    Commands::Stats { report, output } => cmd::cmd_stats(&report, output),
  }
}
