//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::report::ReportArgs;

/// Tag-segmented time reports for klog files.
///
/// Reads every `.klg` file in a directory through `klog json` and charts the
/// logged time by project, by tag, by tag within each project and by day.
#[derive(Debug, Parser)]
#[command(name = "klog-report", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the time reports.
    Report(ReportArgs),

    /// List the configured color palettes.
    Palettes {
        /// Disable colored output (also respects `NO_COLOR`).
        #[arg(long)]
        no_color: bool,
    },
}
