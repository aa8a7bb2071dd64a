//! Command-line interface definition

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

/// Patch compliance reporting for Jamf Pro
#[derive(Debug, Parser)]
#[command(name = "patcher")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show debug output on the console
    #[arg(short = 'x', long, global = true)]
    pub debug: bool,

    /// Configuration file (defaults to config.toml in the support directory)
    #[arg(long, global = true, env = "PATCHER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a patch report
    Report(ReportArgs),

    /// Run the first-run setup assistant
    Setup,

    /// Remove stored credentials and run setup again
    Reset,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Directory the Patch-Reports folder is created in
    #[arg(short, long)]
    pub path: PathBuf,

    /// Column to sort by, e.g. "Software Title"
    #[arg(short, long)]
    pub sort: Option<String>,

    /// Omit patches released within the last 48 hours
    #[arg(short, long)]
    pub omit: bool,

    /// Append iOS adoption rows from the SOFA feed
    #[arg(short = 'm', long)]
    pub ios: bool,
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}
