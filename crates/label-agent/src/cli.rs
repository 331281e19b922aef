use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config directory (optional)
    #[arg(long, default_value = "config")]
    pub config_dir: String,

    /// Use in-process fakes instead of the GPIO relay and the printing program
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Power the printer up and show what it reports
    Status,
    /// Show the printing program version
    Version,
    /// Print a label
    Print {
        text: String,
        /// Font size, defaults to the configured one
        #[arg(long)]
        size: Option<u32>,
    },
    /// Print a label with a named preset
    Preset { name: String, text: String },
    /// List configured presets
    Presets,
    /// Render a label to a PNG file without printing it
    Preview {
        text: String,
        #[arg(long)]
        out: PathBuf,
        /// Identifies whose draft this is; drafts of different requesters never collide
        #[arg(long, default_value_t = 0)]
        requester: i64,
        #[arg(long)]
        preset: Option<String>,
    },
    /// Print every line read from stdin until EOF or Ctrl-C
    Serve,
}
