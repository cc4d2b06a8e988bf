//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// clawsh - interactive inspection shell for a Clawbernetes fleet.
#[derive(Parser, Debug, Clone)]
#[command(name = "clawsh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Nexus to hand-shake with, as `host:port`.
    #[arg(short, long, env = "CLAWSH_NEXUS")]
    pub nexus: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Fill character of progress bars.
    #[arg(long, default_value_t = '#')]
    pub bar_fill: char,

    /// Width of progress bars in characters.
    #[arg(long, default_value_t = 50)]
    pub bar_width: usize,

    /// File to load and save line-editor history.
    #[arg(long, env = "CLAWSH_HISTORY")]
    pub history_file: Option<PathBuf>,

    /// JSON-lines file of telemetry events to replay before the first prompt.
    #[arg(long)]
    pub probe_file: Option<PathBuf>,

    /// Run this line instead of reading from the terminal (repeatable).
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    pub commands: Vec<String>,

    /// Run the lines of this file instead of reading from the terminal.
    #[arg(long, conflicts_with = "commands")]
    pub script: Option<PathBuf>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}
