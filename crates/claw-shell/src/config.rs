//! Validated shell configuration.

use std::fs;
use std::path::{Path, PathBuf};

use claw_probe::ProbeEvent;

use crate::cli::{Cli, Format};
use crate::error::ShellError;
use crate::output::BarStyle;

/// Process exit code for invalid startup configuration.
pub const EXIT_INVALID_CONFIG: u8 = 64;

/// Widest progress bar accepted.
pub const MAX_BAR_WIDTH: usize = 200;

/// Where command lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Interactive line editor.
    Interactive {
        /// File to load and save history.
        history_file: Option<PathBuf>,
    },
    /// A fixed list of lines; end of input acts like `quit`.
    Script(Vec<String>),
}

/// Everything the binary needs to start a session.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Transport peer named in the handshake.
    pub nexus: String,
    /// Output format.
    pub format: Format,
    /// Progress bar rendering.
    pub bar: BarStyle,
    /// Line source.
    pub input: Input,
    /// Telemetry replayed before the first prompt.
    pub probe_events: Vec<ProbeEvent>,
}

impl ShellConfig {
    /// Validate parsed arguments and load the files they name.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Config`] if any value is invalid or a named
    /// file cannot be read.
    pub fn from_cli(cli: &Cli) -> Result<Self, ShellError> {
        validate_nexus(&cli.nexus)?;

        if cli.bar_width == 0 || cli.bar_width > MAX_BAR_WIDTH {
            return Err(ShellError::Config(format!(
                "bar width must be between 1 and {MAX_BAR_WIDTH}, got {}",
                cli.bar_width
            )));
        }
        if cli.bar_fill.is_control() {
            return Err(ShellError::Config(
                "bar fill must be a printable character".to_string(),
            ));
        }

        let input = if let Some(path) = &cli.script {
            Input::Script(read_file(path, "script")?.lines().map(str::to_string).collect())
        } else if !cli.commands.is_empty() {
            Input::Script(cli.commands.clone())
        } else {
            Input::Interactive {
                history_file: cli.history_file.clone(),
            }
        };

        let probe_events = match &cli.probe_file {
            Some(path) => ProbeEvent::from_json_lines(&read_file(path, "probe file")?)
                .map_err(|e| ShellError::Config(format!("{}: {e}", path.display())))?,
            None => Vec::new(),
        };

        Ok(Self {
            nexus: cli.nexus.trim().to_string(),
            format: cli.format,
            bar: BarStyle::new(cli.bar_fill, cli.bar_width),
            input,
            probe_events,
        })
    }
}

/// Check a `host:port` nexus address.
fn validate_nexus(nexus: &str) -> Result<(), ShellError> {
    let nexus = nexus.trim();
    let (host, port) = nexus.rsplit_once(':').ok_or_else(|| {
        ShellError::Config(format!("nexus must be host:port, got '{nexus}'"))
    })?;

    if host.is_empty() {
        return Err(ShellError::Config("nexus host cannot be empty".to_string()));
    }

    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(ShellError::Config(format!(
            "nexus port must be between 1 and 65535, got '{port}'"
        ))),
        Ok(_) => Ok(()),
    }
}

fn read_file(path: &Path, what: &str) -> Result<String, ShellError> {
    fs::read_to_string(path)
        .map_err(|e| ShellError::Config(format!("cannot read {what} {}: {e}", path.display())))
}
