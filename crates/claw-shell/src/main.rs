//! `clawsh` binary entrypoint.
//!
//! Starts the registry service on a background runtime, replays any probe
//! file into it, and runs the shell on the main thread.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use claw_registry::{DEFAULT_INBOX_CAPACITY, RegistryService};
use claw_shell::config::{EXIT_INVALID_CONFIG, Input};
use claw_shell::editor::{LineEditor, RustylineEditor, ScriptedEditor};
use claw_shell::{Cli, OutputFormat, QueryClient, RegistryTransport, Shell, ShellConfig};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "clawsh=warn,claw_shell=warn,claw_registry=warn";

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return parse_failure(&e),
    };
    let config = match ShellConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run 'clawsh --help' for usage.");
            return ExitCode::from(EXIT_INVALID_CONFIG);
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `--help` and `--version` exit 0; malformed arguments exit like any other
/// invalid configuration.
fn parse_failure(err: &clap::Error) -> ExitCode {
    // Nothing useful is left to report if the terminal is gone
    let _ = err.print();
    if err.use_stderr() {
        ExitCode::from(EXIT_INVALID_CONFIG)
    } else {
        ExitCode::SUCCESS
    }
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing() -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(DEFAULT_LOG_FILTER).context("invalid default log filter")?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .try_init()
        .context("failed to install subscriber")?;
    Ok(())
}

fn run(config: ShellConfig) -> anyhow::Result<()> {
    // The shell blocks on replies, so it stays on this thread and the
    // service runs on the runtime's workers.
    let runtime = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    let (service, handle) = RegistryService::new(DEFAULT_INBOX_CAPACITY);
    let service_task = service.spawn(runtime.handle());

    let replayed = config.probe_events.len();
    for event in config.probe_events {
        handle
            .blocking_push(event)
            .context("failed to replay probe events")?;
    }
    if replayed > 0 {
        info!(events = replayed, "replayed probe file");
    }

    let client = QueryClient::connect(Box::new(RegistryTransport::new(handle)), &config.nexus)
        .with_context(|| format!("handshake with {} failed", config.nexus))?;

    let output = OutputFormat::new(config.format, config.bar);
    let mut shell = Shell::new(client, output, Box::new(io::stdout()));

    let mut editor: Box<dyn LineEditor> = match config.input {
        Input::Interactive { history_file } => Box::new(RustylineEditor::new(history_file)?),
        Input::Script(lines) => Box::new(ScriptedEditor::new(lines)),
    };

    shell.run(editor.as_mut())?;
    editor.save_history()?;

    if let Err(e) = runtime.block_on(service_task) {
        debug!(error = %e, "registry task ended abnormally");
    }
    Ok(())
}
