//! The shell session and its dispatch loop.

use std::io::Write;

use claw_probe::{NodeData, NodeId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::QueryClient;
use crate::commands;
use crate::editor::LineEditor;
use crate::error::ShellError;
use crate::mailbox::{Courier, LoopbackCourier, Mailbox};
use crate::mode::ModeStack;
use crate::output::{OutputFormat, TableDisplay};
use crate::variables::{NODE_VAR, Variables};

/// Name of the bottom mode.
pub const GLOBAL_MODE: &str = "global";

/// Name of the mode active while a node is selected.
pub const NODE_MODE: &str = "node";

/// Classification of one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// A command ran successfully.
    Executed,
    /// No command ran, or it failed; see [`Shell::last_error`].
    NoCommand,
    /// The line was empty.
    Nop,
}

/// One interactive session.
pub struct Shell {
    pub(crate) client: QueryClient,
    pub(crate) modes: ModeStack<Shell>,
    pub(crate) vars: Variables,
    pub(crate) mailbox: Mailbox,
    pub(crate) courier: Box<dyn Courier>,
    pub(crate) output: OutputFormat,
    pub(crate) out: Box<dyn Write>,
    pub(crate) done: bool,
    last_error: Option<String>,
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("client", &self.client)
            .field("mode", &self.modes.current().name())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl Shell {
    /// Create a session in global mode. Deliveries from `send` loop back
    /// into the shell's own mailbox.
    #[must_use]
    pub fn new(client: QueryClient, output: OutputFormat, out: Box<dyn Write>) -> Self {
        let mailbox = Mailbox::new();
        let courier = Box::new(LoopbackCourier::new(&mailbox));
        Self {
            client,
            modes: commands::build_modes(),
            vars: Variables::new(),
            mailbox,
            courier,
            output,
            out,
            done: false,
            last_error: None,
        }
    }

    /// Replace the courier used by `send`.
    #[must_use]
    pub fn with_courier(mut self, courier: Box<dyn Courier>) -> Self {
        self.courier = courier;
        self
    }

    /// Run until `quit` or end of input.
    ///
    /// Lines that ran a command or failed to are added to the editor's
    /// history; failures are printed right after.
    ///
    /// # Errors
    ///
    /// Returns an error only if the editor or the output fails.
    pub fn run(&mut self, editor: &mut dyn LineEditor) -> Result<(), ShellError> {
        while !self.done {
            let prompt = self.modes.current().prompt().to_string();
            let Some(line) = editor.read_line(&prompt)? else {
                debug!("end of input");
                self.finish();
                break;
            };

            match self.dispatch(&line) {
                CommandResult::Nop => {}
                CommandResult::Executed => editor.add_history(&line),
                CommandResult::NoCommand => {
                    editor.add_history(&line);
                    let msg = self.last_error.clone().unwrap_or_default();
                    writeln!(self.out, "{msg}")?;
                }
            }
            self.out.flush()?;
        }
        Ok(())
    }

    /// Process one input line.
    pub fn dispatch(&mut self, line: &str) -> CommandResult {
        self.last_error = None;

        let expanded = self.vars.expand(line).into_owned();
        let trimmed = expanded.trim();
        if trimmed.is_empty() {
            return CommandResult::Nop;
        }

        let (name, args) = match trimmed.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim_start()),
            None => (trimmed, ""),
        };

        let Some(handler) = self.modes.lookup(name).map(|clause| clause.handler) else {
            self.fail(ShellError::UnknownCommand);
            return CommandResult::NoCommand;
        };

        debug!(command = name, mode = self.modes.current().name(), "dispatching");
        match handler(self, args) {
            Ok(()) => CommandResult::Executed,
            Err(err) => {
                self.fail(err);
                CommandResult::NoCommand
            }
        }
    }

    fn fail(&mut self, err: ShellError) {
        debug!(error = %err, "command failed");
        self.last_error = Some(err.to_string());
    }

    /// Message of the last failed command, cleared by every dispatch.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Name of the current mode.
    #[must_use]
    pub fn mode(&self) -> &str {
        self.modes.current().name()
    }

    /// Number of active modes.
    #[must_use]
    pub fn mode_depth(&self) -> usize {
        self.modes.depth()
    }

    /// Value of a shell variable.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name)
    }

    /// Whether `quit` ran or input ended.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Mutable access to the query client.
    pub fn client(&mut self) -> &mut QueryClient {
        &mut self.client
    }

    /// Stop the loop and notify the registry's peer.
    pub(crate) fn finish(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        if let Err(e) = self.client.shutdown() {
            warn!(error = %e, "failed to notify registry of shutdown");
        }
    }

    // ========================================================================
    // Helpers for command handlers
    // ========================================================================

    /// Render a view in the configured format.
    pub(crate) fn print<T: Serialize + TableDisplay>(&mut self, value: &T) -> Result<(), ShellError> {
        self.output.write(&mut self.out, value)
    }

    /// Record navigation to `node`: bind `NODE` and make sure node mode is
    /// active.
    pub(crate) fn enter_node(&mut self, node: NodeId) -> Result<(), ShellError> {
        if self.modes.current().name() == GLOBAL_MODE {
            self.modes.push(NODE_MODE)?;
        }
        self.vars.set(NODE_VAR, node.to_string());
        Ok(())
    }

    /// Return to global mode and unbind `NODE`.
    pub(crate) fn leave_to_global(&mut self) {
        while self.modes.depth() > 1 {
            self.modes.pop();
        }
        self.vars.unset(NODE_VAR);
    }

    /// Display names for all `nodes`: the hostname, plus `:<pid>` when more
    /// than one node is known.
    pub(crate) fn display_names(nodes: &[NodeData]) -> Vec<(NodeId, String)> {
        let qualify = nodes.len() > 1;
        nodes
            .iter()
            .map(|data| {
                let id = data.node_id();
                let name = if qualify {
                    format!("{}:{}", data.node_info.hostname, id.process_id())
                } else {
                    data.node_info.hostname.clone()
                };
                (id, name)
            })
            .collect()
    }

    /// Display name of a single node.
    pub(crate) fn display_name(&mut self, node: NodeId) -> Result<String, ShellError> {
        let nodes = self.client.list_nodes()?;
        Self::display_names(&nodes)
            .into_iter()
            .find_map(|(id, name)| (id == node).then_some(name))
            .ok_or(ShellError::UnknownNode)
    }
}
