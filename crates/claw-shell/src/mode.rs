//! Modes and the mode stack.
//!
//! A [`Mode`] is a named context with a prompt and a command table. Tables
//! are built once at startup: the node mode is the global table followed by
//! the node-specific commands, and lookup returns the first match, so global
//! commands win on a name collision.

use std::fmt;

use crate::error::ShellError;

/// Command implementation. Receives the context and the raw argument string.
pub type Handler<C> = fn(&mut C, &str) -> Result<(), ShellError>;

/// One entry of a command table.
pub struct CommandClause<C> {
    /// Command name, the first token of an input line.
    pub name: &'static str,
    /// One-line description shown by `help`.
    pub description: &'static str,
    /// Implementation.
    pub handler: Handler<C>,
}

impl<C> CommandClause<C> {
    /// Create a clause.
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str, handler: Handler<C>) -> Self {
        Self {
            name,
            description,
            handler,
        }
    }
}

impl<C> Clone for CommandClause<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for CommandClause<C> {}

impl<C> fmt::Debug for CommandClause<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandClause")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// A named UI context.
pub struct Mode<C> {
    name: String,
    prompt: String,
    help: String,
    commands: Vec<CommandClause<C>>,
}

impl<C> Mode<C> {
    /// Create a mode without commands.
    #[must_use]
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            help: String::new(),
            commands: Vec::new(),
        }
    }

    /// Append clauses to the command table.
    #[must_use]
    pub fn with_commands(mut self, clauses: impl IntoIterator<Item = CommandClause<C>>) -> Self {
        self.add_commands(clauses);
        self
    }

    /// Append clauses to the command table. Calls accumulate.
    pub fn add_commands(&mut self, clauses: impl IntoIterator<Item = CommandClause<C>>) {
        self.commands.extend(clauses);
        self.help = render_help(&self.commands);
    }

    /// Mode name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prompt shown while this mode is current.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Generated help text.
    #[must_use]
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Command table in registration order.
    #[must_use]
    pub fn commands(&self) -> &[CommandClause<C>] {
        &self.commands
    }

    /// First clause registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&CommandClause<C>> {
        self.commands.iter().find(|clause| clause.name == name)
    }
}

impl<C> fmt::Debug for Mode<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mode")
            .field("name", &self.name)
            .field("prompt", &self.prompt)
            .field("commands", &self.commands.len())
            .finish_non_exhaustive()
    }
}

fn render_help<C>(commands: &[CommandClause<C>]) -> String {
    let width = commands.iter().map(|c| c.name.len()).max().unwrap_or(0);
    let mut seen: Vec<&str> = Vec::with_capacity(commands.len());
    let mut help = String::new();
    for clause in commands {
        // Shadowed clauses are unreachable.
        if seen.contains(&clause.name) {
            continue;
        }
        seen.push(clause.name);
        help.push_str(&format!(
            "  {:<width$}  {}\n",
            clause.name, clause.description
        ));
    }
    help
}

/// Registered modes and the stack of active ones.
///
/// The bottom of the stack is always the mode the stack was created with.
#[derive(Debug)]
pub struct ModeStack<C> {
    modes: Vec<Mode<C>>,
    active: Vec<usize>,
}

impl<C> ModeStack<C> {
    /// Create a stack whose permanent bottom is `root`.
    #[must_use]
    pub fn new(root: Mode<C>) -> Self {
        Self {
            modes: vec![root],
            active: vec![0],
        }
    }

    /// Register a mode so it can be pushed by name.
    ///
    /// A mode registered under an existing name replaces it.
    pub fn add_mode(&mut self, mode: Mode<C>) {
        match self.modes.iter().position(|m| m.name == mode.name) {
            Some(idx) => self.modes[idx] = mode,
            None => self.modes.push(mode),
        }
    }

    /// Activate the mode registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns an error and leaves the stack unchanged if no such mode exists.
    pub fn push(&mut self, name: &str) -> Result<(), ShellError> {
        let idx = self
            .modes
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| ShellError::InvalidArgument(format!("unknown mode: {name}")))?;
        self.active.push(idx);
        Ok(())
    }

    /// Deactivate the current mode. No-op at the bottom.
    pub fn pop(&mut self) {
        if self.active.len() > 1 {
            self.active.pop();
        }
    }

    /// The current mode.
    #[must_use]
    pub fn current(&self) -> &Mode<C> {
        let idx = self.active.last().copied().unwrap_or(0);
        &self.modes[idx]
    }

    /// Number of active modes, at least 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Look a command up in the current mode only.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&CommandClause<C>> {
        self.current().lookup(name)
    }
}
