//! Command tables and handlers.
//!
//! - [`global`]: commands available everywhere
//! - [`node`]: commands that need a current node

pub mod global;
pub mod node;

use crate::error::ShellError;
use crate::mode::{CommandClause, Mode, ModeStack};
use crate::shell::{GLOBAL_MODE, NODE_MODE, Shell};

/// Prompt of global mode.
pub const GLOBAL_PROMPT: &str = "$ ";

/// Prompt of node mode.
pub const NODE_PROMPT: &str = "node $ ";

/// Build the global and node modes, with global active.
///
/// The node table is the global table followed by the node commands.
pub fn build_modes() -> ModeStack<Shell> {
    let global_cmds = global::commands();
    let global_mode = Mode::new(GLOBAL_MODE, GLOBAL_PROMPT).with_commands(global_cmds.clone());
    let node_mode = Mode::new(NODE_MODE, NODE_PROMPT)
        .with_commands(global_cmds)
        .with_commands(node::commands());

    let mut modes = ModeStack::new(global_mode);
    modes.add_mode(node_mode);
    modes
}

/// Reject any arguments.
pub(crate) fn no_args(command: &str, args: &str) -> Result<(), ShellError> {
    if args.trim().is_empty() {
        Ok(())
    } else {
        Err(ShellError::invalid(command, "no arguments expected"))
    }
}

/// Clause list type used by both tables.
pub(crate) type Table = Vec<CommandClause<Shell>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_mode_extends_global_mode() {
        let mut modes = build_modes();
        let global: Vec<_> = modes.current().commands().iter().map(|c| c.name).collect();
        modes.push(NODE_MODE).expect("registered");
        let node: Vec<_> = modes.current().commands().iter().map(|c| c.name).collect();

        assert_eq!(&node[..global.len()], global.as_slice());
        for name in ["leave-node", "back", "whereami", "send", "list-actors"] {
            assert!(node.contains(&name), "{name} missing from node mode");
            assert!(!global.contains(&name), "{name} leaked into global mode");
        }
    }

    #[test]
    fn global_catalog_is_complete() {
        let modes = build_modes();
        for name in [
            "quit", "echo", "clear", "help", "sleep", "list-nodes", "test-nodes",
            "change-node", "all-routes", "mailbox", "dequeue", "pop-front", "await-msg",
        ] {
            assert!(modes.lookup(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn no_args_rejects_arguments() {
        assert!(no_args("quit", "").is_ok());
        assert!(no_args("quit", "  ").is_ok());
        assert_eq!(
            no_args("quit", "now").expect_err("should reject").to_string(),
            "quit: no arguments expected"
        );
    }
}
