//! Commands available in every mode.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use claw_probe::NodeId;
use tracing::info;

use super::{Table, no_args};
use crate::error::ShellError;
use crate::mode::CommandClause;
use crate::output::{Message, NodeList, NodeRow, RouteEntry, RouteList};
use crate::samples::sample_fleet;
use crate::shell::Shell;

/// The global command table.
pub fn commands() -> Table {
    vec![
        CommandClause::new("quit", "end the session", quit),
        CommandClause::new("echo", "print the arguments", echo),
        CommandClause::new("clear", "clear the screen", clear),
        CommandClause::new("help", "list the commands of the current mode", help),
        CommandClause::new("sleep", "pause for <ms> milliseconds", sleep),
        CommandClause::new("list-nodes", "list all known nodes", list_nodes),
        CommandClause::new("test-nodes", "load a fixed sample fleet", test_nodes),
        CommandClause::new("change-node", "select a node by ID or host[:pid]", change_node),
        CommandClause::new("all-routes", "print the direct routes of every node", all_routes),
        CommandClause::new("mailbox", "print the shell's mailbox", mailbox),
        CommandClause::new("dequeue", "remove a message from the mailbox", dequeue),
        CommandClause::new("pop-front", "print the oldest message, if any", pop_front),
        CommandClause::new("await-msg", "wait for a message and print it", await_msg),
    ]
}

fn quit(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("quit", args)?;
    shell.finish();
    Ok(())
}

fn echo(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    shell.print(&Message::new(args.trim_end()))
}

fn clear(_shell: &mut Shell, _args: &str) -> Result<(), ShellError> {
    Err(ShellError::NotImplemented("clear"))
}

fn help(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("help", args)?;
    let text = shell.modes.current().help().trim_end().to_string();
    shell.print(&Message::new(text))
}

fn sleep(_shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    let millis: u64 = args
        .trim()
        .parse()
        .map_err(|_| ShellError::invalid("sleep", "expected a number of milliseconds"))?;
    thread::sleep(Duration::from_millis(millis));
    Ok(())
}

fn list_nodes(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("list-nodes", args)?;
    let nodes = shell.client.list_nodes()?;
    let rows = Shell::display_names(&nodes)
        .into_iter()
        .zip(&nodes)
        .map(|((id, name), data)| NodeRow {
            name,
            id: id.to_string(),
            os: data.node_info.os.clone(),
            cores: data.node_info.total_cores(),
        })
        .collect();
    shell.print(&NodeList { nodes: rows })
}

fn test_nodes(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("test-nodes", args)?;
    let events = sample_fleet()?;
    let count = events.len();
    for event in events {
        shell.client.push(event)?;
    }
    info!(events = count, "loaded sample fleet");
    Ok(())
}

fn change_node(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    let target = args.trim();
    if target.is_empty() {
        return Err(ShellError::invalid(
            "change-node",
            "expected a node ID or host[:pid]",
        ));
    }

    let node = match NodeId::parse(target) {
        Ok(node) => node,
        Err(_) => resolve_host(shell, target)?,
    };
    let node = shell.client.change_node(node)?;
    shell.enter_node(node)
}

/// Resolve `host` or `host:pid` to a node.
fn resolve_host(shell: &mut Shell, spec: &str) -> Result<NodeId, ShellError> {
    let parts: Vec<&str> = spec.split(':').collect();
    let (host, pid) = match parts.as_slice() {
        [host] => (*host, None),
        [host, pid] => {
            let pid = pid
                .parse::<u32>()
                .map_err(|_| ShellError::UnresolvedHost(spec.to_string()))?;
            (*host, Some(pid))
        }
        _ => return Err(ShellError::UnresolvedHost(spec.to_string())),
    };

    let candidates = shell.client.nodes_on_host(host)?;
    let found = match pid {
        Some(pid) => candidates.into_iter().find(|n| n.process_id() == pid),
        None if candidates.len() > 1 => {
            return Err(ShellError::AmbiguousHost(spec.to_string()));
        }
        None => candidates.into_iter().next(),
    };

    match found {
        Some(node) => Ok(node),
        None if shell.client.list_nodes()?.is_empty() => Err(ShellError::EmptyRegistry),
        None => Err(ShellError::UnresolvedHost(spec.to_string())),
    }
}

fn all_routes(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("all-routes", args)?;
    let nodes = shell.client.list_nodes()?;
    let names: BTreeMap<NodeId, String> = Shell::display_names(&nodes).into_iter().collect();

    let mut routes = Vec::with_capacity(names.len());
    for (node, name) in &names {
        let neighbours = shell.client.routes(*node)?;
        routes.push(route_entry(&names, name, neighbours));
    }
    shell.print(&RouteList { routes })
}

/// Build a route entry, naming neighbours by display name where known.
pub(crate) fn route_entry(
    names: &BTreeMap<NodeId, String>,
    name: &str,
    neighbours: impl IntoIterator<Item = NodeId>,
) -> RouteEntry {
    RouteEntry {
        node: name.to_string(),
        neighbours: neighbours
            .into_iter()
            .map(|n| names.get(&n).cloned().unwrap_or_else(|| n.to_string()))
            .collect(),
    }
}

fn mailbox(_shell: &mut Shell, _args: &str) -> Result<(), ShellError> {
    Err(ShellError::NotImplemented("mailbox"))
}

fn dequeue(_shell: &mut Shell, _args: &str) -> Result<(), ShellError> {
    Err(ShellError::NotImplemented("dequeue"))
}

fn pop_front(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("pop-front", args)?;
    let text = match shell.mailbox.try_pop_message() {
        Some(msg) => msg.to_string(),
        None => "pop-front: mailbox is empty".to_string(),
    };
    shell.print(&Message::new(text))
}

fn await_msg(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("await-msg", args)?;
    let msg = shell.mailbox.wait_for_message()?;
    shell.print(&Message::new(msg.to_string()))
}
