//! Commands that operate on the current node.

use std::collections::BTreeMap;

use claw_probe::{ActorId, NodeId};
use claw_registry::Back;
use tracing::debug;

use super::global::route_entry;
use super::{Table, no_args};
use crate::error::ShellError;
use crate::mode::CommandClause;
use crate::output::{
    ActorList, InterfaceList, Location, Message, NodeStatistics, RamUsageView, RouteList,
    WorkLoadView,
};
use crate::shell::Shell;

/// Commands added on top of the global table in node mode.
pub fn commands() -> Table {
    vec![
        CommandClause::new("leave-node", "return to global mode", leave_node),
        CommandClause::new("back", "return to the previously selected node", back),
        CommandClause::new("whereami", "print the current node", whereami),
        CommandClause::new("work-load", "print the node's load", work_load),
        CommandClause::new("ram-usage", "print the node's memory usage", ram_usage),
        CommandClause::new("statistics", "print everything known about the node", statistics),
        CommandClause::new("interfaces", "print the node's network interfaces", interfaces),
        CommandClause::new("direct-routes", "print the node's direct routes", direct_routes),
        CommandClause::new("list-actors", "list the actors running on the node", list_actors),
        CommandClause::new("send", "send <actor-id> <json> to an actor on the node", send),
    ]
}

fn leave_node(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("leave-node", args)?;
    shell.client.leave_node()?;
    shell.leave_to_global();
    shell.print(&Message::new("Leaving node-mode"))
}

fn back(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("back", args)?;
    match shell.client.back()? {
        Back::Leave => {
            shell.leave_to_global();
            shell.print(&Message::new("Leaving node-mode"))
        }
        Back::Continue(node) => {
            shell.enter_node(node)?;
            let name = shell.display_name(node)?;
            shell.print(&Location {
                name,
                id: node.to_string(),
            })
        }
    }
}

fn whereami(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("whereami", args)?;
    let node = shell.client.where_am_i()?;
    shell.enter_node(node)?;
    let name = shell.display_name(node)?;
    shell.print(&Location {
        name,
        id: node.to_string(),
    })
}

fn work_load(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("work-load", args)?;
    let node = shell.client.where_am_i()?;
    let load = shell
        .client
        .work_load(node)?
        .ok_or(ShellError::NoTelemetry("work load"))?;
    shell.print(&WorkLoadView::from(load))
}

fn ram_usage(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("ram-usage", args)?;
    let node = shell.client.where_am_i()?;
    let usage = shell
        .client
        .ram_usage(node)?
        .ok_or(ShellError::NoTelemetry("ram usage"))?;
    shell.print(&RamUsageView::from(usage))
}

fn statistics(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("statistics", args)?;
    let data = shell.client.current_node_data()?;
    let info = data.node_info;
    shell.print(&NodeStatistics {
        id: info.node_id.to_string(),
        hostname: info.hostname,
        os: info.os,
        cpu: info.cpu,
        work_load: data.work_load.map(WorkLoadView::from),
        ram_usage: data.ram_usage.map(RamUsageView::from),
    })
}

fn interfaces(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("interfaces", args)?;
    let node = shell.client.where_am_i()?;
    let info = shell
        .client
        .node_info(node)?
        .ok_or(ShellError::UnknownNode)?;
    shell.print(&InterfaceList {
        interfaces: info.interfaces,
    })
}

fn direct_routes(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("direct-routes", args)?;
    let node = shell.client.where_am_i()?;
    let neighbours = shell.client.routes(node)?;
    if neighbours.is_empty() {
        return shell.print(&RouteList { routes: Vec::new() });
    }

    let nodes = shell.client.list_nodes()?;
    let names: BTreeMap<NodeId, String> = Shell::display_names(&nodes).into_iter().collect();
    let name = names.get(&node).cloned().unwrap_or_else(|| node.to_string());
    shell.print(&RouteList {
        routes: vec![route_entry(&names, &name, neighbours)],
    })
}

fn list_actors(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    no_args("list-actors", args)?;
    let node = shell.client.where_am_i()?;
    let listing = shell.client.list_actors(node)?;
    shell.print(&ActorList::from_listing(&listing))
}

/// `send <actor-id> <json>`: deliver a JSON value to an actor on the
/// current node.
fn send(shell: &mut Shell, args: &str) -> Result<(), ShellError> {
    let args = args.trim();
    if args.is_empty() {
        return Err(ShellError::invalid("send", "missing actor ID as first argument"));
    }
    let Some((id, body)) = args.split_once(char::is_whitespace) else {
        return Err(ShellError::invalid(
            "send",
            "invalid format: missing whitespace after actor ID",
        ));
    };
    let id: u32 = id
        .parse()
        .map_err(|_| ShellError::invalid("send", format!("invalid actor ID: {id}")))?;
    let body: serde_json::Value = serde_json::from_str(body.trim())
        .map_err(|_| ShellError::invalid("send", "cannot deserialize a message from given input"))?;

    let node = shell.client.where_am_i()?;
    let actor = shell
        .client
        .actor_handle(node, ActorId::new(id))?
        .ok_or_else(|| ShellError::invalid("send", format!("no actor known with ID {id}")))?;
    debug!(%actor, "sending message");
    shell.courier.deliver(actor, body)
}
