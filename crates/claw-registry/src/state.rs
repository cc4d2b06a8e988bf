//! Registry state.
//!
//! Tracks known nodes with their latest telemetry, direct routes between
//! nodes, actors per node, and the history of visited nodes.

use std::collections::{BTreeMap, BTreeSet};

use claw_probe::{ActorId, ActorRef, NodeData, NodeId, NodeInfo, ProbeEvent, RamUsage, WorkLoad};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Outcome of stepping back in the visited history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Back {
    /// History is exhausted; the shell must return to global mode.
    Leave,
    /// The previous node is now current.
    Continue(NodeId),
}

/// Authoritative store of node telemetry and navigation history.
///
/// Nodes are never removed, so a visited node always stays known.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    /// Known nodes, iterated in ascending ID order.
    nodes: BTreeMap<NodeId, NodeData>,
    /// Visited nodes; the last element is the current node.
    visited: Vec<NodeId>,
    /// Direct routes reported by each node.
    routes: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// Known actors per node, with their names.
    actors: BTreeMap<NodeId, BTreeMap<ActorId, String>>,
}

impl NodeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Telemetry
    // ========================================================================

    /// Insert a node if its ID is unseen.
    ///
    /// Returns `false` for a duplicate announcement; the incoming info is
    /// discarded, not merged.
    pub fn add_node(&mut self, info: NodeInfo) -> bool {
        if self.nodes.contains_key(&info.node_id) {
            return false;
        }
        self.nodes.insert(info.node_id, NodeData::new(info));
        true
    }

    /// Replace the load sample of a known node.
    ///
    /// Returns `false` and changes nothing if the node is unknown.
    pub fn set_work_load(&mut self, wl: WorkLoad) -> bool {
        match self.nodes.get_mut(&wl.node_id) {
            Some(data) => {
                data.work_load = Some(wl);
                true
            }
            None => false,
        }
    }

    /// Replace the memory sample of a known node.
    ///
    /// Returns `false` and changes nothing if the node is unknown.
    pub fn set_ram_usage(&mut self, ru: RamUsage) -> bool {
        match self.nodes.get_mut(&ru.node_id) {
            Some(data) => {
                data.ram_usage = Some(ru);
                true
            }
            None => false,
        }
    }

    /// Record a direct route reported by a known node.
    pub fn add_route(&mut self, from: NodeId, to: NodeId) -> bool {
        if !self.nodes.contains_key(&from) || from == to {
            return false;
        }
        self.routes.entry(from).or_default().insert(to)
    }

    /// Record an actor on a known node.
    pub fn add_actor(&mut self, node: NodeId, actor: ActorId, name: String) -> bool {
        if !self.nodes.contains_key(&node) {
            return false;
        }
        self.actors.entry(node).or_default().insert(actor, name);
        true
    }

    /// Forget an actor. Returns `false` if it was not known.
    pub fn remove_actor(&mut self, node: NodeId, actor: ActorId) -> bool {
        self.actors
            .get_mut(&node)
            .is_some_and(|actors| actors.remove(&actor).is_some())
    }

    /// Apply a telemetry push. Returns whether it changed anything.
    pub fn apply(&mut self, event: ProbeEvent) -> bool {
        match event {
            ProbeEvent::NodeInfo(info) => self.add_node(info),
            ProbeEvent::WorkLoad(wl) => self.set_work_load(wl),
            ProbeEvent::RamUsage(ru) => self.set_ram_usage(ru),
            ProbeEvent::NewRoute { from, to } => self.add_route(from, to),
            ProbeEvent::ActorSpawned { node, actor, name } => self.add_actor(node, actor, name),
            ProbeEvent::ActorExited { node, actor } => self.remove_actor(node, actor),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot of all entries in ascending ID order.
    #[must_use]
    pub fn list_nodes(&self) -> Vec<NodeData> {
        self.nodes.values().cloned().collect()
    }

    /// Number of known nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether a node is known.
    #[must_use]
    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Static info of a node.
    #[must_use]
    pub fn node_info(&self, id: NodeId) -> Option<&NodeInfo> {
        self.nodes.get(&id).map(|data| &data.node_info)
    }

    /// Latest load sample of a node.
    #[must_use]
    pub fn work_load(&self, id: NodeId) -> Option<WorkLoad> {
        self.nodes.get(&id).and_then(|data| data.work_load)
    }

    /// Latest memory sample of a node.
    #[must_use]
    pub fn ram_usage(&self, id: NodeId) -> Option<RamUsage> {
        self.nodes.get(&id).and_then(|data| data.ram_usage)
    }

    /// Direct routes of a node; empty for unknown nodes.
    #[must_use]
    pub fn routes(&self, id: NodeId) -> BTreeSet<NodeId> {
        self.routes.get(&id).cloned().unwrap_or_default()
    }

    /// All nodes whose hostname matches exactly, in ascending ID order.
    #[must_use]
    pub fn nodes_on_host(&self, hostname: &str) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|data| data.node_info.hostname == hostname)
            .map(NodeData::node_id)
            .collect()
    }

    /// Handle of a known actor.
    #[must_use]
    pub fn actor(&self, node: NodeId, actor: ActorId) -> Option<ActorRef> {
        self.actors
            .get(&node)
            .filter(|actors| actors.contains_key(&actor))
            .map(|_| ActorRef { node, actor })
    }

    /// One `<id> <name>` line per known actor of a node, sorted by ID.
    #[must_use]
    pub fn list_actors(&self, node: NodeId) -> String {
        self.actors
            .get(&node)
            .map(|actors| {
                actors
                    .iter()
                    .map(|(id, name)| format!("{id} {name}\n"))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Make `target` the current node.
    ///
    /// The target is pushed onto the history unless it already is the
    /// current node, so the history never holds immediate duplicates.
    pub fn change_node(&mut self, target: NodeId) -> Result<NodeId, RegistryError> {
        if self.nodes.is_empty() {
            return Err(RegistryError::EmptyRegistry);
        }
        if !self.nodes.contains_key(&target) {
            return Err(RegistryError::UnknownNode);
        }
        if self.visited.last() != Some(&target) {
            self.visited.push(target);
        }
        Ok(target)
    }

    /// The current node.
    pub fn where_am_i(&self) -> Result<NodeId, RegistryError> {
        self.visited.last().copied().ok_or(RegistryError::GlobalMode)
    }

    /// Everything known about the current node.
    pub fn current_node_data(&self) -> Result<&NodeData, RegistryError> {
        let current = self.visited.last().ok_or(RegistryError::NotFound)?;
        self.nodes.get(current).ok_or(RegistryError::NotFound)
    }

    /// Drop the whole history, returning to global mode.
    pub fn leave_node(&mut self) {
        self.visited.clear();
    }

    /// Step back to the previously visited node.
    pub fn back(&mut self) -> Back {
        if self.visited.len() <= 1 {
            self.visited.clear();
            return Back::Leave;
        }
        self.visited.pop();
        match self.visited.last() {
            Some(previous) => Back::Continue(*previous),
            None => Back::Leave,
        }
    }

    /// Visited history, oldest first.
    #[must_use]
    pub fn visited(&self) -> &[NodeId] {
        &self.visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claw_probe::{HostId, Protocol};

    fn node(pid: u32) -> NodeId {
        NodeId::new(
            pid,
            HostId::parse("afafafafafafafafafafafafafafafafafafafaf").expect("valid host"),
        )
    }

    fn info(pid: u32, hostname: &str) -> NodeInfo {
        NodeInfo::new(node(pid), hostname, "Linux")
            .with_cpu(4, 2400)
            .with_address("en0", Protocol::Ethernet, "00:00:FF:FF:92:00")
    }

    fn work_load(pid: u32, cpu: f64) -> WorkLoad {
        WorkLoad {
            node_id: node(pid),
            num_processes: 3,
            num_actors: 7,
            cpu_load_percent: cpu,
        }
    }

    fn ram_usage(pid: u32) -> RamUsage {
        RamUsage {
            node_id: node(pid),
            bytes_in_use: 512,
            bytes_available: 1024,
        }
    }

    fn registry_with(pids: &[u32]) -> NodeRegistry {
        let mut reg = NodeRegistry::new();
        for &pid in pids {
            assert!(reg.add_node(info(pid, &format!("host-{pid}"))));
        }
        reg
    }

    #[test]
    fn add_node_twice_keeps_first_announcement() {
        let mut reg = NodeRegistry::new();
        assert!(reg.add_node(info(1, "Sokrates")));
        assert!(!reg.add_node(info(1, "Impostor")));

        let nodes = reg.list_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_info.hostname, "Sokrates");
    }

    #[test]
    fn telemetry_for_unknown_node_is_dropped() {
        let mut reg = registry_with(&[1]);
        assert!(!reg.set_work_load(work_load(2, 10.0)));
        assert!(!reg.set_ram_usage(ram_usage(2)));
        assert!(reg.work_load(node(1)).is_none());
        assert_eq!(reg.node_count(), 1);
    }

    #[test]
    fn telemetry_overwrites_previous_sample() {
        let mut reg = registry_with(&[1]);
        assert!(reg.set_work_load(work_load(1, 10.0)));
        assert!(reg.set_work_load(work_load(1, 55.5)));
        assert!(reg.set_ram_usage(ram_usage(1)));

        let wl = reg.work_load(node(1)).expect("work load set");
        assert!((wl.cpu_load_percent - 55.5).abs() < f64::EPSILON);
        assert_eq!(reg.ram_usage(node(1)), Some(ram_usage(1)));
    }

    #[test]
    fn list_nodes_is_sorted_by_id() {
        let reg = registry_with(&[1231, 42, 123]);
        let ids: Vec<_> = reg.list_nodes().iter().map(NodeData::node_id).collect();
        assert_eq!(ids, vec![node(42), node(123), node(1231)]);
    }

    #[test]
    fn node_info_lookup() {
        let reg = registry_with(&[1]);
        assert_eq!(reg.node_info(node(1)).map(|i| i.hostname.as_str()), Some("host-1"));
        assert!(reg.node_info(node(2)).is_none());
        assert!(reg.has_node(node(1)));
        assert!(!reg.has_node(node(2)));
    }

    #[test]
    fn change_node_on_empty_registry_fails() {
        let mut reg = NodeRegistry::new();
        assert_eq!(reg.change_node(node(1)), Err(RegistryError::EmptyRegistry));
        assert!(reg.visited().is_empty());
    }

    #[test]
    fn change_node_to_unknown_fails() {
        let mut reg = registry_with(&[1]);
        assert_eq!(reg.change_node(node(9)), Err(RegistryError::UnknownNode));
        assert!(reg.visited().is_empty());
    }

    #[test]
    fn change_node_suppresses_duplicate_top() {
        let mut reg = registry_with(&[1, 2]);
        assert_eq!(reg.change_node(node(1)), Ok(node(1)));
        assert_eq!(reg.change_node(node(1)), Ok(node(1)));
        assert_eq!(reg.visited().len(), 1);
        assert_eq!(reg.back(), Back::Leave);
        assert!(reg.visited().is_empty());
    }

    #[test]
    fn back_returns_to_previous_node() {
        let mut reg = registry_with(&[1, 2]);
        reg.change_node(node(1)).expect("known");
        reg.change_node(node(2)).expect("known");
        assert_eq!(reg.back(), Back::Continue(node(1)));
        assert_eq!(reg.where_am_i(), Ok(node(1)));
    }

    #[test]
    fn queries_in_global_mode_fail_cleanly() {
        let mut reg = registry_with(&[1]);
        assert_eq!(reg.where_am_i(), Err(RegistryError::GlobalMode));
        assert_eq!(reg.current_node_data(), Err(RegistryError::NotFound));
        assert_eq!(reg.back(), Back::Leave);
    }

    #[test]
    fn leave_node_clears_whole_history() {
        let mut reg = registry_with(&[1, 2, 3]);
        for pid in [1, 2, 3] {
            reg.change_node(node(pid)).expect("known");
        }
        reg.leave_node();
        assert!(reg.visited().is_empty());
        assert_eq!(reg.where_am_i(), Err(RegistryError::GlobalMode));
    }

    #[test]
    fn current_node_data_includes_telemetry() {
        let mut reg = registry_with(&[1]);
        reg.set_work_load(work_load(1, 3.0));
        reg.change_node(node(1)).expect("known");
        let data = reg.current_node_data().expect("current node");
        assert_eq!(data.node_id(), node(1));
        assert!(data.work_load.is_some());
        assert!(data.ram_usage.is_none());
    }

    #[test]
    fn nodes_on_host_matches_exact_hostname() {
        let mut reg = NodeRegistry::new();
        reg.add_node(info(1, "Platon"));
        reg.add_node(info(2, "Platon"));
        reg.add_node(info(3, "Sokrates"));
        assert_eq!(reg.nodes_on_host("Platon"), vec![node(1), node(2)]);
        assert_eq!(reg.nodes_on_host("Sokrates"), vec![node(3)]);
        assert!(reg.nodes_on_host("platon").is_empty());
    }

    #[test]
    fn routes_require_known_source() {
        let mut reg = registry_with(&[1, 2]);
        assert!(reg.add_route(node(1), node(2)));
        assert!(!reg.add_route(node(1), node(2)));
        assert!(!reg.add_route(node(9), node(1)));
        assert!(!reg.add_route(node(1), node(1)));
        assert_eq!(reg.routes(node(1)).into_iter().collect::<Vec<_>>(), vec![node(2)]);
        assert!(reg.routes(node(2)).is_empty());
    }

    #[test]
    fn actor_directory() {
        let mut reg = registry_with(&[1]);
        assert!(reg.add_actor(node(1), ActorId::new(7), "logger".into()));
        assert!(reg.add_actor(node(1), ActorId::new(3), "worker".into()));
        assert!(!reg.add_actor(node(2), ActorId::new(1), "ghost".into()));

        assert_eq!(reg.list_actors(node(1)), "3 worker\n7 logger\n");
        assert_eq!(
            reg.actor(node(1), ActorId::new(7)),
            Some(ActorRef {
                node: node(1),
                actor: ActorId::new(7)
            })
        );
        assert!(reg.actor(node(1), ActorId::new(8)).is_none());

        assert!(reg.remove_actor(node(1), ActorId::new(7)));
        assert!(!reg.remove_actor(node(1), ActorId::new(7)));
        assert_eq!(reg.list_actors(node(1)), "3 worker\n");
        assert_eq!(reg.list_actors(node(2)), "");
    }

    #[test]
    fn apply_dispatches_events() {
        let mut reg = NodeRegistry::new();
        assert!(reg.apply(ProbeEvent::NodeInfo(info(1, "a"))));
        assert!(reg.apply(ProbeEvent::WorkLoad(work_load(1, 1.0))));
        assert!(reg.apply(ProbeEvent::RamUsage(ram_usage(1))));
        assert!(!reg.apply(ProbeEvent::RamUsage(ram_usage(2))));
        assert!(reg.apply(ProbeEvent::ActorSpawned {
            node: node(1),
            actor: ActorId::new(1),
            name: "a".into(),
        }));
        assert!(reg.apply(ProbeEvent::ActorExited {
            node: node(1),
            actor: ActorId::new(1),
        }));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Nav {
            Change(u32),
            Back,
            Leave,
        }

        fn nav() -> impl Strategy<Value = Nav> {
            prop_oneof![
                (0u32..5).prop_map(Nav::Change),
                Just(Nav::Back),
                Just(Nav::Leave),
            ]
        }

        proptest! {
            #[test]
            fn add_is_idempotent(pid in 1u32..10_000, host in "[a-z]{1,12}") {
                let mut reg = NodeRegistry::new();
                let first = reg.add_node(info(pid, &host));
                let second = reg.add_node(info(pid, "other"));
                prop_assert_eq!((first, second), (true, false));
                let matching = reg.list_nodes().iter().filter(|d| d.node_id() == node(pid)).count();
                prop_assert_eq!(matching, 1);
            }

            #[test]
            fn updates_for_unknown_nodes_change_nothing(
                known in prop::collection::btree_set(1u32..50, 0..5),
                stranger in 50u32..100,
            ) {
                let mut reg = NodeRegistry::new();
                for pid in &known {
                    reg.add_node(info(*pid, "h"));
                }
                let before = reg.list_nodes();
                prop_assert!(!reg.set_work_load(work_load(stranger, 50.0)));
                prop_assert!(!reg.set_ram_usage(ram_usage(stranger)));
                prop_assert_eq!(reg.list_nodes(), before);
            }

            #[test]
            fn history_follows_stack_model(ops in prop::collection::vec(nav(), 0..40)) {
                // Nodes 1..=3 are known; 0 and 4 never are.
                let mut reg = registry_with(&[1, 2, 3]);
                let mut model: Vec<NodeId> = Vec::new();

                for op in ops {
                    match op {
                        Nav::Change(pid) => {
                            let before = reg.visited().len();
                            let result = reg.change_node(node(pid));
                            if (1..=3).contains(&pid) {
                                prop_assert_eq!(result, Ok(node(pid)));
                                if model.last() != Some(&node(pid)) {
                                    model.push(node(pid));
                                } else {
                                    prop_assert_eq!(reg.visited().len(), before);
                                }
                            } else {
                                prop_assert_eq!(result, Err(RegistryError::UnknownNode));
                            }
                        }
                        Nav::Back => {
                            let expected = if model.len() <= 1 {
                                model.clear();
                                Back::Leave
                            } else {
                                model.pop();
                                Back::Continue(*model.last().expect("non-empty"))
                            };
                            prop_assert_eq!(reg.back(), expected);
                        }
                        Nav::Leave => {
                            reg.leave_node();
                            model.clear();
                        }
                    }

                    prop_assert_eq!(reg.visited(), model.as_slice());
                    prop_assert_eq!(reg.where_am_i().is_ok(), !model.is_empty());
                    if let Some(top) = reg.visited().last() {
                        prop_assert!(reg.has_node(*top));
                    }
                    prop_assert!(reg.visited().windows(2).all(|w| w[0] != w[1]));
                }
            }
        }
    }
}
