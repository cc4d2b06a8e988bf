//! Fixed sample fleet loaded by `test-nodes`.

use claw_probe::{ActorId, HostId, NodeId, NodeInfo, ProbeEvent, Protocol, RamUsage, WorkLoad};

use crate::error::ShellError;

const SOKRATES_HOST: &str = "afafafafafafafafafafafafafafafafafafafaf";
const PLATON_HOST: &str = "bfbfbfbfbfbfbfbfbfbfbfbfbfbfbfbfbfbfbfbf";
const BSD_HOST: &str = "000000000fbfbfbfbfbfbfbfbfbfbfbfbfbfbfbf";

fn node(pid: u32, host: &str) -> Result<NodeId, ShellError> {
    let host = HostId::parse(host).map_err(|e| ShellError::Format(e.to_string()))?;
    Ok(NodeId::new(pid, host))
}

fn work_load(node_id: NodeId, num_processes: u32, num_actors: u32, cpu: f64) -> ProbeEvent {
    ProbeEvent::WorkLoad(WorkLoad {
        node_id,
        num_processes,
        num_actors,
        cpu_load_percent: cpu,
    })
}

fn ram_usage(node_id: NodeId, bytes_in_use: u64, bytes_available: u64) -> ProbeEvent {
    ProbeEvent::RamUsage(RamUsage {
        node_id,
        bytes_in_use,
        bytes_available,
    })
}

fn actor(node: NodeId, id: u32, name: &str) -> ProbeEvent {
    ProbeEvent::ActorSpawned {
        node,
        actor: ActorId::new(id),
        name: name.to_string(),
    }
}

/// Telemetry for three nodes, in the order a live fleet would push it.
pub fn sample_fleet() -> Result<Vec<ProbeEvent>, ShellError> {
    let sokrates = node(42, SOKRATES_HOST)?;
    let platon = node(123, PLATON_HOST)?;
    let bsd = node(1231, BSD_HOST)?;

    Ok(vec![
        ProbeEvent::NodeInfo(
            NodeInfo::new(sokrates, "Sokrates", "Mac OS X")
                .with_cpu(2, 2300)
                .with_address("en0", Protocol::Ethernet, "00:00:FF:FF:92:00"),
        ),
        work_load(sokrates, 5, 3, 0.0),
        ram_usage(sokrates, 512, 1024),
        ProbeEvent::NodeInfo(
            NodeInfo::new(platon, "Platon", "Linux")
                .with_cpu(4, 1500)
                .with_cpu(32, 3500)
                .with_address("wlan0", Protocol::Ethernet, "00:00:FF:FF:00:00")
                .with_address("wlan0", Protocol::Ipv4, "192.168.0.23"),
        ),
        work_load(platon, 20, 3, 10.0),
        ram_usage(platon, 1024, 8096),
        ProbeEvent::NodeInfo(
            NodeInfo::new(bsd, "hostname123", "BSD")
                .with_cpu(4, 1500)
                .with_cpu(8, 2500)
                .with_cpu(64, 5500)
                .with_address("en1", Protocol::Ethernet, "00:00:FF:FF:00:00"),
        ),
        work_load(bsd, 20, 3, 23.0),
        ram_usage(bsd, 1024, 8096),
        ProbeEvent::NewRoute {
            from: sokrates,
            to: platon,
        },
        ProbeEvent::NewRoute {
            from: platon,
            to: bsd,
        },
        actor(sokrates, 1, "logger"),
        actor(sokrates, 2, "scheduler"),
        actor(platon, 1, "worker"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use claw_registry::NodeRegistry;

    #[test]
    fn every_sample_event_applies() {
        let mut reg = NodeRegistry::new();
        for event in sample_fleet().expect("valid samples") {
            let kind = event.kind();
            assert!(reg.apply(event), "{kind} was dropped");
        }
        assert_eq!(reg.node_count(), 3);
    }

    #[test]
    fn sample_hosts_are_distinct() {
        let events = sample_fleet().expect("valid samples");
        let hosts: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ProbeEvent::NodeInfo(info) => Some(info.hostname.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(hosts, vec!["Sokrates", "Platon", "hostname123"]);
    }
}
