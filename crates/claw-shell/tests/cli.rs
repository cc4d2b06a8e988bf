//! Tests of the `clawsh` binary.

use std::io::Write;

use assert_cmd::Command;
use claw_probe::{HostId, NodeId, NodeInfo, ProbeEvent, WorkLoad};
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn clawsh() -> Command {
    let mut cmd = Command::cargo_bin("clawsh").expect("binary built");
    cmd.env_remove("CLAWSH_NEXUS")
        .env_remove("CLAWSH_HISTORY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn invalid_nexus_exits_with_config_code() {
    clawsh()
        .args(["--nexus", "localhost", "-c", "quit"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("nexus must be host:port"));
}

#[test]
fn invalid_bar_width_exits_with_config_code() {
    clawsh()
        .args(["--nexus", "localhost:4242", "--bar-width", "0", "-c", "quit"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("bar width"));
}

#[test]
fn malformed_arguments_exit_with_config_code() {
    clawsh()
        .args(["--nexus", "localhost:4242", "--bar-width", "abc", "-c", "quit"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("--bar-width"));

    clawsh().args(["-c", "quit"]).assert().code(64);

    clawsh()
        .args(["--nexus", "localhost:4242", "--frobnicate"])
        .assert()
        .code(64);
}

#[test]
fn help_and_version_exit_cleanly() {
    clawsh()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--nexus"));

    clawsh()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("clawsh"));
}

#[test]
fn missing_script_exits_with_config_code() {
    clawsh()
        .args(["--nexus", "localhost:4242", "--script", "/nonexistent/clawsh-script"])
        .assert()
        .code(64);
}

#[test]
fn scripted_session_lists_sample_nodes() {
    clawsh()
        .args([
            "--nexus",
            "localhost:4242",
            "-c",
            "test-nodes",
            "-c",
            "list-nodes",
            "-c",
            "quit",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sokrates:42"))
        .stdout(predicate::str::contains("hostname123:1231"));
}

#[test]
fn unknown_command_is_reported_on_stdout() {
    clawsh()
        .args(["--nexus", "localhost:4242", "-c", "frobnicate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown command"));
}

#[test]
fn script_file_runs_until_end_of_input() {
    let mut script = NamedTempFile::new().expect("temp file");
    writeln!(script, "echo from a script").expect("write");
    writeln!(script, "echo second line").expect("write");

    clawsh()
        .arg("--nexus")
        .arg("localhost:4242")
        .arg("--script")
        .arg(script.path())
        .assert()
        .success()
        .stdout("from a script\nsecond line\n");
}

#[test]
fn probe_file_is_replayed_before_first_command() {
    let id = NodeId::new(7, HostId::from_bytes([0x0f; 20]));
    let events = [
        ProbeEvent::NodeInfo(NodeInfo::new(id, "replayed", "Linux").with_cpu(8, 3000)),
        ProbeEvent::WorkLoad(WorkLoad {
            node_id: id,
            num_processes: 12,
            num_actors: 4,
            cpu_load_percent: 50.0,
        }),
    ];
    let mut probe = NamedTempFile::new().expect("temp file");
    for event in &events {
        writeln!(probe, "{}", event.to_json().expect("encode")).expect("write");
    }

    clawsh()
        .arg("--nexus")
        .arg("localhost:4242")
        .arg("--probe-file")
        .arg(probe.path())
        .args(["-c", "change-node replayed", "-c", "work-load", "-c", "whereami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processes:  12"))
        .stdout(predicate::str::contains("CPU: ["))
        .stdout(predicate::str::ends_with("replayed\n"));
}

#[test]
fn json_format_emits_json() {
    clawsh()
        .args([
            "--nexus",
            "localhost:4242",
            "--format",
            "json",
            "-c",
            "echo hi",
        ])
        .assert()
        .success()
        .stdout("{\"message\":\"hi\"}\n");
}
