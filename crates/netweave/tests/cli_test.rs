//! Integration tests for the `netweave` CLI binary.
//!
//! These tests run against a fixture snapshot written to a temp directory,
//! with config directories isolated from the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

const SNAPSHOT: &str = r#"{
    "routers": [
        {"routerid": 1, "routername": "R1", "projectid": 1},
        {"routerid": 2, "routername": "R2", "projectid": 1}
    ],
    "switches": [
        {"switchid": 10, "switchname": "SW1", "projectid": 1},
        {"switchid": 11, "switchname": "SW2", "projectid": 1},
        {"switchid": 12, "switchname": "SW3", "projectid": 1}
    ],
    "hosts": [{"hostid": 20, "hostname": "h1", "projectid": 1, "defaultgateway": 2}],
    "routerSwitch": [
        {"projectid": 1, "routerid": 1, "switchid": 10, "portname": "R1SW1",
         "interfacename": "eth0", "configuration": {"10.0.0.1": "255.255.255.252"}},
        {"projectid": 1, "routerid": 2, "switchid": 11, "portname": "R2SW2",
         "interfacename": "eth0", "configuration": {"10.0.1.1": "255.255.255.252"}}
    ],
    "switchSwitch": [
        {"projectid": 1, "switchid_src": 10, "switchid_dst": 11, "portname": "SW1SW2"},
        {"projectid": 1, "switchid_src": 11, "switchid_dst": 10, "portname": "SW2SW1"},
        {"projectid": 1, "switchid_src": 11, "switchid_dst": 12, "portname": "SW2SW3"}
    ]
}"#;

/// Two projects sharing the switch name SW1; only project 2 reaches X.
const TWO_PROJECTS: &str = r#"{
    "routers": [
        {"routerid": 1, "routername": "R1", "projectid": 1},
        {"routerid": 2, "routername": "R2", "projectid": 1},
        {"routerid": 3, "routername": "R2", "projectid": 2}
    ],
    "switches": [
        {"switchid": 10, "switchname": "SW1", "projectid": 1},
        {"switchid": 11, "switchname": "SW2", "projectid": 1},
        {"switchid": 20, "switchname": "SW1", "projectid": 2},
        {"switchid": 21, "switchname": "X", "projectid": 2}
    ],
    "routerSwitch": [
        {"projectid": 1, "routerid": 1, "switchid": 10, "portname": "R1SW1", "configuration": {}},
        {"projectid": 1, "routerid": 2, "switchid": 11, "portname": "R2SW2", "configuration": {}},
        {"projectid": 2, "routerid": 3, "switchid": 21, "portname": "R2X", "configuration": {}}
    ],
    "switchSwitch": [
        {"projectid": 1, "switchid_src": 10, "switchid_dst": 11, "portname": "SW1SW2"},
        {"projectid": 1, "switchid_src": 11, "switchid_dst": 10, "portname": "SW2SW1"},
        {"projectid": 2, "switchid_src": 20, "switchid_dst": 21, "portname": "SW1X"}
    ]
}"#;

struct Fixture {
    dir: TempDir,
    snapshot: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        Self::with_snapshot(SNAPSHOT)
    }

    fn with_snapshot(contents: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("topology.json");
        std::fs::write(&snapshot, contents).unwrap();
        Self { dir, snapshot }
    }

    /// `netweave` with the fixture snapshot and an isolated config dir.
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = netweave_cmd(self.dir.path());
        cmd.arg("--snapshot").arg(&self.snapshot);
        cmd
    }
}

/// Build a [`Command`] for the `netweave` binary with env isolation.
///
/// Clears all `NETWEAVE_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn netweave_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netweave");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env_remove("RUST_LOG")
        .env_remove("NO_COLOR")
        .env_remove("NETWEAVE_SNAPSHOT")
        .env_remove("NETWEAVE_PROFILE")
        .env_remove("NETWEAVE_PROJECT")
        .env_remove("NETWEAVE_OUTPUT")
        .env_remove("NETWEAVE_DEFAULT_PROFILE");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = netweave_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let dir = tempfile::tempdir().unwrap();
    netweave_cmd(dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("topology")
            .and(predicate::str::contains("links"))
            .and(predicate::str::contains("intent"))
            .and(predicate::str::contains("subnet")),
    );
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    netweave_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netweave"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    netweave_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let dir = tempfile::tempdir().unwrap();
    netweave_cmd(dir.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Subnet Table ────────────────────────────────────────────────────

#[test]
fn test_subnet_lookup_both_directions() {
    let dir = tempfile::tempdir().unwrap();
    netweave_cmd(dir.path())
        .args(["-o", "plain", "subnet", "lookup", "/24"])
        .assert()
        .success()
        .stdout("255.255.255.0\n");
    netweave_cmd(dir.path())
        .args(["-o", "plain", "subnet", "lookup", "255.255.255.252"])
        .assert()
        .success()
        .stdout("30\n");
}

#[test]
fn test_subnet_lookup_rejects_out_of_table_prefix() {
    let dir = tempfile::tempdir().unwrap();
    netweave_cmd(dir.path())
        .args(["subnet", "lookup", "31"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown subnet mask"));
}

#[test]
fn test_subnet_list_json_covers_table() {
    let dir = tempfile::tempdir().unwrap();
    let output = netweave_cmd(dir.path())
        .args(["-o", "json", "subnet", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 23);
    assert_eq!(entries[0]["prefix"], 8);
    assert_eq!(entries[22]["mask"], "255.255.255.252");
}

// ── Links ───────────────────────────────────────────────────────────

#[test]
fn test_links_list_plain() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["-o", "plain", "links", "list", "--kind", "switch-switch"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("switchSwitch/1/10/11")
                .and(predicate::str::contains("switchSwitch/1/11/10"))
                .and(predicate::str::contains("routerSwitch").not()),
        );
}

#[test]
fn test_plan_create_mirrors_switch_link() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["-o", "plain", "links", "plan-create", "switch-switch", "SW1", "SW3"])
        .assert()
        .success()
        .stdout("create switchSwitch/1/10/12\ncreate switchSwitch/1/12/10\n");
}

#[test]
fn test_plan_create_rejects_self_loop() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["links", "plan-create", "switch-switch", "SW1", "SW1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be linked to itself"));
}

#[test]
fn test_plan_create_unknown_switch_is_not_found() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["links", "plan-create", "switch-switch", "SW1", "SW9"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("switch 'SW9' not found"));
}

#[test]
fn test_plan_delete_takes_mirror() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["-o", "plain", "links", "plan-delete", "switchSwitch/1/10/11"])
        .assert()
        .success()
        .stdout("delete switchSwitch/1/10/11\ndelete switchSwitch/1/11/10\n");
}

#[test]
fn test_apply_requires_confirmation_without_tty() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["links", "plan-delete", "switchSwitch/1/10/11", "--apply"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Confirmation required"));
    let unchanged = std::fs::read_to_string(&fx.snapshot).unwrap();
    assert_eq!(unchanged, SNAPSHOT);
}

#[test]
fn test_audit_repair_restores_mirror() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["-o", "plain", "links", "audit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("missing-reverse SW2SW3"));

    fx.cmd()
        .args(["-y", "links", "audit", "--repair", "--apply"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Applied 1 command(s)"));

    fx.cmd()
        .args(["--color", "never", "links", "audit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All switch links are mirrored"));
}

// ── Routers ─────────────────────────────────────────────────────────

#[test]
fn test_router_link_edit_keeps_interface() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["-o", "plain", "router", "plan-link", "R1", "SW1", "--ip", "10.0.0.5/30"])
        .assert()
        .success()
        .stdout("update routerSwitch/1/1/10\n");
}

#[test]
fn test_router_link_rejects_duplicate_address() {
    let fx = Fixture::new();
    fx.cmd()
        .args([
            "router", "plan-link", "R1", "SW3", "--ip", "10.0.2.1/30", "--ip", "10.0.2.1/24",
        ])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("allocation failed"));
}

#[test]
fn test_router_interfaces_plain() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["-o", "plain", "router", "interfaces", "R2"])
        .assert()
        .success()
        .stdout("eth0\n");
}

// ── Intents ─────────────────────────────────────────────────────────

#[test]
fn test_intent_paths_plain() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["-o", "plain", "intent", "paths", "R1", "R2"])
        .assert()
        .success()
        .stdout("R1 SW1 SW2 R2\n");
}

#[test]
fn test_intent_next_hops() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["-o", "plain", "intent", "next-hops", "R1", "SW1"])
        .assert()
        .success()
        .stdout("SW2\n");
}

#[test]
fn test_intent_check_rejects_repeated_node() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["intent", "check", "R1", "SW1", "R1"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("more than once"));
}

#[test]
fn test_intent_cannot_cross_into_another_project() {
    let fx = Fixture::with_snapshot(TWO_PROJECTS);
    let intent = fx.dir.path().join("intent.json");
    std::fs::write(
        &intent,
        r#"{"projectid": 1, "source": "R1", "sourcekey": "10.0.0.1",
            "intermediate": ["SW1", "X"], "destination": "R2",
            "destkey": "10.0.1.1", "ethertype": "IPV4"}"#,
    )
    .unwrap();

    fx.cmd()
        .args(["intent", "check", "--from-file"])
        .arg(&intent)
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Invalid path"));

    fx.cmd()
        .args(["-o", "plain", "intent", "paths", "R1", "R2"])
        .assert()
        .success()
        .stdout("R1 SW1 SW2 R2\n");
}

#[test]
fn test_shared_node_name_needs_a_project() {
    let fx = Fixture::with_snapshot(TWO_PROJECTS);
    fx.cmd()
        .args(["intent", "next-hops", "SW1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--project"));

    fx.cmd()
        .args(["-o", "plain", "-p", "2", "intent", "next-hops", "SW1"])
        .assert()
        .success()
        .stdout("X\n");
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_missing_snapshot_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    netweave_cmd(dir.path())
        .args(["links", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No topology snapshot configured"));
}

#[test]
fn test_config_init_creates_usable_profile() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["--project", "1", "config", "init"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Configuration written"));

    // The profile now supplies the snapshot.
    netweave_cmd(fx.dir.path())
        .args(["-o", "plain", "intent", "destinations", "R1", "SW1", "SW2"])
        .assert()
        .success()
        .stdout("R2\n");

    netweave_cmd(fx.dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("topology.json"));
}

#[test]
fn test_unknown_profile_lists_alternatives() {
    let dir = tempfile::tempdir().unwrap();
    netweave_cmd(dir.path())
        .args(["--profile", "prod", "links", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Profile 'prod' not found"));
}
