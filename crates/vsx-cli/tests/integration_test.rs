//! Integration tests for the VSX status pipeline.
//!
//! The first half drives the library on fixture files; the second half runs
//! the built `vsx-cli` binary end to end.

use std::path::PathBuf;
use std::process::{Command, Output};

use vsx_core::{
    ContextKind, FullVsid, InterfaceStatus, ParseConfig, UnterminatedTablePolicy, VlanPeers,
    VsKind, VsxError, VsxErrorCode,
};
use vsx_parser::{parse, parse_with_config};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("fixture should be readable")
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vsx-cli"))
        .args(args)
        .output()
        .expect("vsx-cli should start")
}

/// Two gateways, a root context, a virtual switch and shared VLANs.
#[test]
fn two_gateway_dump_builds_full_inventory() {
    let parsed = parse(&fixture("two_gateways.txt")).expect("fixture parses");
    let inventory = &parsed.inventory;

    assert!(parsed.warnings.is_empty(), "warnings: {:?}", parsed.warnings);
    assert_eq!(inventory.sorted_gateways(), vec!["fw-a", "fw-b"]);
    assert_eq!(inventory.gateways["fw-a"].len(), 4);
    assert_eq!(inventory.gateways["fw-b"].len(), 2);
    assert_eq!(inventory.vs_count(), 6);

    let dmz = inventory.record("fw-a", 1).expect("fw-a dmz exists");
    assert_eq!(dmz.name.as_deref(), Some("fw-a_VS_dmz"));
    assert_eq!(dmz.policy.as_deref(), Some("DMZ_Policy"));
    assert_eq!(dmz.installed_time.as_deref(), Some("13Mar2024 10:14"));
    assert_eq!(dmz.required_interfaces, Some(2));
    assert_eq!(dmz.required_secure_interfaces, Some(1));
    assert_eq!(dmz.virtual_cluster_interfaces, Some(2));
    assert_eq!(
        dmz.physical_interfaces.as_ref().expect("physical map")["eth1"],
        InterfaceStatus::new("UP", "sync(secured), unicast")
    );
    assert_eq!(dmz.secured_interface_count(), 1);
    assert!(!dmz.has_insufficient_secured_interfaces());

    let internal = inventory.record("fw-a", 2).expect("fw-a internal exists");
    assert!(internal.has_insufficient_secured_interfaces());

    let root = inventory.record("fw-a", 0).expect("fw-a root exists");
    assert_eq!(root.kind(), VsKind::VirtualRouter);
    assert_eq!(root.installed_time.as_deref(), Some(""));

    let core = inventory.record("fw-a", 3).expect("fw-a switch exists");
    assert!(core.is_virtual_switch);
    assert_eq!(core.kind(), VsKind::VirtualSwitch);
    assert_eq!(core.display_name("fw-a"), "core");
}

#[test]
fn two_gateway_dump_indexes_vlans_and_interfaces() {
    let parsed = parse(&fixture("two_gateways.txt")).expect("fixture parses");
    let inventory = &parsed.inventory;

    assert_eq!(inventory.sorted_vlan_ids(), vec!["101", "102", "200"]);
    assert_eq!(inventory.vlans["101"], vec!["fw-a+1", "fw-b+1"]);
    assert_eq!(inventory.vlans["200"], vec!["fw-a+2", "fw-a+3"]);
    assert!(
        !inventory.vlans.keys().any(|vlan| vlan.contains("wrp")),
        "wrp interfaces must not feed the VLAN index"
    );

    assert_eq!(inventory.physical_interfaces.len(), 5);
    assert_eq!(inventory.physical_interfaces["fw-a-eth1"], vec!["fw-a+1", "fw-a+2"]);
    assert_eq!(inventory.physical_interfaces["fw-a-Sync"], vec!["fw-a+0"]);
    assert_eq!(inventory.physical_interfaces["fw-b-eth1"], vec!["fw-b+1"]);

    let internal = FullVsid::new("fw-a", 2);
    assert_eq!(inventory.vlans_for(&internal), vec!["102", "200"]);
    assert_eq!(inventory.vlan_peers("102", &internal), Some(VlanPeers::Direct));
    assert_eq!(
        inventory.vlan_peers("200", &internal),
        Some(VlanPeers::Shared(vec!["fw-a+3"]))
    );

    let fw_a_interfaces: Vec<&str> = inventory
        .gateway_physical_interfaces("fw-a")
        .into_iter()
        .map(|(interface, _)| interface)
        .collect();
    assert_eq!(fw_a_interfaces, vec!["Sync", "bond0", "eth1", "eth2"]);

    let (found, _) = inventory
        .find_by_name_suffix("_VS_internal")
        .expect("suffix lookup finds internal");
    assert_eq!(found, internal);
}

#[test]
fn parse_is_deterministic_on_fixture() {
    let input = fixture("two_gateways.txt");
    assert_eq!(parse(&input), parse(&input));
}

#[test]
fn duplicate_fixture_reports_second_row() {
    let error = parse(&fixture("duplicate_vsid.txt")).expect_err("duplicate fails");
    assert_eq!(error.code(), VsxErrorCode::DuplicateVsid);
    assert_eq!(error.line(), 8);
    assert!(matches!(error, VsxError::DuplicateVsid { vsid: 1, .. }));
}

#[test]
fn unterminated_fixture_honours_policy() {
    let input = fixture("unterminated_table.txt");
    let error = parse(&input).expect_err("unterminated table fails by default");
    assert_eq!(error.code(), VsxErrorCode::UnterminatedTable);
    assert_eq!(error.line(), 3);

    let config = ParseConfig {
        unterminated_table: UnterminatedTablePolicy::Warn,
        ..ParseConfig::default()
    };
    let parsed = parse_with_config(&input, &config).expect("warn policy parses");
    assert_eq!(parsed.warnings.len(), 1);
    assert!(parsed.inventory.record("fw-c", 1).is_some());
}

#[test]
fn missing_context_is_reported_with_line() {
    let error = parse("\n\neth0 UP\n").expect_err("no gateway");
    assert_eq!(error.line(), 3);
    assert!(matches!(
        error,
        VsxError::MissingContext {
            missing: ContextKind::Gateway,
            ..
        }
    ));
}

// =============================================================================
// Binary
// =============================================================================

#[test]
fn cli_parse_prints_evidence_summary() {
    let path = fixture_path("two_gateways.txt");
    let output = run_cli(&["parse", path.to_str().expect("utf-8 path")]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("summary is JSON");
    assert_eq!(summary["gateway_count"], 2);
    assert_eq!(summary["vs_count"], 6);
    assert_eq!(summary["virtual_switch_count"], 1);
    assert_eq!(summary["vlan_count"], 3);
    assert_eq!(summary["physical_interface_count"], 5);
}

#[test]
fn cli_parse_full_round_trips_inventory() {
    let path = fixture_path("two_gateways.txt");
    let output = run_cli(&["parse", "--full", "--pretty", path.to_str().expect("utf-8 path")]);
    assert!(output.status.success());

    let inventory: vsx_core::VsxInventory =
        serde_json::from_slice(&output.stdout).expect("inventory is JSON");
    let expected = parse(&fixture("two_gateways.txt")).expect("fixture parses");
    assert_eq!(inventory, expected.inventory);
}

#[test]
fn cli_validate_flags_duplicate_vsid() {
    let path = fixture_path("duplicate_vsid.txt");
    let output = run_cli(&["validate", "--json", path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("report is JSON");
    assert_eq!(report["valid"], false);
    assert_eq!(report["errors"][0]["code"], "vsx/error/duplicate-vsid");
    assert_eq!(report["errors"][0]["line"], 8);
}

#[test]
fn cli_validate_strict_fails_on_warnings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("vsx.toml");
    std::fs::write(&config, "unterminated_table = \"warn\"\n").expect("write config");
    let input = fixture_path("unterminated_table.txt");
    let config = config.to_str().expect("utf-8 path");
    let input = input.to_str().expect("utf-8 path");

    let lenient = run_cli(&["validate", "--config", config, input]);
    assert!(lenient.status.success());

    let strict = run_cli(&["validate", "--strict", "--json", "--config", config, input]);
    assert_eq!(strict.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&strict.stdout).expect("report is JSON");
    assert_eq!(report["warnings"][0]["code"], "vsx/warn/unterminated-table");
}

#[test]
fn cli_concatenates_inputs_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let header = dir.path().join("header.txt");
    let body = dir.path().join("body.txt");
    std::fs::write(&header, "Name: fw-x").expect("write header");
    std::fs::write(&body, "vsid 4:\nRequired interfaces: 1\neth0 UP\n").expect("write body");

    let output = run_cli(&[
        "parse",
        "--full",
        header.to_str().expect("utf-8 path"),
        body.to_str().expect("utf-8 path"),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let inventory: vsx_core::VsxInventory =
        serde_json::from_slice(&output.stdout).expect("inventory is JSON");
    assert_eq!(inventory.physical_interfaces["fw-x-eth0"], vec!["fw-x+4"]);
}

#[test]
fn cli_inspect_filters_by_gateway() {
    let path = fixture_path("two_gateways.txt");
    let output = run_cli(&["inspect", "--gateway", "fw-b", path.to_str().expect("utf-8 path")]);
    assert!(output.status.success());

    let text = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(text.starts_with("Gateway fw-b (2 virtual systems)"));
    assert!(!text.contains("Gateway fw-a"));
    assert!(text.contains("vlan 101: shared with dmz (fw-a+1)"));
}

#[test]
fn cli_reports_missing_file() {
    let output = run_cli(&["parse", "/definitely/not/here.txt"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read file"));
}
