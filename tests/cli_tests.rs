use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn recliq_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("recliq"))
}

/// Initialize a fresh config directory inside `temp_dir`.
fn init_config(temp_dir: &TempDir) -> PathBuf {
    let config_path = temp_dir.path().join("recliq-config");
    recliq_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    config_path
}

fn run_in(config_path: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    recliq_cmd()
        .args(["-C", config_path.to_str().unwrap()])
        .args(args)
        .assert()
}

#[test]
fn test_help() {
    recliq_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("RecliQ finance back-office lists"));
}

#[test]
fn test_version() {
    recliq_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("recliq"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("recliq-config");

    recliq_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized recliq config"));

    assert!(config_path.join("config.toml").exists());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["init"])
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_list_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    run_in(&config_path, &["list", "payments"])
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_datasets() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["datasets"])
        .success()
        .stdout(predicate::str::contains("payments"))
        .stdout(predicate::str::contains("escrows"))
        .stdout(predicate::str::contains("users"))
        .stdout(predicate::str::contains("enterprise-payments.csv"));
}

#[test]
fn test_unknown_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["list", "invoices"])
        .failure()
        .stderr(predicate::str::contains("Unknown dataset 'invoices'"));
}

#[test]
fn test_list_first_page() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["list", "payments"])
        .success()
        .stdout(predicate::str::contains("EP-1001"))
        .stdout(predicate::str::contains("$125,000"))
        .stdout(predicate::str::contains("Page 1 of 5 (showing 1-10 of 42 records)"));
}

#[test]
fn test_list_search() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["list", "payments", "-q", "greencycle"])
        .success()
        .stdout(predicate::str::contains("EP-1001"))
        .stdout(predicate::str::contains("EP-1002").not())
        .stdout(predicate::str::contains("Page 1 of 1 (showing 1-1 of 1 records)"));
}

#[test]
fn test_list_filter_and_clamped_page() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["list", "payments", "-f", "status=paid", "-p", "9"])
        .success()
        .stdout(predicate::str::contains("Filtered by status=paid"))
        .stdout(predicate::str::contains("Page 2 of 2 (showing 11-17 of 17 records)"));
}

#[test]
fn test_list_no_matches() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["list", "escrows", "-q", "no-such-payer"])
        .success()
        .stdout(predicate::str::contains("No records match"))
        .stdout(predicate::str::contains("Page 1 of 1 (0 of 0 records)"));
}

#[test]
fn test_list_rejects_unknown_filter() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["list", "payments", "-f", "colour=red"])
        .failure()
        .stderr(predicate::str::contains("Unknown filter 'colour'"));

    run_in(&config_path, &["list", "payments", "-f", "status"])
        .failure()
        .stderr(predicate::str::contains("Expected 'name=value'"));

    run_in(&config_path, &["list", "payments", "-f", "status=settled"])
        .failure()
        .stderr(predicate::str::contains("Invalid value 'settled'"));
}

#[test]
fn test_list_rejects_zero_page_size() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["list", "users", "--page-size", "0"])
        .failure()
        .stderr(predicate::str::contains("Page size must be greater than zero"));
}

#[test]
fn test_view_state_persists_between_runs() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["list", "payments", "-f", "status=paid"]).success();

    run_in(&config_path, &["list", "payments"])
        .success()
        .stdout(predicate::str::contains("Filtered by status=paid"))
        .stdout(predicate::str::contains("of 17 records"));

    // Other datasets keep their own state
    run_in(&config_path, &["list", "escrows"])
        .success()
        .stdout(predicate::str::contains("of 30 records"));

    run_in(&config_path, &["list", "payments", "--reset"])
        .success()
        .stdout(predicate::str::contains("Filtered by").not())
        .stdout(predicate::str::contains("of 42 records"));
}

#[test]
fn test_export_page_scope() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    let out_dir = temp_dir.path().join("out");

    run_in(
        &config_path,
        &["export", "payments", "-o", out_dir.to_str().unwrap()],
    )
    .success()
    .stdout(predicate::str::contains("Exported 10 payments record(s) (page scope)"));

    let csv = fs::read_to_string(out_dir.join("enterprise-payments.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 11);
    assert_eq!(
        lines[0],
        "Payment ID,Enterprise,Invoice ID,Amount,Paid,Method,Status,Due Date"
    );
    assert!(lines[1].starts_with("EP-1001,GreenCycle Industries,INV-2024-0142,125000"));
}

#[test]
fn test_export_filtered_and_all_scopes() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    let out_dir = temp_dir.path().join("out");
    let out = out_dir.to_str().unwrap();

    run_in(
        &config_path,
        &["export", "payments", "-f", "status=paid", "--scope", "filtered", "-o", out],
    )
    .success();
    let csv = fs::read_to_string(out_dir.join("enterprise-payments.csv")).unwrap();
    assert_eq!(csv.lines().count(), 18);
    assert!(csv.lines().skip(1).all(|l| l.contains(",paid,")));

    run_in(&config_path, &["export", "payments", "--scope", "all", "-o", out]).success();
    let csv = fs::read_to_string(out_dir.join("enterprise-payments.csv")).unwrap();
    assert_eq!(csv.lines().count(), 43);
}

#[test]
fn test_export_defaults_to_config_dir() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["export", "escrows"])
        .success()
        .stdout(predicate::str::contains("escrow-holdings.csv"));

    assert!(config_path.join("exports").join("escrow-holdings.csv").exists());
}

#[test]
fn test_export_rejects_unknown_scope() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["export", "users", "--scope", "everything"])
        .failure()
        .stderr(predicate::str::contains("Invalid export scope 'everything'"));
}

#[test]
fn test_show_read_only_for_viewer() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["show", "payments", "EP-1001"])
        .success()
        .stdout(predicate::str::contains("EP-1001 - GreenCycle Industries"))
        .stdout(predicate::str::contains("INV-2024-0142"))
        .stdout(predicate::str::contains("[x] download_invoice"))
        .stdout(predicate::str::contains("[ ] record_payment"))
        .stdout(predicate::str::contains("Read-only except Finance Admin"));
}

#[test]
fn test_show_for_finance_admin() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(
        &config_path,
        &["show", "escrows", "ESC-0301", "--role", "finance_admin"],
    )
    .success()
    .stdout(predicate::str::contains("[x] release"))
    .stdout(predicate::str::contains("Read-only except Finance Admin").not());
}

#[test]
fn test_show_missing_record() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["show", "users", "U-99999"])
        .failure()
        .stderr(predicate::str::contains("Record 'U-99999' not found in users"));
}

#[test]
fn test_action_is_role_gated() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["action", "payments", "EP-1002", "record_payment"])
        .failure()
        .stderr(predicate::str::contains(
            "Action 'record_payment' requires the finance_admin role",
        ));

    run_in(
        &config_path,
        &[
            "action",
            "payments",
            "EP-1002",
            "record_payment",
            "--role",
            "finance_admin",
        ],
    )
    .success()
    .stdout(predicate::str::contains("Requested record_payment on EP-1002"));
}

#[test]
fn test_action_unknown() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["action", "escrows", "ESC-0301", "refund_everything"])
        .failure()
        .stderr(predicate::str::contains("Unknown action 'refund_everything'"));
}

#[test]
fn test_overdue_escrows() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["overdue", "--today", "2025-01-01"])
        .success()
        .stdout(predicate::str::contains("ESC-0301"))
        .stdout(predicate::str::contains("ESC-0302").not())
        .stdout(predicate::str::contains("10 escrow(s) past SLA as of 2025-01-01"));

    run_in(&config_path, &["overdue", "--today", "2024-10-01"])
        .success()
        .stdout(predicate::str::contains("No escrows past their SLA deadline"));

    run_in(&config_path, &["overdue", "--today", "yesterday"])
        .failure()
        .stderr(predicate::str::contains("Invalid date 'yesterday'"));
}

#[test]
fn test_pricing_rules() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["pricing-rules"])
        .success()
        .stdout(predicate::str::contains("PR-001"))
        .stdout(predicate::str::contains("PR-003"));
}

#[test]
fn test_add_pricing_rule() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(
        &config_path,
        &[
            "add-pricing-rule",
            "--name",
            "Glass drop-off",
            "--material",
            "glass",
            "--zone",
            "south",
            "--segment",
            "residential",
            "--unit",
            "per_kg",
            "--rate",
            "12",
            "--from",
            "2025-02-01",
        ],
    )
    .success()
    .stdout(predicate::str::contains("Created PR-004 (Glass drop-off)"))
    .stdout(predicate::str::contains("2025-02-01"));
}

#[test]
fn test_add_pricing_rule_blocked_step() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(
        &config_path,
        &[
            "add-pricing-rule",
            "--name",
            "No zones",
            "--material",
            "paper",
            "--segment",
            "enterprise",
            "--unit",
            "flat",
            "--rate",
            "100",
        ],
    )
    .failure()
    .stderr(predicate::str::contains(
        "Cannot continue from the scope step: add at least one zone",
    ));

    run_in(
        &config_path,
        &[
            "add-pricing-rule",
            "--name",
            "Backwards",
            "--material",
            "metal",
            "--zone",
            "east",
            "--segment",
            "municipal",
            "--unit",
            "per_pickup",
            "--rate",
            "50",
            "--from",
            "2025-03-01",
            "--to",
            "2025-02-01",
        ],
    )
    .failure()
    .stderr(predicate::str::contains("schedule step"));
}

#[test]
fn test_login_requires_credentials() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_in(&config_path, &["login", "--email", "ops@recliq.in"])
        .failure()
        .stderr(predicate::str::contains("Please enter both email and password."));
}

#[test]
fn test_summary_unreachable_server() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    let config = fs::read_to_string(config_path.join("config.toml")).unwrap();
    let config = config.replace("http://localhost:8000/api", "http://127.0.0.1:9/api");
    fs::write(config_path.join("config.toml"), config).unwrap();

    run_in(&config_path, &["summary"])
        .failure()
        .stderr(predicate::str::contains("Unable to reach the server"));
}
