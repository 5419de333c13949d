use predicates::prelude::*;

mod common;

const SIGNALS: &str = r#"
- event: summary
  context:
    execution_id: exec-1
    schema_name: sharding_db
    units: [u1, u2]
- event: unit_report
  execution_id: exec-1
  unit_id: u1
- event: list_request
- event: unit_report
  execution_id: exec-1
  unit_id: u2
- event: completion
  execution_id: exec-1
- event: list_request
"#;

#[test]
fn test_replay_applies_signals_in_order() {
    let mut ctx = common::procreg();
    let file = ctx.write_file("signals.yaml", SIGNALS);

    ctx.cmd
        .arg("replay")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("execution_id: exec-1"))
        .stdout(predicate::str::contains("records: []"));

    ctx.new_cmd()
        .args(["list", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_replay_reports_contract_violations() {
    let mut ctx = common::procreg();
    let file = ctx.write_file(
        "bad.yaml",
        "- event: unit_report\n  execution_id: ghost\n  unit_id: u1\n- event: summary\n",
    );

    ctx.cmd
        .arg("replay")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("signal #1 (unit_report)"))
        .stderr(predicate::str::contains("signal #2 (summary)"))
        .stderr(predicate::str::contains("2 signal(s) failed"));
}

#[test]
fn test_replay_rejects_malformed_file() {
    let mut ctx = common::procreg();
    let file = ctx.write_file("broken.yaml", "- event: launch\n");

    ctx.cmd
        .arg("replay")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid signal file"));
}
