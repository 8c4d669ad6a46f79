use assert_cmd::Command;

/// Exercise the argument surface without touching the network: help output
/// and flag validation run entirely inside clap.
#[test]
fn help_lists_every_command() {
    let mut cmd = Command::cargo_bin("rosa").unwrap();
    let assert = cmd.arg("--help").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for command in [
        "create",
        "list",
        "describe",
        "edit",
        "delete",
        "hibernate",
        "resume",
        "upgrade",
        "verify",
        "grant",
        "revoke",
        "config",
        "token",
    ] {
        assert!(stdout.contains(command), "help is missing '{}'", command);
    }
}

#[test]
fn create_cluster_requires_a_name() {
    let mut cmd = Command::cargo_bin("rosa").unwrap();
    cmd.args(["create", "cluster"]).assert().failure();
}

#[test]
fn autoscaling_flags_conflict_with_fixed_replicas() {
    let mut cmd = Command::cargo_bin("rosa").unwrap();
    cmd.args([
        "create",
        "cluster",
        "--cluster-name",
        "mycluster",
        "--compute-nodes",
        "4",
        "--enable-autoscaling",
    ])
    .assert()
    .failure();
}

#[test]
fn min_replicas_requires_autoscaling() {
    let mut cmd = Command::cargo_bin("rosa").unwrap();
    cmd.args([
        "create",
        "cluster",
        "--cluster-name",
        "mycluster",
        "--min-replicas",
        "2",
    ])
    .assert()
    .failure();
}

#[test]
fn config_get_rejects_unknown_properties() {
    let mut cmd = Command::cargo_bin("rosa").unwrap();
    cmd.env("OCM_CONFIG", "/nonexistent/ocm.json")
        .args(["config", "get", "bogus"])
        .assert()
        .failure()
        .code(1);
}
