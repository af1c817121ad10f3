use assert_cmd::Command;

#[test]
fn test_init_scaffolds_project() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("lodestar")
        .unwrap()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success();

    assert!(dir.path().join("lodestar.json").exists());
    assert!(dir.path().join("specs/example.js").exists());
}

#[test]
fn test_init_twice_fails() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("lodestar")
        .unwrap()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success();

    Command::cargo_bin("lodestar")
        .unwrap()
        .arg("init")
        .arg(dir.path())
        .assert()
        .failure();
}

#[test]
fn test_run_without_scripts_fails() {
    Command::cargo_bin("lodestar")
        .unwrap()
        .arg("run")
        .assert()
        .failure();
}

#[test]
fn test_run_with_missing_config_fails() {
    Command::cargo_bin("lodestar")
        .unwrap()
        .args(["run", "--config", "/nonexistent/lodestar.json", "spec.js"])
        .assert()
        .failure();
}
