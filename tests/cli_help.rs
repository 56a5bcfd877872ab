use std::process::Command;

#[test]
fn test_help_lists_every_command() {
    let bin = env!("CARGO_BIN_EXE_crship");

    let output = Command::new(bin).arg("--help").output().unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["deploy", "upload", "restart"] {
        assert!(
            stdout.contains(command),
            "help output should list `{}`; got:\n{}",
            command,
            stdout
        );
    }
    assert!(stdout.contains("CRSHIP_LOG"), "got:\n{}", stdout);
}

#[test]
fn test_deploy_help_mentions_dry_run_and_force() {
    let bin = env!("CARGO_BIN_EXE_crship");

    let output = Command::new(bin).args(["deploy", "--help"]).output().unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--dry-run"), "got:\n{}", stdout);
    assert!(stdout.contains("--force"), "got:\n{}", stdout);
    assert!(stdout.contains("--no-upload"), "got:\n{}", stdout);
}

#[test]
fn test_version_prints_package_version() {
    let bin = env!("CARGO_BIN_EXE_crship");

    let output = Command::new(bin).arg("--version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "got:\n{}", stdout);
}
