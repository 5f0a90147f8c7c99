use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_textproto2json"))
}

#[test]
fn converts_and_exits_zero() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(
        input.path().join("basic.textproto"),
        "name: \"basic\"\nsection { test { name: \"t\" } }\n",
    )
    .unwrap();

    let status = cli()
        .arg(input.path())
        .arg(out.path())
        .status()
        .expect("failed to run textproto2json");
    assert!(status.success());
    assert!(out.path().join("basic.json").exists());
}

#[test]
fn parse_failure_exits_nonzero() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(input.path().join("broken.textproto"), "name: @oops\n").unwrap();

    let output = cli()
        .arg(input.path())
        .arg(out.path())
        .output()
        .expect("failed to run textproto2json");
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("broken.textproto"),
        "stderr names the file: {stderr}"
    );
}
