use std::process::{Command, Output};

use envfreeze_test_utils::Buildpack;

fn envfreeze(bp: &Buildpack, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_envfreeze"))
        .arg("--dir")
        .arg(bp.path())
        .args(args)
        .env_remove("ENVFREEZE_CONDA_LOCK")
        .env_remove("ENVFREEZE_SOLVER")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn missing_environment_exits_non_zero() {
    let bp = Buildpack::new();
    std::fs::remove_file(bp.file("environment.yml")).unwrap();

    let out = envfreeze(&bp, &["3.8", "linux-64"]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("environment.yml not found"), "{stderr}");
}

#[test]
fn missing_lock_tool_exits_non_zero() {
    let bp = Buildpack::new();

    let out = envfreeze(
        &bp,
        &["--conda-lock", "envfreeze-no-such-lock-tool", "3.8", "linux-64"],
    );

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("failed to execute envfreeze-no-such-lock-tool"),
        "{stderr}"
    );
    assert!(!bp.exists("environment.py-3.8-linux-64.lock"));
}

#[test]
fn invalid_configuration_exits_non_zero() {
    let bp = Buildpack::new();
    bp.write("envfreeze.toml", "manifest = \"../environment.yml\"\n");

    let out = envfreeze(&bp, &[]);

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid manifest name"));
}

#[test]
fn hand_edited_everything_exits_zero() {
    let bp = Buildpack::new();
    bp.write("environment.py-3.8.yml", "dependencies:\n  - python=3.8.5\n");
    bp.write("environment.py-3.8-linux-64.lock", "@EXPLICIT\n");

    let out = envfreeze(&bp, &["--json", "3.8", "linux-64"]);

    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["steps"].as_array().unwrap().len(), 2);
}
