use std::env;
use std::fs;
use std::process::Command;

#[test]
fn headless_run_writes_snapshot() {
    let bin = env!("CARGO_BIN_EXE_grubsim");
    let snapshot = env::temp_dir().join(format!("grubsim-smoke-{}.json", std::process::id()));
    let status = Command::new(bin)
        .args(["--seed", "17", "--frames", "12", "--speed", "2", "--report-every", "4"])
        .arg("--snapshot")
        .arg(&snapshot)
        .env("RUST_LOG", "off")
        .status()
        .expect("failed to run grubsim binary");
    assert!(status.success(), "headless run failed");

    let raw = fs::read_to_string(&snapshot).expect("snapshot written");
    let _ = fs::remove_file(&snapshot);
    let json: serde_json::Value = serde_json::from_str(&raw).expect("snapshot is json");
    assert_eq!(json["tick"], 24);
    assert_eq!(json["speedFactor"], 2);
    assert_eq!(json["population"]["plants"], 100);
}

#[test]
fn invalid_arena_exits_with_error() {
    let bin = env!("CARGO_BIN_EXE_grubsim");
    let status = Command::new(bin)
        .args(["--width", "0", "--frames", "1"])
        .env("RUST_LOG", "off")
        .status()
        .expect("failed to run grubsim binary");
    assert!(!status.success());
}
