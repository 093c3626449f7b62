//! The `forge` binary's offline commands, run as a subprocess.

use std::process::{Command, Output};

fn forge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_forge"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run forge")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "forge failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn decode_prints_the_record() {
    let output = forge(&["decode", r#"{"t":"r","n":"Logo","i":"Acme","ts":1706745600,"v":1,"r":45}"#]);
    let report = stdout_json(&output);
    assert_eq!(report["format"], "compact");
    assert_eq!(report["metadata"]["name"], "Logo");
    assert_eq!(report["metadata"]["rating"], 4.5);
}

#[test]
fn encode_reads_a_draft_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("draft.json");
    std::fs::write(
        &path,
        r#"{"type":"skill","name":"Rust","description":"Systems programming","issuer":"Ferrous","timestamp":"2024-06-01T12:00:00Z"}"#,
    )
    .unwrap();

    let report = stdout_json(&forge(&["encode", path.to_str().unwrap()]));
    assert_eq!(report["encoding"], "compact");
    assert!(report["hex"].as_str().unwrap().starts_with("0x"));
    assert!(report["size"].as_u64().unwrap() <= report["limit"].as_u64().unwrap());
}

#[test]
fn oversized_draft_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("draft.json");
    let draft = serde_json::json!({
        "type": "skill",
        "name": "Rust",
        "issuer": "Ferrous",
        "description": "a".repeat(4000),
        "timestamp": "2024-06-01T12:00:00Z",
    });
    std::fs::write(&path, draft.to_string()).unwrap();

    let output = forge(&["encode", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("too large"));
}

#[test]
fn invalid_metadata_limit_is_rejected_before_running() {
    let output = forge(&["--metadata-limit", "9000", "decode", "x|y|z|1|1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}
