//! Smoke tests for the oxbow-sinks binary.
//!
//! Run with: cargo test -p oxbow-sinks --test cli

use std::collections::BTreeMap;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

use oxbow_sinks::Record;

/// Reads the record, uppercases ASCII letters, writes the result to stdout,
/// reports success.
const UPPERCASE_GUEST: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_read"
    (func $fd_read (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "produce") (param $len i32) (result i64)
    (local $n i32)
    (local $i i32)
    (local $c i32)
    (i32.store (i32.const 0) (i32.const 16))
    (i32.store (i32.const 4) (i32.const 4096))
    (drop (call $fd_read (i32.const 0) (i32.const 0) (i32.const 1) (i32.const 8)))
    (local.set $n (i32.load (i32.const 8)))
    (block $done
      (loop $next
        (br_if $done (i32.ge_u (local.get $i) (local.get $n)))
        (local.set $c (i32.load8_u (i32.add (i32.const 16) (local.get $i))))
        (if (i32.and (i32.ge_u (local.get $c) (i32.const 97))
                     (i32.le_u (local.get $c) (i32.const 122)))
          (then (i32.store8 (i32.add (i32.const 16) (local.get $i))
                            (i32.sub (local.get $c) (i32.const 32)))))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $next)))
    (i32.store (i32.const 4) (local.get $n))
    (drop (call $fd_write (i32.const 1) (i32.const 0) (i32.const 1) (i32.const 8)))
    (i64.const 0)))
"#;

fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("sink.yaml");
    std::fs::write(&path, contents).expect("config written");
    path
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("oxbow-sinks").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Validate configuration file"))
        .stdout(predicate::str::contains("List available sink kinds"));
}

#[test]
fn test_sinks_lists_kinds() {
    let mut cmd = Command::cargo_bin("oxbow-sinks").unwrap();
    cmd.arg("sinks")
        .assert()
        .success()
        .stdout(predicate::str::contains("console"))
        .stdout(predicate::str::contains("wasm"));
}

#[test]
fn test_validate_accepts_console_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "sink: console\n");

    let mut cmd = Command::cargo_bin("oxbow-sinks").unwrap();
    cmd.args(["-c", config.to_str().unwrap(), "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Configuration valid!"));
}

#[test]
fn test_validate_shows_wasm_module() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        "sink: wasm\nconfig:\n  module_path: ./guest.wasm\n",
    );

    let mut cmd = Command::cargo_bin("oxbow-sinks").unwrap();
    cmd.args(["-c", config.to_str().unwrap(), "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Module: ./guest.wasm"))
        .stdout(predicate::str::contains("Stdout: discarded"));
}

#[test]
fn test_validate_rejects_unknown_kind() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "sink: kafka\n");

    let mut cmd = Command::cargo_bin("oxbow-sinks").unwrap();
    cmd.args(["-c", config.to_str().unwrap(), "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown sink kind"));
}

#[test]
fn test_run_console_sink_prints_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "sink: console\n");

    let mut cmd = Command::cargo_bin("oxbow-sinks").unwrap();
    cmd.args(["-c", config.to_str().unwrap(), "run"])
        .write_stdin("hello\nworld\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("world"));
}

#[test]
fn test_run_delivers_stdin_through_wasm_guest() {
    let dir = tempfile::tempdir().unwrap();

    let module = dir.path().join("upper.wasm");
    let binary = wat::parse_str(UPPERCASE_GUEST).expect("guest source assembles");
    std::fs::write(&module, binary).expect("module written");

    let config = write_config(
        &dir,
        &format!(
            "sink: wasm\nconfig:\n  module_path: \"{}\"\n  bind_stdout: true\n",
            module.display()
        ),
    );

    // The guest writes the uppercased record to its stdout, which the
    // config binds to the host's stdout.
    let payload = Record {
        key: b"",
        value: b"hello",
        headers: &BTreeMap::new(),
    }
    .encode()
    .expect("record encodes");
    let expected = String::from_utf8(payload)
        .expect("payload is utf-8")
        .to_ascii_uppercase();

    let mut cmd = Command::cargo_bin("oxbow-sinks").unwrap();
    cmd.args(["-c", config.to_str().unwrap(), "run"])
        .write_stdin("hello\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(expected));
}
