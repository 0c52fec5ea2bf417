//! Integration tests for the rv32im-run CLI.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::too_many_lines
)]

use anyhow as _;
use clap as _;
use rv32im_core as _;
use rv32im_runner as _;
use serde as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("rv32im-run")
}

fn create_temp_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn hex_image(words: &[u32]) -> String {
    let mut text = String::from("@80000000\n");
    for word in words {
        let line: Vec<String> = word.to_le_bytes().iter().map(|b| format!("{b:02x}")).collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }
    text
}

// addi ra, zero, 5 ; addi t0, zero, 7 ; mul a0, ra, t0 ; ebreak
const MULTIPLY: [u32; 4] = [0x0050_0093, 0x0070_0293, 0x0250_8533, 0x0010_0073];

#[test]
fn runs_program_and_writes_trace_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_temp_file(temp_dir.path(), "mul.hex", &hex_image(&MULTIPLY));
    let trace = temp_dir.path().join("mul.out");

    let output = Command::new(binary_path())
        .args([input.to_str().unwrap(), trace.to_str().unwrap()])
        .output()
        .expect("failed to run rv32im-run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim(), "halted normally at 0x8000000c");

    let trace = fs::read_to_string(&trace).unwrap();
    let lines: Vec<&str> = trace.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[2],
        "0x80000008:mul    a0,ra,t0   a0=0x00000005*0x00000007=0x00000023"
    );
    assert_eq!(lines[3], "0x8000000c:ebreak");
}

#[test]
fn trace_goes_to_stdout_without_output_path() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_temp_file(temp_dir.path(), "mul.hex", &hex_image(&MULTIPLY));

    let output = Command::new(binary_path())
        .arg(input.to_str().unwrap())
        .output()
        .expect("failed to run rv32im-run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("0x80000000:addi   ra,zero,0x005"));
    assert!(stdout.ends_with("halted normally at 0x8000000c\n"));
}

#[test]
fn unknown_instruction_exits_with_failure() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_temp_file(
        temp_dir.path(),
        "bad.hex",
        &hex_image(&[0x0010_0093, 0xFFFF_FFFF]),
    );
    let trace = temp_dir.path().join("bad.out");

    let output = Command::new(binary_path())
        .args([input.to_str().unwrap(), trace.to_str().unwrap()])
        .output()
        .expect("failed to run rv32im-run");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim(), "halted on unknown instruction at 0x80000004");
    let trace = fs::read_to_string(&trace).unwrap();
    assert_eq!(
        trace.lines().last(),
        Some("error: unknown instruction 0xffffffff at pc = 0x80000004")
    );
}

#[test]
fn out_of_bounds_store_reports_data_address() {
    let temp_dir = tempfile::tempdir().unwrap();
    // lui t0, 0x10 ; sw zero, 4(t0)
    let input = create_temp_file(
        temp_dir.path(),
        "oob.hex",
        &hex_image(&[0x0001_02B7, 0x0002_A223]),
    );
    let trace = temp_dir.path().join("oob.out");

    let output = Command::new(binary_path())
        .args([input.to_str().unwrap(), trace.to_str().unwrap()])
        .output()
        .expect("failed to run rv32im-run");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.trim(),
        "halted on memory fault at 0x80000004 (address 0x00010004)"
    );
}

#[test]
fn step_limit_stops_infinite_loop() {
    let temp_dir = tempfile::tempdir().unwrap();
    // jal zero, 0
    let input = create_temp_file(temp_dir.path(), "spin.hex", &hex_image(&[0x0000_006F]));
    let trace = temp_dir.path().join("spin.out");

    let output = Command::new(binary_path())
        .args([
            input.to_str().unwrap(),
            trace.to_str().unwrap(),
            "--max-steps",
            "10",
        ])
        .output()
        .expect("failed to run rv32im-run");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim(), "step limit reached at 0x80000000");
    assert_eq!(fs::read_to_string(&trace).unwrap().lines().count(), 10);
}

#[test]
fn writes_state_json() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_temp_file(temp_dir.path(), "mul.hex", &hex_image(&MULTIPLY));
    let trace = temp_dir.path().join("mul.out");
    let state = temp_dir.path().join("state.json");

    let status = Command::new(binary_path())
        .args([
            input.to_str().unwrap(),
            trace.to_str().unwrap(),
            "--state-json",
            state.to_str().unwrap(),
        ])
        .status()
        .expect("failed to run rv32im-run");

    assert!(status.success());
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&state).unwrap()).unwrap();
    assert_eq!(json["pc"], 0x8000_000C_u32);
    assert_eq!(json["retired"], 4);
    assert_eq!(json["registers"][10]["name"], "a0");
    assert_eq!(json["registers"][10]["value"], 35);
}

#[test]
fn marker_policy_runs_past_plain_ebreak() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = [
        0x0010_0073, // ebreak (no marker, retires as a no-op)
        0x01F0_1013, // slli zero, zero, 0x1f
        0x0010_0073, // ebreak
        0x4070_5013, // srai zero, zero, 7
    ];
    let input = create_temp_file(temp_dir.path(), "semi.hex", &hex_image(&program));
    let trace = temp_dir.path().join("semi.out");

    let output = Command::new(binary_path())
        .args([
            input.to_str().unwrap(),
            trace.to_str().unwrap(),
            "--halt",
            "marker",
        ])
        .output()
        .expect("failed to run rv32im-run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim(), "halted normally at 0x80000008");
}

#[test]
fn disassemble_lists_image_without_running() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_temp_file(temp_dir.path(), "mul.hex", &hex_image(&MULTIPLY));

    let output = Command::new(binary_path())
        .args([input.to_str().unwrap(), "--disassemble"])
        .output()
        .expect("failed to run rv32im-run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        [
            "0x80000000: 00500093  addi   ra,zero,0x005",
            "0x80000004: 00700293  addi   t0,zero,0x007",
            "0x80000008: 02508533  mul    a0,ra,t0",
            "0x8000000c: 00100073  ebreak",
        ]
    );
}

#[test]
fn malformed_image_reports_line() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_temp_file(temp_dir.path(), "broken.hex", "@80000000\n93 00 1g 00\n");

    let output = Command::new(binary_path())
        .arg(input.to_str().unwrap())
        .output()
        .expect("failed to run rv32im-run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("line 2: invalid byte `1g`"));
}

#[test]
fn oversized_image_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_temp_file(
        temp_dir.path(),
        "big.hex",
        &hex_image(&[0x0000_0013, 0x0000_0013]),
    );

    let output = Command::new(binary_path())
        .args([input.to_str().unwrap(), "--memory-kib", "0"])
        .output()
        .expect("failed to run rv32im-run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("exceeds memory capacity"));
}

#[test]
fn missing_input_file_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("nope.hex");

    let output = Command::new(binary_path())
        .arg(missing.to_str().unwrap())
        .output()
        .expect("failed to run rv32im-run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("error: failed to load"));
}
