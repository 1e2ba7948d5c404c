#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Stdio};

const INIT_FRAME: &str = "AA BB CC DD 01 00 00 00 04 49 4E 49 54 01 31 EE FF";

fn chunkwire() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chunkwire"));
    cmd.arg("--log-level").arg("error");
    cmd
}

#[test]
fn encode_prints_reference_frame() {
    let output = chunkwire()
        .args(["--format", "pretty", "encode", "--type", "command", "--data", "INIT"])
        .output()
        .expect("encode should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), INIT_FRAME);
}

#[test]
fn encode_json_reports_frame_fields() {
    let output = chunkwire()
        .args(["--format", "json", "encode", "-t", "data", "--seq", "258", "--hex", "0102"])
        .output()
        .expect("encode should run");

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("encode should emit json");
    assert_eq!(value["packet_type"], "DATA");
    assert_eq!(value["sequence"], 258);
    assert_eq!(value["checksum"], 3);
    assert_eq!(value["frame_size"], 15);
    assert_eq!(value["hex"], "aabbccdd020102000201020003eeff");
}

#[test]
fn decode_resyncs_past_garbage_in_small_chunks() {
    let input = format!("00 13 37 AA BB {INIT_FRAME}");
    let output = chunkwire()
        .args(["--format", "json", "decode", "--chunk", "5", "--hex", &input])
        .output()
        .expect("decode should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let value: serde_json::Value = serde_json::from_str(lines[0]).expect("packet json");
    assert_eq!(value["event"], "packet");
    assert_eq!(value["packet_type"], "COMMAND");
    assert_eq!(value["sequence"], 0);
    assert_eq!(value["payload"], "INIT");
}

#[test]
fn decode_without_frames_exits_data_invalid() {
    let output = chunkwire()
        .args(["decode", "--hex", "DEADBEEF"])
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn decode_reads_raw_frames_from_stdin() {
    let encoded = chunkwire()
        .args(["--format", "raw", "encode", "-t", "heartbeat", "--seq", "9"])
        .output()
        .expect("encode should run");
    assert!(encoded.status.success());
    assert_eq!(encoded.stdout.len(), 13);

    let mut child = chunkwire()
        .args(["--format", "pretty", "decode"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("decode should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(&encoded.stdout)
        .expect("stdin should accept input");
    let output = child.wait_with_output().expect("decode should finish");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("HEARTBEAT"));
    assert!(stdout.contains("seq=9"));
}

#[test]
fn encode_rejects_oversized_payload() {
    let dir = std::env::temp_dir().join(format!("chunkwire-big-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    let path = dir.join("payload.bin");
    std::fs::write(&path, vec![0u8; 65_536]).expect("payload should be writable");

    let output = chunkwire()
        .arg("encode")
        .arg("--file")
        .arg(&path)
        .output()
        .expect("encode should run");

    assert_eq!(output.status.code(), Some(60));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_reports_crate_version() {
    let output = chunkwire()
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("chunkwire {}", env!("CARGO_PKG_VERSION"))
    );
}
