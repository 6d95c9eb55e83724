#![cfg(all(unix, feature = "cli"))]

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/growlink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn wait_for_socket(path: &Path, timeout: Duration) {
    let start = Instant::now();
    while !path.exists() {
        assert!(
            start.elapsed() < timeout,
            "socket {} never appeared",
            path.display()
        );
        thread::sleep(Duration::from_millis(25));
    }
}

fn growlink() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_growlink"));
    command.env_remove("GROWLINK_SOCKET").arg("--log-level").arg("error");
    command
}

#[test]
fn version_prints_package_version() {
    let output = growlink().arg("version").output().expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("growlink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn status_without_worker_exits_1_and_reports_cached_warnings() {
    let dir = unique_temp_dir("status");
    let warnings = dir.join("warnings.json");
    std::fs::write(&warnings, r#"[{"id":"w1","message":"persisted"}]"#)
        .expect("write warnings file");

    let output = growlink()
        .arg("--format")
        .arg("json")
        .arg("--socket")
        .arg(dir.join("missing.sock"))
        .arg("--warnings-file")
        .arg(&warnings)
        .arg("status")
        .arg("--settle")
        .arg("300ms")
        .output()
        .expect("status should run");

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status should emit json");
    assert_ne!(report["status"]["worker"]["state"], "connected");
    assert!(report["status"]["worker"]["error"].is_string());
    assert_eq!(report["status"]["fieldBus"]["state"], "disconnected");
    assert_eq!(report["warnings"][0]["id"], "w1");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_without_worker_times_out_with_124() {
    let dir = unique_temp_dir("send-timeout");

    let output = growlink()
        .arg("--socket")
        .arg(dir.join("missing.sock"))
        .arg("send")
        .arg("auto")
        .arg("--timeout")
        .arg("300ms")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(124));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_reaches_mock_worker() {
    let dir = unique_temp_dir("send");
    let sock_path = dir.join("greenhouse.sock");

    let mut worker = growlink()
        .arg("mock-worker")
        .arg(&sock_path)
        .arg("--count")
        .arg("1")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("mock worker should start");
    wait_for_socket(&sock_path, Duration::from_secs(3));

    let output = growlink()
        .arg("--format")
        .arg("json")
        .arg("--socket")
        .arg(&sock_path)
        .arg("send")
        .arg("override")
        .arg("--actuator")
        .arg("fan")
        .arg("--value")
        .arg("on")
        .output()
        .expect("send should run");
    assert!(
        output.status.success(),
        "send failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let sent: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("send should emit json");
    assert_eq!(sent["sent"]["cmd"], "manual_override");

    let stdout = worker.stdout.take().expect("worker stdout");
    let mut line = String::new();
    BufReader::new(stdout)
        .read_line(&mut line)
        .expect("worker should print the command");
    assert_eq!(
        line.trim(),
        r#"{"cmd":"manual_override","actuator":"fan","value":true}"#
    );

    let status = worker.wait().expect("mock worker should exit");
    assert!(status.success());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn monitor_prints_scripted_telemetry() {
    let dir = unique_temp_dir("monitor");
    let sock_path = dir.join("greenhouse.sock");
    let script = dir.join("script.jsonl");
    std::fs::write(
        &script,
        concat!(
            r#"{"event":"sensor_update","data":{"id":"t1","value":21.5}}"#,
            "\n",
            r#"{"event":"status_update","data":{"status":"fail","error":"timeout"}}"#,
            "\n",
        ),
    )
    .expect("write script");

    let mut worker = growlink()
        .arg("mock-worker")
        .arg(&sock_path)
        .arg("--script")
        .arg(&script)
        .arg("--interval")
        .arg("20ms")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("mock worker should start");
    wait_for_socket(&sock_path, Duration::from_secs(3));

    // Connecting, Connected, telemetry, field bus status.
    let output = growlink()
        .arg("--format")
        .arg("json")
        .arg("--socket")
        .arg(&sock_path)
        .arg("monitor")
        .arg("--count")
        .arg("4")
        .output()
        .expect("monitor should run");
    assert!(output.status.success());

    let events: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();
    assert_eq!(events.len(), 4);
    assert_eq!(events[1]["status"]["worker"]["state"], "connected");
    assert_eq!(events[2]["type"], "telemetry");
    assert_eq!(events[2]["data"]["id"], "t1");
    assert_eq!(events[3]["type"], "status");
    assert_eq!(events[3]["status"]["fieldBus"]["state"], "fail");

    let _ = worker.kill();
    let _ = worker.wait();
    let _ = std::fs::remove_dir_all(&dir);
}
