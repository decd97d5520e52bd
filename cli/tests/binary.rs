//! Drives the built `courier` binary end to end: keygen to a temp dir,
//! seal through stdin/stdout, open back through stdin/stdout.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn courier() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_courier"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run_with_stdin(mut cmd: Command, stdin: &[u8]) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn courier");
    child.stdin.take().unwrap().write_all(stdin).unwrap();
    child.wait_with_output().unwrap()
}

fn keygen(dir: &Path) {
    let status = courier()
        .args(["keygen", "--name", "server", "--out-dir"])
        .arg(dir)
        .stdout(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn version_prints_algorithms() {
    let output = courier().arg("version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("AES-256-CBC"));
    assert!(stdout.contains("RSA-PKCS1-v1_5"));
}

#[test]
fn seal_and_open_through_pipes() {
    let dir = tempfile::tempdir().unwrap();
    keygen(dir.path());
    let message = b"This is a secret message from the client.";

    let mut seal = courier();
    seal.arg("seal")
        .arg("--recipient")
        .arg(dir.path().join("server.pub.pem"));
    let sealed = run_with_stdin(seal, message);
    assert!(sealed.status.success(), "{}", String::from_utf8_lossy(&sealed.stderr));
    assert!(sealed.stdout.starts_with(b"{"));
    assert!(sealed.stderr.is_empty(), "default log level should be quiet");

    let mut open = courier();
    open.arg("open").arg("--key").arg(dir.path().join("server.pem"));
    let opened = run_with_stdin(open, &sealed.stdout);
    assert!(opened.status.success(), "{}", String::from_utf8_lossy(&opened.stderr));
    assert_eq!(opened.stdout, message);
}

#[test]
fn logs_stay_off_stdout() {
    let dir = tempfile::tempdir().unwrap();
    keygen(dir.path());

    let mut seal = courier();
    seal.args(["--log-level", "debug", "--log-format", "json", "seal"])
        .args(["--encoding", "binary", "--recipient"])
        .arg(dir.path().join("server.pub.pem"));
    let sealed = run_with_stdin(seal, b"quiet please");
    assert!(sealed.status.success());
    assert!(!sealed.stderr.is_empty());
    assert!(!String::from_utf8_lossy(&sealed.stdout).contains("message sealed"));

    let mut open = courier();
    open.args(["open", "--encoding", "binary", "--key"])
        .arg(dir.path().join("server.pem"));
    let opened = run_with_stdin(open, &sealed.stdout);
    assert!(opened.status.success());
    assert_eq!(opened.stdout, b"quiet please");
}

#[test]
fn open_with_wrong_key_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    keygen(dir.path());
    let other = tempfile::tempdir().unwrap();
    keygen(other.path());

    let mut seal = courier();
    seal.arg("seal")
        .arg("--recipient")
        .arg(dir.path().join("server.pub.pem"));
    let sealed = run_with_stdin(seal, b"for the first server only");
    assert!(sealed.status.success());

    let mut open = courier();
    open.arg("open").arg("--key").arg(other.path().join("server.pem"));
    let opened = run_with_stdin(open, &sealed.stdout);
    assert!(!opened.status.success());
    assert!(opened.stdout.is_empty());
    assert!(String::from_utf8_lossy(&opened.stderr).contains("failed to open envelope"));
}
