use std::net::{SocketAddr, TcpListener};
use std::process::{Command, Output};
use std::thread;

fn tcping(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tcping"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("TCPING_LOG_LEVEL")
        .output()
        .expect("binary runs")
}

/// Loopback listener that accepts and immediately drops every connection.
fn accepting_listener() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for conn in listener.incoming() {
            drop(conn);
        }
    });
    addr
}

fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn reachable_target_exits_zero_with_header_and_summary() {
    let addr = accepting_listener();
    let port = addr.port().to_string();
    let out = tcping(&["127.0.0.1", &port]);

    assert_eq!(out.status.code(), Some(0));
    let stdout = lines(&out.stdout);
    assert_eq!(stdout[0], format!("tcp pinging to 127.0.0.1:{} (127.0.0.1)", port));
    assert!(stdout[1].starts_with(" seq 1, RRT: "), "{:?}", stdout);
    assert!(stdout.contains(&"--- 127.0.0.1 tcp ping statistics ---".to_string()));
    assert_eq!(
        stdout.last().map(String::as_str),
        Some("1 packet(s) transmitted, 100.0% tcp ping successful")
    );
}

#[test]
fn unreachable_target_exits_nonzero() {
    let port = closed_port().port().to_string();
    let out = tcping(&[&port, "127.0.0.1"]);

    assert_eq!(out.status.code(), Some(1));
    let stdout = lines(&out.stdout);
    assert!(stdout.contains(&"can not connect target".to_string()), "{:?}", stdout);
    assert_eq!(
        stdout.last().map(String::as_str),
        Some("1 packet(s) transmitted, 0.0% tcp ping successful")
    );
}

#[test]
fn quiet_prints_nothing_but_keeps_exit_status() {
    let addr = accepting_listener();
    let out = tcping(&["-q", "127.0.0.1", &addr.port().to_string()]);
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
    assert!(out.stderr.is_empty());

    let port = closed_port().port().to_string();
    let out = tcping(&["-q", "127.0.0.1", &port]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn fatal_bind_error_prints_one_diagnostic_line() {
    let addr = accepting_listener();
    let out = tcping(&["-i", "192.0.2.1", "127.0.0.1", &addr.port().to_string()]);

    assert_eq!(out.status.code(), Some(1));
    let stderr: Vec<_> = lines(&out.stderr)
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .collect();
    assert_eq!(stderr.len(), 1, "{:?}", stderr);
    assert!(stderr[0].starts_with("can not bind source"), "{:?}", stderr);
    assert!(!stderr[0].contains('\x1b'));
    // no summary after a fatal error
    assert!(!String::from_utf8_lossy(&out.stdout).contains("statistics"));
}

#[test]
fn configuration_errors_exit_with_one() {
    let out = tcping(&["-c", "3", "-s", "127.0.0.1", "80"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(lines(&out.stderr), vec!["can not give both of the option, -c and -s"]);
    assert!(out.stdout.is_empty());

    let out = tcping(&["-c", "0", "127.0.0.1", "80"]);
    assert_eq!(out.status.code(), Some(1));

    // missing port is a usage error, still status 1
    let out = tcping(&["127.0.0.1"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn help_and_version_succeed() {
    let out = tcping(&["--help"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("--count"));

    let out = tcping(&["--version"]);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn log_lines_are_plain_when_stderr_is_captured() {
    let addr = accepting_listener();
    let out = tcping(&["--log-level", "info", "127.0.0.1", &addr.port().to_string()]);

    assert_eq!(out.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("INFO"), "{}", stderr);
    assert!(!stderr.contains('\x1b'), "{:?}", stderr);
}
