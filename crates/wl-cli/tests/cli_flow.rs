//! End-to-end tests driving the `wl` binary against a temporary work log.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn wl_binary() -> String {
    env!("CARGO_BIN_EXE_wl").to_string()
}

/// A temporary home with a config file and an empty work log location.
struct Sandbox {
    temp: TempDir,
    config: PathBuf,
    log: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("wl.toml");
        fs::write(&config, "day_decoration = \"\"\n").unwrap();
        let log = temp.path().join("worklog.txt");
        Self { temp, config, log }
    }

    /// Runs `wl` at the given wall clock time on 25.11.2022.
    fn run(&self, clock: &str, args: &[&str]) -> Output {
        let home = self.temp.path();
        Command::new(wl_binary())
            .env("HOME", home)
            .env("XDG_CONFIG_HOME", home.join(".config"))
            .env("XDG_DATA_HOME", home.join(".local/share"))
            .env("XDG_CACHE_HOME", home.join(".cache"))
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config)
            .arg("--file")
            .arg(&self.log)
            .arg("--now")
            .arg(format!("2022-11-25 {clock}"))
            .args(args)
            .output()
            .expect("failed to run wl")
    }

    /// Runs `wl` and returns stdout, asserting success.
    fn ok(&self, clock: &str, args: &[&str]) -> String {
        let output = self.run(clock, args);
        assert!(
            output.status.success(),
            "wl {args:?} should succeed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn log_text(&self) -> String {
        fs::read_to_string(&self.log).unwrap()
    }

    fn log_path(&self) -> &Path {
        &self.log
    }
}

#[test]
fn test_work_day_flow() {
    let sandbox = Sandbox::new();

    let out = sandbox.ok("09:00", &["start", "TEST-1", "review"]);
    assert_eq!(out, "Started TEST-1 review at 09:00\n");
    assert_eq!(sandbox.log_text(), "\n25.11.2022\n\n09:00\nTEST-1 review\n");

    let out = sandbox.ok("10:02", &["log", "TEST-2", "docs"]);
    assert_eq!(
        out,
        "Stopped TEST-1 review at 10:00\nStarted TEST-2 docs at 10:00\n"
    );

    let out = sandbox.ok("11:00", &["stop"]);
    assert_eq!(out, "Stopped TEST-2 docs at 11:00\n");
    assert_eq!(
        sandbox.log_text(),
        "\n25.11.2022\n\n09:00\nTEST-1 review\n10:00\nTEST-2 docs\n11:00\n"
    );

    let out = sandbox.ok("12:00", &["list", "--combine"]);
    assert!(out.contains("* TEST-1     1h      review"), "{out}");
    assert!(out.contains("* TEST-2     1h      docs"), "{out}");
    assert!(out.contains(" 2h "), "{out}");
}

#[test]
fn test_delete_reopens_log() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.log_path(), "25.11.2022\n\n10:00\nTEST-2 docs\n11:00\n").unwrap();

    let out = sandbox.ok("12:00", &["delete"]);
    assert_eq!(out, "Deleted 11:00\n");

    let out = sandbox.ok("12:00", &["current"]);
    assert_eq!(out, "* 10:00-12:00 TEST-2     2h      docs\n");
}

#[test]
fn test_log_with_time_and_duration() {
    let sandbox = Sandbox::new();

    sandbox.ok("09:30", &["log", "09:00", "5m", "TEST-1", "foo"]);
    assert_eq!(
        sandbox.log_text(),
        "\n25.11.2022\n\n09:00\nTEST-1 foo\n09:05\n"
    );

    let out = sandbox.ok("09:30", &["stop"]);
    assert_eq!(out, "Warning: No active log\n");
}

#[test]
fn test_time_accepts_negative_offsets() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.log_path(), "25.11.2022\n\n09:00\nTEST-1\n10:00\n").unwrap();

    let out = sandbox.ok("12:00", &["time", "-15"]);
    assert_eq!(out, "Set time to 09:45\n");
    assert_eq!(sandbox.log_text(), "25.11.2022\n\n09:00\nTEST-1\n09:45\n");
}

#[test]
fn test_syntax_errors_fail_without_writing() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.log_path(), "09:00\nTEST-1\n").unwrap();

    let output = sandbox.run("12:00", &["stop"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("worklog.txt"), "{stderr}");
    assert_eq!(sandbox.log_text(), "09:00\nTEST-1\n");
}

#[test]
fn test_oversized_offsets_fail_without_writing() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.log_path(), "25.11.2022\n\n09:00\nTEST-1\n10:00\n").unwrap();

    let output = sandbox.run("12:00", &["time", "+99999999999999"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid time"), "{stderr}");
    assert_eq!(sandbox.log_text(), "25.11.2022\n\n09:00\nTEST-1\n10:00\n");
}

#[test]
fn test_oversized_quick_entry_reports_line() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.log_path(), "25.11.2022\n09:00 9999999999999m TEST-1 x\n").unwrap();

    let output = sandbox.run("12:00", &["list"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid duration at line 2"), "{stderr}");
}

#[test]
fn test_start_continues_last_issue() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.log_path(), "25.11.2022\n\n09:00\nTEST-1 review\n10:00\n").unwrap();

    let out = sandbox.ok("11:00", &["start"]);
    assert_eq!(out, "Started TEST-1 review at 11:00\n");
}

#[test]
fn test_clear_cache_when_clean() {
    let sandbox = Sandbox::new();
    let out = sandbox.ok("12:00", &["clear-cache"]);
    assert_eq!(out, "Cache is clean\n");
}

#[test]
fn test_no_subcommand_prints_help() {
    let sandbox = Sandbox::new();
    let out = sandbox.ok("12:00", &[]);
    assert!(out.contains("Usage"), "{out}");
}
