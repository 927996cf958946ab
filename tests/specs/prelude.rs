//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for testing `bd`/`beadsd` behavior against a
//! real daemon process rooted in a throwaway state directory.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

// Aggressive timeouts for fast tests.
//
// IMPORTANT:
//   Do NOT change these.
//   File a performance bug instead.
const BEADS_IPC_TIMEOUT_MS: &str = "500";
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 2000;

/// Returns the path to a binary, checking llvm-cov target directory first.
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR is stale (e.g. compiled by a removed worktree
/// into a shared target directory).
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn bd_binary() -> PathBuf {
    binary_path("bd")
}

pub fn beadsd_binary() -> PathBuf {
    binary_path("beadsd")
}

/// A running `beadsd` instance rooted in a fresh temp directory. Killed
/// (and its state dir removed) on drop.
pub struct Daemon {
    child: Child,
    state_dir: tempfile::TempDir,
}

impl Daemon {
    /// Start `beadsd` against a fresh state dir and wait for its socket
    /// to appear.
    pub fn start() -> Self {
        let state_dir = tempfile::tempdir().expect("tempdir");
        let mut child = Command::new(beadsd_binary())
            .env("BEADS_STATE_DIR", state_dir.path())
            .env("BEADS_IPC_TIMEOUT_MS", BEADS_IPC_TIMEOUT_MS)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("beadsd should spawn");

        let socket = state_dir.path().join("daemon.sock");
        let ready = wait_for(SPEC_WAIT_MAX_MS, || socket.exists());
        if !ready {
            let _ = child.kill();
            let mut stderr = String::new();
            if let Some(mut s) = child.stderr.take() {
                let _ = s.read_to_string(&mut stderr);
            }
            panic!("beadsd did not create its socket in time\nstderr: {stderr}");
        }

        Daemon { child, state_dir }
    }

    pub fn state_dir(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Send SIGKILL, simulating a crash rather than a graceful stop.
    pub fn kill(&mut self) -> bool {
        self.child.kill().is_ok()
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.path().join("daemon.lock")
    }

    pub fn bd(&self) -> CliBuilder {
        CliBuilder::new(self.state_dir.path().to_path_buf())
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Poll `check` every `SPEC_POLL_INTERVAL_MS` until it returns true or
/// `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(SPEC_POLL_INTERVAL_MS));
    }
}

/// High-level CLI builder for fluent test assertions against `bd`,
/// pointed at a specific daemon's state dir.
pub struct CliBuilder {
    state_dir: PathBuf,
    args: Vec<String>,
}

impl CliBuilder {
    fn new(state_dir: PathBuf) -> Self {
        Self { state_dir, args: Vec::new() }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = Command::new(bd_binary());
        cmd.args(&self.args);
        cmd.env("BEADS_STATE_DIR", &self.state_dir);
        cmd.env("BEADS_IPC_TIMEOUT_MS", BEADS_IPC_TIMEOUT_MS);
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout()).expect("stdout should be JSON")
    }
}
