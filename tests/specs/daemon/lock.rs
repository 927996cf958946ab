//! Daemon lock specs (§8: acquire, second-acquire-fails, release,
//! reacquire-succeeds).

use std::process::{Command, Stdio};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::prelude::*;

#[test]
fn second_daemon_against_the_same_state_dir_is_refused() {
    let daemon = Daemon::start();

    let second = Command::new(beadsd_binary())
        .env("BEADS_STATE_DIR", daemon.state_dir())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("second beadsd should run to completion");

    assert!(!second.status.success(), "a second daemon on the same state dir must fail to start");
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("already running"), "stderr: {stderr}");
    assert!(daemon.lock_path().exists(), "the first daemon's lock file should remain");
}

#[test]
fn lock_file_is_removed_after_a_clean_shutdown() {
    let mut daemon = Daemon::start();
    let lock_path = daemon.lock_path();
    assert!(lock_path.exists());

    // SIGTERM triggers the graceful shutdown path (flush, checkpoint,
    // then delete socket/lock files).
    kill(Pid::from_raw(daemon.pid() as i32), Signal::SIGTERM).expect("signal should deliver");
    let gone = wait_for(SPEC_WAIT_MAX_MS, || !lock_path.exists());
    assert!(gone, "lock file should be removed after clean shutdown");

    // Starting a fresh daemon against the same (now-unlocked) dir
    // succeeds.
    let _ = daemon.kill();
    let reacquired = Daemon::start();
    assert!(reacquired.lock_path().exists());
}
