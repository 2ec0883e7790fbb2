//! Exercises the registry against a real short-lived child process instead
//! of fabricated pids, so the non-blocking `WNOHANG` reap path actually
//! observes a genuine exit.

use std::time::{Duration, Instant};

use nix::unistd::Pid;

use rdx_shell::shell::job::{JobRegistry, JobStatus};

#[test]
fn reap_background_picks_up_a_real_process_exit_exactly_once() {
    let child = std::process::Command::new("true")
        .spawn()
        .expect("spawning /bin/true for the test");
    let pid = Pid::from_raw(child.id() as i32);

    let mut reg = JobRegistry::new();
    let job_num = reg.add(pid, pid, "true".to_string(), JobStatus::Running);
    assert!(reg.owns(pid));

    let deadline = Instant::now() + Duration::from_secs(2);
    let mut done = Vec::new();
    while done.is_empty() && Instant::now() < deadline {
        done = reg.reap_background();
        if done.is_empty() {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    assert_eq!(done.len(), 1, "the exited child should be reaped exactly once");
    assert_eq!(done[0].job_num, job_num);
    assert_eq!(done[0].status, JobStatus::DoneOk);
    assert!(!reg.owns(pid), "the reaped job must be removed from the registry");

    // A second poll must not report it again — the single-reaper invariant.
    assert!(reg.reap_background().is_empty());

    std::mem::forget(child);
}
