//! Job registry: tracks background and stopped jobs keyed by a monotonic
//! job number (spec §3 "Job" / §4.8), grounded on
//! `original_source/shell/src/partE.c` (`addJob`/`removeJob`/`updateJobs`)
//! and `executes.c` (`add_bg_job`/`check_bg_jobs`/`is_bg_job_running`),
//! unified into one registry instead of the original's two parallel lists.

use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Stopped,
    DoneOk,
    DoneErr,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub job_num: u32,
    pub pid: Pid,
    pub pgid: Pid,
    pub command: String,
    pub status: JobStatus,
}

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Vec<Job>,
    next_job_num: u32,
}

impl JobRegistry {
    pub fn new() -> Self {
        JobRegistry { jobs: Vec::new(), next_job_num: 1 }
    }

    pub fn add(&mut self, pid: Pid, pgid: Pid, command: String, status: JobStatus) -> u32 {
        let job_num = self.next_job_num;
        self.next_job_num += 1;
        self.jobs.push(Job { job_num, pid, pgid, command, status });
        job_num
    }

    pub fn owns(&self, pid: Pid) -> bool {
        self.jobs.iter().any(|j| j.pid == pid)
    }

    /// Non-blocking reap of every tracked job whose leader has exited.
    /// Returns the removed jobs so the caller can print the termination
    /// message exactly once.
    pub fn reap_background(&mut self) -> Vec<Job> {
        let mut done = Vec::new();
        let mut i = 0;
        while i < self.jobs.len() {
            let pid = self.jobs[i].pid;
            match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(_, code)) => {
                    let mut job = self.jobs.remove(i);
                    job.status = if code == 0 { JobStatus::DoneOk } else { JobStatus::DoneErr };
                    done.push(job);
                }
                Ok(WaitStatus::Signaled(..)) => {
                    let mut job = self.jobs.remove(i);
                    job.status = JobStatus::DoneErr;
                    done.push(job);
                }
                Ok(WaitStatus::Stopped(..)) => {
                    self.jobs[i].status = JobStatus::Stopped;
                    i += 1;
                }
                _ => i += 1,
            }
        }
        done
    }

    pub fn mark_stopped(&mut self, pid: Pid) {
        if let Some(job) = self.jobs.iter_mut().find(|j| j.pid == pid) {
            job.status = JobStatus::Stopped;
        }
    }

    pub fn mark_running(&mut self, pid: Pid) {
        if let Some(job) = self.jobs.iter_mut().find(|j| j.pid == pid) {
            job.status = JobStatus::Running;
        }
    }

    pub fn most_recent(&self) -> Option<&Job> {
        self.jobs.last()
    }

    pub fn find_by_num(&self, job_num: u32) -> Option<&Job> {
        self.jobs.iter().find(|j| j.job_num == job_num)
    }

    pub fn remove(&mut self, pid: Pid) -> Option<Job> {
        let idx = self.jobs.iter().position(|j| j.pid == pid)?;
        Some(self.jobs.remove(idx))
    }

    pub fn sorted_by_command(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.jobs.iter().collect();
        jobs.sort_by(|a, b| a.command.cmp(&b.command));
        jobs
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn all_pgids(&self) -> Vec<Pid> {
        self.jobs.iter().map(|j| j.pgid).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_assigns_monotonic_job_numbers() {
        let mut reg = JobRegistry::new();
        let n1 = reg.add(Pid::from_raw(100), Pid::from_raw(100), "sleep 1".into(), JobStatus::Running);
        let n2 = reg.add(Pid::from_raw(200), Pid::from_raw(200), "sleep 2".into(), JobStatus::Running);
        assert_eq!(n1, 1);
        assert_eq!(n2, 2);
    }

    #[test]
    fn sorted_by_command_orders_lexicographically() {
        let mut reg = JobRegistry::new();
        reg.add(Pid::from_raw(1), Pid::from_raw(1), "zzz".into(), JobStatus::Running);
        reg.add(Pid::from_raw(2), Pid::from_raw(2), "aaa".into(), JobStatus::Running);
        let sorted: Vec<&str> = reg.sorted_by_command().iter().map(|j| j.command.as_str()).collect();
        assert_eq!(sorted, vec!["aaa", "zzz"]);
    }

    #[test]
    fn most_recent_is_the_last_added_job() {
        let mut reg = JobRegistry::new();
        reg.add(Pid::from_raw(1), Pid::from_raw(1), "first".into(), JobStatus::Running);
        reg.add(Pid::from_raw(2), Pid::from_raw(2), "second".into(), JobStatus::Running);
        assert_eq!(reg.most_recent().unwrap().command, "second");
    }
}
