//! Consolidated shell state, replacing the original's scattered globals
//! (`absoluteHomePath`, `oldWD`, `bg_job_head`, `listHead`/`listTail`,
//! `job_list`) with one struct threaded by `&mut` down the call tree — the
//! one deliberate structural deviation from the teacher's style.

use std::path::PathBuf;

use nix::unistd::Pid;

use super::history::HistoryStore;
use super::job::JobRegistry;

pub struct ShellContext {
    pub start_dir: PathBuf,
    pub old_dir: Option<PathBuf>,
    pub jobs: JobRegistry,
    pub history: HistoryStore,
    pub foreground_pgid: Option<Pid>,
}

impl ShellContext {
    pub fn new(start_dir: PathBuf) -> Self {
        let history = HistoryStore::load(&start_dir);
        ShellContext { start_dir, old_dir: None, jobs: JobRegistry::new(), history, foreground_pgid: None }
    }
}
