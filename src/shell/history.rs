//! Bounded, deduplicated command history with file persistence (spec §3
//! "History entry" / §4.9), grounded on `partB.c`'s
//! `loadLogs`/`saveLog`/`addLog`.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

pub const HISTORY_CAP: usize = 15;

pub struct HistoryStore {
    entries: VecDeque<String>,
    path: Option<PathBuf>,
}

impl HistoryStore {
    /// Loads up to `HISTORY_CAP` lines from `home/logs.txt`, oldest first,
    /// if the file exists; otherwise starts empty.
    pub fn load(home: &Path) -> Self {
        let path = home.join("logs.txt");
        let mut entries = VecDeque::new();
        if let Ok(contents) = fs::read_to_string(&path) {
            for line in contents.lines() {
                if entries.len() == HISTORY_CAP {
                    entries.pop_front();
                }
                entries.push_back(line.to_string());
            }
        }
        HistoryStore { entries, path: Some(path) }
    }

    /// An in-memory-only store, useful for tests that shouldn't touch disk.
    pub fn in_memory() -> Self {
        HistoryStore { entries: VecDeque::new(), path: None }
    }

    /// Appends `line` unless it duplicates the most recent entry, evicting
    /// the oldest entry past `HISTORY_CAP`, then persists.
    pub fn record(&mut self, line: &str) {
        if self.entries.back().map(String::as_str) == Some(line) {
            return;
        }
        if self.entries.len() == HISTORY_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
        self.persist();
    }

    pub fn purge(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// 1 = most recently recorded entry.
    pub fn nth_most_recent(&self, k: usize) -> Option<&str> {
        if k == 0 {
            return None;
        }
        let idx = self.entries.len().checked_sub(k)?;
        self.entries.get(idx).map(String::as_str)
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().rev().map(String::as_str)
    }

    fn persist(&self) {
        let Some(path) = &self.path else { return };
        let body: String = self.entries.iter().map(|e| format!("{e}\n")).collect();
        let _ = fs::write(path, body);
    }
}
