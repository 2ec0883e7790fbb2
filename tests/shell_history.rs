//! Exercises `HistoryStore` against a real `logs.txt` on disk, the way the
//! shell binary actually uses it, rather than the in-memory-only unit tests.

use std::fs;

use rdx_shell::shell::history::HistoryStore;

fn scratch_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("rdx_shell_history_test_{tag}_{}", std::process::id()));
    let _ = fs::create_dir_all(&dir);
    dir
}

#[test]
fn persisted_history_survives_a_reload() {
    let home = scratch_dir("reload");
    let mut store = HistoryStore::load(&home);
    store.record("echo one");
    store.record("echo two");
    store.record("echo two"); // immediate duplicate, not recorded again

    let reloaded = HistoryStore::load(&home);
    let entries: Vec<&str> = reloaded.newest_first().collect();
    assert_eq!(entries, vec!["echo two", "echo one"]);

    fs::remove_dir_all(&home).ok();
}

#[test]
fn purge_empties_the_file_too() {
    let home = scratch_dir("purge");
    let mut store = HistoryStore::load(&home);
    store.record("echo one");
    store.purge();

    let reloaded = HistoryStore::load(&home);
    assert_eq!(reloaded.newest_first().count(), 0);

    fs::remove_dir_all(&home).ok();
}
