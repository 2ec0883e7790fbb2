//! Prompt string rendering — peripheral per spec §1, kept thin since no
//! tested invariant depends on its output.

use std::path::Path;

/// Builds `<user@host:path> `, collapsing the start-directory prefix the
/// way the original's `printPrompt.c` does (so `$HOME/foo` prints as
/// `~/foo`).
pub fn render(user: &str, host: &str, cwd: &Path, start_dir: &Path) -> String {
    let path_to_print = match cwd.strip_prefix(start_dir) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => cwd.display().to_string(),
    };
    format!("<{user}@{host}:{path_to_print}> ")
}
