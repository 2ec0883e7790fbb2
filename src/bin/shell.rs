//! Shell REPL entry point. No arguments (spec §6): reads lines from stdin,
//! prints a prompt when stdin is a TTY, tokenizes/validates/executes each
//! line, and records history — mirrors the original's `main.c` loop plus
//! the EOF hard-kill-all-jobs-then-`logout` behavior spec §4.8 adds.

use std::io::{self, BufRead, IsTerminal, Write};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use rdx_shell::shell::{tokenize, validate, ShellContext};

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let start_dir = std::env::current_dir().unwrap_or_else(|_| "/".into());
    let mut ctx = ShellContext::new(start_dir);

    let user = std::env::var("USER").unwrap_or_else(|_| "user".to_string());
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());

    let stdin = io::stdin();
    let is_tty = stdin.is_terminal();
    let mut lines = stdin.lock().lines();

    loop {
        ctx.jobs.reap_background();

        if is_tty {
            let cwd = std::env::current_dir().unwrap_or_else(|_| ctx.start_dir.clone());
            print!("{}", rdx_shell::shell::prompt::render(&user, &host, &cwd, &ctx.start_dir));
            let _ = io::stdout().flush();
        }

        let Some(line) = lines.next() else {
            hard_kill_all(&mut ctx);
            println!("logout");
            std::process::exit(0);
        };
        let Ok(line) = line else { continue };
        if line.trim().is_empty() {
            continue;
        }

        let parsed = tokenize(&line);
        if let Err(err) = validate(&parsed) {
            println!("{err}");
            continue;
        }
        if let Err(err) = rdx_shell::shell::executor::execute(&parsed, &mut ctx) {
            println!("{err}");
        }
        ctx.history.record(&line);
    }
}

fn hard_kill_all(ctx: &mut ShellContext) {
    for pgid in ctx.jobs.all_pgids() {
        let _ = kill(Pid::from_raw(-pgid.as_raw()), Signal::SIGKILL);
    }
}
