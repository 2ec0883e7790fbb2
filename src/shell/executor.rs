//! Top-down parse-tree walk: forks pipelines, wires pipes, applies
//! redirections, assigns process groups, transfers the controlling
//! terminal, waits with stop-awareness, and dispatches built-ins (spec
//! §4.7), grounded on `executes.c`'s `executeShellCommand`/
//! `executeCmdGroup`/`executeAtomicCmd`.

use std::ffi::CString;
use std::os::fd::RawFd;

use nix::fcntl::{open, OFlag};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{
    close, dup, dup2, execvp, fork, getpgrp, pipe, setpgid, tcgetpgrp, tcsetpgrp, ForkResult, Pid,
};

use super::builtins;
use super::context::ShellContext;
use super::error::{Error, Result};
use super::job::JobStatus;
use super::tokenizer::{Atomic, CommandGroup, RedirSep, Separator, ShellCommand};

pub const BUILTINS: &[&str] =
    &["hop", "reveal", "log", "activities", "ping", "fg", "bg", "exit"];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// RAII replacement for the original's `goto restore:` cleanup: saves
/// descriptors 0/1 on construction, restores them on drop.
pub struct RedirGuard {
    saved_stdin: RawFd,
    saved_stdout: RawFd,
}

impl RedirGuard {
    fn capture() -> Result<Self> {
        Ok(RedirGuard { saved_stdin: dup(0)?, saved_stdout: dup(1)? })
    }
}

impl Drop for RedirGuard {
    fn drop(&mut self) {
        let _ = dup2(self.saved_stdin, 0);
        let _ = dup2(self.saved_stdout, 1);
        let _ = close(self.saved_stdin);
        let _ = close(self.saved_stdout);
    }
}

/// Opens and dup2's every redirection target named in `atomic` onto 0/1.
/// Used both by forked children (about to exec or exit, no restore needed)
/// and by in-process builtins (wrapped in a `RedirGuard` by the caller).
fn apply_redirections(atomic: &Atomic) -> Result<()> {
    for (i, sep) in atomic.separators.iter().enumerate() {
        if *sep == RedirSep::None {
            continue;
        }
        let terminal = atomic.terminals.get(i + 1).ok_or(Error::UserSyntax)?;
        let filename = terminal.args.first().ok_or(Error::UserSyntax)?;
        let path = CString::new(filename.as_str()).map_err(|_| Error::UserSyntax)?;
        let (flags, mode, target_fd) = match sep {
            RedirSep::In => (OFlag::O_RDONLY, Mode::empty(), 0),
            RedirSep::Out => (
                OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
                Mode::from_bits_truncate(0o644),
                1,
            ),
            RedirSep::Append => (
                OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
                Mode::from_bits_truncate(0o644),
                1,
            ),
            RedirSep::None => unreachable!(),
        };
        let fd = open(path.as_c_str(), flags, mode)?;
        dup2(fd, target_fd)?;
        close(fd)?;
    }
    Ok(())
}

fn argv_cstrings(terminal: &super::tokenizer::Terminal) -> Vec<CString> {
    terminal.args.iter().map(|a| CString::new(a.as_str()).unwrap_or_default()).collect()
}

fn reset_job_control_signals() {
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::SigDfl);
        let _ = signal(Signal::SIGQUIT, SigHandler::SigDfl);
        let _ = signal(Signal::SIGTSTP, SigHandler::SigDfl);
        let _ = signal(Signal::SIGTTIN, SigHandler::SigDfl);
        let _ = signal(Signal::SIGTTOU, SigHandler::SigDfl);
    }
}

fn exec_or_die(atomic: &Atomic) -> ! {
    if apply_redirections(atomic).is_err() {
        eprintln!("Command not found!");
        std::process::exit(1);
    }
    let argv = argv_cstrings(&atomic.terminals[0]);
    if argv.is_empty() {
        std::process::exit(0);
    }
    let err = execvp(&argv[0], &argv);
    eprintln!("Command not found!");
    drop(err);
    std::process::exit(127)
}

fn transfer_terminal(pgid: Pid) {
    let _ = tcsetpgrp(0, pgid);
}

fn reclaim_terminal(shell_pgid: Pid) {
    let _ = tcsetpgrp(0, shell_pgid);
}

/// Entry point: runs every command group in `cmd` left to right.
pub fn execute(cmd: &ShellCommand, ctx: &mut ShellContext) -> Result<()> {
    for (group, sep) in cmd.groups.iter().zip(cmd.separators.iter()) {
        if group.atomics.iter().all(|a| a.terminals[0].args.is_empty()) {
            continue;
        }
        if *sep == Separator::Amp {
            spawn_background(group, ctx)?;
        } else {
            execute_group_foreground(group, ctx)?;
        }
    }
    Ok(())
}

/// Reconstructs a group's own command text from its atomics, the way
/// `original_source/shell/src/executes.c:108` uses `cmdGroup->cmdString` —
/// never the raw input line, which may carry other groups and the
/// trailing `&` itself.
fn group_command_string(atomics: &[Atomic]) -> String {
    atomics.iter().map(|a| a.terminals[0].args.join(" ")).collect::<Vec<_>>().join(" | ")
}

/// Runs one atomic in a process that has already forked and joined its
/// pipeline/job process group. A built-in always runs in place here instead
/// of being exec'd — `original_source/shell/src/executes.c:268-271` checks
/// `is_builtin` unconditionally before the pipe/background exec branch, so a
/// built-in never loses out just because it landed in a forked child.
fn run_atomic_in_child(atomic: &Atomic, ctx: &mut ShellContext) -> ! {
    let name = atomic.terminals[0].args.first().map(String::as_str).unwrap_or("");
    if is_builtin(name) {
        if apply_redirections(atomic).is_err() {
            eprintln!("Command not found!");
            std::process::exit(1);
        }
        let result = builtins::dispatch(name, atomic, ctx);
        std::process::exit(if result.is_ok() { 0 } else { 1 });
    }
    exec_or_die(atomic);
}

fn execute_group_foreground(group: &CommandGroup, ctx: &mut ShellContext) -> Result<()> {
    if group.atomics.len() == 1 {
        let atomic = &group.atomics[0];
        let name = atomic.terminals[0].args.first().map(String::as_str).unwrap_or("");
        if is_builtin(name) {
            let guard = RedirGuard::capture()?;
            apply_redirections(atomic)?;
            let result = builtins::dispatch(name, atomic, ctx);
            drop(guard);
            return result;
        }
        return run_single_external(atomic, ctx);
    }
    run_pipeline(&group.atomics, ctx)
}

fn run_single_external(atomic: &Atomic, ctx: &mut ShellContext) -> Result<()> {
    let shell_pgid = getpgrp();
    match unsafe { fork()? } {
        ForkResult::Child => {
            let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));
            reset_job_control_signals();
            exec_or_die(atomic);
        }
        ForkResult::Parent { child } => {
            let _ = setpgid(child, child);
            transfer_terminal(child);
            let status = waitpid(child, Some(WaitPidFlag::WUNTRACED))?;
            reclaim_terminal(shell_pgid);
            if let WaitStatus::Stopped(..) = status {
                let cmd_string = atomic.terminals[0].args.join(" ");
                let n = ctx.jobs.add(child, child, cmd_string.clone(), JobStatus::Stopped);
                println!("[{n}] Stopped {cmd_string}");
            }
        }
    }
    Ok(())
}

fn run_pipeline(atomics: &[Atomic], ctx: &mut ShellContext) -> Result<()> {
    let shell_pgid = getpgrp();
    let n = atomics.len();
    let mut pipes = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        pipes.push(pipe()?);
    }
    let mut pgid: Option<Pid> = None;
    let mut children = Vec::with_capacity(n);
    for (i, atomic) in atomics.iter().enumerate() {
        match unsafe { fork()? } {
            ForkResult::Child => {
                if i > 0 {
                    dup2(pipes[i - 1].0, 0)?;
                }
                if i < n - 1 {
                    dup2(pipes[i].1, 1)?;
                }
                for &(r, w) in &pipes {
                    let _ = close(r);
                    let _ = close(w);
                }
                let my_pgid = pgid.unwrap_or(Pid::from_raw(0));
                let _ = setpgid(Pid::from_raw(0), my_pgid);
                reset_job_control_signals();
                run_atomic_in_child(atomic, ctx);
            }
            ForkResult::Parent { child } => {
                let my_pgid = pgid.unwrap_or(child);
                let _ = setpgid(child, my_pgid);
                pgid = Some(my_pgid);
                children.push(child);
            }
        }
    }
    for &(r, w) in &pipes {
        let _ = close(r);
        let _ = close(w);
    }
    let pgid = pgid.expect("pipeline has at least one child");
    transfer_terminal(pgid);

    let mut remaining = children.len();
    let mut stopped = false;
    while remaining > 0 {
        match waitpid(Pid::from_raw(-pgid.as_raw()), Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => remaining -= 1,
            Ok(WaitStatus::Stopped(..)) => {
                stopped = true;
                break;
            }
            Err(nix::errno::Errno::ECHILD) => break,
            Err(nix::errno::Errno::EINTR) => continue,
            _ => continue,
        }
    }
    reclaim_terminal(shell_pgid);
    if stopped {
        let cmd_string = group_command_string(atomics);
        let leader = *children.first().unwrap();
        let n = ctx.jobs.add(leader, pgid, cmd_string.clone(), JobStatus::Stopped);
        println!("[{n}] Stopped {cmd_string}");
    }
    Ok(())
}

fn spawn_background(group: &CommandGroup, ctx: &mut ShellContext) -> Result<()> {
    match unsafe { fork()? } {
        ForkResult::Child => {
            let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));
            reset_job_control_signals();
            if let Ok(devnull) = open("/dev/null", OFlag::O_RDONLY, Mode::empty()) {
                let _ = dup2(devnull, 0);
                let _ = close(devnull);
            }
            run_background_subtree(&group.atomics, ctx);
        }
        ForkResult::Parent { child } => {
            let _ = setpgid(child, child);
            let cmd_string = group_command_string(&group.atomics);
            let n = ctx.jobs.add(child, child, cmd_string, JobStatus::Running);
            println!("[{n}] {child}");
            Ok(())
        }
    }
}

/// Runs inside the already-forked background child: pipeline members join
/// the child's own process group instead of forming a new one, and nothing
/// here waits on the terminal — the registry's non-blocking poll is the
/// only reaper for this subtree.
fn run_background_subtree(atomics: &[Atomic], ctx: &mut ShellContext) -> ! {
    if atomics.len() == 1 {
        run_atomic_in_child(&atomics[0], ctx);
    }
    let n = atomics.len();
    let mut pipes = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        pipes.push(pipe().expect("pipe"));
    }
    let my_pgid = getpgrp();
    for (i, atomic) in atomics.iter().enumerate() {
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                if i > 0 {
                    let _ = dup2(pipes[i - 1].0, 0);
                }
                if i < n - 1 {
                    let _ = dup2(pipes[i].1, 1);
                }
                for &(r, w) in &pipes {
                    let _ = close(r);
                    let _ = close(w);
                }
                let _ = setpgid(Pid::from_raw(0), my_pgid);
                run_atomic_in_child(atomic, ctx);
            }
            Ok(ForkResult::Parent { child }) => {
                let _ = setpgid(child, my_pgid);
            }
            Err(_) => break,
        }
    }
    for &(r, w) in &pipes {
        let _ = close(r);
        let _ = close(w);
    }
    let mut remaining = n;
    while remaining > 0 {
        match waitpid(Pid::from_raw(-my_pgid.as_raw()), None) {
            Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => remaining -= 1,
            Err(nix::errno::Errno::ECHILD) => break,
            _ => continue,
        }
    }
    std::process::exit(0)
}

pub fn foreground_continue(pid: Pid, pgid: Pid, ctx: &mut ShellContext) -> Result<()> {
    let shell_pgid = getpgrp();
    transfer_terminal(pgid);
    nix::sys::signal::kill(Pid::from_raw(-pgid.as_raw()), Signal::SIGCONT)?;
    let status = waitpid(pid, Some(WaitPidFlag::WUNTRACED))?;
    reclaim_terminal(shell_pgid);
    match status {
        WaitStatus::Stopped(..) => ctx.jobs.mark_stopped(pid),
        _ => {
            ctx.jobs.remove(pid);
        }
    }
    Ok(())
}

pub fn current_tty_pgid() -> nix::Result<Pid> {
    tcgetpgrp(0)
}
