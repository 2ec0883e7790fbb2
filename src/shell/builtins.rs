//! Built-in command implementations (spec §4.7 "Built-in contracts"),
//! each grounded on its corresponding original function: `hop`→
//! `partB.c::executeHop`, `reveal`→`executeReveal`, `log`→`executeLog`,
//! `activities`→`partE.c::printActivities`, `ping`/`fg`/`bg`→
//! `executes.c::executePing`/`fg`/`bg`.

use std::fs;
use std::path::{Path, PathBuf};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use super::context::ShellContext;
use super::error::{Error, Result};
use super::executor;
use super::job::JobStatus;
use super::tokenizer::Atomic;
use super::validator;

pub fn dispatch(name: &str, atomic: &Atomic, ctx: &mut ShellContext) -> Result<()> {
    let args = &atomic.terminals[0].args;
    match name {
        "hop" => hop(&args[1..], ctx),
        "reveal" => reveal(&args[1..], ctx),
        "log" => log_builtin(&args[1..], ctx),
        "activities" => activities(ctx),
        "ping" => ping(&args[1..]),
        "fg" => fg(&args[1..], ctx),
        "bg" => bg(&args[1..], ctx),
        "exit" => std::process::exit(0),
        _ => Err(Error::CommandNotFound),
    }
}

fn hop(args: &[String], ctx: &mut ShellContext) -> Result<()> {
    if args.is_empty() {
        return chdir_tracking_oldpwd(&ctx.start_dir.clone(), ctx);
    }
    for arg in args {
        let target: PathBuf = match arg.as_str() {
            "-" => match ctx.old_dir.clone() {
                Some(p) => p,
                None => {
                    println!("No such directory!");
                    continue;
                }
            },
            "." => std::env::current_dir().map_err(Error::Io)?,
            ".." => {
                let cwd = std::env::current_dir().map_err(Error::Io)?;
                match cwd.parent() {
                    Some(p) => p.to_path_buf(),
                    None => cwd,
                }
            }
            "~" => ctx.start_dir.clone(),
            other => PathBuf::from(other),
        };
        if chdir_tracking_oldpwd(&target, ctx).is_err() {
            println!("No such directory!");
        }
    }
    Ok(())
}

fn chdir_tracking_oldpwd(target: &Path, ctx: &mut ShellContext) -> Result<()> {
    let prev = std::env::current_dir().ok();
    std::env::set_current_dir(target).map_err(|_| Error::NoSuchDirectory)?;
    ctx.old_dir = prev;
    Ok(())
}

fn reveal(args: &[String], ctx: &ShellContext) -> Result<()> {
    let mut show_hidden = false;
    let mut one_per_line = false;
    let mut path_arg: Option<&str> = None;
    for a in args {
        match a.as_str() {
            "-a" => show_hidden = true,
            "-l" => one_per_line = true,
            "-la" | "-al" => {
                show_hidden = true;
                one_per_line = true;
            }
            other => path_arg = Some(other),
        }
    }
    let target: PathBuf = match path_arg {
        None => std::env::current_dir().map_err(Error::Io)?,
        Some("-") => ctx.old_dir.clone().ok_or(Error::NoSuchDirectory)?,
        Some("~") => ctx.start_dir.clone(),
        Some(".") => std::env::current_dir().map_err(Error::Io)?,
        Some("..") => {
            let cwd = std::env::current_dir().map_err(Error::Io)?;
            cwd.parent().map(Path::to_path_buf).unwrap_or(cwd)
        }
        Some(other) => PathBuf::from(other),
    };
    if !target.exists() {
        println!("No such directory!");
        return Ok(());
    }
    if !target.is_dir() {
        println!("{}", target.display());
        return Ok(());
    }
    let mut names: Vec<String> = fs::read_dir(&target)
        .map_err(|_| Error::NoSuchDirectory)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| show_hidden || !n.starts_with('.'))
        .collect();
    names.sort();
    if one_per_line {
        for n in names {
            println!("{n}");
        }
    } else {
        println!("{}", names.join("  "));
    }
    Ok(())
}

fn log_builtin(args: &[String], ctx: &mut ShellContext) -> Result<()> {
    match args {
        [] => {
            for (i, entry) in ctx.history.newest_first().enumerate() {
                println!("{} {}", i + 1, entry);
            }
            Ok(())
        }
        [cmd] if cmd == "purge" => {
            ctx.history.purge();
            Ok(())
        }
        [cmd, k] if cmd == "execute" => {
            let k: usize = k.parse().map_err(|_| Error::UserSyntax)?;
            let line = ctx.history.nth_most_recent(k).ok_or(Error::UserSyntax)?.to_string();
            let parsed = super::tokenizer::tokenize(&line);
            validator::validate(&parsed)?;
            executor::execute(&parsed, ctx)
        }
        _ => Err(Error::UserSyntax),
    }
}

fn activities(ctx: &mut ShellContext) -> Result<()> {
    for job in ctx.jobs.reap_background() {
        let verb = if job.status == JobStatus::DoneOk { "exited normally" } else { "exited abnormally" };
        println!("{} with pid {} {}", job.command, job.pid, verb);
    }
    for job in ctx.jobs.sorted_by_command() {
        let status = if job.status == JobStatus::Stopped { "Stopped" } else { "Running" };
        println!("[{}] : {} - {}", job.pid, job.command, status);
    }
    Ok(())
}

fn ping(args: &[String]) -> Result<()> {
    if args.len() != 2 {
        println!("Invalid syntax!");
        return Ok(());
    }
    let (Ok(pid), Ok(sig)) = (args[0].parse::<i32>(), args[1].parse::<i32>()) else {
        println!("Invalid syntax!");
        return Ok(());
    };
    let normalized = ((sig % 32) + 32) % 32;
    let Ok(signal) = Signal::try_from(normalized) else {
        println!("Invalid syntax!");
        return Ok(());
    };
    match kill(Pid::from_raw(pid), signal) {
        Ok(()) => println!("Sent signal {normalized} to process with pid {pid}"),
        Err(_) => println!("No such process found"),
    }
    Ok(())
}

fn fg(args: &[String], ctx: &mut ShellContext) -> Result<()> {
    let job = resolve_job(args, ctx)?;
    let (pid, pgid) = (job.pid, job.pgid);
    executor::foreground_continue(pid, pgid, ctx)
}

fn bg(args: &[String], ctx: &mut ShellContext) -> Result<()> {
    let job = resolve_job(args, ctx)?;
    let (pid, pgid, cmd) = (job.pid, job.pgid, job.command.clone());
    kill(Pid::from_raw(-pgid.as_raw()), Signal::SIGCONT).map_err(|_| Error::NoSuchJob)?;
    ctx.jobs.mark_running(pid);
    println!("[{}] {cmd} &", job.job_num);
    Ok(())
}

fn resolve_job<'a>(args: &[String], ctx: &'a ShellContext) -> Result<super::job::Job> {
    let job = if args.is_empty() {
        ctx.jobs.most_recent()
    } else {
        let n: u32 = args[0].parse().map_err(|_| Error::NoSuchJob)?;
        ctx.jobs.find_by_num(n)
    };
    job.cloned().ok_or(Error::NoSuchJob)
}
